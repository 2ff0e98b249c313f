#![forbid(unsafe_code)]
//! sqlopt-core: the data the optimizer works on.
//!
//! - `schema` / `types`: columns with table qualifiers, scalar values
//! - `expr`: scalar expression tree and its evaluator
//! - `plan`: logical plan tree
//! - `tree`: bottom-up rewrite and early-stop inspection over both trees
//!
//! Pure data and pure functions only; no I/O and no global state.

pub mod config;
pub mod error;
pub mod expr;
pub mod plan;
pub mod prelude;
pub mod schema;
pub mod tree;
pub mod types;

pub use error::{Error, Result};
