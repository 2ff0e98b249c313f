//! Convenient re-exports for downstream crates.

pub use crate::config::OptimizerConfig;
pub use crate::error::{Error, Result};
pub use crate::expr::{EvalContext, Expr, ExprRef, ScalarUdf};
pub use crate::plan::{LogicalPlan, PlanRef, SortField, SortOrder, UserDefinedPlan};
pub use crate::schema::{DataType, Field, Schema};
pub use crate::types::{Row, Scalar};
