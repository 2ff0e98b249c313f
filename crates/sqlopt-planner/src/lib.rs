#![forbid(unsafe_code)]
//! sqlopt-planner: rule-based rewrites of resolved logical plans.
//!
//! Design:
//! - Plans and expressions come from `sqlopt-core`; rewrites share untouched
//!   subtrees by `Arc` and return the input root when nothing changed.
//! - Each rule in [`rules`] is a plain function over
//!   `(context, analyzer state, plan, scope)`.
//! - [`Optimizer`] runs them in a fixed order, honouring [`OptimizerConfig`]
//!   (disabled rules, debug notes, division-by-zero semantics).
//!
//! Unresolved plans pass through every rule untouched.

pub mod config;
pub mod context;
pub mod error;
pub mod optimizer;
pub mod rules;
pub mod scope;
pub mod sources;
pub mod state;

pub use config::{parse_json_config, parse_yaml_config};
pub use context::OptimizerContext;
pub use error::{OptimizeError, Result};
pub use optimizer::Optimizer;
pub use rules::{default_rules, Rule, RuleFn};
pub use scope::{fix_field_indexes, Scope};
pub use sqlopt_core::config::OptimizerConfig;
pub use state::AnalyzerState;

use sqlopt_core::plan::PlanRef;

/// Run the default pipeline with default settings.
pub fn optimize(plan: &PlanRef) -> Result<PlanRef> {
    Optimizer::default().optimize_plan(plan)
}
