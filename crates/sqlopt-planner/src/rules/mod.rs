//! Rewrite rules over resolved logical plans.
//!
//! Every rule has the same shape: it takes the per-query context, the
//! diagnostics sink, the plan root and the enclosing scope, and returns a new
//! root. A rule that finds nothing to do hands back the input `Arc` itself, so
//! callers can detect no-ops with `Arc::ptr_eq`.

mod erase_projection;
mod eval_filter;
mod move_join_conditions;
mod optimize_distinct;
mod remove_unnecessary_converts;

use sqlopt_core::plan::PlanRef;

use crate::context::OptimizerContext;
use crate::scope::Scope;
use crate::state::AnalyzerState;

pub use erase_projection::erase_projection;
pub use eval_filter::eval_filter;
pub use move_join_conditions::move_join_conditions_to_filter;
pub use optimize_distinct::optimize_distinct;
pub use remove_unnecessary_converts::remove_unnecessary_converts;

pub type RuleFn =
    fn(&OptimizerContext, &mut AnalyzerState, &PlanRef, &Scope) -> sqlopt_core::Result<PlanRef>;

/// A named rewrite.
#[derive(Clone, Copy)]
pub struct Rule {
    pub name: &'static str,
    pub apply: RuleFn,
}

impl std::fmt::Debug for Rule {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Rule").field("name", &self.name).finish()
    }
}

/// The default pipeline, in execution order.
///
/// Casts go first so folding sees bare literals. Join conditions are pushed
/// before folding so constant conjuncts moved into filters get folded in the
/// same run.
pub fn default_rules() -> Vec<Rule> {
    vec![
        Rule {
            name: "remove_unnecessary_converts",
            apply: remove_unnecessary_converts,
        },
        Rule {
            name: "move_join_conditions_to_filter",
            apply: move_join_conditions_to_filter,
        },
        Rule {
            name: "eval_filter",
            apply: eval_filter,
        },
        Rule {
            name: "erase_projection",
            apply: erase_projection,
        },
        Rule {
            name: "optimize_distinct",
            apply: optimize_distinct,
        },
    ]
}

/// Names of the default rules, for validating configuration.
pub fn rule_names() -> Vec<&'static str> {
    default_rules().iter().map(|r| r.name).collect()
}
