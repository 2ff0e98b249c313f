//! Drop projections that hand their input's columns through untouched.

use std::sync::Arc;

use sqlopt_core::plan::{LogicalPlan, PlanRef};
use sqlopt_core::tree::transform_up;
use sqlopt_core::Result;

use crate::context::OptimizerContext;
use crate::scope::Scope;
use crate::state::AnalyzerState;

/// Replace every `Project` whose schema is equivalent to its child's schema
/// (same names and types, same order) with the child.
pub fn erase_projection(
    ctx: &OptimizerContext,
    state: &mut AnalyzerState,
    plan: &PlanRef,
    _scope: &Scope,
) -> Result<PlanRef> {
    let _span = ctx.span("erase_projection");

    if !plan.resolved() {
        return Ok(Arc::clone(plan));
    }

    transform_up(plan, &mut |node: &PlanRef| match node.as_ref() {
        LogicalPlan::Project { input, .. } if node.schema().equivalent(&input.schema()) => {
            state.log("project erased");
            Ok(Arc::clone(input))
        }
        _ => Ok(Arc::clone(node)),
    })
}
