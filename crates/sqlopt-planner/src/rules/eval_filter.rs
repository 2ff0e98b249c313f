//! Constant folding and short-circuiting of filter predicates.
//!
//! Predicates are rewritten bottom-up: boolean literals short-circuit the
//! `AND`/`OR` around them and anything computable without a row becomes a
//! literal. A filter left with a literal false predicate can produce no rows
//! and turns into an empty table; a literal true one is dropped.

use std::sync::Arc;

use sqlopt_core::expr::{typed_lit, Expr, ExprRef};
use sqlopt_core::plan::{LogicalPlan, PlanRef};
use sqlopt_core::schema::DataType;
use sqlopt_core::tree::{transform_expr_up, transform_up};
use sqlopt_core::types::{Scalar, FALSE_I8};
use sqlopt_core::Result;

use crate::context::OptimizerContext;
use crate::scope::Scope;
use crate::state::AnalyzerState;

pub fn eval_filter(
    ctx: &OptimizerContext,
    state: &mut AnalyzerState,
    plan: &PlanRef,
    _scope: &Scope,
) -> Result<PlanRef> {
    let _span = ctx.span("eval_filter");

    if !plan.resolved() {
        return Ok(Arc::clone(plan));
    }

    transform_up(plan, &mut |node: &PlanRef| {
        let LogicalPlan::Filter { predicate, input } = node.as_ref() else {
            return Ok(Arc::clone(node));
        };

        let folded = transform_expr_up(predicate, &mut |e: &ExprRef| fold(ctx, e))?;

        if is_false(&folded) {
            state.log("filter always false, replaced with empty table");
            return Ok(LogicalPlan::empty_table(input.schema()));
        }
        if is_true(&folded) {
            state.log("filter always true, removed");
            return Ok(Arc::clone(input));
        }
        if Arc::ptr_eq(&folded, predicate) {
            Ok(Arc::clone(node))
        } else {
            state.log(format!("filter predicate simplified to {folded}"));
            Ok(LogicalPlan::filter(folded, Arc::clone(input)))
        }
    })
}

fn fold(ctx: &OptimizerContext, e: &ExprRef) -> Result<ExprRef> {
    match e.as_ref() {
        Expr::Or { left, right } => Ok(Arc::clone(if is_true(left) {
            left
        } else if is_true(right) || is_false(left) {
            right
        } else if is_false(right) {
            left
        } else {
            e
        })),
        Expr::And { left, right } => Ok(Arc::clone(if is_false(left) {
            left
        } else if is_false(right) || is_true(left) {
            right
        } else if is_true(right) {
            left
        } else {
            e
        })),
        Expr::Literal { .. } | Expr::Tuple(_) | Expr::Interval { .. } => Ok(Arc::clone(e)),
        _ if e.is_evaluable() => match e.eval(ctx.eval_context(), None) {
            Ok(value) => Ok(typed_lit(value, e.data_type())),
            Err(err) => {
                // The unfolded expression raises the same error at execution.
                tracing::trace!(expr = %e, error = %err, "constant folding skipped");
                Ok(Arc::clone(e))
            }
        },
        _ => Ok(Arc::clone(e)),
    }
}

/// A boolean literal, native or in the narrow integer encoding.
fn literal_bool(e: &Expr) -> Option<bool> {
    match e {
        Expr::Literal {
            value,
            data_type: DataType::Boolean,
        } => match value {
            Scalar::Bool(b) => Some(*b),
            Scalar::I8(v) => Some(*v != FALSE_I8),
            _ => None,
        },
        _ => None,
    }
}

fn is_true(e: &ExprRef) -> bool {
    literal_bool(e) == Some(true)
}

fn is_false(e: &ExprRef) -> bool {
    literal_bool(e) == Some(false)
}
