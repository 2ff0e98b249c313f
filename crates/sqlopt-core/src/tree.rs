//! Generic traversal over plan and expression trees.
//!
//! Rewrites are post-order: children first, then the node itself. A parent is
//! rebuilt only when at least one child came back as a different `Arc`, so a
//! rewrite that changes nothing returns the very same root and callers can
//! test for change with `Arc::ptr_eq`.
//!
//! Inspection is pre-order depth-first; a visitor returning `false` stops the
//! descent below the node it was called on.

use std::sync::Arc;

use crate::error::Result;
use crate::expr::ExprRef;
use crate::plan::PlanRef;

/// Rewrite every plan node bottom-up with `f`.
pub fn transform_up<F>(plan: &PlanRef, f: &mut F) -> Result<PlanRef>
where
    F: FnMut(&PlanRef) -> Result<PlanRef>,
{
    let children = plan.children();
    let node = if children.is_empty() {
        Arc::clone(plan)
    } else {
        let mut changed = false;
        let mut rewritten = Vec::with_capacity(children.len());
        for child in children {
            let new_child = transform_up(child, f)?;
            changed |= !Arc::ptr_eq(child, &new_child);
            rewritten.push(new_child);
        }
        if changed {
            Arc::new(plan.with_new_children(rewritten)?)
        } else {
            Arc::clone(plan)
        }
    };
    f(&node)
}

/// Rewrite every expression node bottom-up with `f`.
pub fn transform_expr_up<F>(expr: &ExprRef, f: &mut F) -> Result<ExprRef>
where
    F: FnMut(&ExprRef) -> Result<ExprRef>,
{
    let children = expr.children();
    let node = if children.is_empty() {
        Arc::clone(expr)
    } else {
        let mut changed = false;
        let mut rewritten = Vec::with_capacity(children.len());
        for child in children {
            let new_child = transform_expr_up(child, f)?;
            changed |= !Arc::ptr_eq(child, &new_child);
            rewritten.push(new_child);
        }
        if changed {
            Arc::new(expr.with_new_children(rewritten)?)
        } else {
            Arc::clone(expr)
        }
    };
    f(&node)
}

/// Rewrite, bottom-up, every expression owned by every node of `plan`.
pub fn transform_expressions_up<F>(plan: &PlanRef, f: &mut F) -> Result<PlanRef>
where
    F: FnMut(&ExprRef) -> Result<ExprRef>,
{
    transform_up(plan, &mut |node: &PlanRef| {
        let exprs = node.expressions();
        if exprs.is_empty() {
            return Ok(Arc::clone(node));
        }
        let mut changed = false;
        let mut rewritten = Vec::with_capacity(exprs.len());
        for e in &exprs {
            let new_e = transform_expr_up(e, f)?;
            changed |= !Arc::ptr_eq(e, &new_e);
            rewritten.push(new_e);
        }
        if changed {
            Ok(Arc::new(node.with_new_expressions(rewritten)?))
        } else {
            Ok(Arc::clone(node))
        }
    })
}

/// Visit plan nodes depth-first, pre-order.
pub fn inspect<F>(plan: &PlanRef, f: &mut F)
where
    F: FnMut(&PlanRef) -> bool,
{
    if !f(plan) {
        return;
    }
    for child in plan.children() {
        inspect(child, f);
    }
}

/// Visit expression nodes depth-first, pre-order.
pub fn inspect_expr<F>(expr: &ExprRef, f: &mut F)
where
    F: FnMut(&ExprRef) -> bool,
{
    if !f(expr) {
        return;
    }
    for child in expr.children() {
        inspect_expr(child, f);
    }
}
