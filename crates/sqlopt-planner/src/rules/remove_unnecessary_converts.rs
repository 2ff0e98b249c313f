//! Drop casts whose input already has the target type.
//!
//! A projection names an unaliased output column after its expression, so a
//! top-level projection expression that loses a cast is aliased back to its
//! old name to keep the projection's schema intact.

use std::sync::Arc;

use sqlopt_core::expr::{alias, Expr, ExprRef};
use sqlopt_core::plan::{LogicalPlan, PlanRef};
use sqlopt_core::tree::{transform_expr_up, transform_up};
use sqlopt_core::Result;

use crate::context::OptimizerContext;
use crate::scope::Scope;
use crate::state::AnalyzerState;

pub fn remove_unnecessary_converts(
    ctx: &OptimizerContext,
    state: &mut AnalyzerState,
    plan: &PlanRef,
    _scope: &Scope,
) -> Result<PlanRef> {
    let _span = ctx.span("remove_unnecessary_converts");

    if !plan.resolved() {
        return Ok(Arc::clone(plan));
    }

    transform_up(plan, &mut |node: &PlanRef| {
        let exprs = node.expressions();
        if exprs.is_empty() {
            return Ok(Arc::clone(node));
        }
        let is_project = matches!(node.as_ref(), LogicalPlan::Project { .. });

        let mut changed = false;
        let mut rewritten = Vec::with_capacity(exprs.len());
        for e in &exprs {
            let mut new_e = transform_expr_up(e, &mut |e: &ExprRef| match e.as_ref() {
                Expr::Cast { expr, data_type } if expr.data_type() == *data_type => {
                    state.log(format!("removed no-op cast of {expr} to {data_type}"));
                    Ok(Arc::clone(expr))
                }
                _ => Ok(Arc::clone(e)),
            })?;
            if !Arc::ptr_eq(e, &new_e) {
                changed = true;
                if is_project && new_e.name() != e.name() {
                    new_e = alias(new_e, e.name());
                }
            }
            rewritten.push(new_e);
        }

        if changed {
            Ok(Arc::new(node.with_new_expressions(rewritten)?))
        } else {
            Ok(Arc::clone(node))
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use sqlopt_core::expr::{cast, col, eq, lit};
    use sqlopt_core::plan::SortField;
    use sqlopt_core::schema::{DataType, Field};
    use sqlopt_core::types::Scalar;

    fn t1() -> PlanRef {
        LogicalPlan::table_scan(
            "t1",
            vec![
                Field::new("x", DataType::Int32, false),
                Field::new("s", DataType::Utf8, false),
            ],
        )
    }

    fn x() -> ExprRef {
        col(0, "t1", "x", DataType::Int32, false)
    }

    fn run(plan: &PlanRef) -> PlanRef {
        let mut state = AnalyzerState::default();
        remove_unnecessary_converts(&OptimizerContext::default(), &mut state, plan, &Scope::new()).unwrap()
    }

    #[test]
    fn same_type_cast_is_removed() {
        let plan = LogicalPlan::filter(eq(cast(x(), DataType::Int32), lit(Scalar::I32(3))), t1());
        assert_eq!(run(&plan), LogicalPlan::filter(eq(x(), lit(Scalar::I32(3))), t1()));
    }

    #[test]
    fn projection_keeps_its_column_names() {
        let plan = LogicalPlan::project(vec![cast(x(), DataType::Int32)], t1());
        let out = run(&plan);
        assert_eq!(
            out,
            LogicalPlan::project(vec![alias(x(), "CAST(t1.x AS INT)")], t1())
        );
        assert_eq!(out.schema(), plan.schema());
        // nothing left to remove
        assert!(Arc::ptr_eq(&run(&out), &out));
    }

    #[test]
    fn widening_cast_is_kept() {
        let plan = LogicalPlan::project(vec![cast(x(), DataType::Utf8)], t1());
        assert!(Arc::ptr_eq(&run(&plan), &plan));
    }

    #[test]
    fn nested_casts_collapse_bottom_up() {
        // CAST(CAST(x AS INT) AS INT): the inner cast goes first, which makes
        // the outer one a no-op as well.
        let inner = cast(x(), DataType::Int32);
        let plan = LogicalPlan::filter(
            eq(cast(inner, DataType::Int32), lit(Scalar::I32(3))),
            t1(),
        );
        assert_eq!(run(&plan), LogicalPlan::filter(eq(x(), lit(Scalar::I32(3))), t1()));
    }

    #[test]
    fn casts_are_removed_in_every_node() {
        let plan = LogicalPlan::sort(
            vec![SortField::asc(cast(x(), DataType::Int32))],
            LogicalPlan::filter(eq(cast(x(), DataType::Int32), lit(Scalar::I32(1))), t1()),
        );
        let expected = LogicalPlan::sort(
            vec![SortField::asc(x())],
            LogicalPlan::filter(eq(x(), lit(Scalar::I32(1))), t1()),
        );
        let out = run(&plan);
        assert_eq!(out, expected);
        assert_eq!(out.schema(), plan.schema());
    }
}
