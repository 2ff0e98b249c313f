//! Push single-side join predicates below the join.
//!
//! Each conjunct of an inner join condition that only reads columns of one
//! side becomes a `Filter` over that side, so each input shrinks before the
//! join runs. When nothing is left for the join itself, the join becomes a
//! `CrossJoin`: the pushed filters already express its semantics.

use std::sync::Arc;

use sqlopt_core::expr::{join_and, split_conjunction, ExprRef};
use sqlopt_core::plan::{LogicalPlan, PlanRef};
use sqlopt_core::tree::transform_up;
use sqlopt_core::Result;

use crate::context::OptimizerContext;
use crate::scope::{fix_field_indexes, Scope};
use crate::sources::{contains_sources, expression_sources, node_sources};
use crate::state::AnalyzerState;

pub fn move_join_conditions_to_filter(
    ctx: &OptimizerContext,
    state: &mut AnalyzerState,
    plan: &PlanRef,
    scope: &Scope,
) -> Result<PlanRef> {
    let _span = ctx.span("move_join_conditions_to_filter");

    if !plan.resolved() {
        return Ok(Arc::clone(plan));
    }

    transform_up(plan, &mut |node: &PlanRef| {
        let LogicalPlan::InnerJoin {
            left,
            right,
            condition,
        } = node.as_ref()
        else {
            return Ok(Arc::clone(node));
        };

        let left_sources = node_sources(left);
        let right_sources = node_sources(right);
        let mut left_filters = Vec::new();
        let mut right_filters = Vec::new();
        let mut cond_filters = Vec::new();

        for e in split_conjunction(condition) {
            let sources = expression_sources(&e);

            // A conjunct without any column reference fits both sides and is
            // pushed to both.
            let to_left = contains_sources(&left_sources, &sources);
            let to_right = contains_sources(&right_sources, &sources);
            if to_left {
                left_filters.push(Arc::clone(&e));
            }
            if to_right {
                right_filters.push(Arc::clone(&e));
            }
            if !to_left && !to_right {
                cond_filters.push(e);
            }
        }

        if left_filters.is_empty() && right_filters.is_empty() {
            return Ok(Arc::clone(node));
        }

        let left = push_filters(scope, left, left_filters)?;
        let right = push_filters(scope, right, right_filters)?;

        match join_and(cond_filters) {
            Some(condition) => {
                state.log("join conditions moved to filters");
                Ok(LogicalPlan::inner_join(left, right, condition))
            }
            None => {
                state.log("join converted to cross join");
                Ok(LogicalPlan::cross_join(left, right))
            }
        }
    })
}

/// Wrap `child` in a filter over `filters`, re-resolved against the child's
/// schema. No filters leaves the child as is.
fn push_filters(scope: &Scope, child: &PlanRef, filters: Vec<ExprRef>) -> Result<PlanRef> {
    let Some(predicate) = join_and(filters) else {
        return Ok(Arc::clone(child));
    };
    let predicate = fix_field_indexes(scope, &child.schema(), &predicate)?;
    Ok(LogicalPlan::filter(predicate, Arc::clone(child)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use sqlopt_core::expr::{and, col, eq, gt, lit, lt};
    use sqlopt_core::schema::{DataType, Field};
    use sqlopt_core::types::Scalar;
    use sqlopt_core::Error;

    fn t1() -> PlanRef {
        LogicalPlan::table_scan(
            "t1",
            vec![
                Field::new("a", DataType::Int64, false),
                Field::new("b", DataType::Int64, false),
            ],
        )
    }

    fn t2() -> PlanRef {
        LogicalPlan::table_scan(
            "t2",
            vec![
                Field::new("c", DataType::Int64, false),
                Field::new("d", DataType::Int64, false),
            ],
        )
    }

    // Indexes as resolved against the join schema t1(a, b) ++ t2(c, d).
    fn join_col(index: usize, table: &str, name: &str) -> ExprRef {
        col(index, table, name, DataType::Int64, false)
    }

    fn run(plan: &PlanRef) -> Result<PlanRef> {
        let mut state = AnalyzerState::default();
        move_join_conditions_to_filter(&OptimizerContext::default(), &mut state, plan, &Scope::new())
    }

    #[test]
    fn single_side_conjuncts_move_below_join() {
        let cond = and(
            and(
                gt(join_col(0, "t1", "a"), lit(Scalar::I64(5))),
                lt(join_col(2, "t2", "c"), lit(Scalar::I64(10))),
            ),
            eq(join_col(1, "t1", "b"), join_col(3, "t2", "d")),
        );
        let plan = LogicalPlan::inner_join(t1(), t2(), cond);

        let expected = LogicalPlan::inner_join(
            LogicalPlan::filter(gt(join_col(0, "t1", "a"), lit(Scalar::I64(5))), t1()),
            LogicalPlan::filter(lt(join_col(0, "t2", "c"), lit(Scalar::I64(10))), t2()),
            eq(join_col(1, "t1", "b"), join_col(3, "t2", "d")),
        );
        let out = run(&plan).unwrap();
        assert_eq!(out, expected, "\n{out}");
        assert_eq!(out.schema(), plan.schema());
    }

    #[test]
    fn empty_condition_degenerates_to_cross_join() {
        let cond = and(
            gt(join_col(0, "t1", "a"), lit(Scalar::I64(5))),
            lt(join_col(3, "t2", "d"), lit(Scalar::I64(10))),
        );
        let plan = LogicalPlan::inner_join(t1(), t2(), cond);

        let expected = LogicalPlan::cross_join(
            LogicalPlan::filter(gt(join_col(0, "t1", "a"), lit(Scalar::I64(5))), t1()),
            LogicalPlan::filter(lt(join_col(1, "t2", "d"), lit(Scalar::I64(10))), t2()),
        );
        assert_eq!(run(&plan).unwrap(), expected);
    }

    #[test]
    fn cross_side_condition_is_untouched() {
        let plan = LogicalPlan::inner_join(t1(), t2(), eq(join_col(0, "t1", "a"), join_col(2, "t2", "c")));
        let out = run(&plan).unwrap();
        assert!(Arc::ptr_eq(&out, &plan));
    }

    #[test]
    fn constant_conjunct_goes_to_both_sides() {
        let truth = eq(lit(Scalar::I64(1)), lit(Scalar::I64(1)));
        let plan = LogicalPlan::inner_join(t1(), t2(), Arc::clone(&truth));
        let expected = LogicalPlan::cross_join(
            LogicalPlan::filter(Arc::clone(&truth), t1()),
            LogicalPlan::filter(truth, t2()),
        );
        assert_eq!(run(&plan).unwrap(), expected);
    }

    #[test]
    fn unknown_source_stays_in_condition() {
        // `t3` exists on neither side.
        let plan = LogicalPlan::inner_join(t1(), t2(), gt(join_col(4, "t3", "e"), lit(Scalar::I64(0))));
        let out = run(&plan).unwrap();
        assert!(Arc::ptr_eq(&out, &plan));
    }

    #[test]
    fn reindex_failure_aborts_the_rewrite() {
        // Qualifier says t1 but the column does not exist in t1's schema.
        let plan = LogicalPlan::inner_join(
            t1(),
            t2(),
            and(
                gt(join_col(0, "t1", "zz"), lit(Scalar::I64(5))),
                eq(join_col(1, "t1", "b"), join_col(3, "t2", "d")),
            ),
        );
        let err = run(&plan).unwrap_err();
        assert!(matches!(err, Error::FieldMissing { ref name, .. } if name == "zz"));
    }

    #[test]
    fn nested_joins_are_rewritten_bottom_up() {
        let inner = LogicalPlan::inner_join(t1(), t2(), gt(join_col(2, "t2", "c"), lit(Scalar::I64(1))));
        let t3 = LogicalPlan::table_scan("t3", vec![Field::new("e", DataType::Int64, false)]);
        let plan = LogicalPlan::inner_join(
            inner,
            Arc::clone(&t3),
            eq(join_col(0, "t1", "a"), join_col(4, "t3", "e")),
        );

        let expected = LogicalPlan::inner_join(
            LogicalPlan::cross_join(
                t1(),
                LogicalPlan::filter(gt(join_col(0, "t2", "c"), lit(Scalar::I64(1))), t2()),
            ),
            t3,
            eq(join_col(0, "t1", "a"), join_col(4, "t3", "e")),
        );
        assert_eq!(run(&plan).unwrap(), expected);
    }
}
