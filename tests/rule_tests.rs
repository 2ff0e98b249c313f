//! Behaviour of each rule on the plans it is meant for, plus the properties
//! every rule must keep: a second run is a no-op and, projection erasure
//! aside, the root schema never changes.

mod common;

use std::sync::Arc;

use common::*;
use sqlopt_core::expr::{and, cast, eq, gt, is_null, lit, lit_bool, lt, or};
use sqlopt_core::plan::{LogicalPlan, PlanRef, SortField};
use sqlopt_core::schema::DataType;
use sqlopt_core::types::Scalar;
use sqlopt_planner::rules::{
    erase_projection, eval_filter, move_join_conditions_to_filter, optimize_distinct,
    remove_unnecessary_converts,
};
use sqlopt_planner::{default_rules, RuleFn};

fn schema_preserving_rules() -> Vec<RuleFn> {
    vec![
        optimize_distinct,
        move_join_conditions_to_filter,
        remove_unnecessary_converts,
        eval_filter,
    ]
}

/// A plan with something for every rule to do.
fn busy_plan() -> PlanRef {
    let cond = and(
        and(
            gt(cast(join_column("t1", "a"), DataType::Int64), lit(Scalar::I64(5))),
            lt(join_column("t2", "c"), lit(Scalar::I64(10))),
        ),
        eq(join_column("t1", "b"), join_column("t2", "d")),
    );
    let join = LogicalPlan::inner_join(t1(), t2(), cond);
    let filtered = LogicalPlan::filter(
        or(eq(lit(Scalar::I64(1)), lit(Scalar::I64(1))), is_null(join_column("t2", "d"))),
        join,
    );
    let passthrough = LogicalPlan::project(
        vec![
            join_column("t1", "a"),
            join_column("t1", "b"),
            join_column("t2", "c"),
            join_column("t2", "d"),
        ],
        filtered,
    );
    let sorted = LogicalPlan::sort(vec![SortField::asc(join_column("t1", "a"))], passthrough);
    LogicalPlan::distinct(sorted)
}

#[test]
fn projection_over_identical_columns_is_erased() {
    let input = t1();
    let plan = LogicalPlan::project(vec![column("t1", "a"), column("t1", "b")], Arc::clone(&input));
    assert!(same(&apply(erase_projection, &plan), &input));
}

#[test]
fn reordering_projection_is_kept() {
    let plan = LogicalPlan::project(vec![column("t1", "b"), column("t1", "a")], t1());
    assert!(same(&apply(erase_projection, &plan), &plan));
}

#[test]
fn distinct_over_sort_on_output_column_becomes_ordered() {
    let sorted = LogicalPlan::sort(vec![SortField::asc(column("t1", "a"))], t1());
    let plan = LogicalPlan::distinct(Arc::clone(&sorted));
    assert_eq!(apply(optimize_distinct, &plan), LogicalPlan::ordered_distinct(sorted));
}

#[test]
fn distinct_over_sort_on_dropped_column_is_kept() {
    let sorted = LogicalPlan::sort(vec![SortField::asc(column("t1", "a"))], t1());
    let plan = LogicalPlan::distinct(LogicalPlan::project(vec![column("t1", "b")], sorted));
    assert!(same(&apply(optimize_distinct, &plan), &plan));
}

#[test]
fn join_conditions_split_by_side() {
    let cond = and(
        and(
            gt(join_column("t1", "a"), lit(Scalar::I64(5))),
            lt(join_column("t2", "c"), lit(Scalar::I64(10))),
        ),
        eq(join_column("t1", "b"), join_column("t2", "d")),
    );
    let plan = LogicalPlan::inner_join(t1(), t2(), cond);
    let expected = LogicalPlan::inner_join(
        LogicalPlan::filter(gt(column("t1", "a"), lit(Scalar::I64(5))), t1()),
        LogicalPlan::filter(lt(column("t2", "c"), lit(Scalar::I64(10))), t2()),
        eq(join_column("t1", "b"), join_column("t2", "d")),
    );
    assert_eq!(apply(move_join_conditions_to_filter, &plan), expected);
}

#[test]
fn join_without_cross_side_condition_becomes_cross_join() {
    let cond = and(
        gt(join_column("t1", "a"), lit(Scalar::I64(5))),
        lt(join_column("t2", "c"), lit(Scalar::I64(10))),
    );
    let plan = LogicalPlan::inner_join(t1(), t2(), cond);
    let expected = LogicalPlan::cross_join(
        LogicalPlan::filter(gt(column("t1", "a"), lit(Scalar::I64(5))), t1()),
        LogicalPlan::filter(lt(column("t2", "c"), lit(Scalar::I64(10))), t2()),
    );
    assert_eq!(apply(move_join_conditions_to_filter, &plan), expected);
}

#[test]
fn same_type_cast_is_dropped() {
    let plan = LogicalPlan::filter(
        gt(cast(column("t1", "a"), DataType::Int64), lit(Scalar::I64(0))),
        t1(),
    );
    let expected = LogicalPlan::filter(gt(column("t1", "a"), lit(Scalar::I64(0))), t1());
    assert_eq!(apply(remove_unnecessary_converts, &plan), expected);
}

#[test]
fn converting_cast_is_kept() {
    let plan = LogicalPlan::filter(
        eq(cast(column("t1", "a"), DataType::Utf8), lit(Scalar::Str("1".into()))),
        t1(),
    );
    assert!(same(&apply(remove_unnecessary_converts, &plan), &plan));
}

#[test]
fn filter_folding_examples() {
    let never = LogicalPlan::filter(eq(lit(Scalar::I64(1)), lit(Scalar::I64(2))), t2());
    assert_eq!(apply(eval_filter, &never), LogicalPlan::empty_table(t2().schema()));

    let input = t2();
    let always = LogicalPlan::filter(
        or(eq(lit(Scalar::I64(1)), lit(Scalar::I64(1))), is_null(column("t2", "d"))),
        Arc::clone(&input),
    );
    assert!(same(&apply(eval_filter, &always), &input));

    let short = LogicalPlan::filter(and(lit_bool(false), gt(column("t2", "c"), lit(Scalar::I64(0)))), t2());
    assert!(matches!(apply(eval_filter, &short).as_ref(), LogicalPlan::EmptyTable { .. }));
}

#[test]
fn every_rule_is_idempotent() {
    let plan = busy_plan();
    for rule in default_rules() {
        common::assert_idempotent(rule.apply, &plan);
    }
}

#[test]
fn rules_keep_the_root_schema() {
    let plan = busy_plan();
    for rule in schema_preserving_rules() {
        let out = apply(rule, &plan);
        assert_eq!(out.schema(), plan.schema(), "\n{out}");
    }
}

#[test]
fn default_pipeline_on_busy_plan() {
    let out = sqlopt_planner::optimize(&busy_plan()).unwrap();

    let left = LogicalPlan::filter(gt(column("t1", "a"), lit(Scalar::I64(5))), t1());
    let right = LogicalPlan::filter(lt(column("t2", "c"), lit(Scalar::I64(10))), t2());
    let join = LogicalPlan::inner_join(left, right, eq(join_column("t1", "b"), join_column("t2", "d")));
    let sorted = LogicalPlan::sort(vec![SortField::asc(join_column("t1", "a"))], join);
    let expected = LogicalPlan::ordered_distinct(sorted);

    assert_eq!(out, expected, "\n{out}");
    assert_eq!(out.schema(), busy_plan().schema());
}

#[test]
fn unresolved_plans_pass_through_every_rule() {
    let plan = LogicalPlan::distinct(LogicalPlan::filter(
        eq(lit(Scalar::I64(1)), lit(Scalar::I64(2))),
        Arc::new(LogicalPlan::UnresolvedTable { name: "t9".into() }),
    ));
    for rule in default_rules() {
        assert!(same(&apply(rule.apply, &plan), &plan), "{} touched the plan", rule.name);
    }
}
