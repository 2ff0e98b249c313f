//! Shared fixtures: two small tables and columns resolved against them.

#![allow(dead_code)]

use std::sync::Arc;

use sqlopt_core::expr::{col, ExprRef};
use sqlopt_core::plan::{LogicalPlan, PlanRef};
use sqlopt_core::schema::{DataType, Field};
use sqlopt_planner::{AnalyzerState, OptimizerContext, RuleFn, Scope};

/// `t1(a BIGINT, b BIGINT)`
pub fn t1() -> PlanRef {
    LogicalPlan::table_scan(
        "t1",
        vec![
            Field::new("a", DataType::Int64, false),
            Field::new("b", DataType::Int64, false),
        ],
    )
}

/// `t2(c BIGINT, d BIGINT NULL)`
pub fn t2() -> PlanRef {
    LogicalPlan::table_scan(
        "t2",
        vec![
            Field::new("c", DataType::Int64, false),
            Field::new("d", DataType::Int64, true),
        ],
    )
}

/// Column of `t1` or `t2` at its position in a single-table scan.
pub fn column(table: &str, name: &str) -> ExprRef {
    let index = match name {
        "a" | "c" => 0,
        _ => 1,
    };
    at(index, table, name)
}

/// Column at `index` in `t1 ++ t2`, as a join condition sees it.
pub fn join_column(table: &str, name: &str) -> ExprRef {
    let Some(index) = ["a", "b", "c", "d"].iter().position(|n| *n == name) else {
        panic!("no column {name} in fixtures");
    };
    at(index, table, name)
}

fn at(index: usize, table: &str, name: &str) -> ExprRef {
    col(index, table, name, DataType::Int64, name == "d")
}

pub fn apply(rule: RuleFn, plan: &PlanRef) -> PlanRef {
    let mut state = AnalyzerState::default();
    rule(&OptimizerContext::default(), &mut state, plan, &Scope::new()).expect("rule failed")
}

/// Apply `rule` twice and assert the second run changes nothing.
pub fn assert_idempotent(rule: RuleFn, plan: &PlanRef) {
    let once = apply(rule, plan);
    let twice = apply(rule, &once);
    assert_eq!(once, twice, "second run changed the plan:\n{once}\n--\n{twice}");
}

pub fn same(a: &PlanRef, b: &PlanRef) -> bool {
    Arc::ptr_eq(a, b)
}
