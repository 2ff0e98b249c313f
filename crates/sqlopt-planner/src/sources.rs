//! Source sets: the distinct table qualifiers a plan exposes or an expression
//! reads, in order of first occurrence.

use std::collections::HashSet;

use sqlopt_core::expr::{Expr, ExprRef};
use sqlopt_core::plan::LogicalPlan;
use sqlopt_core::tree::inspect_expr;

/// Qualifiers of the columns in `node`'s schema.
pub fn node_sources(node: &LogicalPlan) -> Vec<String> {
    let mut seen = HashSet::new();
    let mut result = Vec::new();
    for field in node.schema().fields {
        if seen.insert(field.source.clone()) {
            result.push(field.source);
        }
    }
    result
}

/// Qualifiers of every column reference inside `expr`.
pub fn expression_sources(expr: &ExprRef) -> Vec<String> {
    let mut seen = HashSet::new();
    let mut result = Vec::new();
    inspect_expr(expr, &mut |e: &ExprRef| {
        if let Expr::Column(c) = e.as_ref() {
            if seen.insert(c.table.clone()) {
                result.push(c.table.clone());
            }
        }
        true
    });
    result
}

/// Every source in `needle` is present in `haystack`. Vacuously true for an
/// empty needle.
pub fn contains_sources(haystack: &[String], needle: &[String]) -> bool {
    needle.iter().all(|s| haystack.contains(s))
}
