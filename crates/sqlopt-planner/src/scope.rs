//! Enclosing query scope and field index re-resolution.
//!
//! A correlated subquery sees the rows of the queries around it. Those outer
//! rows come first in the row the expression is evaluated against, so field
//! indexes are resolved against the scope schema followed by the node's own.

use std::sync::Arc;

use sqlopt_core::expr::{ColumnRef, Expr, ExprRef};
use sqlopt_core::plan::PlanRef;
use sqlopt_core::schema::Schema;
use sqlopt_core::tree::transform_expr_up;
use sqlopt_core::{Error, Result};

#[derive(Debug, Clone, Default)]
pub struct Scope {
    // innermost first
    nodes: Vec<PlanRef>,
}

impl Scope {
    pub fn new() -> Self {
        Self::default()
    }

    /// A new scope with `node` as the innermost enclosing query.
    pub fn push(&self, node: PlanRef) -> Scope {
        let mut nodes = Vec::with_capacity(self.nodes.len() + 1);
        nodes.push(node);
        nodes.extend(self.nodes.iter().cloned());
        Scope { nodes }
    }

    pub fn schema(&self) -> Schema {
        Schema::new(self.nodes.iter().flat_map(|n| n.schema().fields).collect())
    }
}

/// Point every column reference in `expr` at its position in `schema`
/// (preceded by the scope schema). A reference with no matching column is a
/// `FieldMissing` error.
pub fn fix_field_indexes(scope: &Scope, schema: &Schema, expr: &ExprRef) -> Result<ExprRef> {
    let full = scope.schema().join(schema);
    transform_expr_up(expr, &mut |e: &ExprRef| {
        let Expr::Column(c) = e.as_ref() else {
            return Ok(Arc::clone(e));
        };
        match full.index_of_qualified(&c.name, &c.table) {
            Some(index) if index == c.index => Ok(Arc::clone(e)),
            Some(index) => Ok(Arc::new(Expr::Column(ColumnRef {
                index,
                ..c.clone()
            }))),
            None => Err(Error::FieldMissing {
                table: c.table.clone(),
                name: c.name.clone(),
            }),
        }
    })
}
