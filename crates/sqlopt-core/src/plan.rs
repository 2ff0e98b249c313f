//! Logical plan representation consumed and produced by the rewrite rules.
//!
//! Nodes are immutable and shared through `PlanRef` (`Arc<LogicalPlan>`).
//! A node's schema is derived from its children and its own parameters on
//! demand. Operators defined outside this crate plug in through
//! [`UserDefinedPlan`] and travel as `LogicalPlan::Extension`.

use std::fmt;
use std::sync::Arc;

use crate::error::{Error, Result};
use crate::expr::ExprRef;
use crate::schema::{Field, Schema};

pub type PlanRef = Arc<LogicalPlan>;

/// A relational operator defined outside the core plan set.
pub trait UserDefinedPlan: fmt::Debug + Send + Sync {
    fn name(&self) -> &str;

    fn schema(&self) -> Schema;

    fn resolved(&self) -> bool;

    fn children(&self) -> Vec<&PlanRef>;

    fn expressions(&self) -> Vec<ExprRef> {
        Vec::new()
    }

    fn with_new_children(&self, children: Vec<PlanRef>) -> Result<Arc<dyn UserDefinedPlan>>;

    fn with_new_expressions(&self, exprs: Vec<ExprRef>) -> Result<Arc<dyn UserDefinedPlan>>;
}

#[derive(Debug, Clone)]
pub struct ExtensionNode(pub Arc<dyn UserDefinedPlan>);

impl PartialEq for ExtensionNode {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
            || (self.0.name() == other.0.name()
                && self.0.schema() == other.0.schema()
                && self.0.children() == other.0.children()
                && self.0.expressions() == other.0.expressions())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortOrder {
    Ascending,
    Descending,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SortField {
    pub expr: ExprRef,
    pub order: SortOrder,
    pub nulls_first: bool,
}

impl SortField {
    pub fn asc(expr: ExprRef) -> Self {
        Self {
            expr,
            order: SortOrder::Ascending,
            nulls_first: true,
        }
    }

    pub fn desc(expr: ExprRef) -> Self {
        Self {
            expr,
            order: SortOrder::Descending,
            nulls_first: false,
        }
    }
}

/// Relational operators of the logical plan.
#[derive(Debug, Clone, PartialEq)]
pub enum LogicalPlan {
    TableScan {
        table: String,
        schema: Schema,
    },
    /// A table reference the binder has not looked up yet.
    UnresolvedTable {
        name: String,
    },
    Project {
        exprs: Vec<ExprRef>,
        input: PlanRef,
    },
    Filter {
        predicate: ExprRef,
        input: PlanRef,
    },
    InnerJoin {
        left: PlanRef,
        right: PlanRef,
        condition: ExprRef,
    },
    CrossJoin {
        left: PlanRef,
        right: PlanRef,
    },
    Distinct {
        input: PlanRef,
    },
    /// Deduplicates input already ordered on the distinct columns by comparing
    /// each row with its predecessor only.
    OrderedDistinct {
        input: PlanRef,
    },
    Sort {
        fields: Vec<SortField>,
        input: PlanRef,
    },
    Limit {
        limit: u64,
        input: PlanRef,
    },
    /// Produces no rows. Keeps the schema of the subtree it replaced.
    EmptyTable {
        schema: Schema,
    },
    Extension(ExtensionNode),
}

impl LogicalPlan {
    pub fn table_scan(table: impl Into<String>, fields: Vec<Field>) -> PlanRef {
        let table = table.into();
        let fields = fields
            .into_iter()
            .map(|f| f.with_source(table.clone()))
            .collect();
        Arc::new(LogicalPlan::TableScan {
            table,
            schema: Schema::new(fields),
        })
    }

    pub fn project(exprs: Vec<ExprRef>, input: PlanRef) -> PlanRef {
        Arc::new(LogicalPlan::Project { exprs, input })
    }

    pub fn filter(predicate: ExprRef, input: PlanRef) -> PlanRef {
        Arc::new(LogicalPlan::Filter { predicate, input })
    }

    pub fn inner_join(left: PlanRef, right: PlanRef, condition: ExprRef) -> PlanRef {
        Arc::new(LogicalPlan::InnerJoin {
            left,
            right,
            condition,
        })
    }

    pub fn cross_join(left: PlanRef, right: PlanRef) -> PlanRef {
        Arc::new(LogicalPlan::CrossJoin { left, right })
    }

    pub fn distinct(input: PlanRef) -> PlanRef {
        Arc::new(LogicalPlan::Distinct { input })
    }

    pub fn ordered_distinct(input: PlanRef) -> PlanRef {
        Arc::new(LogicalPlan::OrderedDistinct { input })
    }

    pub fn sort(fields: Vec<SortField>, input: PlanRef) -> PlanRef {
        Arc::new(LogicalPlan::Sort { fields, input })
    }

    pub fn limit(limit: u64, input: PlanRef) -> PlanRef {
        Arc::new(LogicalPlan::Limit { limit, input })
    }

    pub fn empty_table(schema: Schema) -> PlanRef {
        Arc::new(LogicalPlan::EmptyTable { schema })
    }

    pub fn extension(node: Arc<dyn UserDefinedPlan>) -> PlanRef {
        Arc::new(LogicalPlan::Extension(ExtensionNode(node)))
    }

    /// Stable operator name, used in logs and plan display.
    pub fn name(&self) -> &str {
        use LogicalPlan::*;
        match self {
            TableScan { .. } => "TableScan",
            UnresolvedTable { .. } => "UnresolvedTable",
            Project { .. } => "Project",
            Filter { .. } => "Filter",
            InnerJoin { .. } => "InnerJoin",
            CrossJoin { .. } => "CrossJoin",
            Distinct { .. } => "Distinct",
            OrderedDistinct { .. } => "OrderedDistinct",
            Sort { .. } => "Sort",
            Limit { .. } => "Limit",
            EmptyTable { .. } => "EmptyTable",
            Extension(ext) => ext.0.name(),
        }
    }

    /// Output columns of this node.
    pub fn schema(&self) -> Schema {
        use LogicalPlan::*;
        match self {
            TableScan { schema, .. } | EmptyTable { schema } => schema.clone(),
            UnresolvedTable { .. } => Schema::empty(),
            Project { exprs, .. } => Schema::new(
                exprs
                    .iter()
                    .map(|e| Field::new(e.name(), e.data_type(), e.nullable()).with_source(e.source()))
                    .collect(),
            ),
            Filter { input, .. }
            | Distinct { input }
            | OrderedDistinct { input }
            | Sort { input, .. }
            | Limit { input, .. } => input.schema(),
            InnerJoin { left, right, .. } | CrossJoin { left, right } => left.schema().join(&right.schema()),
            Extension(ext) => ext.0.schema(),
        }
    }

    /// True once every table and column reference below is bound.
    pub fn resolved(&self) -> bool {
        match self {
            LogicalPlan::UnresolvedTable { .. } => false,
            LogicalPlan::Extension(ext) => ext.0.resolved(),
            other => {
                other.children().iter().all(|c| c.resolved())
                    && other.expressions().iter().all(|e| e.resolved())
            }
        }
    }

    pub fn children(&self) -> Vec<&PlanRef> {
        use LogicalPlan::*;
        match self {
            TableScan { .. } | UnresolvedTable { .. } | EmptyTable { .. } => vec![],
            Project { input, .. }
            | Filter { input, .. }
            | Distinct { input }
            | OrderedDistinct { input }
            | Sort { input, .. }
            | Limit { input, .. } => vec![input],
            InnerJoin { left, right, .. } | CrossJoin { left, right } => vec![left, right],
            Extension(ext) => ext.0.children(),
        }
    }

    /// Rebuild this node over `children`, keeping its own parameters.
    pub fn with_new_children(&self, children: Vec<PlanRef>) -> Result<LogicalPlan> {
        use LogicalPlan::*;
        let expected = self.children().len();
        if children.len() != expected {
            return Err(Error::Invariant(format!(
                "{}: expected {expected} children, got {}",
                self.name(),
                children.len()
            )));
        }
        if let Extension(ext) = self {
            return Ok(Extension(ExtensionNode(ext.0.with_new_children(children)?)));
        }
        let mut it = children.into_iter();
        let mut next = || it.next().ok_or_else(|| Error::Invariant("child iterator exhausted".into()));
        let plan = match self {
            TableScan { .. } | UnresolvedTable { .. } | EmptyTable { .. } | Extension(_) => self.clone(),
            Project { exprs, .. } => Project {
                exprs: exprs.clone(),
                input: next()?,
            },
            Filter { predicate, .. } => Filter {
                predicate: Arc::clone(predicate),
                input: next()?,
            },
            InnerJoin { condition, .. } => InnerJoin {
                left: next()?,
                right: next()?,
                condition: Arc::clone(condition),
            },
            CrossJoin { .. } => CrossJoin {
                left: next()?,
                right: next()?,
            },
            Distinct { .. } => Distinct { input: next()? },
            OrderedDistinct { .. } => OrderedDistinct { input: next()? },
            Sort { fields, .. } => Sort {
                fields: fields.clone(),
                input: next()?,
            },
            Limit { limit, .. } => Limit {
                limit: *limit,
                input: next()?,
            },
        };
        Ok(plan)
    }

    /// Expressions owned directly by this node (not by its children).
    pub fn expressions(&self) -> Vec<ExprRef> {
        use LogicalPlan::*;
        match self {
            Project { exprs, .. } => exprs.clone(),
            Filter { predicate, .. } => vec![Arc::clone(predicate)],
            InnerJoin { condition, .. } => vec![Arc::clone(condition)],
            Sort { fields, .. } => fields.iter().map(|f| Arc::clone(&f.expr)).collect(),
            Extension(ext) => ext.0.expressions(),
            _ => vec![],
        }
    }

    /// Rebuild this node with `exprs` in place of `expressions()`.
    pub fn with_new_expressions(&self, exprs: Vec<ExprRef>) -> Result<LogicalPlan> {
        use LogicalPlan::*;
        let expected = self.expressions().len();
        if exprs.len() != expected {
            return Err(Error::Invariant(format!(
                "{}: expected {expected} expressions, got {}",
                self.name(),
                exprs.len()
            )));
        }
        let plan = match self {
            Project { input, .. } => Project {
                exprs,
                input: Arc::clone(input),
            },
            Filter { input, .. } => Filter {
                predicate: first(exprs)?,
                input: Arc::clone(input),
            },
            InnerJoin { left, right, .. } => InnerJoin {
                left: Arc::clone(left),
                right: Arc::clone(right),
                condition: first(exprs)?,
            },
            Sort { fields, input } => Sort {
                fields: fields
                    .iter()
                    .zip(exprs)
                    .map(|(f, expr)| SortField {
                        expr,
                        order: f.order,
                        nulls_first: f.nulls_first,
                    })
                    .collect(),
                input: Arc::clone(input),
            },
            Extension(ext) => Extension(ExtensionNode(ext.0.with_new_expressions(exprs)?)),
            other => other.clone(),
        };
        Ok(plan)
    }

    fn fmt_node(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        use LogicalPlan::*;
        match self {
            TableScan { table, .. } => write!(f, "TableScan: {table}"),
            UnresolvedTable { name } => write!(f, "UnresolvedTable: {name}"),
            Project { exprs, .. } => {
                let list: Vec<String> = exprs.iter().map(|e| e.to_string()).collect();
                write!(f, "Project: {}", list.join(", "))
            }
            Filter { predicate, .. } => write!(f, "Filter: {predicate}"),
            InnerJoin { condition, .. } => write!(f, "InnerJoin: {condition}"),
            Sort { fields, .. } => {
                let list: Vec<String> = fields
                    .iter()
                    .map(|s| {
                        let dir = match s.order {
                            SortOrder::Ascending => "ASC",
                            SortOrder::Descending => "DESC",
                        };
                        format!("{} {dir}", s.expr)
                    })
                    .collect();
                write!(f, "Sort: {}", list.join(", "))
            }
            Limit { limit, .. } => write!(f, "Limit: {limit}"),
            other => write!(f, "{}", other.name()),
        }
    }

    fn fmt_indent(&self, f: &mut fmt::Formatter<'_>, depth: usize) -> fmt::Result {
        if depth > 0 {
            writeln!(f)?;
        }
        write!(f, "{:width$}", "", width = depth * 2)?;
        self.fmt_node(f)?;
        for child in self.children() {
            child.fmt_indent(f, depth + 1)?;
        }
        Ok(())
    }
}

fn first(exprs: Vec<ExprRef>) -> Result<ExprRef> {
    exprs
        .into_iter()
        .next()
        .ok_or_else(|| Error::Invariant("missing expression".into()))
}

/// Indented tree, one operator per line, children two spaces deeper.
impl fmt::Display for LogicalPlan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.fmt_indent(f, 0)
    }
}
