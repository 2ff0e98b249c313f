//! Scalar expression tree.
//!
//! Expressions are immutable and shared through `ExprRef` (`Arc<Expr>`), so a
//! rewrite can replace one node while every untouched sibling keeps its
//! identity. Functions defined outside this crate plug in via [`ScalarUdf`].

use std::fmt;
use std::sync::Arc;

use crate::error::{Error, Result};
use crate::schema::DataType;
use crate::types::{Row, Scalar};

pub type ExprRef = Arc<Expr>;

/// Evaluation environment handed to `Expr::eval`.
#[derive(Debug, Clone)]
pub struct EvalContext {
    /// MySQL returns NULL for `x / 0` and `x % 0` unless strict mode is on.
    pub division_by_zero_is_null: bool,
}

impl Default for EvalContext {
    fn default() -> Self {
        Self {
            division_by_zero_is_null: true,
        }
    }
}

/// A scalar function implemented outside the core expression set.
pub trait ScalarUdf: fmt::Debug + Send + Sync {
    fn name(&self) -> &str;

    fn return_type(&self, args: &[DataType]) -> DataType;

    /// Non-deterministic functions (`RAND()`, `NOW()`, ...) are never folded.
    fn is_deterministic(&self) -> bool {
        true
    }

    fn invoke(&self, args: &[Scalar]) -> Result<Scalar>;
}

#[derive(Debug, Clone)]
pub struct FunctionExpr {
    pub func: Arc<dyn ScalarUdf>,
    pub args: Vec<ExprRef>,
}

impl PartialEq for FunctionExpr {
    fn eq(&self, other: &Self) -> bool {
        self.func.name() == other.func.name() && self.args == other.args
    }
}

/// A resolved column reference. `index` is positional and only meaningful
/// against the schema it was resolved for.
#[derive(Debug, Clone, PartialEq)]
pub struct ColumnRef {
    pub index: usize,
    pub table: String,
    pub name: String,
    pub data_type: DataType,
    pub nullable: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompareOp {
    Eq,
    NotEq,
    Lt,
    LtEq,
    Gt,
    GtEq,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArithmeticOp {
    Plus,
    Minus,
    Multiply,
    Divide,
    Modulo,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IntervalUnit {
    Second,
    Minute,
    Hour,
    Day,
    Month,
    Year,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Literal {
        value: Scalar,
        data_type: DataType,
    },
    Column(ColumnRef),
    UnresolvedColumn {
        table: Option<String>,
        name: String,
    },
    Alias {
        expr: ExprRef,
        name: String,
    },
    And {
        left: ExprRef,
        right: ExprRef,
    },
    Or {
        left: ExprRef,
        right: ExprRef,
    },
    Not(ExprRef),
    IsNull(ExprRef),
    Compare {
        op: CompareOp,
        left: ExprRef,
        right: ExprRef,
    },
    Arithmetic {
        op: ArithmeticOp,
        left: ExprRef,
        right: ExprRef,
    },
    Cast {
        expr: ExprRef,
        data_type: DataType,
    },
    Tuple(Vec<ExprRef>),
    Interval {
        value: ExprRef,
        unit: IntervalUnit,
    },
    ScalarFunction(FunctionExpr),
}

impl Expr {
    /// Static result type.
    pub fn data_type(&self) -> DataType {
        use Expr::*;
        match self {
            Literal { data_type, .. } => data_type.clone(),
            Column(c) => c.data_type.clone(),
            UnresolvedColumn { .. } => DataType::Null,
            Alias { expr, .. } => expr.data_type(),
            And { .. } | Or { .. } | Not(_) | IsNull(_) | Compare { .. } => DataType::Boolean,
            Arithmetic { op, left, right } => {
                let (l, r) = (left.data_type(), right.data_type());
                if *op == ArithmeticOp::Divide
                    || (!l.is_integer() && l != DataType::Boolean)
                    || (!r.is_integer() && r != DataType::Boolean)
                {
                    DataType::Float64
                } else {
                    DataType::Int64
                }
            }
            Cast { data_type, .. } => data_type.clone(),
            Tuple(elems) if elems.len() == 1 => elems[0].data_type(),
            Tuple(elems) => DataType::Tuple(elems.iter().map(|e| e.data_type()).collect()),
            Interval { .. } => DataType::Interval,
            ScalarFunction(f) => {
                let args: Vec<DataType> = f.args.iter().map(|a| a.data_type()).collect();
                f.func.return_type(&args)
            }
        }
    }

    pub fn nullable(&self) -> bool {
        match self {
            Expr::Literal { value, .. } => value.is_null(),
            Expr::Column(c) => c.nullable,
            Expr::IsNull(_) => false,
            Expr::ScalarFunction(_) => true,
            other => other.children().iter().any(|c| c.nullable()),
        }
    }

    /// Name of the output column this expression produces in a projection.
    pub fn name(&self) -> String {
        match self {
            Expr::Column(c) => c.name.clone(),
            Expr::UnresolvedColumn { name, .. } => name.clone(),
            Expr::Alias { name, .. } => name.clone(),
            other => other.to_string(),
        }
    }

    /// Table qualifier of the output column, empty for computed values.
    pub fn source(&self) -> String {
        match self {
            Expr::Column(c) => c.table.clone(),
            _ => String::new(),
        }
    }

    /// All column references are bound.
    pub fn resolved(&self) -> bool {
        match self {
            Expr::UnresolvedColumn { .. } => false,
            other => other.children().iter().all(|c| c.resolved()),
        }
    }

    /// Computable without row input: no column references and nothing
    /// non-deterministic anywhere below this node.
    pub fn is_evaluable(&self) -> bool {
        match self {
            Expr::Column(_) | Expr::UnresolvedColumn { .. } => false,
            Expr::ScalarFunction(f) if !f.func.is_deterministic() => false,
            other => other.children().iter().all(|c| c.is_evaluable()),
        }
    }

    pub fn children(&self) -> Vec<&ExprRef> {
        use Expr::*;
        match self {
            Literal { .. } | Column(_) | UnresolvedColumn { .. } => vec![],
            Alias { expr, .. } | Cast { expr, .. } => vec![expr],
            Not(e) | IsNull(e) => vec![e],
            Interval { value, .. } => vec![value],
            And { left, right }
            | Or { left, right }
            | Compare { left, right, .. }
            | Arithmetic { left, right, .. } => vec![left, right],
            Tuple(elems) => elems.iter().collect(),
            ScalarFunction(f) => f.args.iter().collect(),
        }
    }

    /// Rebuild this node over `children`, which must match `children()` in
    /// count and order.
    pub fn with_new_children(&self, children: Vec<ExprRef>) -> Result<Expr> {
        use Expr::*;
        let expected = self.children().len();
        if children.len() != expected {
            return Err(Error::Invariant(format!(
                "{self}: expected {expected} children, got {}",
                children.len()
            )));
        }
        let mut it = children.into_iter();
        let mut next = || it.next().ok_or_else(|| Error::Invariant("child iterator exhausted".into()));
        let e = match self {
            Literal { .. } | Column(_) | UnresolvedColumn { .. } => self.clone(),
            Alias { name, .. } => Alias {
                expr: next()?,
                name: name.clone(),
            },
            Cast { data_type, .. } => Cast {
                expr: next()?,
                data_type: data_type.clone(),
            },
            Not(_) => Not(next()?),
            IsNull(_) => IsNull(next()?),
            Interval { unit, .. } => Interval {
                value: next()?,
                unit: *unit,
            },
            And { .. } => And {
                left: next()?,
                right: next()?,
            },
            Or { .. } => Or {
                left: next()?,
                right: next()?,
            },
            Compare { op, .. } => Compare {
                op: *op,
                left: next()?,
                right: next()?,
            },
            Arithmetic { op, .. } => Arithmetic {
                op: *op,
                left: next()?,
                right: next()?,
            },
            Tuple(_) => Tuple((0..expected).map(|_| next()).collect::<Result<_>>()?),
            ScalarFunction(f) => ScalarFunction(FunctionExpr {
                func: Arc::clone(&f.func),
                args: (0..expected).map(|_| next()).collect::<Result<_>>()?,
            }),
        };
        Ok(e)
    }

    /// Evaluate against `row`. Passing `None` is only valid for evaluable
    /// expressions.
    pub fn eval(&self, ctx: &EvalContext, row: Option<&Row>) -> Result<Scalar> {
        use Expr::*;
        match self {
            Literal { value, .. } => Ok(value.clone()),
            Column(c) => {
                let row = row.ok_or_else(|| {
                    Error::Eval(format!("column {}.{} evaluated without a row", c.table, c.name))
                })?;
                row.get(c.index).cloned().ok_or_else(|| {
                    Error::Eval(format!(
                        "column {}.{} index {} out of range for row of {}",
                        c.table,
                        c.name,
                        c.index,
                        row.len()
                    ))
                })
            }
            UnresolvedColumn { name, .. } => Err(Error::Eval(format!("unresolved column {name}"))),
            Alias { expr, .. } => expr.eval(ctx, row),
            And { left, right } => {
                let l = left.eval(ctx, row)?.truthy();
                if l == Some(false) {
                    return Ok(Scalar::Bool(false));
                }
                let r = right.eval(ctx, row)?.truthy();
                Ok(match (l, r) {
                    (_, Some(false)) => Scalar::Bool(false),
                    (Some(true), Some(true)) => Scalar::Bool(true),
                    _ => Scalar::Null,
                })
            }
            Or { left, right } => {
                let l = left.eval(ctx, row)?.truthy();
                if l == Some(true) {
                    return Ok(Scalar::Bool(true));
                }
                let r = right.eval(ctx, row)?.truthy();
                Ok(match (l, r) {
                    (_, Some(true)) => Scalar::Bool(true),
                    (Some(false), Some(false)) => Scalar::Bool(false),
                    _ => Scalar::Null,
                })
            }
            Not(e) => Ok(match e.eval(ctx, row)?.truthy() {
                Some(b) => Scalar::Bool(!b),
                None => Scalar::Null,
            }),
            IsNull(e) => Ok(Scalar::Bool(e.eval(ctx, row)?.is_null())),
            Compare { op, left, right } => {
                let l = left.eval(ctx, row)?;
                let r = right.eval(ctx, row)?;
                eval_compare(*op, &l, &r)
            }
            Arithmetic { op, left, right } => {
                let l = left.eval(ctx, row)?;
                let r = right.eval(ctx, row)?;
                eval_arithmetic(ctx, *op, &l, &r)
            }
            Cast { expr, data_type } => expr.eval(ctx, row)?.cast_to(data_type),
            Tuple(elems) if elems.len() == 1 => elems[0].eval(ctx, row),
            Tuple(elems) => Err(Error::Eval(format!(
                "tuple of {} elements cannot be evaluated as a scalar",
                elems.len()
            ))),
            Interval { .. } => Err(Error::Eval(
                "interval can only be evaluated as part of a date expression".into(),
            )),
            ScalarFunction(f) => {
                let args = f
                    .args
                    .iter()
                    .map(|a| a.eval(ctx, row))
                    .collect::<Result<Vec<_>>>()?;
                f.func.invoke(&args)
            }
        }
    }
}

fn eval_compare(op: CompareOp, l: &Scalar, r: &Scalar) -> Result<Scalar> {
    // Strings compared with numbers are coerced to numbers, as MySQL does.
    let (l, r) = match (l, r) {
        (Scalar::Str(_), other) | (other, Scalar::Str(_)) if other.as_f64().is_some() => (
            l.cast_to(&DataType::Float64).unwrap_or(Scalar::F64(0.0)),
            r.cast_to(&DataType::Float64).unwrap_or(Scalar::F64(0.0)),
        ),
        _ => (l.clone(), r.clone()),
    };
    let Some(ord) = l.compare(&r)? else {
        return Ok(Scalar::Null);
    };
    let b = match op {
        CompareOp::Eq => ord.is_eq(),
        CompareOp::NotEq => ord.is_ne(),
        CompareOp::Lt => ord.is_lt(),
        CompareOp::LtEq => ord.is_le(),
        CompareOp::Gt => ord.is_gt(),
        CompareOp::GtEq => ord.is_ge(),
    };
    Ok(Scalar::Bool(b))
}

fn eval_arithmetic(ctx: &EvalContext, op: ArithmeticOp, l: &Scalar, r: &Scalar) -> Result<Scalar> {
    use ArithmeticOp::*;
    if l.is_null() || r.is_null() {
        return Ok(Scalar::Null);
    }
    let division_by_zero = || {
        if ctx.division_by_zero_is_null {
            Ok(Scalar::Null)
        } else {
            Err(Error::Eval("division by zero".into()))
        }
    };
    let integral = |s: &Scalar| !matches!(s, Scalar::F32(_) | Scalar::F64(_) | Scalar::Str(_));

    if op != Divide && integral(l) && integral(r) {
        let (Some(a), Some(b)) = (l.as_i64(), r.as_i64()) else {
            return Err(Error::Eval(format!("cannot apply {op:?} to {l} and {r}")));
        };
        let v = match op {
            Plus => a.checked_add(b),
            Minus => a.checked_sub(b),
            Multiply => a.checked_mul(b),
            Modulo if b == 0 => return division_by_zero(),
            Modulo => a.checked_rem(b),
            // excluded above
            Divide => None,
        };
        return v
            .map(Scalar::I64)
            .ok_or_else(|| Error::Eval(format!("BIGINT value is out of range in {a} {op:?} {b}")));
    }

    let as_float = |s: &Scalar| -> Result<f64> {
        match s.cast_to(&DataType::Float64)? {
            Scalar::F64(v) => Ok(v),
            other => Err(Error::Eval(format!("cannot use {other} as a number"))),
        }
    };
    let (a, b) = (as_float(l)?, as_float(r)?);
    let v = match op {
        Plus => a + b,
        Minus => a - b,
        Multiply => a * b,
        Divide | Modulo if b == 0.0 => return division_by_zero(),
        Divide => a / b,
        Modulo => a % b,
    };
    if !v.is_finite() {
        return Err(Error::Eval(format!("DOUBLE value is out of range in {a} {op:?} {b}")));
    }
    Ok(Scalar::F64(v))
}

/// Split a predicate into its top-level AND-separated terms.
pub fn split_conjunction(expr: &ExprRef) -> Vec<ExprRef> {
    match expr.as_ref() {
        Expr::And { left, right } => {
            let mut out = split_conjunction(left);
            out.extend(split_conjunction(right));
            out
        }
        _ => vec![Arc::clone(expr)],
    }
}

/// Combine predicates into a left-deep AND chain. `None` for an empty list.
pub fn join_and(exprs: Vec<ExprRef>) -> Option<ExprRef> {
    exprs.into_iter().reduce(and)
}

// Builders, mirroring the way plans are written by hand in tests and fixtures.

pub fn lit(value: Scalar) -> ExprRef {
    let data_type = value.data_type();
    Arc::new(Expr::Literal { value, data_type })
}

pub fn typed_lit(value: Scalar, data_type: DataType) -> ExprRef {
    Arc::new(Expr::Literal { value, data_type })
}

pub fn lit_bool(b: bool) -> ExprRef {
    lit(Scalar::Bool(b))
}

pub fn col(
    index: usize,
    table: impl Into<String>,
    name: impl Into<String>,
    data_type: DataType,
    nullable: bool,
) -> ExprRef {
    Arc::new(Expr::Column(ColumnRef {
        index,
        table: table.into(),
        name: name.into(),
        data_type,
        nullable,
    }))
}

pub fn and(left: ExprRef, right: ExprRef) -> ExprRef {
    Arc::new(Expr::And { left, right })
}

pub fn or(left: ExprRef, right: ExprRef) -> ExprRef {
    Arc::new(Expr::Or { left, right })
}

pub fn not(e: ExprRef) -> ExprRef {
    Arc::new(Expr::Not(e))
}

pub fn is_null(e: ExprRef) -> ExprRef {
    Arc::new(Expr::IsNull(e))
}

pub fn compare(op: CompareOp, left: ExprRef, right: ExprRef) -> ExprRef {
    Arc::new(Expr::Compare { op, left, right })
}

pub fn eq(left: ExprRef, right: ExprRef) -> ExprRef {
    compare(CompareOp::Eq, left, right)
}

pub fn gt(left: ExprRef, right: ExprRef) -> ExprRef {
    compare(CompareOp::Gt, left, right)
}

pub fn lt(left: ExprRef, right: ExprRef) -> ExprRef {
    compare(CompareOp::Lt, left, right)
}

pub fn arithmetic(op: ArithmeticOp, left: ExprRef, right: ExprRef) -> ExprRef {
    Arc::new(Expr::Arithmetic { op, left, right })
}

pub fn cast(expr: ExprRef, data_type: DataType) -> ExprRef {
    Arc::new(Expr::Cast { expr, data_type })
}

pub fn alias(expr: ExprRef, name: impl Into<String>) -> ExprRef {
    Arc::new(Expr::Alias {
        expr,
        name: name.into(),
    })
}

pub fn call(func: Arc<dyn ScalarUdf>, args: Vec<ExprRef>) -> ExprRef {
    Arc::new(Expr::ScalarFunction(FunctionExpr { func, args }))
}

impl fmt::Display for CompareOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            CompareOp::Eq => "=",
            CompareOp::NotEq => "!=",
            CompareOp::Lt => "<",
            CompareOp::LtEq => "<=",
            CompareOp::Gt => ">",
            CompareOp::GtEq => ">=",
        };
        f.write_str(s)
    }
}

impl fmt::Display for ArithmeticOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ArithmeticOp::Plus => "+",
            ArithmeticOp::Minus => "-",
            ArithmeticOp::Multiply => "*",
            ArithmeticOp::Divide => "/",
            ArithmeticOp::Modulo => "%",
        };
        f.write_str(s)
    }
}

fn write_list(f: &mut fmt::Formatter<'_>, exprs: &[ExprRef]) -> fmt::Result {
    for (i, e) in exprs.iter().enumerate() {
        if i > 0 {
            write!(f, ", ")?;
        }
        write!(f, "{e}")?;
    }
    Ok(())
}

impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        use Expr::*;
        match self {
            Literal {
                value: Scalar::Str(s),
                ..
            } => write!(f, "'{s}'"),
            Literal { value, .. } => write!(f, "{value}"),
            Column(c) if c.table.is_empty() => write!(f, "{}", c.name),
            Column(c) => write!(f, "{}.{}", c.table, c.name),
            UnresolvedColumn { table: Some(t), name } => write!(f, "{t}.{name}"),
            UnresolvedColumn { table: None, name } => write!(f, "{name}"),
            Alias { expr, name } => write!(f, "{expr} as {name}"),
            And { left, right } => write!(f, "({left} AND {right})"),
            Or { left, right } => write!(f, "({left} OR {right})"),
            Not(e) => write!(f, "NOT({e})"),
            IsNull(e) => write!(f, "{e} IS NULL"),
            Compare { op, left, right } => write!(f, "{left} {op} {right}"),
            Arithmetic { op, left, right } => write!(f, "({left} {op} {right})"),
            Cast { expr, data_type } => write!(f, "CAST({expr} AS {data_type})"),
            Tuple(elems) => {
                write!(f, "(")?;
                write_list(f, elems)?;
                write!(f, ")")
            }
            Interval { value, unit } => write!(f, "INTERVAL {value} {}", format!("{unit:?}").to_uppercase()),
            ScalarFunction(func) => {
                write!(f, "{}(", func.func.name())?;
                write_list(f, &func.args)?;
                write!(f, ")")
            }
        }
    }
}
