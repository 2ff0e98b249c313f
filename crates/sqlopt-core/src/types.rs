//! Lightweight logical values used by literals and constant folding.
//!
//! Booleans have two encodings: the native `Bool` and the narrow-integer
//! `I8` form where `FALSE_I8` is false and every other value is true.

use std::cmp::Ordering;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::schema::DataType;

/// Narrow-integer encoding of boolean false.
pub const FALSE_I8: i8 = 0;
/// Narrow-integer encoding of boolean true.
pub const TRUE_I8: i8 = 1;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Scalar {
    Null,
    Bool(bool),
    I8(i8),
    I32(i32),
    I64(i64),
    F32(f32),
    F64(f64),
    Str(String),
    Bin(Vec<u8>),
}

/// A single input row for expression evaluation.
pub type Row = Vec<Scalar>;

impl Scalar {
    pub fn data_type(&self) -> DataType {
        match self {
            Scalar::Null => DataType::Null,
            Scalar::Bool(_) => DataType::Boolean,
            Scalar::I8(_) => DataType::Int8,
            Scalar::I32(_) => DataType::Int32,
            Scalar::I64(_) => DataType::Int64,
            Scalar::F32(_) => DataType::Float32,
            Scalar::F64(_) => DataType::Float64,
            Scalar::Str(_) => DataType::Utf8,
            Scalar::Bin(_) => DataType::Binary,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Scalar::Null)
    }

    /// Truthiness under SQL rules: `None` for NULL.
    pub fn truthy(&self) -> Option<bool> {
        match self {
            Scalar::Null => None,
            Scalar::Bool(b) => Some(*b),
            Scalar::I8(v) => Some(*v != FALSE_I8),
            Scalar::I32(v) => Some(*v != 0),
            Scalar::I64(v) => Some(*v != 0),
            Scalar::F32(v) => Some(*v != 0.0),
            Scalar::F64(v) => Some(*v != 0.0),
            Scalar::Str(s) => Some(s.trim().parse::<f64>().map(|v| v != 0.0).unwrap_or(false)),
            Scalar::Bin(b) => Some(!b.is_empty()),
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Scalar::Bool(b) => Some(i64::from(*b)),
            Scalar::I8(v) => Some(i64::from(*v)),
            Scalar::I32(v) => Some(i64::from(*v)),
            Scalar::I64(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Scalar::F32(v) => Some(f64::from(*v)),
            Scalar::F64(v) => Some(*v),
            other => other.as_i64().map(|v| v as f64),
        }
    }

    /// Compare two non-null values. Numbers compare across widths, strings
    /// lexicographically. Returns `Ok(None)` if either side is NULL.
    pub fn compare(&self, other: &Scalar) -> Result<Option<Ordering>> {
        use Scalar::*;
        if self.is_null() || other.is_null() {
            return Ok(None);
        }
        match (self, other) {
            (Str(a), Str(b)) => Ok(Some(a.cmp(b))),
            (Bin(a), Bin(b)) => Ok(Some(a.cmp(b))),
            (a, b) => {
                if let (Some(x), Some(y)) = (a.as_i64(), b.as_i64()) {
                    return Ok(Some(x.cmp(&y)));
                }
                match (a.as_f64(), b.as_f64()) {
                    (Some(x), Some(y)) => Ok(x.partial_cmp(&y)),
                    _ => Err(Error::Eval(format!(
                        "cannot compare {} with {}",
                        a.data_type(),
                        b.data_type()
                    ))),
                }
            }
        }
    }

    /// Convert this value to `target`. NULL converts to NULL of any type.
    pub fn cast_to(&self, target: &DataType) -> Result<Scalar> {
        use Scalar::*;
        if self.is_null() {
            return Ok(Null);
        }
        let fail = || Error::Eval(format!("cannot cast {} to {}", self, target));
        let v = match target {
            DataType::Null => Null,
            DataType::Boolean => Bool(self.truthy().ok_or_else(fail)?),
            DataType::Int8 => I8(i8::try_from(self.to_integer().ok_or_else(fail)?).map_err(|_| fail())?),
            DataType::Int32 => I32(i32::try_from(self.to_integer().ok_or_else(fail)?).map_err(|_| fail())?),
            DataType::Int64 | DataType::Date64 => I64(self.to_integer().ok_or_else(fail)?),
            DataType::Float32 => F32(self.to_float().ok_or_else(fail)? as f32),
            DataType::Float64 | DataType::Decimal128 => F64(self.to_float().ok_or_else(fail)?),
            DataType::Utf8 => Str(self.to_string()),
            DataType::Binary => match self {
                Bin(b) => Bin(b.clone()),
                Str(s) => Bin(s.as_bytes().to_vec()),
                other => Bin(other.to_string().into_bytes()),
            },
            DataType::Interval | DataType::Tuple(_) => return Err(fail()),
        };
        Ok(v)
    }

    fn to_integer(&self) -> Option<i64> {
        match self {
            Scalar::Str(s) => s.trim().parse::<i64>().ok(),
            Scalar::F32(v) => float_to_i64(f64::from(*v)),
            Scalar::F64(v) => float_to_i64(*v),
            other => other.as_i64(),
        }
    }

    fn to_float(&self) -> Option<f64> {
        match self {
            Scalar::Str(s) => s.trim().parse::<f64>().ok(),
            other => other.as_f64(),
        }
    }
}

fn float_to_i64(v: f64) -> Option<i64> {
    let r = v.round();
    // i64::MAX as f64 rounds up to 2^63, which is already out of range.
    if r.is_finite() && r >= i64::MIN as f64 && r < i64::MAX as f64 {
        Some(r as i64)
    } else {
        None
    }
}

impl fmt::Display for Scalar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Scalar::Null => write!(f, "NULL"),
            Scalar::Bool(b) => write!(f, "{}", if *b { "true" } else { "false" }),
            Scalar::I8(v) => write!(f, "{v}"),
            Scalar::I32(v) => write!(f, "{v}"),
            Scalar::I64(v) => write!(f, "{v}"),
            Scalar::F32(v) => write!(f, "{v}"),
            Scalar::F64(v) => write!(f, "{v}"),
            Scalar::Str(s) => write!(f, "{s}"),
            Scalar::Bin(b) => write!(f, "0x{}", b.iter().map(|x| format!("{x:02x}")).collect::<String>()),
        }
    }
}
