//! Logical schema types. Pure data; no execution dependency here.
//!
//! Every column carries the table qualifier ("source") it originates from.
//! The join pushdown rule relies on these qualifiers to decide which side of
//! a join a predicate can move to.

use std::fmt;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DataType {
    Null,
    Boolean,
    Int8,
    Int32,
    Int64,
    Float32,
    Float64,
    Utf8,
    Binary,
    Date64,
    Decimal128,
    Interval,
    Tuple(Vec<DataType>),
}

impl DataType {
    pub fn is_integer(&self) -> bool {
        matches!(self, DataType::Int8 | DataType::Int32 | DataType::Int64)
    }
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DataType::Null => write!(f, "NULL"),
            DataType::Boolean => write!(f, "BOOLEAN"),
            DataType::Int8 => write!(f, "TINYINT"),
            DataType::Int32 => write!(f, "INT"),
            DataType::Int64 => write!(f, "BIGINT"),
            DataType::Float32 => write!(f, "FLOAT"),
            DataType::Float64 => write!(f, "DOUBLE"),
            DataType::Utf8 => write!(f, "TEXT"),
            DataType::Binary => write!(f, "BLOB"),
            DataType::Date64 => write!(f, "DATETIME"),
            DataType::Decimal128 => write!(f, "DECIMAL"),
            DataType::Interval => write!(f, "INTERVAL"),
            DataType::Tuple(types) => {
                write!(f, "TUPLE(")?;
                for (i, t) in types.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{t}")?;
                }
                write!(f, ")")
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Field {
    pub name: String,
    pub data_type: DataType,
    pub nullable: bool,
    /// Table qualifier this column belongs to. Empty for computed columns.
    #[serde(default)]
    pub source: String,
}

impl Field {
    pub fn new(name: impl Into<String>, data_type: DataType, nullable: bool) -> Self {
        Self {
            name: name.into(),
            data_type,
            nullable,
            source: String::new(),
        }
    }

    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.source = source.into();
        self
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Schema {
    pub fields: Vec<Field>,
}

impl Schema {
    pub fn new(fields: Vec<Field>) -> Self {
        Self { fields }
    }

    pub fn empty() -> Self {
        Self { fields: Vec::new() }
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Position of the column `name` qualified by `source`. Names compare
    /// case-insensitively, sources exactly.
    pub fn index_of_qualified(&self, name: &str, source: &str) -> Option<usize> {
        self.fields
            .iter()
            .position(|f| f.source == source && f.name.eq_ignore_ascii_case(name))
    }

    pub fn contains(&self, name: &str, source: &str) -> bool {
        self.index_of_qualified(name, source).is_some()
    }

    /// Same column names and types in the same order. Nullability and
    /// qualifiers are not compared.
    pub fn equivalent(&self, other: &Schema) -> bool {
        self.fields.len() == other.fields.len()
            && self
                .fields
                .iter()
                .zip(&other.fields)
                .all(|(a, b)| a.name == b.name && a.data_type == b.data_type)
    }

    /// Concatenate two schemas (left columns first), as produced by joins.
    pub fn join(&self, other: &Schema) -> Schema {
        let mut fields = Vec::with_capacity(self.fields.len() + other.fields.len());
        fields.extend(self.fields.iter().cloned());
        fields.extend(other.fields.iter().cloned());
        Schema { fields }
    }
}
