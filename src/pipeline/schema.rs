//! Typed columns, rows and the record trait that ties a Rust struct to a schema.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use super::PipelineError;

/// Storage type of a raw input column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ColumnKind {
    Text,
    Int,
    Float,
}

impl ColumnKind {
    /// Parse one raw field into a value of this kind.
    pub fn parse(self, raw: &str) -> Result<Value, String> {
        match self {
            Self::Text => Ok(Value::Text(raw.to_string())),
            Self::Int => raw
                .trim()
                .parse::<i64>()
                .map(Value::Int)
                .map_err(|err| format!("expected integer, got {raw:?}: {err}")),
            Self::Float => raw
                .trim()
                .parse::<f32>()
                .map(Value::Float)
                .map_err(|err| format!("expected number, got {raw:?}: {err}")),
        }
    }
}

/// Named column in a [`DataSchema`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Column {
    pub name: String,
    pub kind: ColumnKind,
}

impl Column {
    pub fn new(name: &str, kind: ColumnKind) -> Self {
        Self {
            name: name.to_string(),
            kind,
        }
    }
}

/// Ordered column layout of a training file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DataSchema {
    pub columns: Vec<Column>,
}

impl DataSchema {
    pub fn new(columns: Vec<Column>) -> Self {
        Self { columns }
    }

    /// Column names in declared order.
    pub fn names(&self) -> Vec<&str> {
        self.columns.iter().map(|column| column.name.as_str()).collect()
    }

    /// Fail unless `other` has the same columns, kinds and order.
    pub fn ensure_compatible(&self, other: &DataSchema) -> Result<(), PipelineError> {
        if self == other {
            return Ok(());
        }
        Err(PipelineError::SchemaMismatch {
            expected: self.to_string(),
            found: other.to_string(),
        })
    }
}

impl fmt::Display for DataSchema {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self
            .columns
            .iter()
            .map(|column| format!("{}:{:?}", column.name, column.kind))
            .collect();
        write!(f, "[{}]", parts.join(", "))
    }
}

/// A single cell value flowing through the pipeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum Value {
    Text(String),
    Int(i64),
    Float(f32),
    /// Dense key; `0` means missing.
    Key(u32),
    Vector(Vec<f32>),
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Text(text) => f.write_str(text),
            Self::Int(value) => write!(f, "{value}"),
            Self::Float(value) => write!(f, "{value}"),
            Self::Key(key) => write!(f, "{key}"),
            Self::Vector(values) => {
                let parts: Vec<String> = values.iter().map(|v| v.to_string()).collect();
                write!(f, "{}", parts.join(" "))
            }
        }
    }
}

/// Column name to value map. Stages read columns and add new ones.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Row {
    values: BTreeMap<String, Value>,
}

impl Row {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, name: &str, value: Value) -> Self {
        self.insert(name, value);
        self
    }

    pub fn insert(&mut self, name: &str, value: Value) {
        self.values.insert(name.to_string(), value);
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.values.get(name)
    }

    pub fn text(&self, name: &str) -> Result<&str, PipelineError> {
        match self.values.get(name) {
            Some(Value::Text(text)) => Ok(text),
            other => Err(type_error(name, "text", other)),
        }
    }

    pub fn int(&self, name: &str) -> Result<i64, PipelineError> {
        match self.values.get(name) {
            Some(Value::Int(value)) => Ok(*value),
            other => Err(type_error(name, "int", other)),
        }
    }

    pub fn float(&self, name: &str) -> Result<f32, PipelineError> {
        match self.values.get(name) {
            Some(Value::Float(value)) => Ok(*value),
            other => Err(type_error(name, "float", other)),
        }
    }

    /// Key value of a column; an absent column reads as the missing key `0`.
    pub fn key(&self, name: &str) -> Result<u32, PipelineError> {
        match self.values.get(name) {
            Some(Value::Key(key)) => Ok(*key),
            None => Ok(0),
            other => Err(type_error(name, "key", other)),
        }
    }

    pub fn vector(&self, name: &str) -> Result<&[f32], PipelineError> {
        match self.values.get(name) {
            Some(Value::Vector(values)) => Ok(values),
            other => Err(type_error(name, "vector", other)),
        }
    }
}

fn type_error(column: &str, expected: &'static str, found: Option<&Value>) -> PipelineError {
    PipelineError::ColumnType {
        column: column.to_string(),
        expected,
        found: match found {
            None => "missing".to_string(),
            Some(Value::Text(_)) => "text".to_string(),
            Some(Value::Int(_)) => "int".to_string(),
            Some(Value::Float(_)) => "float".to_string(),
            Some(Value::Key(_)) => "key".to_string(),
            Some(Value::Vector(_)) => "vector".to_string(),
        },
    }
}

/// A typed input record with a fixed column layout.
pub trait Record: Sized {
    /// Column layout shared by CSV files, training data and artifacts.
    fn schema() -> DataSchema;
    /// Raw columns of this record; optional columns may be left out.
    fn to_row(&self) -> Row;
    /// Rebuild the record from raw columns.
    fn from_row(row: &Row) -> Result<Self, PipelineError>;
}

/// Typed view of a scored row.
pub trait Prediction: Sized {
    fn from_row(row: &Row) -> Result<Self, PipelineError>;
}
