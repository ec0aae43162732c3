//! Dynamic representation of materialised parquet values.

use chrono::{DateTime, NaiveDate, Utc};

/// A single materialised value, after logical-type conversion and record
/// assembly. Lists, maps and structs nest through [`Value::List`] and
/// [`Value::Record`].
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Null,
    Boolean(bool),
    Int32(i32),
    Int64(i64),
    /// Unsigned reinterpretation of an INT32 annotated as unsigned.
    UInt32(u32),
    /// Unsigned reinterpretation of an INT64 annotated as unsigned.
    UInt64(u64),
    Float(f32),
    Double(f64),
    Bytes(Vec<u8>),
    String(String),
    Date(NaiveDate),
    Timestamp(DateTime<Utc>),
    List(Vec<Value>),
    /// An ordered set of named fields. Used for structs, maps and rows in
    /// object format.
    Record(Vec<(String, Value)>),
}

impl Value {
    #[inline]
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Renders this value as a map key. Strings pass through; other scalars
    /// use their display form.
    pub(crate) fn into_map_key(self) -> String {
        match self {
            Value::String(s) => s,
            Value::Boolean(v) => v.to_string(),
            Value::Int32(v) => v.to_string(),
            Value::Int64(v) => v.to_string(),
            Value::UInt32(v) => v.to_string(),
            Value::UInt64(v) => v.to_string(),
            Value::Float(v) => v.to_string(),
            Value::Double(v) => v.to_string(),
            Value::Date(v) => v.to_string(),
            Value::Timestamp(v) => v.to_string(),
            Value::Bytes(v) => String::from_utf8_lossy(&v).into_owned(),
            other => format!("{other:?}"),
        }
    }
}

impl From<serde_json::Value> for Value {
    fn from(value: serde_json::Value) -> Self {
        match value {
            serde_json::Value::Null => Value::Null,
            serde_json::Value::Bool(v) => Value::Boolean(v),
            serde_json::Value::Number(v) => {
                if let Some(v) = v.as_i64() {
                    Value::Int64(v)
                } else if let Some(v) = v.as_u64() {
                    Value::UInt64(v)
                } else {
                    Value::Double(v.as_f64().unwrap_or(f64::NAN))
                }
            }
            serde_json::Value::String(v) => Value::String(v),
            serde_json::Value::Array(values) => {
                Value::List(values.into_iter().map(Value::from).collect())
            }
            serde_json::Value::Object(fields) => Value::Record(
                fields
                    .into_iter()
                    .map(|(name, value)| (name, Value::from(value)))
                    .collect(),
            ),
        }
    }
}
