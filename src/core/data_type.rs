use serde::{Deserialize, Serialize};

use super::value::Value;

/// Declared column type from a table schema.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum DataType {
    Integer,
    Float,
    Text,
    Boolean,
    Json,
}

impl DataType {
    /// Maps a schema.ini type name. Unknown names are `None`.
    #[must_use]
    pub fn from_schema_name(name: &str) -> Option<Self> {
        match name.trim().to_ascii_lowercase().as_str() {
            "integer" | "int" | "long" | "short" | "byte" => Some(Self::Integer),
            "float" | "double" | "single" | "currency" | "decimal" => Some(Self::Float),
            "text" | "char" | "memo" | "date" | "datetime" => Some(Self::Text),
            "bit" | "bool" | "boolean" => Some(Self::Boolean),
            "json" => Some(Self::Json),
            _ => None,
        }
    }

    /// Converts `value` to this type. Empty text becomes NULL for every
    /// non-text type.
    pub fn coerce(self, value: Value) -> Result<Value, String> {
        if let Value::Text(s) = &value {
            if s.trim().is_empty() && self != Self::Text {
                return Ok(Value::Null);
            }
        }
        match (self, value) {
            (_, Value::Null) => Ok(Value::Null),
            (Self::Integer, Value::Integer(i)) => Ok(Value::Integer(i)),
            (Self::Integer, Value::Float(f)) if f.fract() == 0.0 => Ok(Value::Integer(f as i64)),
            (Self::Integer, Value::Boolean(b)) => Ok(Value::Integer(i64::from(b))),
            (Self::Integer, Value::Text(s)) => s
                .trim()
                .parse::<i64>()
                .map(Value::Integer)
                .map_err(|_| format!("'{s}' is not an integer")),
            (Self::Float, Value::Integer(i)) => Ok(Value::Float(i as f64)),
            (Self::Float, Value::Float(f)) => Ok(Value::Float(f)),
            (Self::Float, Value::Text(s)) => s
                .trim()
                .parse::<f64>()
                .map(Value::Float)
                .map_err(|_| format!("'{s}' is not a number")),
            (Self::Boolean, Value::Boolean(b)) => Ok(Value::Boolean(b)),
            (Self::Boolean, Value::Integer(i)) => Ok(Value::Boolean(i != 0)),
            (Self::Boolean, Value::Text(s)) => match s.trim().to_ascii_lowercase().as_str() {
                "1" | "true" | "yes" | "on" => Ok(Value::Boolean(true)),
                "0" | "false" | "no" | "off" => Ok(Value::Boolean(false)),
                _ => Err(format!("'{s}' is not a boolean")),
            },
            (Self::Text, Value::Text(s)) => Ok(Value::Text(s)),
            (Self::Text, v @ (Value::List(_) | Value::Map(_))) => Err(format!("{v} is not text")),
            (Self::Text, v) => Ok(Value::Text(v.to_string())),
            (Self::Json, Value::Text(s)) => serde_json::from_str::<Value>(&s)
                .map_err(|e| format!("'{s}' is not JSON: {e}")),
            (Self::Json, v) => Ok(v),
            (ty, v) => Err(format!("{v} cannot be read as {ty:?}")),
        }
    }
}
