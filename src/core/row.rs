use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use super::value::Value;

/// A schemaless row: column name to value, in insertion order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Row {
    values: IndexMap<String, Value>,
}

impl Row {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn get(&self, column: &str) -> Option<&Value> {
        self.values.get(column)
    }

    /// Value of `column`, treating an absent key as NULL.
    #[must_use]
    pub fn get_or_null(&self, column: &str) -> Value {
        self.values.get(column).cloned().unwrap_or(Value::Null)
    }

    /// Sets a column, keeping its position if it already exists.
    pub fn insert(&mut self, column: impl Into<String>, value: impl Into<Value>) -> Option<Value> {
        self.values.insert(column.into(), value.into())
    }

    pub fn remove(&mut self, column: &str) -> Option<Value> {
        self.values.shift_remove(column)
    }

    #[must_use]
    pub fn contains_key(&self, column: &str) -> bool {
        self.values.contains_key(column)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.values.keys().map(String::as_str)
    }

    pub fn values(&self) -> impl Iterator<Item = &Value> {
        self.values.values()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v))
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Keeps only `columns`, in the given order. Missing columns become NULL.
    #[must_use]
    pub fn project(&self, columns: &[String]) -> Self {
        columns
            .iter()
            .map(|c| (c.clone(), self.get_or_null(c)))
            .collect()
    }

    /// Overwrites existing keys and appends new ones.
    pub fn merge(&mut self, changes: &Self) {
        for (k, v) in changes.iter() {
            self.values.insert(k.to_string(), v.clone());
        }
    }

    /// Same keys in the same order with loosely equal values.
    #[must_use]
    pub fn same_as(&self, other: &Self) -> bool {
        self.len() == other.len()
            && self
                .iter()
                .zip(other.iter())
                .all(|((ka, va), (kb, vb))| ka == kb && va.loose_eq(vb))
    }

    #[must_use]
    pub fn into_map(self) -> IndexMap<String, Value> {
        self.values
    }
}

impl<K: Into<String>, V: Into<Value>> FromIterator<(K, V)> for Row {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            values: iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect(),
        }
    }
}

impl IntoIterator for Row {
    type Item = (String, Value);
    type IntoIter = indexmap::map::IntoIter<String, Value>;

    fn into_iter(self) -> Self::IntoIter {
        self.values.into_iter()
    }
}

impl From<IndexMap<String, Value>> for Row {
    fn from(values: IndexMap<String, Value>) -> Self {
        Self { values }
    }
}

/// Builds a [`Row`] from `column => value` pairs.
#[macro_export]
macro_rules! row {
    () => { $crate::core::Row::new() };
    ($($column:expr => $value:expr),+ $(,)?) => {{
        let mut row = $crate::core::Row::new();
        $( row.insert($column, $value); )+
        row
    }};
}
