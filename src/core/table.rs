use indexmap::IndexSet;

use super::row::Row;

/// In-memory row store for one table.
///
/// Between `load` and `save` this copy is authoritative; the backing file is
/// only touched at those boundaries.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Table {
    pub name: String,
    pub rows: Vec<Row>,
}

impl Table {
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            rows: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_rows(name: impl Into<String>, rows: Vec<Row>) -> Self {
        Self {
            name: name.into(),
            rows,
        }
    }

    pub fn insert(&mut self, row: Row) {
        self.rows.push(row);
    }

    /// Ordered union of every row's keys, by first appearance.
    #[must_use]
    pub fn columns(&self) -> Vec<String> {
        column_union(&self.rows)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

pub fn column_union(rows: &[Row]) -> Vec<String> {
    let mut seen = IndexSet::new();
    for row in rows {
        for key in row.keys() {
            if !seen.contains(key) {
                seen.insert(key.to_string());
            }
        }
    }
    seen.into_iter().collect()
}
