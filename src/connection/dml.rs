use std::mem;

use crate::parser::Condition;
use crate::processor::DataProcessor;
use crate::types::{DatabaseError, Row, Table, Value};

pub struct DmlExecutor;

impl DmlExecutor {
    /// Appends one row per VALUES tuple. Without a column list the table's
    /// current column layout is used.
    pub fn insert(
        table: &mut Table,
        columns: Option<Vec<String>>,
        values: Vec<Vec<Value>>,
    ) -> Result<usize, DatabaseError> {
        let columns = match columns {
            Some(columns) => columns,
            None => table.columns(),
        };
        if columns.is_empty() {
            return Err(DatabaseError::QueryBuild(format!(
                "INSERT into '{}' needs a column list",
                table.name
            )));
        }
        if columns.iter().any(|c| c.trim().is_empty()) {
            return Err(DatabaseError::QueryBuild("blank column name in INSERT".to_string()));
        }

        // Every tuple is checked before the first row lands.
        let mut rows = Vec::with_capacity(values.len());
        for tuple in values {
            if tuple.len() != columns.len() {
                return Err(DatabaseError::QueryBuild(format!(
                    "INSERT has {} values for {} columns",
                    tuple.len(),
                    columns.len()
                )));
            }
            rows.push(columns.iter().cloned().zip(tuple).collect::<Row>());
        }

        let mut processor = DataProcessor::new(mem::take(&mut table.rows));
        let mut inserted = 0;
        for row in rows {
            if processor.insert(row) {
                inserted += 1;
            }
        }
        table.rows = processor.into_data();
        Ok(inserted)
    }

    pub fn update(
        table: &mut Table,
        assignments: Vec<(String, Value)>,
        filter: Option<&Condition>,
    ) -> Result<usize, DatabaseError> {
        let changes: Row = assignments.into_iter().collect();
        let mut processor = DataProcessor::new(mem::take(&mut table.rows));
        let result = processor.update(&changes, filter);
        table.rows = processor.into_data();
        result
    }

    pub fn delete(table: &mut Table, filter: Option<&Condition>) -> Result<usize, DatabaseError> {
        let mut processor = DataProcessor::new(mem::take(&mut table.rows));
        let result = processor.delete(filter);
        table.rows = processor.into_data();
        result
    }
}
