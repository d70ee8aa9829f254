use indexmap::IndexMap;
use std::collections::HashMap;
use std::fs;
use std::path::Path;

use crate::types::{DataType, DatabaseError, Row};

/// Declared column types for one table.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TableSchema {
    pub columns: IndexMap<String, DataType>,
}

impl TableSchema {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_column(mut self, name: impl Into<String>, data_type: DataType) -> Self {
        self.columns.insert(name.into(), data_type);
        self
    }

    /// Coerces every declared column of every row. Undeclared columns pass
    /// through untouched.
    pub fn apply(&self, table: &str, rows: Vec<Row>) -> Result<Vec<Row>, DatabaseError> {
        rows.into_iter()
            .map(|row| {
                row.into_iter()
                    .map(|(column, value)| match self.columns.get(&column) {
                        Some(data_type) => data_type
                            .coerce(value)
                            .map(|v| (column.clone(), v))
                            .map_err(|reason| DatabaseError::SchemaMismatch {
                                table: table.to_string(),
                                column,
                                reason,
                            }),
                        None => Ok((column, value)),
                    })
                    .collect::<Result<Row, _>>()
            })
            .collect()
    }
}

/// Reads a `schema.ini`:
///
/// ```text
/// [users.csv]
/// ColNameHeader=True
/// Col1=id Integer
/// Col2="full name" Text
/// ```
///
/// Section names may carry the file extension; it is stripped. Keys other
/// than `ColN` are ignored.
pub fn parse_schema_ini(content: &str) -> Result<HashMap<String, TableSchema>, DatabaseError> {
    let mut schemas: HashMap<String, TableSchema> = HashMap::new();
    let mut current: Option<String> = None;

    for (line_no, raw) in content.lines().enumerate() {
        let line = raw.trim();
        if line.is_empty() || line.starts_with(';') || line.starts_with('#') {
            continue;
        }

        if let Some(section) = line.strip_prefix('[').and_then(|l| l.strip_suffix(']')) {
            let section = section.trim();
            let table = section
                .rsplit_once('.')
                .map_or(section, |(stem, _)| stem)
                .to_string();
            schemas.entry(table.clone()).or_default();
            current = Some(table);
            continue;
        }

        let Some((key, definition)) = line.split_once('=') else {
            return Err(DatabaseError::ParseError(format!(
                "schema.ini line {}: expected key=value",
                line_no + 1
            )));
        };
        if !is_column_key(key.trim()) {
            continue;
        }

        let Some(table) = &current else {
            return Err(DatabaseError::ParseError(format!(
                "schema.ini line {}: column outside of a section",
                line_no + 1
            )));
        };

        let (name, type_name) = split_column_definition(definition.trim()).ok_or_else(|| {
            DatabaseError::ParseError(format!("schema.ini line {}: bad column '{definition}'", line_no + 1))
        })?;
        let data_type = DataType::from_schema_name(type_name).unwrap_or_else(|| {
            tracing::warn!(table = %table, column = %name, declared = %type_name, "unknown schema type, reading as text");
            DataType::Text
        });

        if let Some(schema) = schemas.get_mut(table) {
            schema.columns.insert(name, data_type);
        }
    }

    Ok(schemas)
}

fn is_column_key(key: &str) -> bool {
    match (key.get(..3), key.get(3..)) {
        (Some(prefix), Some(digits)) => {
            prefix.eq_ignore_ascii_case("col")
                && !digits.is_empty()
                && digits.chars().all(|c| c.is_ascii_digit())
        }
        _ => false,
    }
}

fn split_column_definition(definition: &str) -> Option<(String, &str)> {
    if let Some(rest) = definition.strip_prefix('"') {
        let (name, tail) = rest.split_once('"')?;
        let type_name = tail.split_whitespace().next().unwrap_or("Text");
        return Some((name.to_string(), type_name));
    }
    let mut parts = definition.split_whitespace();
    let name = parts.next()?;
    Some((name.to_string(), parts.next().unwrap_or("Text")))
}

/// Loads `schema.ini` from `dir`, or nothing when the file is absent.
pub fn load_schema_file(dir: &Path) -> Result<HashMap<String, TableSchema>, DatabaseError> {
    let path = dir.join("schema.ini");
    if !path.exists() {
        return Ok(HashMap::new());
    }
    let content = fs::read_to_string(&path).map_err(|e| DatabaseError::file_io(&path, e))?;
    let schemas = parse_schema_ini(&content)?;
    tracing::debug!(path = %path.display(), tables = schemas.len(), "schema loaded");
    Ok(schemas)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::row;
    use crate::types::Value;

    const INI: &str = "\
; sample
[users.csv]
ColNameHeader=True
Col1=id Integer
Col2=\"full name\" Text
Col3=score Double
Col4=active Bit

[orders]
Col1=qty Long
";

    #[test]
    fn test_parse_schema_ini() {
        let schemas = parse_schema_ini(INI).unwrap();
        let users = &schemas["users"];
        assert_eq!(users.columns["id"], DataType::Integer);
        assert_eq!(users.columns["full name"], DataType::Text);
        assert_eq!(users.columns["score"], DataType::Float);
        assert_eq!(users.columns["active"], DataType::Boolean);
        assert_eq!(schemas["orders"].columns["qty"], DataType::Integer);
    }

    #[test]
    fn test_apply_coerces_declared_columns() {
        let schema = TableSchema::new()
            .with_column("id", DataType::Integer)
            .with_column("active", DataType::Boolean);
        let rows = vec![row! { "id" => "7", "active" => "1", "note" => "42" }];
        let rows = schema.apply("users", rows).unwrap();
        assert_eq!(rows[0].get("id"), Some(&Value::Integer(7)));
        assert_eq!(rows[0].get("active"), Some(&Value::Boolean(true)));
        assert_eq!(rows[0].get("note"), Some(&Value::from("42")));
        assert_eq!(rows[0].keys().collect::<Vec<_>>(), vec!["id", "active", "note"]);
    }

    #[test]
    fn test_apply_reports_table_and_column() {
        let schema = TableSchema::new().with_column("id", DataType::Integer);
        let err = schema.apply("users", vec![row! { "id" => "x" }]).unwrap_err();
        match err {
            DatabaseError::SchemaMismatch { table, column, .. } => {
                assert_eq!((table.as_str(), column.as_str()), ("users", "id"));
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_column_outside_section_is_error() {
        assert!(parse_schema_ini("Col1=id Integer").is_err());
    }
}
