use std::fs;
use std::path::PathBuf;

use super::formats;
use super::schema::load_schema_file;
use super::structure::Structure;
use crate::types::{ConnectionConfig, DatabaseError, Row};

/// Loads and saves whole tables.
pub trait RowPersistence {
    /// Reads a table. An absent backing file is created empty.
    fn load(&mut self, table: &str) -> Result<Vec<Row>, DatabaseError>;

    /// Rewrites the table's backing file with `rows`.
    fn save(&mut self, rows: &[Row], table: &str) -> Result<bool, DatabaseError>;
}

/// File-backed persistence driven by a [`Structure`].
#[derive(Debug, Clone)]
pub struct StructureHandler {
    structure: Structure,
}

impl StructureHandler {
    /// Validates the database directory and reads its `schema.ini`.
    pub fn open(config: &ConnectionConfig) -> Result<Self, DatabaseError> {
        if config.is_memory() {
            return Ok(Self {
                structure: Structure::new(None, config.driver()),
            });
        }

        let root = PathBuf::from(config.database());
        if config.database().trim().is_empty() {
            return Err(DatabaseError::invalid_path("", "database path is empty"));
        }
        if !root.is_dir() {
            return Err(DatabaseError::invalid_path(
                config.database(),
                "database must be an existing directory",
            ));
        }

        let mut structure = Structure::new(Some(root.clone()), config.driver());
        structure.set_schemas(load_schema_file(&root)?);
        Ok(Self { structure })
    }

    #[must_use]
    pub const fn structure(&self) -> &Structure {
        &self.structure
    }

    pub const fn structure_mut(&mut self) -> &mut Structure {
        &mut self.structure
    }
}

impl RowPersistence for StructureHandler {
    fn load(&mut self, table: &str) -> Result<Vec<Row>, DatabaseError> {
        let Some(path) = self.structure.register(table)? else {
            return Ok(Vec::new());
        };

        if !path.exists() {
            let empty = formats::encode(self.structure.driver(), &[])?;
            fs::write(&path, empty).map_err(|e| DatabaseError::file_io(&path, e))?;
            tracing::info!(table, path = %path.display(), "created empty table file");
            return Ok(Vec::new());
        }

        let content = fs::read_to_string(&path).map_err(|e| DatabaseError::file_io(&path, e))?;
        let rows = formats::decode(self.structure.driver(), &content).map_err(|e| {
            DatabaseError::ParseError(format!("{}: {e}", path.display()))
        })?;
        let rows = match self.structure.schema_for(table) {
            Some(schema) => schema.apply(table, rows)?,
            None => rows,
        };
        tracing::debug!(table, rows = rows.len(), "table loaded");
        Ok(rows)
    }

    fn save(&mut self, rows: &[Row], table: &str) -> Result<bool, DatabaseError> {
        let Some(path) = self.structure.register(table)? else {
            return Ok(true);
        };
        let content = formats::encode(self.structure.driver(), rows)?;
        fs::write(&path, content).map_err(|e| DatabaseError::file_io(&path, e))?;
        tracing::debug!(table, rows = rows.len(), path = %path.display(), "table saved");
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::row;
    use crate::storage::schema::TableSchema;
    use crate::types::{DataType, Driver, Value};
    use tempfile::TempDir;

    fn handler(dir: &TempDir, driver: Driver) -> StructureHandler {
        let config = ConnectionConfig::new(driver, dir.path().to_string_lossy());
        StructureHandler::open(&config).unwrap()
    }

    #[test]
    fn test_load_creates_missing_file() {
        let dir = TempDir::new().unwrap();
        let mut h = handler(&dir, Driver::Json);
        assert!(h.load("users").unwrap().is_empty());
        assert_eq!(fs::read_to_string(dir.path().join("users.json")).unwrap(), "[]");
    }

    #[test]
    fn test_save_then_load_round_trip() {
        let dir = TempDir::new().unwrap();
        let mut h = handler(&dir, Driver::Yaml);
        let rows = vec![
            row! { "id" => 1, "tags" => Value::List(vec![Value::from("x")]) },
            row! { "id" => 2, "score" => 1.5 },
        ];
        assert!(h.save(&rows, "items").unwrap());
        assert_eq!(h.load("items").unwrap(), rows);

        assert!(h.save(&rows[..1], "items").unwrap());
        assert_eq!(h.load("items").unwrap().len(), 1);
    }

    #[test]
    fn test_csv_load_applies_schema() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("users.csv"), "id,name,age\n1,Ann,30\n2,Bob,\n").unwrap();
        let mut h = handler(&dir, Driver::Csv);
        h.structure_mut().set_schema(
            "users",
            TableSchema::new().with_column("id", DataType::Integer).with_column("age", DataType::Integer),
        );
        let rows = h.load("users").unwrap();
        assert_eq!(rows[0], row! { "id" => 1, "name" => "Ann", "age" => 30 });
        assert_eq!(rows[1].get("age"), Some(&Value::Null));
    }

    #[test]
    fn test_open_reads_schema_ini() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("schema.ini"), "[users.csv]\nCol1=id Integer\n").unwrap();
        let h = handler(&dir, Driver::Csv);
        assert!(h.structure().schema_for("users").is_some());
    }

    #[test]
    fn test_open_rejects_missing_directory() {
        let config = ConnectionConfig::new(Driver::Csv, "/definitely/not/here");
        assert!(matches!(
            StructureHandler::open(&config),
            Err(DatabaseError::InvalidPath { .. })
        ));
    }

    #[test]
    fn test_memory_database_never_touches_disk() {
        let mut h = StructureHandler::open(&ConnectionConfig::new(Driver::Json, "memory")).unwrap();
        assert!(h.save(&[row! { "id" => 1 }], "t").unwrap());
        assert!(h.load("t").unwrap().is_empty());
        assert!(h.structure().root().is_none());
    }
}
