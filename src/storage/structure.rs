use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use indexmap::IndexMap;

use super::schema::TableSchema;
use crate::types::{DatabaseError, Driver};

/// Table-to-file mapping for one flat-file database.
///
/// `root` is `None` for the in-memory JSON database; tables then have no
/// backing file at all.
#[derive(Debug, Clone)]
pub struct Structure {
    root: Option<PathBuf>,
    driver: Driver,
    tables: IndexMap<String, Option<PathBuf>>,
    schemas: HashMap<String, TableSchema>,
    current: Option<String>,
}

impl Structure {
    #[must_use]
    pub fn new(root: Option<PathBuf>, driver: Driver) -> Self {
        Self {
            root,
            driver,
            tables: IndexMap::new(),
            schemas: HashMap::new(),
            current: None,
        }
    }

    #[must_use]
    pub fn root(&self) -> Option<&Path> {
        self.root.as_deref()
    }

    #[must_use]
    pub const fn driver(&self) -> Driver {
        self.driver
    }

    /// Table names map straight onto file names, so only plain names pass.
    pub fn validate_table_name(name: &str) -> Result<(), DatabaseError> {
        let valid = !name.is_empty()
            && name != "."
            && name != ".."
            && !name.contains("..")
            && name
                .chars()
                .all(|c| c.is_alphanumeric() || matches!(c, '_' | '-' | '.' | ' '));
        if valid {
            Ok(())
        } else {
            Err(DatabaseError::invalid_path(name, "not a valid table name"))
        }
    }

    /// Records `table` and returns its backing file, if any.
    pub fn register(&mut self, table: &str) -> Result<Option<PathBuf>, DatabaseError> {
        if let Some(path) = self.tables.get(table) {
            return Ok(path.clone());
        }
        Self::validate_table_name(table)?;
        let path = self
            .root
            .as_ref()
            .map(|root| root.join(format!("{table}.{}", self.driver.extension())));
        self.tables.insert(table.to_string(), path.clone());
        Ok(path)
    }

    #[must_use]
    pub fn path_for(&self, table: &str) -> Option<&Path> {
        self.tables.get(table).and_then(Option::as_deref)
    }

    pub fn set_current(&mut self, table: &str) -> Result<(), DatabaseError> {
        self.register(table)?;
        self.current = Some(table.to_string());
        Ok(())
    }

    #[must_use]
    pub fn current(&self) -> Option<&str> {
        self.current.as_deref()
    }

    #[must_use]
    pub fn schema_for(&self, table: &str) -> Option<&TableSchema> {
        self.schemas.get(table)
    }

    pub fn set_schema(&mut self, table: impl Into<String>, schema: TableSchema) {
        self.schemas.insert(table.into(), schema);
    }

    pub fn set_schemas(&mut self, schemas: HashMap<String, TableSchema>) {
        self.schemas = schemas;
    }

    /// Registered tables plus every file of this driver's extension in the
    /// database directory, sorted.
    pub fn table_names(&self) -> Result<Vec<String>, DatabaseError> {
        let mut names: Vec<String> = self.tables.keys().cloned().collect();
        if let Some(root) = &self.root {
            let entries = fs::read_dir(root).map_err(|e| DatabaseError::file_io(root, e))?;
            for entry in entries {
                let path = entry?.path();
                if path.extension().and_then(|e| e.to_str()) == Some(self.driver.extension()) {
                    if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
                        if !names.iter().any(|n| n == stem) {
                            names.push(stem.to_string());
                        }
                    }
                }
            }
        }
        names.sort();
        Ok(names)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_register_maps_to_driver_extension() {
        let mut structure = Structure::new(Some(PathBuf::from("/data")), Driver::Yaml);
        let path = structure.register("users").unwrap();
        assert_eq!(path, Some(PathBuf::from("/data/users.yaml")));
        assert_eq!(structure.path_for("users"), Some(Path::new("/data/users.yaml")));
    }

    #[test]
    fn test_memory_tables_have_no_file() {
        let mut structure = Structure::new(None, Driver::Json);
        assert_eq!(structure.register("cache").unwrap(), None);
        structure.set_current("cache").unwrap();
        assert_eq!(structure.current(), Some("cache"));
    }

    #[test]
    fn test_rejects_path_like_names() {
        for bad in ["", "..", "../etc/passwd", "a/b", "a\\b"] {
            assert!(matches!(
                Structure::validate_table_name(bad),
                Err(DatabaseError::InvalidPath { .. })
            ), "{bad} accepted");
        }
        assert!(Structure::validate_table_name("order_items-2024").is_ok());
    }

    #[test]
    fn test_table_names_discovers_files() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("b.csv"), "").unwrap();
        fs::write(dir.path().join("a.csv"), "").unwrap();
        fs::write(dir.path().join("notes.txt"), "").unwrap();
        let mut structure = Structure::new(Some(dir.path().to_path_buf()), Driver::Csv);
        structure.register("c").unwrap();
        assert_eq!(structure.table_names().unwrap(), vec!["a", "b", "c"]);
    }
}
