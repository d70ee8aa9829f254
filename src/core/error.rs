use thiserror::Error;

#[derive(Error, Debug)]
pub enum DatabaseError {
    #[error("Table '{0}' not found")]
    TableNotFound(String),
    #[error("Column '{0}' not found")]
    ColumnNotFound(String),
    #[error("Invalid predicate: {0}")]
    InvalidPredicate(String),
    #[error("Query build error: {0}")]
    QueryBuild(String),
    #[error("Parse error: {0}")]
    ParseError(String),
    #[error("Invalid path '{path}': {reason}")]
    InvalidPath { path: String, reason: String },
    #[error("Schema mismatch in {table}.{column}: {reason}")]
    SchemaMismatch {
        table: String,
        column: String,
        reason: String,
    },
    #[error("Not connected")]
    NotConnected,
    #[error("Unsupported fetch style: {0}")]
    UnsupportedFetchStyle(String),
    #[error("Cannot assign field '{field}': {reason}")]
    FieldAssignment { field: String, reason: String },
    #[error("IO error on '{path}': {source}")]
    FileIo {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
    #[error("YAML Serialization error: {0}")]
    Yaml(#[from] serde_yaml::Error),
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),
}

impl DatabaseError {
    /// Wraps an I/O failure with the path that caused it.
    pub fn file_io(path: impl AsRef<std::path::Path>, source: std::io::Error) -> Self {
        Self::FileIo {
            path: path.as_ref().display().to_string(),
            source,
        }
    }

    pub fn invalid_path(path: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidPath {
            path: path.into(),
            reason: reason.into(),
        }
    }
}
