// flatql - SQL-like querying over CSV, JSON and YAML table files
// Modular architecture for maintainability and extensibility

// Clippy configuration - allow non-critical warnings
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::cast_precision_loss)]
#![allow(clippy::cast_sign_loss)]
#![allow(clippy::cast_possible_wrap)]
#![allow(clippy::too_many_lines)]
#![allow(clippy::needless_pass_by_value)]
#![allow(clippy::match_same_arms)]
#![allow(clippy::manual_let_else)]
#![allow(clippy::option_if_let_else)]
#![allow(clippy::format_push_string)]
#![allow(clippy::wildcard_enum_match_arm)]
#![allow(clippy::module_name_repetitions)]

// Core data structures (values, rows, tables, config, errors)
pub mod core;

// Backward compatibility - re-export all core types as types module
pub mod types {
    pub use crate::core::*;
}

// Raw query parser (SELECT / INSERT / UPDATE / DELETE)
pub mod parser;

// In-memory relational operations (filter, projection, grouping, DML)
pub mod processor;

// Fluent query builder with result caching
pub mod builder;

// Fetch styles and row formatting
pub mod fetch;

// Flat-file persistence (CSV, JSON, YAML, schema.ini)
pub mod storage;

// Connection: statement execution and result buffering
pub mod connection;

// Re-export commonly used types for convenience
pub use core::{ConnectionConfig, DataType, DatabaseError, Driver, Row, Table, Value};
pub use parser::{parse_condition, parse_statement, Statement};
pub use processor::DataProcessor;
pub use builder::{Criterion, QueryBuilder};
pub use fetch::{FetchStyle, Fetched, RowClass, RowTarget};
pub use storage::{RowPersistence, Structure, StructureHandler};
pub use connection::Connection;
