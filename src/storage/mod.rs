// Storage module - flat-file persistence and schema.ini handling

pub mod formats;
mod handler;
pub mod schema;
mod structure;

pub use handler::{RowPersistence, StructureHandler};
pub use schema::{TableSchema, parse_schema_ini};
pub use structure::Structure;
