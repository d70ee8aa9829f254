/// Processor module - relational operations over in-memory rows
///
/// Structure:
/// - conditions: WHERE/HAVING evaluation
/// - aggregate: GROUP BY and aggregate functions
/// - data_processor: select/where/insert/update/delete and SELECT execution

pub mod conditions;
pub mod aggregate;
pub mod data_processor;

pub use conditions::ConditionEvaluator;
pub use data_processor::{cross_join, DataProcessor};
