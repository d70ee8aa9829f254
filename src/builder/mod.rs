// Builder module - fluent query assembly, rendering and the result cache

pub mod criteria;
pub mod query;
pub mod render;
mod query_builder;

pub use criteria::Criterion;
pub use query::{Junction, Limit, Operand, Operator, Predicate, PredicateNode, Query, SelectType};
pub use query_builder::{CursorState, QueryBuilder, QueryMetadata};
