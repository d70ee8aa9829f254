// Module declarations
mod statement;
mod common;
mod dml;
mod queries;

// Re-export all public types
pub use statement::{
    Statement,
    SelectStatement,
    Condition,
    SortOrder,
    SelectColumn,
    AggregateFunction,
    CountTarget,
};
pub use common::is_reserved;

use crate::types::DatabaseError;
use nom::branch::alt;

/// Parses one raw query (the execution text a builder renders).
pub fn parse_statement(input: &str) -> Result<Statement, DatabaseError> {
    let input = input.trim();
    let input = input.trim_end_matches(';');

    let result = alt((queries::select, dml::insert, dml::update, dml::delete))(input);

    match result {
        Ok((remaining, stmt)) => {
            if remaining.trim().is_empty() {
                Ok(stmt)
            } else {
                Err(DatabaseError::ParseError(format!(
                    "Unexpected input after statement: {remaining}"
                )))
            }
        }
        Err(e) => Err(DatabaseError::ParseError(format!("{e:?}"))),
    }
}

/// Parses a standalone WHERE expression such as `age > 18 AND name LIKE 'A%'`.
pub fn parse_condition(input: &str) -> Result<Condition, DatabaseError> {
    match queries::condition(input.trim()) {
        Ok((remaining, cond)) if remaining.trim().is_empty() => Ok(cond),
        Ok((remaining, _)) => Err(DatabaseError::InvalidPredicate(format!(
            "unexpected input in predicate: {remaining}"
        ))),
        Err(e) => Err(DatabaseError::InvalidPredicate(format!("{input}: {e:?}"))),
    }
}
