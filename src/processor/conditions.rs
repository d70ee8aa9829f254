/// Condition evaluation for WHERE and HAVING clauses
///
/// Rows are schemaless, so a column absent from a row reads as NULL.
/// Supports: =, !=, >, <, >=, <=, BETWEEN, LIKE, IN, IS NULL, NOT, AND, OR.

use crate::types::{DatabaseError, Row, Value};
use crate::parser::Condition;
use std::cmp::Ordering;

pub struct ConditionEvaluator;

impl ConditionEvaluator {
    /// Evaluate condition against a row. AND/OR short-circuit left to right.
    pub fn evaluate(row: &Row, condition: &Condition) -> Result<bool, DatabaseError> {
        match condition {
            Condition::Equals(col, val) => Ok(Self::cell(row, col).loose_eq(val)),
            Condition::NotEquals(col, val) => {
                let cell = Self::cell(row, col);
                Ok(!cell.is_null() && !val.is_null() && !cell.loose_eq(val))
            }
            Condition::GreaterThan(col, val) => {
                Self::compare(row, col, val, |o| o == Ordering::Greater)
            }
            Condition::LessThan(col, val) => Self::compare(row, col, val, |o| o == Ordering::Less),
            Condition::GreaterThanOrEqual(col, val) => {
                Self::compare(row, col, val, |o| o != Ordering::Less)
            }
            Condition::LessThanOrEqual(col, val) => {
                Self::compare(row, col, val, |o| o != Ordering::Greater)
            }
            Condition::Between(col, low, high) => {
                Ok(Self::compare(row, col, low, |o| o != Ordering::Less)?
                    && Self::compare(row, col, high, |o| o != Ordering::Greater)?)
            }
            Condition::Like(col, pattern) => Self::match_like(&Self::cell(row, col), pattern),
            Condition::In(col, values) => {
                let cell = Self::cell(row, col);
                Ok(values.iter().any(|v| cell.loose_eq(v)))
            }
            Condition::IsNull(col) => Ok(Self::cell(row, col).is_null()),
            Condition::IsNotNull(col) => Ok(!Self::cell(row, col).is_null()),
            Condition::Not(inner) => Ok(!Self::evaluate(row, inner)?),
            Condition::And(left, right) => {
                Ok(Self::evaluate(row, left)? && Self::evaluate(row, right)?)
            }
            Condition::Or(left, right) => {
                Ok(Self::evaluate(row, left)? || Self::evaluate(row, right)?)
            }
        }
    }

    fn cell(row: &Row, col: &str) -> Value {
        row.get_or_null(col)
    }

    fn compare(
        row: &Row,
        col: &str,
        val: &Value,
        accept: impl Fn(Ordering) -> bool,
    ) -> Result<bool, DatabaseError> {
        let ordering = Self::cell(row, col)
            .compare(val)
            .map_err(|e| match e {
                DatabaseError::InvalidPredicate(msg) => {
                    DatabaseError::InvalidPredicate(format!("column '{col}': {msg}"))
                }
                other => other,
            })?;
        Ok(ordering.is_some_and(accept))
    }

    /// Match LIKE pattern
    /// Supports: % (any chars), _ (single char)
    fn match_like(value: &Value, pattern: &str) -> Result<bool, DatabaseError> {
        match value {
            Value::Null => Ok(false), // NULL doesn't match anything
            Value::List(_) | Value::Map(_) => Err(DatabaseError::InvalidPredicate(format!(
                "LIKE on non-scalar value {value}"
            ))),
            other => Ok(Self::like_pattern_match(&other.to_string(), pattern)),
        }
    }

    /// `%` matches any run, `_` one character. Only the most recent `%` is
    /// ever retried, so the cost stays within text length times pattern length.
    fn like_pattern_match(text: &str, pattern: &str) -> bool {
        let text: Vec<char> = text.chars().collect();
        let pattern: Vec<char> = pattern.chars().collect();

        let (mut ti, mut pi) = (0, 0);
        let mut retry: Option<(usize, usize)> = None;
        while ti < text.len() {
            if pi < pattern.len() && pattern[pi] == '%' {
                retry = Some((pi, ti));
                pi += 1;
            } else if pi < pattern.len() && (pattern[pi] == '_' || pattern[pi] == text[ti]) {
                ti += 1;
                pi += 1;
            } else if let Some((star, consumed)) = retry {
                // let the last % swallow one more character
                pi = star + 1;
                ti = consumed + 1;
                retry = Some((star, ti));
            } else {
                return false;
            }
        }
        pattern[pi..].iter().all(|&c| c == '%')
    }
}
