use super::query::{Junction, Operand, Operator, Predicate, PredicateNode};
use crate::types::Value;

/// Argument of `where_clause`, `and_where`, `having`, ...
#[derive(Debug, Clone, PartialEq)]
pub enum Criterion {
    /// Raw predicate text such as `age > 18`.
    Expr(String),
    Compare {
        column: String,
        op: Operator,
        operand: Operand,
    },
    /// Keyed (`AND`/`OR`) or positional (`None`) list of criteria.
    Group {
        junction: Option<Junction>,
        items: Vec<Criterion>,
    },
}

impl Criterion {
    pub fn expr(text: impl Into<String>) -> Self {
        Self::Expr(text.into())
    }

    pub fn compare(column: impl Into<String>, op: Operator, operand: Operand) -> Self {
        Self::Compare {
            column: column.into(),
            op,
            operand,
        }
    }

    pub fn eq(column: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::compare(column, Operator::Eq, Operand::Value(value.into()))
    }

    pub fn is_in(column: impl Into<String>, values: Vec<Value>) -> Self {
        Self::compare(column, Operator::In, Operand::List(values))
    }

    pub fn between(column: impl Into<String>, low: impl Into<Value>, high: impl Into<Value>) -> Self {
        Self::compare(column, Operator::Between, Operand::Range(low.into(), high.into()))
    }

    pub fn is_null(column: impl Into<String>) -> Self {
        Self::compare(column, Operator::IsNull, Operand::None)
    }

    #[must_use]
    pub const fn all(items: Vec<Self>) -> Self {
        Self::Group {
            junction: Some(Junction::And),
            items,
        }
    }

    #[must_use]
    pub const fn any(items: Vec<Self>) -> Self {
        Self::Group {
            junction: Some(Junction::Or),
            items,
        }
    }

    #[must_use]
    pub const fn list(items: Vec<Self>) -> Self {
        Self::Group {
            junction: None,
            items,
        }
    }
}

impl From<&str> for Criterion {
    fn from(text: &str) -> Self {
        Self::Expr(text.to_string())
    }
}

impl From<String> for Criterion {
    fn from(text: String) -> Self {
        Self::Expr(text)
    }
}

/// Turns one clause call into predicate nodes.
///
/// A top-level group yields one node per entry, each tagged with the group's
/// junction or, for a positional list, the caller's `implicit` one. Deeper
/// groups become parenthesised sub-trees whose entries default to AND.
pub fn expand(criterion: Criterion, implicit: Junction, errors: &mut Vec<String>) -> Vec<PredicateNode> {
    match criterion {
        Criterion::Group { junction, items } => {
            if items.is_empty() {
                errors.push("empty condition group".to_string());
            }
            let junction = junction.unwrap_or(implicit);
            items
                .into_iter()
                .map(|item| to_node(item, junction, errors))
                .collect()
        }
        single => vec![to_node(single, implicit, errors)],
    }
}

fn to_node(criterion: Criterion, junction: Junction, errors: &mut Vec<String>) -> PredicateNode {
    let predicate = match criterion {
        Criterion::Expr(text) => {
            let text = text.trim().to_string();
            if text.is_empty() {
                errors.push("empty predicate".to_string());
            }
            Predicate::Expr(text)
        }
        Criterion::Compare { column, op, operand } => {
            let column = column.trim().to_string();
            if let Err(reason) = validate(&column, op, &operand) {
                errors.push(reason);
            }
            Predicate::Compare { column, op, operand }
        }
        Criterion::Group { junction: inner, items } => {
            if items.is_empty() {
                errors.push("empty condition group".to_string());
            }
            let inner = inner.unwrap_or(Junction::And);
            Predicate::Group(
                items
                    .into_iter()
                    .map(|item| to_node(item, inner, errors))
                    .collect(),
            )
        }
    };
    PredicateNode { junction, predicate }
}

fn validate(column: &str, op: Operator, operand: &Operand) -> Result<(), String> {
    if column.is_empty() {
        return Err(format!("{} needs a column", op.as_sql()));
    }
    let fits = match op {
        Operator::In | Operator::NotIn => matches!(operand, Operand::List(values) if !values.is_empty()),
        Operator::Between | Operator::NotBetween => matches!(operand, Operand::Range(..)),
        Operator::IsNull | Operator::IsNotNull => matches!(operand, Operand::None),
        _ => matches!(operand, Operand::Value(_)),
    };
    if fits {
        Ok(())
    } else {
        Err(format!("{column} {} cannot take {operand:?}", op.as_sql()))
    }
}
