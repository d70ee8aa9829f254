use crate::parser::SortOrder;
use crate::types::Value;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SelectType {
    #[default]
    Default,
    Distinct,
}

/// How a predicate node joins the node before it at the same level.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Junction {
    And,
    Or,
    None,
}

impl Junction {
    /// Connector text; `None` after the first node reads as AND.
    #[must_use]
    pub const fn connector(self) -> &'static str {
        match self {
            Self::Or => " OR ",
            Self::And | Self::None => " AND ",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operator {
    Eq,
    NotEq,
    Lt,
    Le,
    Gt,
    Ge,
    Like,
    NotLike,
    In,
    NotIn,
    Between,
    NotBetween,
    IsNull,
    IsNotNull,
}

impl Operator {
    #[must_use]
    pub const fn as_sql(self) -> &'static str {
        match self {
            Self::Eq => "=",
            Self::NotEq => "!=",
            Self::Lt => "<",
            Self::Le => "<=",
            Self::Gt => ">",
            Self::Ge => ">=",
            Self::Like => "LIKE",
            Self::NotLike => "NOT LIKE",
            Self::In => "IN",
            Self::NotIn => "NOT IN",
            Self::Between => "BETWEEN",
            Self::NotBetween => "NOT BETWEEN",
            Self::IsNull => "IS NULL",
            Self::IsNotNull => "IS NOT NULL",
        }
    }
}

impl std::str::FromStr for Operator {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.split_whitespace().collect::<Vec<_>>().join(" ").to_uppercase();
        Ok(match normalized.as_str() {
            "=" | "==" => Self::Eq,
            "!=" | "<>" => Self::NotEq,
            "<" => Self::Lt,
            "<=" => Self::Le,
            ">" => Self::Gt,
            ">=" => Self::Ge,
            "LIKE" => Self::Like,
            "NOT LIKE" => Self::NotLike,
            "IN" => Self::In,
            "NOT IN" => Self::NotIn,
            "BETWEEN" => Self::Between,
            "NOT BETWEEN" => Self::NotBetween,
            "IS NULL" => Self::IsNull,
            "IS NOT NULL" => Self::IsNotNull,
            _ => return Err(format!("unknown operator '{s}'")),
        })
    }
}

/// Right-hand side of a comparison.
#[derive(Debug, Clone, PartialEq)]
pub enum Operand {
    None,
    Value(Value),
    List(Vec<Value>),
    Range(Value, Value),
}

impl From<Value> for Operand {
    fn from(value: Value) -> Self {
        Self::Value(value)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Predicate {
    /// Predicate text passed through as written.
    Expr(String),
    Compare {
        column: String,
        op: Operator,
        operand: Operand,
    },
    /// Parenthesised sub-tree.
    Group(Vec<PredicateNode>),
}

#[derive(Debug, Clone, PartialEq)]
pub struct PredicateNode {
    pub junction: Junction,
    pub predicate: Predicate,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Limit {
    Count(usize),
    Range { offset: usize, count: usize },
    /// More than two arguments, kept verbatim.
    Literal(String),
}

/// The AST one fluent chain assembles.
///
/// Clause problems found while assembling are kept in `errors` and reported
/// by the first render.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Query {
    pub select_type: SelectType,
    pub columns: Vec<String>,
    pub from: Vec<String>,
    pub where_nodes: Vec<PredicateNode>,
    pub having_nodes: Vec<PredicateNode>,
    pub group: Vec<String>,
    pub order: Vec<(String, SortOrder)>,
    pub limit: Option<Limit>,
    pub errors: Vec<String>,
}

impl Query {
    #[must_use]
    pub fn new(select_type: SelectType) -> Self {
        Self {
            select_type,
            ..Self::default()
        }
    }
}

/// Splits clause arguments on top-level commas and trims each piece, so
/// `&["a, b", "c"]` and `&["a", "b", "c"]` come out the same.
#[must_use]
pub fn normalize_list(args: &[&str]) -> Vec<String> {
    let mut items = Vec::new();
    for arg in args {
        let mut depth = 0usize;
        let mut quoted = false;
        let mut current = String::new();
        for c in arg.chars() {
            match c {
                '`' => quoted = !quoted,
                '(' if !quoted => depth += 1,
                ')' if !quoted => depth = depth.saturating_sub(1),
                ',' if !quoted && depth == 0 => {
                    items.push(current.trim().to_string());
                    current.clear();
                    continue;
                }
                _ => {}
            }
            current.push(c);
        }
        items.push(current.trim().to_string());
    }
    items
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_list() {
        assert_eq!(normalize_list(&["a, b", " c "]), vec!["a", "b", "c"]);
        assert_eq!(normalize_list(&["COUNT(*), `x,y`"]), vec!["COUNT(*)", "`x,y`"]);
        assert_eq!(normalize_list(&["a,"]), vec!["a", ""]);
    }

    #[test]
    fn test_operator_parsing() {
        assert_eq!("<>".parse::<Operator>().unwrap(), Operator::NotEq);
        assert_eq!("not  like".parse::<Operator>().unwrap(), Operator::NotLike);
        assert_eq!("is null".parse::<Operator>().unwrap(), Operator::IsNull);
        assert!("~".parse::<Operator>().is_err());
    }
}
