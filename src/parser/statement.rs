use crate::types::Value;

#[derive(Debug, Clone, PartialEq)]
pub enum Statement {
    Select(SelectStatement),
    Insert {
        table: String,
        columns: Option<Vec<String>>,
        rows: Vec<Vec<Value>>,
    },
    Update {
        table: String,
        assignments: Vec<(String, Value)>,
        filter: Option<Condition>,
    },
    Delete {
        from: String,
        filter: Option<Condition>,
    },
}

impl Statement {
    /// Table touched by a DML statement.
    #[must_use]
    pub fn target_table(&self) -> Option<&str> {
        match self {
            Self::Select(_) => None,
            Self::Insert { table, .. } | Self::Update { table, .. } => Some(table),
            Self::Delete { from, .. } => Some(from),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct SelectStatement {
    pub distinct: bool,
    pub columns: Vec<SelectColumn>,
    pub from: Vec<String>,
    pub filter: Option<Condition>,
    pub group_by: Vec<String>,
    pub having: Option<Condition>,
    pub order_by: Vec<(String, SortOrder)>,
    pub limit: Option<usize>,
    pub offset: Option<usize>,
}

impl SelectStatement {
    #[must_use]
    pub fn has_aggregates(&self) -> bool {
        self.columns
            .iter()
            .any(|c| matches!(c, SelectColumn::Aggregate { .. }))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Condition {
    Equals(String, Value),
    NotEquals(String, Value),
    GreaterThan(String, Value),
    LessThan(String, Value),
    GreaterThanOrEqual(String, Value),
    LessThanOrEqual(String, Value),
    Between(String, Value, Value),
    Like(String, String),
    In(String, Vec<Value>),
    IsNull(String),
    IsNotNull(String),
    Not(Box<Condition>),
    And(Box<Condition>, Box<Condition>),
    Or(Box<Condition>, Box<Condition>),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortOrder {
    #[default]
    Asc,
    Desc,
}

#[derive(Debug, Clone, PartialEq)]
pub enum SelectColumn {
    All,
    Regular {
        name: String,
        alias: Option<String>,
    },
    Aggregate {
        function: AggregateFunction,
        alias: Option<String>,
    },
}

impl SelectColumn {
    /// Key the column gets in result rows. `None` for `*`.
    #[must_use]
    pub fn output_name(&self) -> Option<String> {
        match self {
            Self::All => None,
            Self::Regular { name, alias } => Some(alias.clone().unwrap_or_else(|| name.clone())),
            Self::Aggregate { function, alias } => {
                Some(alias.clone().unwrap_or_else(|| function.to_string()))
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AggregateFunction {
    Count(CountTarget),
    Sum(String),
    Avg(String),
    Min(String),
    Max(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CountTarget {
    All,
    Column(String),
}

impl std::fmt::Display for AggregateFunction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Count(CountTarget::All) => write!(f, "COUNT(*)"),
            Self::Count(CountTarget::Column(c)) => write!(f, "COUNT({c})"),
            Self::Sum(c) => write!(f, "SUM({c})"),
            Self::Avg(c) => write!(f, "AVG({c})"),
            Self::Min(c) => write!(f, "MIN({c})"),
            Self::Max(c) => write!(f, "MAX({c})"),
        }
    }
}
