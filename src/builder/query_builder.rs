use std::collections::VecDeque;

use super::criteria::{expand, Criterion};
use super::query::{normalize_list, Junction, Limit, Query, SelectType};
use super::render;
use crate::connection::Connection;
use crate::fetch::{self, FetchStyle, Fetched, RowClass, RowTarget};
use crate::parser::SortOrder;
use crate::types::table::column_union;
use crate::types::{DatabaseError, Row, Value};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CursorState {
    /// Nothing executed for the current text yet.
    Fresh,
    /// Rows buffered and not yet drained.
    Cached,
    /// Drained or reset.
    Exhausted,
}

/// Figures derived from the cached result of the current query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryMetadata {
    pub query: String,
    pub row_count: usize,
    pub column_count: usize,
    pub affected_rows: Option<usize>,
}

/// Fluent query assembly over a borrowed [`Connection`].
///
/// Results are executed once per distinct query and buffered; repeated
/// `fetch` calls drain the buffer instead of re-running the query.
///
/// ```no_run
/// # use flatql::{Connection, ConnectionConfig, Driver, FetchStyle, QueryBuilder};
/// # fn main() -> Result<(), flatql::DatabaseError> {
/// let mut conn = Connection::open(ConnectionConfig::new(Driver::Csv, "./data"))?;
/// let adults = QueryBuilder::new(&mut conn)
///     .select(&["name"])
///     .from(&["users"])
///     .where_clause("age > 18")
///     .fetch_all(FetchStyle::Assoc)?;
/// # Ok(())
/// # }
/// ```
pub struct QueryBuilder<'c> {
    connection: &'c mut Connection,
    query: Query,
    cache: VecDeque<Row>,
    state: CursorState,
    last_query: Option<(String, Vec<Value>)>,
}

impl<'c> QueryBuilder<'c> {
    pub fn new(connection: &'c mut Connection) -> Self {
        Self {
            connection,
            query: Query::default(),
            cache: VecDeque::new(),
            state: CursorState::Fresh,
            last_query: None,
        }
    }

    pub fn connection(&mut self) -> &mut Connection {
        &mut *self.connection
    }

    #[must_use]
    pub const fn query(&self) -> &Query {
        &self.query
    }

    #[must_use]
    pub const fn state(&self) -> CursorState {
        self.state
    }

    /// Display text of the last executed query.
    #[must_use]
    pub fn last_query(&self) -> Option<&str> {
        self.last_query.as_ref().map(|(text, _)| text.as_str())
    }

    /// Starts a new query selecting `columns` (`*` when empty).
    pub fn select(&mut self, columns: &[&str]) -> &mut Self {
        self.start(SelectType::Default, columns)
    }

    pub fn select_distinct(&mut self, columns: &[&str]) -> &mut Self {
        self.start(SelectType::Distinct, columns)
    }

    fn start(&mut self, select_type: SelectType, columns: &[&str]) -> &mut Self {
        self.reset();
        self.query = Query::new(select_type);
        for column in normalize_list(columns) {
            if column.is_empty() {
                self.query.errors.push("empty column name in select list".to_string());
            }
            self.query.columns.push(column);
        }
        self
    }

    pub fn from(&mut self, tables: &[&str]) -> &mut Self {
        for table in normalize_list(tables) {
            if table.is_empty() {
                self.query.errors.push("empty table name".to_string());
            }
            self.query.from.push(table);
        }
        self
    }

    pub fn where_clause(&mut self, criterion: impl Into<Criterion>) -> &mut Self {
        self.push_where(criterion.into(), Junction::None)
    }

    pub fn and_where(&mut self, criterion: impl Into<Criterion>) -> &mut Self {
        self.push_where(criterion.into(), Junction::And)
    }

    pub fn or_where(&mut self, criterion: impl Into<Criterion>) -> &mut Self {
        self.push_where(criterion.into(), Junction::Or)
    }

    pub fn having(&mut self, criterion: impl Into<Criterion>) -> &mut Self {
        self.push_having(criterion.into(), Junction::None)
    }

    pub fn and_having(&mut self, criterion: impl Into<Criterion>) -> &mut Self {
        self.push_having(criterion.into(), Junction::And)
    }

    pub fn or_having(&mut self, criterion: impl Into<Criterion>) -> &mut Self {
        self.push_having(criterion.into(), Junction::Or)
    }

    fn push_where(&mut self, criterion: Criterion, implicit: Junction) -> &mut Self {
        let nodes = expand(criterion, implicit, &mut self.query.errors);
        self.query.where_nodes.extend(nodes);
        self
    }

    fn push_having(&mut self, criterion: Criterion, implicit: Junction) -> &mut Self {
        let nodes = expand(criterion, implicit, &mut self.query.errors);
        self.query.having_nodes.extend(nodes);
        self
    }

    pub fn group(&mut self, columns: &[&str]) -> &mut Self {
        for column in normalize_list(columns) {
            if column.is_empty() {
                self.query.errors.push("empty GROUP BY column".to_string());
            }
            self.query.group.push(column);
        }
        self
    }

    /// Entries read `column`, `column ASC` or `column DESC`.
    pub fn order(&mut self, entries: &[&str]) -> &mut Self {
        for entry in normalize_list(entries) {
            match parse_order_entry(&entry) {
                Ok(item) => self.query.order.push(item),
                Err(reason) => self.query.errors.push(reason),
            }
        }
        self
    }

    /// One argument is a row count, two are offset and count. Anything longer
    /// is kept as literal text.
    pub fn limit<V: Into<Value> + Clone>(&mut self, args: &[V]) -> &mut Self {
        let args: Vec<Value> = args.iter().cloned().map(Into::into).collect();
        let limit = match args.as_slice() {
            [] => Err("LIMIT needs a row count".to_string()),
            [count] => as_count(count).map(Limit::Count),
            [offset, count] => as_count(offset)
                .and_then(|offset| as_count(count).map(|count| Limit::Range { offset, count })),
            many => Ok(Limit::Literal(
                many.iter().map(ToString::to_string).collect::<Vec<_>>().join(", "),
            )),
        };
        match limit {
            Ok(limit) => self.query.limit = Some(limit),
            Err(reason) => self.query.errors.push(reason),
        }
        self
    }

    /// Display text with placeholders and its bound values.
    pub fn build(&self) -> Result<(String, Vec<Value>), DatabaseError> {
        render::build(&self.query)
    }

    pub fn build_raw(&self) -> Result<String, DatabaseError> {
        render::build_raw(&self.query)
    }

    /// The text handed to [`Connection::query`].
    pub fn build_raw_for_execution(&self) -> Result<String, DatabaseError> {
        self.build_raw()
    }

    /// Drops the buffered result so the next fetch re-executes. The AST is
    /// left as it is.
    pub fn reset(&mut self) -> &mut Self {
        self.cache.clear();
        self.last_query = None;
        self.state = CursorState::Exhausted;
        self
    }

    fn run_once(&mut self) -> Result<(), DatabaseError> {
        let key = self.build()?;
        if self.last_query.as_ref() == Some(&key) {
            match self.state {
                CursorState::Cached => {
                    tracing::debug!(query = %key.0, remaining = self.cache.len(), "result cache hit");
                    return Ok(());
                }
                CursorState::Exhausted => return Ok(()),
                CursorState::Fresh => {}
            }
        }

        let raw = self.build_raw_for_execution()?;
        let rows: VecDeque<Row> = self
            .connection
            .query(&raw)?
            .fetch_all(FetchStyle::Assoc)?
            .into_iter()
            .filter_map(Fetched::into_assoc)
            .collect();
        tracing::debug!(query = %key.0, rows = rows.len(), "query executed");

        self.cache = rows;
        self.last_query = Some(key);
        self.state = CursorState::Cached;
        Ok(())
    }

    fn next_row(&mut self) -> Result<Option<Row>, DatabaseError> {
        self.run_once()?;
        let row = self.cache.pop_front();
        if self.cache.is_empty() {
            self.state = CursorState::Exhausted;
        }
        Ok(row)
    }

    /// Next row of the current query, `None` once drained.
    pub fn fetch(&mut self, style: FetchStyle) -> Result<Option<Fetched>, DatabaseError> {
        self.next_row()?
            .map(|row| fetch::format_row(row, style))
            .transpose()
    }

    /// Every remaining row. The cursor is exhausted afterwards, so an
    /// immediate repeat returns nothing.
    pub fn fetch_all(&mut self, style: FetchStyle) -> Result<Vec<Fetched>, DatabaseError> {
        self.run_once()?;
        self.state = CursorState::Exhausted;
        self.cache
            .drain(..)
            .map(|row| fetch::format_row(row, style))
            .collect()
    }

    pub fn fetch_column(&mut self, column: Option<&str>) -> Result<Option<Value>, DatabaseError> {
        self.next_row()?
            .map(|row| fetch::format_column(row, column))
            .transpose()
    }

    pub fn fetch_class<T: RowClass>(&mut self, args: T::Args) -> Result<Option<T>, DatabaseError> {
        self.next_row()?
            .map(|row| fetch::instantiate(args, row))
            .transpose()
    }

    pub fn fetch_into<T: RowTarget + ?Sized>(&mut self, target: &mut T) -> Result<bool, DatabaseError> {
        match self.next_row()? {
            Some(row) => fetch::hydrate(target, row).map(|()| true),
            None => Ok(false),
        }
    }

    pub fn get_all_metadata(&mut self) -> Result<QueryMetadata, DatabaseError> {
        self.run_once()?;
        let rows: Vec<Row> = self.cache.iter().cloned().collect();
        Ok(QueryMetadata {
            query: self.last_query().unwrap_or_default().to_string(),
            row_count: rows.len(),
            column_count: column_union(&rows).len(),
            affected_rows: self.connection.affected_rows(),
        })
    }

    /// Appends `row` to `table`; returns the affected row count.
    pub fn insert(&mut self, table: &str, row: &Row) -> Result<usize, DatabaseError> {
        let sql = render::render_insert(table, row)?;
        self.execute_dml(&sql)
    }

    pub fn update(
        &mut self,
        table: &str,
        changes: &Row,
        criterion: Option<Criterion>,
    ) -> Result<usize, DatabaseError> {
        let filter = self.dml_filter(criterion)?;
        let sql = render::render_update(table, changes, &filter)?;
        self.execute_dml(&sql)
    }

    pub fn delete(&mut self, table: &str, criterion: Option<Criterion>) -> Result<usize, DatabaseError> {
        let filter = self.dml_filter(criterion)?;
        let sql = render::render_delete(table, &filter);
        self.execute_dml(&sql)
    }

    fn dml_filter(
        &self,
        criterion: Option<Criterion>,
    ) -> Result<Vec<super::query::PredicateNode>, DatabaseError> {
        let Some(criterion) = criterion else {
            return Ok(Vec::new());
        };
        let mut errors = Vec::new();
        let nodes = expand(criterion, Junction::None, &mut errors);
        match errors.into_iter().next() {
            Some(problem) => Err(DatabaseError::QueryBuild(problem)),
            None => Ok(nodes),
        }
    }

    fn execute_dml(&mut self, sql: &str) -> Result<usize, DatabaseError> {
        // Buffered rows may no longer match the table.
        self.reset();
        let affected = self.connection.query(sql)?.affected_rows().unwrap_or(0);
        tracing::debug!(query = sql, affected, "builder DML");
        Ok(affected)
    }
}

fn as_count(value: &Value) -> Result<usize, String> {
    let count = match value {
        Value::Integer(i) => usize::try_from(*i).ok(),
        Value::Text(s) => s.trim().parse::<usize>().ok(),
        _ => None,
    };
    count.ok_or_else(|| format!("LIMIT argument {value} is not a row count"))
}

fn parse_order_entry(entry: &str) -> Result<(String, SortOrder), String> {
    let entry = entry.trim();
    if entry.is_empty() {
        return Err("empty ORDER BY entry".to_string());
    }
    let (column, direction) = if let Some(rest) = entry.strip_prefix('`') {
        let end = rest
            .find('`')
            .ok_or_else(|| format!("unterminated identifier in ORDER BY '{entry}'"))?;
        (&rest[..end], rest[end + 1..].trim())
    } else {
        match entry.rsplit_once(char::is_whitespace) {
            Some((column, direction)) => (column.trim(), direction),
            None => (entry, ""),
        }
    };
    let order = match direction.to_ascii_uppercase().as_str() {
        "" | "ASC" => SortOrder::Asc,
        "DESC" => SortOrder::Desc,
        other => return Err(format!("invalid sort direction '{other}' in ORDER BY '{entry}'")),
    };
    Ok((column.to_string(), order))
}
