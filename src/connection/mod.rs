// Connection - query-result consumer over one flat-file database

mod dml;

use std::collections::{HashMap, VecDeque};

use crate::fetch::{self, FetchStyle, Fetched, RowClass, RowTarget};
use crate::parser::{parse_statement, SelectStatement, Statement};
use crate::processor::{cross_join, DataProcessor};
use crate::storage::{RowPersistence, StructureHandler};
use crate::types::{ConnectionConfig, DatabaseError, Row, Table, Value};
use crate::types::table::column_union;

pub use dml::DmlExecutor;

/// An open flat-file database.
///
/// Tables are read from disk the first time a query touches them and then
/// live in memory until [`Connection::load`] re-reads or
/// [`Connection::disconnect`] drops them. With `auto_save` every DML
/// statement rewrites the touched table's file before returning.
#[derive(Debug)]
pub struct Connection {
    config: ConnectionConfig,
    handler: Option<StructureHandler>,
    tables: HashMap<String, Table>,
    result: VecDeque<Row>,
    columns: Vec<String>,
    row_count: usize,
    affected_rows: Option<usize>,
    query_string: String,
}

impl Connection {
    /// A connection that has not touched the filesystem yet.
    #[must_use]
    pub fn new(config: ConnectionConfig) -> Self {
        Self {
            config,
            handler: None,
            tables: HashMap::new(),
            result: VecDeque::new(),
            columns: Vec::new(),
            row_count: 0,
            affected_rows: None,
            query_string: String::new(),
        }
    }

    pub fn open(config: ConnectionConfig) -> Result<Self, DatabaseError> {
        let mut connection = Self::new(config);
        connection.connect()?;
        Ok(connection)
    }

    /// Validates the database location. On failure the connection stays
    /// empty and disconnected.
    pub fn connect(&mut self) -> Result<(), DatabaseError> {
        self.disconnect();
        let handler = StructureHandler::open(&self.config).inspect_err(|e| {
            tracing::warn!(database = self.config.database(), error = %e, "connect failed");
        })?;
        self.handler = Some(handler);
        self.config.set_connected(true);
        tracing::info!(
            driver = %self.config.driver(),
            database = self.config.database(),
            "connected"
        );
        Ok(())
    }

    pub fn disconnect(&mut self) {
        self.handler = None;
        self.tables.clear();
        self.clear_result();
        self.affected_rows = None;
        self.config.set_connected(false);
    }

    #[must_use]
    pub const fn is_connected(&self) -> bool {
        self.config.is_connected()
    }

    #[must_use]
    pub const fn config(&self) -> &ConnectionConfig {
        &self.config
    }

    fn handler_mut(&mut self) -> Result<&mut StructureHandler, DatabaseError> {
        self.handler.as_mut().ok_or(DatabaseError::NotConnected)
    }

    /// The in-memory table, reading it from its file on first use.
    fn table_mut(&mut self, name: &str) -> Result<&mut Table, DatabaseError> {
        if !self.tables.contains_key(name) {
            let rows = self.handler_mut()?.load(name)?;
            self.tables.insert(name.to_string(), Table::with_rows(name, rows));
        }
        self.tables
            .get_mut(name)
            .ok_or_else(|| DatabaseError::TableNotFound(name.to_string()))
    }

    /// Re-reads `table` from its file, discarding unsaved changes, and makes
    /// it the current table.
    pub fn load(&mut self, table: &str) -> Result<&[Row], DatabaseError> {
        let handler = self.handler_mut()?;
        let rows = handler.load(table)?;
        handler.structure_mut().set_current(table)?;
        let entry = self
            .tables
            .entry(table.to_string())
            .insert_entry(Table::with_rows(table, rows));
        Ok(&entry.into_mut().rows)
    }

    /// Writes a table (the current one when `table` is `None`) to its file.
    pub fn save(&mut self, table: Option<&str>) -> Result<bool, DatabaseError> {
        let name = match table {
            Some(name) => name.to_string(),
            None => self.current_table()?,
        };
        let rows = self.table_mut(&name)?.rows.clone();
        self.handler_mut()?.save(&rows, &name)
    }

    pub fn use_table(&mut self, table: &str) -> Result<(), DatabaseError> {
        self.handler_mut()?.structure_mut().set_current(table)?;
        self.table_mut(table)?;
        Ok(())
    }

    fn current_table(&self) -> Result<String, DatabaseError> {
        self.handler
            .as_ref()
            .ok_or(DatabaseError::NotConnected)?
            .structure()
            .current()
            .map(str::to_string)
            .ok_or_else(|| DatabaseError::TableNotFound("no current table".to_string()))
    }

    /// Rows of the current table.
    pub fn get_data(&mut self) -> Result<&[Row], DatabaseError> {
        let name = self.current_table()?;
        Ok(&self.table_mut(&name)?.rows)
    }

    /// Replaces every row of the current table in memory.
    pub fn set_data(&mut self, rows: Vec<Row>) -> Result<(), DatabaseError> {
        let name = self.current_table()?;
        self.table_mut(&name)?.rows = rows;
        Ok(())
    }

    /// Every table in the database directory plus those created this session.
    pub fn tables(&self) -> Result<Vec<String>, DatabaseError> {
        let handler = self.handler.as_ref().ok_or(DatabaseError::NotConnected)?;
        let mut names = handler.structure().table_names()?;
        for name in self.tables.keys() {
            if !names.contains(name) {
                names.push(name.clone());
            }
        }
        names.sort();
        Ok(names)
    }

    /// Runs one raw statement. SELECT results are buffered for
    /// `fetch`/`fetch_all`; DML records the affected row count.
    pub fn query(&mut self, raw: &str) -> Result<&mut Self, DatabaseError> {
        if !self.is_connected() {
            return Err(DatabaseError::NotConnected);
        }
        let statement = parse_statement(raw)?;
        self.query_string = raw.trim().to_string();
        self.clear_result();
        self.affected_rows = None;

        match statement {
            Statement::Select(select) => self.run_select(&select)?,
            Statement::Insert { table, columns, rows } => {
                let count = DmlExecutor::insert(self.table_mut(&table)?, columns, rows)?;
                self.finish_dml(&table, count)?;
            }
            Statement::Update { table, assignments, filter } => {
                let count = DmlExecutor::update(self.table_mut(&table)?, assignments, filter.as_ref())?;
                self.finish_dml(&table, count)?;
            }
            Statement::Delete { from, filter } => {
                let count = DmlExecutor::delete(self.table_mut(&from)?, filter.as_ref())?;
                self.finish_dml(&from, count)?;
            }
        }
        Ok(self)
    }

    fn run_select(&mut self, select: &SelectStatement) -> Result<(), DatabaseError> {
        let mut sources = Vec::with_capacity(select.from.len());
        for name in &select.from {
            sources.push((name.clone(), self.table_mut(name)?.rows.clone()));
        }
        if let Some(first) = select.from.first() {
            self.handler_mut()?.structure_mut().set_current(first)?;
        }

        let rows = if sources.len() == 1 {
            sources.pop().map(|(_, rows)| rows).unwrap_or_default()
        } else {
            cross_join(sources)
        };
        let rows = DataProcessor::new(rows).execute_select(select)?;

        self.columns = column_union(&rows);
        self.row_count = rows.len();
        tracing::debug!(query = %self.query_string, rows = rows.len(), "select executed");
        self.result = rows.into();
        Ok(())
    }

    fn finish_dml(&mut self, table: &str, count: usize) -> Result<(), DatabaseError> {
        self.affected_rows = Some(count);
        self.handler_mut()?.structure_mut().set_current(table)?;
        tracing::debug!(query = %self.query_string, affected = count, "statement executed");
        if self.config.auto_save() {
            // The in-memory change stays even when the write fails.
            self.save(Some(table))?;
        }
        Ok(())
    }

    fn clear_result(&mut self) {
        self.result.clear();
        self.columns.clear();
        self.row_count = 0;
    }

    /// Next buffered row, or `None` once the result is drained.
    pub fn fetch(&mut self, style: FetchStyle) -> Result<Option<Fetched>, DatabaseError> {
        self.result
            .pop_front()
            .map(|row| fetch::format_row(row, style))
            .transpose()
    }

    /// Drains every buffered row.
    pub fn fetch_all(&mut self, style: FetchStyle) -> Result<Vec<Fetched>, DatabaseError> {
        self.result
            .drain(..)
            .map(|row| fetch::format_row(row, style))
            .collect()
    }

    pub fn fetch_column(&mut self, column: Option<&str>) -> Result<Option<Value>, DatabaseError> {
        self.result
            .pop_front()
            .map(|row| fetch::format_column(row, column))
            .transpose()
    }

    pub fn fetch_class<T: RowClass>(&mut self, args: T::Args) -> Result<Option<T>, DatabaseError> {
        self.result
            .pop_front()
            .map(|row| fetch::instantiate(args, row))
            .transpose()
    }

    /// Assigns the next row into `target`; `false` when nothing is left.
    pub fn fetch_into<T: RowTarget + ?Sized>(&mut self, target: &mut T) -> Result<bool, DatabaseError> {
        match self.result.pop_front() {
            Some(row) => fetch::hydrate(target, row).map(|()| true),
            None => Ok(false),
        }
    }

    /// Rows affected by the last DML statement; `None` after a SELECT.
    #[must_use]
    pub const fn affected_rows(&self) -> Option<usize> {
        self.affected_rows
    }

    /// Rows produced by the last SELECT.
    #[must_use]
    pub const fn row_count(&self) -> usize {
        self.row_count
    }

    #[must_use]
    pub fn column_count(&self) -> usize {
        self.columns.len()
    }

    #[must_use]
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    #[must_use]
    pub fn query_string(&self) -> &str {
        &self.query_string
    }

    pub fn set_query_string(&mut self, query: impl Into<String>) {
        self.query_string = query.into();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::row;
    use crate::types::Driver;
    use std::fs;
    use tempfile::TempDir;

    fn users_db(driver: Driver) -> (TempDir, Connection) {
        let dir = TempDir::new().unwrap();
        let config = ConnectionConfig::new(driver, dir.path().to_string_lossy());
        let mut conn = Connection::open(config).unwrap();
        conn.query("INSERT INTO users (id, name, age) VALUES (1, 'Ann', 30), (2, 'Bob', 17)")
            .unwrap();
        (dir, conn)
    }

    #[test]
    fn test_failed_connect_stays_disconnected() {
        let config = ConnectionConfig::new(Driver::Csv, "/no/such/database/dir");
        let mut conn = Connection::new(config);
        assert!(conn.connect().is_err());
        assert!(!conn.is_connected());
        assert!(matches!(conn.query("SELECT * FROM t"), Err(DatabaseError::NotConnected)));
        assert!(matches!(conn.tables(), Err(DatabaseError::NotConnected)));
    }

    #[test]
    fn test_select_buffers_rows() {
        let (_dir, mut conn) = users_db(Driver::Json);
        conn.query("SELECT name FROM users WHERE age > 18").unwrap();
        assert_eq!(conn.row_count(), 1);
        assert_eq!(conn.column_count(), 1);
        assert_eq!(conn.affected_rows(), None);

        let first = conn.fetch(FetchStyle::Assoc).unwrap();
        assert_eq!(first, Some(Fetched::Assoc(row! { "name" => "Ann" })));
        assert_eq!(conn.fetch(FetchStyle::Assoc).unwrap(), None);
    }

    #[test]
    fn test_dml_reports_affected_rows() {
        let (_dir, mut conn) = users_db(Driver::Json);
        assert_eq!(conn.affected_rows(), Some(2));
        conn.query("UPDATE users SET age = 18 WHERE name = 'Bob'").unwrap();
        assert_eq!(conn.affected_rows(), Some(1));
        conn.query("DELETE FROM users WHERE age >= 18").unwrap();
        assert_eq!(conn.affected_rows(), Some(2));
        conn.query("DELETE FROM users WHERE age >= 18").unwrap();
        assert_eq!(conn.affected_rows(), Some(0));
    }

    #[test]
    fn test_changes_stay_in_memory_until_saved() {
        let (dir, mut conn) = users_db(Driver::Json);
        let path = dir.path().join("users.json");
        assert_eq!(fs::read_to_string(&path).unwrap(), "[]");

        assert!(conn.save(None).unwrap());
        let saved: Vec<Row> = serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(saved.len(), 2);
    }

    #[test]
    fn test_load_discards_unsaved_changes() {
        let (_dir, mut conn) = users_db(Driver::Yaml);
        conn.save(Some("users")).unwrap();
        conn.query("DELETE FROM users").unwrap();
        assert!(conn.get_data().unwrap().is_empty());
        assert_eq!(conn.load("users").unwrap().len(), 2);
    }

    #[test]
    fn test_set_data_replaces_current_table() {
        let (_dir, mut conn) = users_db(Driver::Csv);
        conn.set_data(vec![row! { "id" => 9 }]).unwrap();
        conn.query("SELECT COUNT(*) AS n FROM users").unwrap();
        let n = conn.fetch_column(Some("n")).unwrap();
        assert_eq!(n, Some(Value::Integer(1)));
    }

    #[test]
    fn test_query_string_tracks_last_statement() {
        let (_dir, mut conn) = users_db(Driver::Json);
        conn.query("SELECT * FROM users;").unwrap();
        assert_eq!(conn.query_string(), "SELECT * FROM users;");
        conn.set_query_string("custom");
        assert_eq!(conn.query_string(), "custom");
    }

    #[test]
    fn test_join_qualifies_colliding_columns() {
        let (_dir, mut conn) = users_db(Driver::Json);
        conn.query("INSERT INTO orders (id, user_id, item) VALUES (10, 1, 'tea')").unwrap();
        conn.query("SELECT name, item, `orders.id` FROM users, orders WHERE name = 'Ann'").unwrap();
        let rows: Vec<Row> = conn
            .fetch_all(FetchStyle::Assoc)
            .unwrap()
            .into_iter()
            .filter_map(Fetched::into_assoc)
            .collect();
        assert_eq!(rows, vec![row! { "name" => "Ann", "item" => "tea", "orders.id" => 10 }]);
    }

    #[test]
    fn test_tables_lists_files_and_session_tables() {
        let (dir, mut conn) = users_db(Driver::Csv);
        fs::write(dir.path().join("archive.csv"), "id\n1\n").unwrap();
        conn.query("SELECT * FROM archive").unwrap();
        assert_eq!(conn.tables().unwrap(), vec!["archive", "users"]);
    }

    #[test]
    fn test_memory_database() {
        let mut conn = Connection::open(ConnectionConfig::new(Driver::Json, "memory")).unwrap();
        conn.query("INSERT INTO t (a) VALUES (1)").unwrap();
        assert!(conn.save(None).unwrap());
        conn.query("SELECT a FROM t").unwrap();
        assert_eq!(conn.fetch_column(None).unwrap(), Some(Value::Integer(1)));
        conn.disconnect();
        assert!(!conn.is_connected());
    }
}
