/// Relational operations over an in-memory row sequence
///
/// `DataProcessor` holds a working set and the last predicate applied to it.
/// Predicates are evaluated for every row before anything is mutated, so an
/// invalid predicate leaves the working set untouched.

use crate::parser::{Condition, SelectColumn, SelectStatement, SortOrder, parse_condition};
use crate::types::{DatabaseError, Row};
use super::aggregate::{group_rows, GroupedRow};
use super::conditions::ConditionEvaluator;

#[derive(Debug, Clone, Default)]
pub struct DataProcessor {
    data: Vec<Row>,
    predicate: Option<Condition>,
}

impl DataProcessor {
    #[must_use]
    pub fn new(data: Vec<Row>) -> Self {
        Self {
            data,
            predicate: None,
        }
    }

    /// Projects every row onto `columns` in the given order. `*` anywhere in
    /// the list (or an empty list) keeps rows as they are.
    pub fn select(&mut self, columns: &[String]) {
        if columns.is_empty() || columns.iter().any(|c| c == "*") {
            return;
        }
        for row in &mut self.data {
            *row = row.project(columns);
        }
    }

    /// Keeps the rows satisfying `condition`.
    pub fn where_clause(&mut self, condition: Condition) -> Result<(), DatabaseError> {
        let matches = self.matching(Some(&condition))?;
        let mut flags = matches.into_iter();
        self.data.retain(|_| flags.next().unwrap_or(false));
        self.predicate = Some(condition);
        Ok(())
    }

    /// Same as [`Self::where_clause`] with a textual predicate.
    pub fn where_str(&mut self, predicate: &str) -> Result<(), DatabaseError> {
        self.where_clause(parse_condition(predicate)?)
    }

    /// Appends `row`. Rows with a blank column name are rejected with `false`.
    pub fn insert(&mut self, row: Row) -> bool {
        if row.keys().any(|k| k.trim().is_empty()) {
            return false;
        }
        self.data.push(row);
        true
    }

    /// Merges `changes` into every matching row; returns how many matched.
    pub fn update(&mut self, changes: &Row, condition: Option<&Condition>) -> Result<usize, DatabaseError> {
        let matches = self.matching(condition)?;
        let mut count = 0;
        for (row, matched) in self.data.iter_mut().zip(matches) {
            if matched {
                row.merge(changes);
                count += 1;
            }
        }
        Ok(count)
    }

    /// Removes every matching row, keeping the order of the rest.
    pub fn delete(&mut self, condition: Option<&Condition>) -> Result<usize, DatabaseError> {
        let matches = self.matching(condition)?;
        let before = self.data.len();
        let mut flags = matches.into_iter();
        self.data.retain(|_| !flags.next().unwrap_or(false));
        Ok(before - self.data.len())
    }

    #[must_use]
    pub fn get_data(&self) -> &[Row] {
        &self.data
    }

    #[must_use]
    pub fn into_data(self) -> Vec<Row> {
        self.data
    }

    #[must_use]
    pub const fn predicate(&self) -> Option<&Condition> {
        self.predicate.as_ref()
    }

    fn matching(&self, condition: Option<&Condition>) -> Result<Vec<bool>, DatabaseError> {
        match condition {
            None => Ok(vec![true; self.data.len()]),
            Some(cond) => self
                .data
                .iter()
                .map(|row| ConditionEvaluator::evaluate(row, cond))
                .collect(),
        }
    }

    /// Runs a SELECT over the working set.
    ///
    /// Execution order:
    /// 1. WHERE filter
    /// 2. GROUP BY / aggregates, then HAVING
    /// 3. ORDER BY (on source columns and output aliases)
    /// 4. projection
    /// 5. DISTINCT
    /// 6. OFFSET / LIMIT
    pub fn execute_select(mut self, stmt: &SelectStatement) -> Result<Vec<Row>, DatabaseError> {
        if let Some(filter) = &stmt.filter {
            self.where_clause(filter.clone())?;
        }

        let mut entries: Vec<GroupedRow> = if !stmt.group_by.is_empty() || stmt.has_aggregates() {
            let grouped = group_rows(&self.data, &stmt.group_by, &stmt.columns)?;
            match &stmt.having {
                Some(having) => {
                    let mut kept = Vec::with_capacity(grouped.len());
                    for entry in grouped {
                        if ConditionEvaluator::evaluate(&entry.context, having)? {
                            kept.push(entry);
                        }
                    }
                    kept
                }
                None => grouped,
            }
        } else {
            self.data
                .into_iter()
                .map(|row| {
                    let output = project(&row, &stmt.columns);
                    let mut context = row;
                    context.merge(&output);
                    GroupedRow { output, context }
                })
                .collect()
        };

        if !stmt.order_by.is_empty() {
            entries.sort_by(|a, b| compare_entries(&a.context, &b.context, &stmt.order_by));
        }

        let mut rows: Vec<Row> = entries.into_iter().map(|e| e.output).collect();

        if stmt.distinct {
            let mut unique: Vec<Row> = Vec::with_capacity(rows.len());
            for row in rows {
                if !unique.contains(&row) {
                    unique.push(row);
                }
            }
            rows = unique;
        }

        let offset = stmt.offset.unwrap_or(0);
        let count = stmt.limit.unwrap_or(usize::MAX);
        Ok(rows.into_iter().skip(offset).take(count).collect())
    }
}

/// Projects one row through a select list; aliases rename, `*` copies all.
fn project(row: &Row, columns: &[SelectColumn]) -> Row {
    if columns.is_empty() {
        return row.clone();
    }
    let mut out = Row::new();
    for column in columns {
        match column {
            SelectColumn::All => out.merge(row),
            SelectColumn::Regular { name, .. } => {
                out.insert(column.output_name().unwrap_or_else(|| name.clone()), row.get_or_null(name));
            }
            // only reachable through the grouped path
            SelectColumn::Aggregate { .. } => {}
        }
    }
    out
}

fn compare_entries(a: &Row, b: &Row, order_by: &[(String, SortOrder)]) -> std::cmp::Ordering {
    for (column, order) in order_by {
        let ordering = a.get_or_null(column).sort_cmp(&b.get_or_null(column));
        let ordering = match order {
            SortOrder::Asc => ordering,
            SortOrder::Desc => ordering.reverse(),
        };
        if ordering.is_ne() {
            return ordering;
        }
    }
    std::cmp::Ordering::Equal
}

/// Cartesian product of several tables. Columns of a later table that collide
/// with earlier ones are qualified as `table.column`.
#[must_use]
pub fn cross_join(sources: Vec<(String, Vec<Row>)>) -> Vec<Row> {
    let mut sources = sources.into_iter();
    let Some((_, mut joined)) = sources.next() else {
        return Vec::new();
    };

    for (table, rows) in sources {
        let mut next = Vec::with_capacity(joined.len() * rows.len());
        for left in &joined {
            for right in &rows {
                let mut merged = left.clone();
                for (column, value) in right.iter() {
                    if merged.contains_key(column) {
                        merged.insert(format!("{table}.{column}"), value.clone());
                    } else {
                        merged.insert(column, value.clone());
                    }
                }
                next.push(merged);
            }
        }
        joined = next;
    }
    joined
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::{parse_statement, Statement};
    use crate::row;
    use crate::types::Value;

    fn users() -> Vec<Row> {
        vec![
            row! { "id" => 1, "name" => "Ann", "age" => 30 },
            row! { "id" => 2, "name" => "Bob", "age" => 17 },
            row! { "id" => 3, "name" => "Cid", "age" => 40 },
            row! { "id" => 4, "name" => "Dee", "age" => 17 },
        ]
    }

    fn run(sql: &str, rows: Vec<Row>) -> Vec<Row> {
        let Statement::Select(stmt) = parse_statement(sql).unwrap() else { panic!("not a select") };
        DataProcessor::new(rows).execute_select(&stmt).unwrap()
    }

    #[test]
    fn test_select_preserves_requested_order() {
        let mut p = DataProcessor::new(vec![row! { "a" => 1, "b" => 2 }]);
        p.select(&["b".to_string(), "a".to_string()]);
        assert_eq!(p.get_data()[0].keys().collect::<Vec<_>>(), vec!["b", "a"]);
    }

    #[test]
    fn test_select_star_is_unrestricted() {
        let mut p = DataProcessor::new(users());
        p.select(&["*".to_string()]);
        assert_eq!(p.get_data()[0].len(), 3);
    }

    #[test]
    fn test_where_filters_and_remembers_predicate() {
        let mut p = DataProcessor::new(users());
        p.where_str("age > 18").unwrap();
        assert_eq!(p.get_data().len(), 2);
        assert!(p.predicate().is_some());
    }

    #[test]
    fn test_invalid_predicate_does_not_mutate() {
        let mut rows = users();
        rows[2].insert("tags", Value::List(vec![]));
        let mut p = DataProcessor::new(rows);
        let cond = parse_condition("tags > 1").unwrap();
        assert!(matches!(p.delete(Some(&cond)), Err(DatabaseError::InvalidPredicate(_))));
        assert_eq!(p.get_data().len(), 4);
        assert!(p.where_str("age >>> 1").is_err());
        assert_eq!(p.get_data().len(), 4);
    }

    #[test]
    fn test_insert_appends_without_uniqueness() {
        let mut p = DataProcessor::new(users());
        assert!(p.insert(row! { "id" => 1, "name" => "Dup" }));
        assert!(!p.insert(row! { " " => 1 }));
        assert_eq!(p.get_data().len(), 5);
        assert_eq!(p.get_data()[4].get("name"), Some(&Value::from("Dup")));
    }

    #[test]
    fn test_update_merges_and_counts() {
        let mut p = DataProcessor::new(users());
        let cond = parse_condition("age = 17").unwrap();
        let n = p.update(&row! { "minor" => true, "age" => 18 }, Some(&cond)).unwrap();
        assert_eq!(n, 2);
        assert_eq!(p.get_data()[1].get("age"), Some(&Value::Integer(18)));
        assert_eq!(p.get_data()[1].get("minor"), Some(&Value::Boolean(true)));
        assert!(!p.get_data()[0].contains_key("minor"));
    }

    #[test]
    fn test_delete_counts_and_keeps_order() {
        let mut p = DataProcessor::new(users());
        let cond = parse_condition("age = 17").unwrap();
        assert_eq!(p.delete(Some(&cond)).unwrap(), 2);
        let names: Vec<_> = p.get_data().iter().map(|r| r.get_or_null("name")).collect();
        assert_eq!(names, vec![Value::from("Ann"), Value::from("Cid")]);
        assert_eq!(p.delete(Some(&cond)).unwrap(), 0);
    }

    #[test]
    fn test_execute_select_end_to_end() {
        let rows = run("SELECT name FROM users WHERE age > 18", users());
        assert_eq!(rows, vec![row! { "name" => "Ann" }, row! { "name" => "Cid" }]);
    }

    #[test]
    fn test_order_by_unselected_column_then_limit() {
        let rows = run("SELECT name FROM users ORDER BY age DESC, id LIMIT 1, 2", users());
        assert_eq!(rows, vec![row! { "name" => "Ann" }, row! { "name" => "Bob" }]);
    }

    #[test]
    fn test_distinct_after_projection() {
        let rows = run("SELECT DISTINCT age FROM users ORDER BY age", users());
        assert_eq!(rows.len(), 3);
        assert_eq!(rows[0].get("age"), Some(&Value::Integer(17)));
    }

    #[test]
    fn test_group_by_with_having_and_alias_order() {
        let rows = run(
            "SELECT age, COUNT(*) AS n FROM users GROUP BY age HAVING n > 1 ORDER BY n DESC",
            users(),
        );
        assert_eq!(rows, vec![row! { "age" => 17, "n" => 2usize }]);
    }

    #[test]
    fn test_alias_rename() {
        let rows = run("SELECT name AS who FROM users WHERE id = 2", users());
        assert_eq!(rows, vec![row! { "who" => "Bob" }]);
    }

    #[test]
    fn test_cross_join_qualifies_collisions() {
        let left = vec![row! { "id" => 1, "name" => "Ann" }];
        let right = vec![row! { "id" => 9, "sku" => "x" }, row! { "id" => 8, "sku" => "y" }];
        let joined = cross_join(vec![("users".into(), left), ("items".into(), right)]);
        assert_eq!(joined.len(), 2);
        assert_eq!(joined[0].get("items.id"), Some(&Value::Integer(9)));
        assert_eq!(joined[1].get("sku"), Some(&Value::from("y")));
        assert_eq!(joined[1].get("id"), Some(&Value::Integer(1)));
    }
}
