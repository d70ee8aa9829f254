//! Query AST to text.
//!
//! The display form carries `?` placeholders plus the bound values; the
//! execution form inlines every value as a literal, since the flat-file
//! engine has no parameter binding.

use super::query::{Limit, Operand, Predicate, PredicateNode, Query, SelectType};
use crate::parser::{is_reserved, SortOrder};
use crate::types::{DatabaseError, Row, Value};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mode {
    Placeholders,
    Inline,
}

struct Renderer {
    mode: Mode,
    params: Vec<Value>,
}

impl Renderer {
    const fn new(mode: Mode) -> Self {
        Self {
            mode,
            params: Vec::new(),
        }
    }

    fn value(&mut self, value: &Value) -> String {
        match self.mode {
            Mode::Placeholders => {
                self.params.push(value.clone());
                "?".to_string()
            }
            Mode::Inline => value.to_literal(),
        }
    }

    fn select(&mut self, query: &Query) -> String {
        let mut sql = String::from("SELECT ");
        if query.select_type == SelectType::Distinct {
            sql.push_str("DISTINCT ");
        }
        if query.columns.is_empty() {
            sql.push('*');
        } else {
            let columns: Vec<String> = query.columns.iter().map(|c| column_expr(c)).collect();
            sql.push_str(&columns.join(", "));
        }

        let tables: Vec<String> = query.from.iter().map(|t| quote_identifier(t)).collect();
        sql.push_str(" FROM ");
        sql.push_str(&tables.join(", "));

        if !query.where_nodes.is_empty() {
            sql.push_str(" WHERE ");
            sql.push_str(&self.nodes(&query.where_nodes));
        }
        if !query.group.is_empty() {
            let group: Vec<String> = query.group.iter().map(|g| quote_identifier(g)).collect();
            sql.push_str(" GROUP BY ");
            sql.push_str(&group.join(", "));
        }
        if !query.having_nodes.is_empty() {
            sql.push_str(" HAVING ");
            sql.push_str(&self.nodes(&query.having_nodes));
        }
        if !query.order.is_empty() {
            let order: Vec<String> = query
                .order
                .iter()
                .map(|(column, direction)| {
                    let direction = match direction {
                        SortOrder::Asc => "ASC",
                        SortOrder::Desc => "DESC",
                    };
                    format!("{} {direction}", expression(column))
                })
                .collect();
            sql.push_str(" ORDER BY ");
            sql.push_str(&order.join(", "));
        }
        match &query.limit {
            Some(Limit::Count(count)) => sql.push_str(&format!(" LIMIT {count}")),
            Some(Limit::Range { offset, count }) => sql.push_str(&format!(" LIMIT {offset}, {count}")),
            Some(Limit::Literal(text)) => sql.push_str(&format!(" LIMIT {text}")),
            None => {}
        }
        sql
    }

    fn nodes(&mut self, nodes: &[PredicateNode]) -> String {
        let wrap_expr = nodes.len() > 1;
        let mut sql = String::new();
        for (i, node) in nodes.iter().enumerate() {
            if i > 0 {
                sql.push_str(node.junction.connector());
            }
            match &node.predicate {
                Predicate::Expr(text) if wrap_expr => sql.push_str(&format!("({text})")),
                Predicate::Expr(text) => sql.push_str(text),
                Predicate::Compare { column, op, operand } => {
                    sql.push_str(&expression(column));
                    sql.push(' ');
                    sql.push_str(op.as_sql());
                    match operand {
                        Operand::None => {}
                        Operand::Value(value) => {
                            sql.push(' ');
                            sql.push_str(&self.value(value));
                        }
                        Operand::List(values) => {
                            let items: Vec<String> = values.iter().map(|v| self.value(v)).collect();
                            sql.push_str(&format!(" ({})", items.join(", ")));
                        }
                        Operand::Range(low, high) => {
                            let low = self.value(low);
                            let high = self.value(high);
                            sql.push_str(&format!(" {low} AND {high}"));
                        }
                    }
                }
                Predicate::Group(inner) => sql.push_str(&format!("({})", self.nodes(inner))),
            }
        }
        sql
    }
}

fn check(query: &Query) -> Result<(), DatabaseError> {
    if let Some(problem) = query.errors.first() {
        return Err(DatabaseError::QueryBuild(problem.clone()));
    }
    if query.from.is_empty() {
        return Err(DatabaseError::QueryBuild("no table to select from".to_string()));
    }
    Ok(())
}

/// Display text with `?` placeholders, and the values bound to them in order.
pub fn build(query: &Query) -> Result<(String, Vec<Value>), DatabaseError> {
    check(query)?;
    let mut renderer = Renderer::new(Mode::Placeholders);
    let sql = renderer.select(query);
    Ok((sql, renderer.params))
}

/// Execution text with every value inlined.
pub fn build_raw(query: &Query) -> Result<String, DatabaseError> {
    check(query)?;
    Ok(Renderer::new(Mode::Inline).select(query))
}

pub fn render_insert(table: &str, row: &Row) -> Result<String, DatabaseError> {
    if row.is_empty() {
        return Err(DatabaseError::QueryBuild(format!("nothing to insert into '{table}'")));
    }
    if row.keys().any(|k| k.trim().is_empty()) {
        return Err(DatabaseError::QueryBuild("blank column name in INSERT".to_string()));
    }
    let columns: Vec<String> = row.keys().map(quote_identifier).collect();
    let values: Vec<String> = row.values().map(Value::to_literal).collect();
    Ok(format!(
        "INSERT INTO {} ({}) VALUES ({})",
        quote_identifier(table),
        columns.join(", "),
        values.join(", ")
    ))
}

pub fn render_update(table: &str, changes: &Row, filter: &[PredicateNode]) -> Result<String, DatabaseError> {
    if changes.is_empty() {
        return Err(DatabaseError::QueryBuild(format!("nothing to update in '{table}'")));
    }
    let assignments: Vec<String> = changes
        .iter()
        .map(|(column, value)| format!("{} = {}", quote_identifier(column), value.to_literal()))
        .collect();
    let mut sql = format!("UPDATE {} SET {}", quote_identifier(table), assignments.join(", "));
    push_filter(&mut sql, filter);
    Ok(sql)
}

pub fn render_delete(table: &str, filter: &[PredicateNode]) -> String {
    let mut sql = format!("DELETE FROM {}", quote_identifier(table));
    push_filter(&mut sql, filter);
    sql
}

fn push_filter(sql: &mut String, filter: &[PredicateNode]) {
    if !filter.is_empty() {
        sql.push_str(" WHERE ");
        sql.push_str(&Renderer::new(Mode::Inline).nodes(filter));
    }
}

/// Bare when the name reads as a plain identifier, backticked otherwise.
#[must_use]
pub fn quote_identifier(name: &str) -> String {
    if name.len() >= 2 && name.starts_with('`') && name.ends_with('`') {
        return name.to_string();
    }
    let mut chars = name.chars();
    let plain = chars.next().is_some_and(|c| c.is_alphabetic() || c == '_')
        && chars.all(|c| c.is_alphanumeric() || c == '_' || c == '.')
        && !is_reserved(name);
    if plain {
        name.to_string()
    } else {
        format!("`{}`", name.replace('`', "``"))
    }
}

/// Column or aggregate call; calls pass through untouched.
fn expression(text: &str) -> String {
    if text.contains('(') {
        text.to_string()
    } else {
        quote_identifier(text)
    }
}

/// One select-list entry, with an optional `AS alias`.
fn column_expr(entry: &str) -> String {
    if entry == "*" {
        return entry.to_string();
    }
    let lower = entry.to_ascii_lowercase();
    match lower.rfind(" as ") {
        Some(at) if !entry[..at].trim().is_empty() => {
            let alias = entry[at + 4..].trim();
            format!("{} AS {}", expression(entry[..at].trim()), quote_identifier(alias))
        }
        _ => expression(entry),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::query::{Junction, Operator};
    use crate::row;

    fn users_query() -> Query {
        let mut query = Query::default();
        query.columns = vec!["name".into(), "COUNT(*) AS n".into()];
        query.from = vec!["users".into()];
        query.where_nodes = vec![
            PredicateNode {
                junction: Junction::None,
                predicate: Predicate::Compare {
                    column: "age".into(),
                    op: Operator::Gt,
                    operand: Operand::Value(Value::from(18)),
                },
            },
            PredicateNode {
                junction: Junction::Or,
                predicate: Predicate::Compare {
                    column: "name".into(),
                    op: Operator::In,
                    operand: Operand::List(vec![Value::from("O'Neil"), Value::from("Bo")]),
                },
            },
        ];
        query.group = vec!["name".into()];
        query.order = vec![("n".into(), SortOrder::Desc)];
        query.limit = Some(Limit::Range { offset: 5, count: 10 });
        query
    }

    #[test]
    fn test_display_uses_placeholders() {
        let (sql, params) = build(&users_query()).unwrap();
        assert_eq!(
            sql,
            "SELECT name, COUNT(*) AS n FROM users WHERE age > ? OR name IN (?, ?) \
             GROUP BY name ORDER BY n DESC LIMIT 5, 10"
        );
        assert_eq!(params, vec![Value::from(18), Value::from("O'Neil"), Value::from("Bo")]);
    }

    #[test]
    fn test_raw_inlines_literals() {
        let sql = build_raw(&users_query()).unwrap();
        assert!(sql.contains("WHERE age > 18 OR name IN ('O''Neil', 'Bo')"), "{sql}");
    }

    #[test]
    fn test_expressions_are_parenthesised_among_siblings() {
        let mut query = Query::default();
        query.from = vec!["t".into()];
        query.where_nodes = vec![
            PredicateNode { junction: Junction::None, predicate: Predicate::Expr("a = 1 OR b = 2".into()) },
            PredicateNode { junction: Junction::None, predicate: Predicate::Expr("c = 3".into()) },
        ];
        assert_eq!(build_raw(&query).unwrap(), "SELECT * FROM t WHERE (a = 1 OR b = 2) AND (c = 3)");
    }

    #[test]
    fn test_identifier_quoting() {
        assert_eq!(quote_identifier("users.name"), "users.name");
        assert_eq!(quote_identifier("full name"), "`full name`");
        assert_eq!(quote_identifier("order"), "`order`");
        assert_eq!(quote_identifier("we`ird"), "`we``ird`");
        assert_eq!(column_expr("total as `sum all`"), "total AS `sum all`");
    }

    #[test]
    fn test_missing_table_is_build_error() {
        let query = Query::default();
        assert!(matches!(build(&query), Err(DatabaseError::QueryBuild(_))));
    }

    #[test]
    fn test_dml_rendering() {
        let sql = render_insert("users", &row! { "id" => 3, "name" => "Cid", "tags" => Value::Null }).unwrap();
        assert_eq!(sql, "INSERT INTO users (id, name, tags) VALUES (3, 'Cid', NULL)");

        let filter = vec![PredicateNode {
            junction: Junction::None,
            predicate: Predicate::Compare {
                column: "id".into(),
                op: Operator::Between,
                operand: Operand::Range(Value::from(1), Value::from(2)),
            },
        }];
        let sql = render_update("users", &row! { "age" => 41 }, &filter).unwrap();
        assert_eq!(sql, "UPDATE users SET age = 41 WHERE id BETWEEN 1 AND 2");
        assert_eq!(render_delete("users", &[]), "DELETE FROM users");
        assert!(render_insert("users", &Row::new()).is_err());
    }
}
