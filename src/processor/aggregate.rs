/// GROUP BY and aggregate functions over schemaless rows.

use crate::parser::{AggregateFunction, CountTarget, SelectColumn};
use crate::types::{DatabaseError, Row, Value};

/// One output row of a grouped query plus the row HAVING and ORDER BY see:
/// the group's first source row overlaid with the output columns.
pub struct GroupedRow {
    pub output: Row,
    pub context: Row,
}

/// Groups `rows` by `group_by` (first-appearance order) and projects each
/// group through `columns`. With no GROUP BY every row falls into one group,
/// which still yields a row when `rows` is empty (`COUNT(*)` is 0).
pub fn group_rows(
    rows: &[Row],
    group_by: &[String],
    columns: &[SelectColumn],
) -> Result<Vec<GroupedRow>, DatabaseError> {
    let mut groups: Vec<(Vec<Value>, Vec<&Row>)> = Vec::new();

    for row in rows {
        let key: Vec<Value> = group_by.iter().map(|c| row.get_or_null(c)).collect();
        match groups.iter_mut().find(|(k, _)| *k == key) {
            Some((_, members)) => members.push(row),
            None => groups.push((key, vec![row])),
        }
    }

    if groups.is_empty() && group_by.is_empty() {
        groups.push((Vec::new(), Vec::new()));
    }

    groups
        .into_iter()
        .map(|(_, members)| project_group(&members, columns))
        .collect()
}

fn project_group(members: &[&Row], columns: &[SelectColumn]) -> Result<GroupedRow, DatabaseError> {
    let first = members.first().map(|r| (*r).clone()).unwrap_or_default();
    let mut output = Row::new();
    // aliased aggregates stay reachable under their call text, e.g. `COUNT(*)`
    let mut calls = Row::new();

    for column in columns {
        match column {
            SelectColumn::All => output.merge(&first),
            SelectColumn::Regular { name, .. } => {
                output.insert(column_key(column), first.get_or_null(name));
            }
            SelectColumn::Aggregate { function, alias } => {
                let value = compute(function, members)?;
                if alias.is_some() {
                    calls.insert(function.to_string(), value.clone());
                }
                output.insert(column_key(column), value);
            }
        }
    }

    let mut context = first;
    context.merge(&calls);
    context.merge(&output);
    Ok(GroupedRow { output, context })
}

fn column_key(column: &SelectColumn) -> String {
    column.output_name().unwrap_or_default()
}

/// Evaluates one aggregate over a group. Values that are not numeric are
/// skipped by SUM and AVG.
pub fn compute(function: &AggregateFunction, members: &[&Row]) -> Result<Value, DatabaseError> {
    let column_values = |col: &str| -> Vec<Value> {
        members
            .iter()
            .map(|r| r.get_or_null(col))
            .filter(|v| !v.is_null())
            .collect()
    };

    let value = match function {
        AggregateFunction::Count(CountTarget::All) => Value::from(members.len()),
        AggregateFunction::Count(CountTarget::Column(col)) => Value::from(column_values(col.as_str()).len()),
        AggregateFunction::Sum(col) => {
            let values = column_values(col.as_str());
            if values.iter().any(Value::is_composite) {
                return Err(DatabaseError::InvalidPredicate(format!("SUM over non-scalar column '{col}'")));
            }
            if values.iter().all(|v| matches!(v, Value::Integer(_))) {
                if values.is_empty() {
                    Value::Null
                } else {
                    sum_integers(&values)
                }
            } else {
                let numbers: Vec<f64> = values.iter().filter_map(Value::as_number).collect();
                if numbers.is_empty() {
                    Value::Null
                } else {
                    Value::Float(numbers.iter().sum())
                }
            }
        }
        AggregateFunction::Avg(col) => {
            let numbers: Vec<f64> = column_values(col.as_str()).iter().filter_map(Value::as_number).collect();
            if numbers.is_empty() {
                Value::Null
            } else {
                Value::Float(numbers.iter().sum::<f64>() / numbers.len() as f64)
            }
        }
        AggregateFunction::Min(col) => column_values(col.as_str())
            .into_iter()
            .min_by(Value::sort_cmp)
            .unwrap_or(Value::Null),
        AggregateFunction::Max(col) => column_values(col.as_str())
            .into_iter()
            .max_by(Value::sort_cmp)
            .unwrap_or(Value::Null),
    };
    Ok(value)
}

/// Integer sum, switching to float accumulation once i64 would overflow.
fn sum_integers(values: &[Value]) -> Value {
    let exact = values
        .iter()
        .filter_map(Value::as_int)
        .try_fold(0i64, i64::checked_add);
    exact.map_or_else(
        || Value::Float(values.iter().filter_map(Value::as_number).sum()),
        Value::Integer,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::row;

    fn orders() -> Vec<Row> {
        vec![
            row! { "customer" => "ann", "total" => 10 },
            row! { "customer" => "bob", "total" => 5 },
            row! { "customer" => "ann", "total" => 7 },
            row! { "customer" => "cid", "total" => Value::Null },
        ]
    }

    fn agg(function: AggregateFunction, alias: &str) -> SelectColumn {
        SelectColumn::Aggregate { function, alias: Some(alias.to_string()) }
    }

    #[test]
    fn test_group_preserves_first_appearance_order() {
        let columns = vec![
            SelectColumn::Regular { name: "customer".into(), alias: None },
            agg(AggregateFunction::Count(CountTarget::All), "n"),
            agg(AggregateFunction::Sum("total".into()), "sum"),
        ];
        let grouped = group_rows(&orders(), &["customer".to_string()], &columns).unwrap();
        let out: Vec<_> = grouped.into_iter().map(|g| g.output).collect();
        assert_eq!(out.len(), 3);
        assert_eq!(out[0], row! { "customer" => "ann", "n" => 2usize, "sum" => 17 });
        assert_eq!(out[1].get("sum"), Some(&Value::Integer(5)));
        assert_eq!(out[2].get("sum"), Some(&Value::Null));
    }

    #[test]
    fn test_aggregates_without_group_by() {
        let columns = vec![
            SelectColumn::Aggregate { function: AggregateFunction::Count(CountTarget::Column("total".into())), alias: None },
            agg(AggregateFunction::Avg("total".into()), "avg"),
            agg(AggregateFunction::Min("total".into()), "min"),
            agg(AggregateFunction::Max("customer".into()), "max"),
        ];
        let grouped = group_rows(&orders(), &[], &columns).unwrap();
        assert_eq!(grouped.len(), 1);
        let out = &grouped[0].output;
        assert_eq!(out.get("COUNT(total)"), Some(&Value::Integer(3)));
        assert_eq!(out.get("avg"), Some(&Value::Float(22.0 / 3.0)));
        assert_eq!(out.get("min"), Some(&Value::Integer(5)));
        assert_eq!(out.get("max"), Some(&Value::from("cid")));
    }

    #[test]
    fn test_count_over_empty_input() {
        let columns = vec![agg(AggregateFunction::Count(CountTarget::All), "n")];
        let grouped = group_rows(&[], &[], &columns).unwrap();
        assert_eq!(grouped[0].output.get("n"), Some(&Value::Integer(0)));
    }

    #[test]
    fn test_integer_sum_overflow_falls_back_to_float() {
        let rows = vec![row! { "a" => i64::MAX }, row! { "a" => 1 }];
        let columns = vec![agg(AggregateFunction::Sum("a".into()), "total")];
        let grouped = group_rows(&rows, &[], &columns).unwrap();
        assert_eq!(grouped[0].output.get("total"), Some(&Value::Float(i64::MAX as f64 + 1.0)));
    }
}
