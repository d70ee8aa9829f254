//! Row formatting for `fetch`/`fetch_all`.
//!
//! Result rows are always stored associatively; a [`FetchStyle`] picks the
//! shape handed to the caller, and formatting happens per consumed row.

use serde_json::Map;

use crate::types::{DatabaseError, Row, Value};

/// Fetch style tags shared by every engine. The numeric codes are stable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[repr(i32)]
pub enum FetchStyle {
    #[default]
    Assoc = 2,
    Num = 3,
    Both = 4,
    Obj = 5,
    Column = 7,
    Class = 8,
    Into = 9,
}

impl FetchStyle {
    #[must_use]
    pub const fn code(self) -> i32 {
        self as i32
    }
}

impl TryFrom<i32> for FetchStyle {
    type Error = DatabaseError;

    fn try_from(code: i32) -> Result<Self, Self::Error> {
        match code {
            2 => Ok(Self::Assoc),
            3 => Ok(Self::Num),
            4 => Ok(Self::Both),
            5 => Ok(Self::Obj),
            7 => Ok(Self::Column),
            8 => Ok(Self::Class),
            9 => Ok(Self::Into),
            other => Err(DatabaseError::UnsupportedFetchStyle(format!("code {other}"))),
        }
    }
}

/// Key of a `Both` entry: positional index or column name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldKey {
    Index(usize),
    Name(String),
}

/// One row shaped by a fetch style.
#[derive(Debug, Clone, PartialEq)]
pub enum Fetched {
    Assoc(Row),
    Num(Vec<Value>),
    /// index 0, key 0, index 1, key 1, ... each paired with its value
    Both(Vec<(FieldKey, Value)>),
    Obj(Map<String, serde_json::Value>),
    Column(Value),
}

impl Fetched {
    #[must_use]
    pub fn into_assoc(self) -> Option<Row> {
        match self {
            Self::Assoc(row) => Some(row),
            _ => None,
        }
    }

    #[must_use]
    pub fn into_values(self) -> Option<Vec<Value>> {
        match self {
            Self::Num(values) => Some(values),
            _ => None,
        }
    }

    #[must_use]
    pub fn into_value(self) -> Option<Value> {
        match self {
            Self::Column(value) => Some(value),
            _ => None,
        }
    }
}

/// Something a row's columns can be written into (`FetchStyle::Into`).
pub trait RowTarget {
    fn assign(&mut self, column: &str, value: Value) -> Result<(), DatabaseError>;
}

/// A type built fresh for every fetched row (`FetchStyle::Class`).
pub trait RowClass: RowTarget + Sized {
    type Args: Clone;

    fn construct(args: Self::Args) -> Self;
}

impl RowTarget for Row {
    fn assign(&mut self, column: &str, value: Value) -> Result<(), DatabaseError> {
        self.insert(column, value);
        Ok(())
    }
}

impl RowClass for Row {
    type Args = ();

    fn construct((): ()) -> Self {
        Self::new()
    }
}

impl RowTarget for Map<String, serde_json::Value> {
    fn assign(&mut self, column: &str, value: Value) -> Result<(), DatabaseError> {
        self.insert(column.to_string(), value.into());
        Ok(())
    }
}

/// Shapes one associative row. `Column` takes the first value; `Class` and
/// `Into` need a target and go through [`instantiate`] / [`hydrate`].
pub fn format_row(row: Row, style: FetchStyle) -> Result<Fetched, DatabaseError> {
    match style {
        FetchStyle::Assoc => Ok(Fetched::Assoc(row)),
        FetchStyle::Num => Ok(Fetched::Num(row.into_iter().map(|(_, v)| v).collect())),
        FetchStyle::Both => {
            let mut entries = Vec::with_capacity(row.len() * 2);
            for (index, (key, value)) in row.into_iter().enumerate() {
                entries.push((FieldKey::Index(index), value.clone()));
                entries.push((FieldKey::Name(key), value));
            }
            Ok(Fetched::Both(entries))
        }
        FetchStyle::Obj => Ok(Fetched::Obj(
            row.into_iter().map(|(k, v)| (k, v.into())).collect(),
        )),
        FetchStyle::Column => format_column(row, None).map(Fetched::Column),
        FetchStyle::Class | FetchStyle::Into => Err(DatabaseError::UnsupportedFetchStyle(format!(
            "{style:?} needs a target type"
        ))),
    }
}

/// The named column, or the first value when `column` is `None`.
pub fn format_column(mut row: Row, column: Option<&str>) -> Result<Value, DatabaseError> {
    match column {
        Some(name) => row
            .remove(name)
            .ok_or_else(|| DatabaseError::ColumnNotFound(name.to_string())),
        None => row
            .into_iter()
            .next()
            .map(|(_, v)| v)
            .ok_or_else(|| DatabaseError::ColumnNotFound("0".to_string())),
    }
}

/// Assigns every column of `row` to an existing target.
pub fn hydrate<T: RowTarget + ?Sized>(target: &mut T, row: Row) -> Result<(), DatabaseError> {
    for (column, value) in row {
        target.assign(&column, value)?;
    }
    Ok(())
}

/// Builds a fresh `T` from `args` and assigns every column of `row`.
pub fn instantiate<T: RowClass>(args: T::Args, row: Row) -> Result<T, DatabaseError> {
    let mut target = T::construct(args);
    hydrate(&mut target, row)?;
    Ok(target)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::row;

    fn sample() -> Row {
        row! { "id" => 1, "name" => "x" }
    }

    #[derive(Debug, Default)]
    struct User {
        prefix: String,
        id: i64,
        name: String,
    }

    impl RowTarget for User {
        fn assign(&mut self, column: &str, value: Value) -> Result<(), DatabaseError> {
            match (column, value) {
                ("id", Value::Integer(id)) => self.id = id,
                ("name", Value::Text(name)) => self.name = format!("{}{name}", self.prefix),
                (field, value) => {
                    return Err(DatabaseError::FieldAssignment {
                        field: field.to_string(),
                        reason: format!("unexpected {value}"),
                    })
                }
            }
            Ok(())
        }
    }

    impl RowClass for User {
        type Args = String;

        fn construct(prefix: String) -> Self {
            Self { prefix, ..Self::default() }
        }
    }

    #[test]
    fn test_num_style() {
        let fetched = format_row(sample(), FetchStyle::Num).unwrap();
        assert_eq!(fetched, Fetched::Num(vec![Value::Integer(1), Value::from("x")]));
    }

    #[test]
    fn test_both_style_interleaves_index_then_key() {
        let Fetched::Both(entries) = format_row(sample(), FetchStyle::Both).unwrap() else {
            panic!("expected both");
        };
        assert_eq!(
            entries,
            vec![
                (FieldKey::Index(0), Value::Integer(1)),
                (FieldKey::Name("id".into()), Value::Integer(1)),
                (FieldKey::Index(1), Value::from("x")),
                (FieldKey::Name("name".into()), Value::from("x")),
            ]
        );
    }

    #[test]
    fn test_obj_style() {
        let Fetched::Obj(obj) = format_row(sample(), FetchStyle::Obj).unwrap() else {
            panic!("expected object");
        };
        assert_eq!(obj["name"], serde_json::json!("x"));
        assert_eq!(obj.keys().collect::<Vec<_>>(), vec!["id", "name"]);
    }

    #[test]
    fn test_column_style() {
        assert_eq!(format_column(sample(), Some("name")).unwrap(), Value::from("x"));
        assert_eq!(
            format_row(sample(), FetchStyle::Column).unwrap().into_value(),
            Some(Value::Integer(1))
        );
        assert!(matches!(
            format_column(sample(), Some("age")),
            Err(DatabaseError::ColumnNotFound(_))
        ));
    }

    #[test]
    fn test_class_and_into() {
        let user: User = instantiate("Dr. ".to_string(), sample()).unwrap();
        assert_eq!((user.id, user.name.as_str()), (1, "Dr. x"));

        let mut existing = User::default();
        hydrate(&mut existing, row! { "id" => 5 }).unwrap();
        assert_eq!(existing.id, 5);
        assert!(hydrate(&mut existing, row! { "id" => "five" }).is_err());

        assert!(matches!(
            format_row(sample(), FetchStyle::Class),
            Err(DatabaseError::UnsupportedFetchStyle(_))
        ));
    }

    #[test]
    fn test_style_codes() {
        assert_eq!(FetchStyle::try_from(4).unwrap(), FetchStyle::Both);
        assert_eq!(FetchStyle::Column.code(), 7);
        assert!(FetchStyle::try_from(1).is_err());
    }
}
