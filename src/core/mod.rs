// Module declarations
pub mod error;
pub mod value;
pub mod data_type;
pub mod row;
pub mod table;
pub mod config;

// Re-exports for convenience
pub use error::DatabaseError;
pub use value::Value;
pub use data_type::DataType;
pub use row::Row;
pub use table::Table;
pub use config::{ConnectionConfig, Driver};

#[cfg(test)]
mod tests {
    use super::*;
    use std::cmp::Ordering;

    #[test]
    fn test_value_display() {
        assert_eq!(Value::Null.to_string(), "NULL");
        assert_eq!(Value::Integer(42).to_string(), "42");
        assert_eq!(Value::Float(3.5).to_string(), "3.5");
        assert_eq!(Value::Text("hello".to_string()).to_string(), "hello");
        assert_eq!(Value::Boolean(true).to_string(), "true");
        assert_eq!(Value::List(vec![Value::Integer(1), Value::from("a")]).to_string(), "[1,\"a\"]");
    }

    #[test]
    fn test_value_accessors() {
        assert_eq!(Value::Integer(42).as_int(), Some(42));
        assert_eq!(Value::Text("hello".to_string()).as_int(), None);
        assert_eq!(Value::Text("hello".to_string()).as_text(), Some("hello"));
        assert_eq!(Value::Boolean(false).as_bool(), Some(false));
        assert_eq!(Value::Text(" 17 ".to_string()).as_number(), Some(17.0));
    }

    #[test]
    fn test_loose_equality_across_text_and_numbers() {
        assert!(Value::from("30").loose_eq(&Value::Integer(30)));
        assert!(Value::Float(2.0).loose_eq(&Value::Integer(2)));
        assert!(Value::from("true").loose_eq(&Value::Boolean(true)));
        assert!(!Value::from("Ann").loose_eq(&Value::Integer(0)));
        assert!(Value::Null.loose_eq(&Value::Null));
        assert!(!Value::Null.loose_eq(&Value::Integer(0)));
    }

    #[test]
    fn test_compare() {
        assert_eq!(Value::from("30").compare(&Value::Integer(18)).unwrap(), Some(Ordering::Greater));
        assert_eq!(Value::from("Ann").compare(&Value::from("Bob")).unwrap(), Some(Ordering::Less));
        assert_eq!(Value::Null.compare(&Value::Integer(1)).unwrap(), None);
        assert!(matches!(
            Value::List(vec![]).compare(&Value::Integer(1)),
            Err(DatabaseError::InvalidPredicate(_))
        ));
        assert_eq!(Value::Null.sort_cmp(&Value::Integer(-5)), Ordering::Less);
    }

    #[test]
    fn test_literal_rendering() {
        assert_eq!(Value::from("O'Brien").to_literal(), "'O''Brien'");
        assert_eq!(Value::Float(2.0).to_literal(), "2.0");
        assert_eq!(Value::Boolean(true).to_literal(), "TRUE");
        assert_eq!(Value::List(vec![Value::Integer(1), Value::Null]).to_literal(), "[1, NULL]");
    }

    #[test]
    fn test_value_json_untagged() {
        let v: Value = serde_json::from_str(r#"{"a": [1, 2.5, "x", null, true]}"#).unwrap();
        let Value::Map(map) = v else { panic!("expected map") };
        assert_eq!(
            map["a"],
            Value::List(vec![
                Value::Integer(1),
                Value::Float(2.5),
                Value::from("x"),
                Value::Null,
                Value::Boolean(true),
            ])
        );
    }

    #[test]
    fn test_row_project_preserves_requested_order() {
        let row = crate::row! { "a" => 1, "b" => 2 };
        let projected = row.project(&["b".to_string(), "a".to_string(), "c".to_string()]);
        assert_eq!(projected.keys().collect::<Vec<_>>(), vec!["b", "a", "c"]);
        assert_eq!(projected.get("c"), Some(&Value::Null));
    }

    #[test]
    fn test_row_merge() {
        let mut row = crate::row! { "id" => 1, "name" => "Ann" };
        row.merge(&crate::row! { "name" => "Anna", "age" => 31 });
        assert_eq!(row.keys().collect::<Vec<_>>(), vec!["id", "name", "age"]);
        assert_eq!(row.get("name"), Some(&Value::from("Anna")));
    }

    #[test]
    fn test_table_columns_union() {
        let mut table = Table::new("users");
        table.insert(crate::row! { "id" => 1, "name" => "Ann" });
        table.insert(crate::row! { "id" => 2, "email" => "b@x" });
        assert_eq!(table.columns(), vec!["id", "name", "email"]);
        assert_eq!(table.len(), 2);
    }

    #[test]
    fn test_data_type_coercion() {
        assert_eq!(DataType::Integer.coerce(Value::from("42")), Ok(Value::Integer(42)));
        assert_eq!(DataType::Float.coerce(Value::from("1.5")), Ok(Value::Float(1.5)));
        assert_eq!(DataType::Boolean.coerce(Value::from("yes")), Ok(Value::Boolean(true)));
        assert_eq!(DataType::Integer.coerce(Value::from("")), Ok(Value::Null));
        assert_eq!(DataType::Text.coerce(Value::from("")), Ok(Value::from("")));
        assert_eq!(
            DataType::Json.coerce(Value::from("[1,2]")),
            Ok(Value::List(vec![Value::Integer(1), Value::Integer(2)]))
        );
        assert!(DataType::Integer.coerce(Value::from("abc")).is_err());
        assert_eq!(DataType::from_schema_name("Long"), Some(DataType::Integer));
        assert_eq!(DataType::from_schema_name("Blob"), None);
    }
}
