//! Whole-file codecs for the three flat-file drivers.

use crate::types::{DatabaseError, Driver, Row, Value};
use crate::types::table::column_union;

/// Parses the full contents of a table file. Blank content is an empty table.
pub fn decode(driver: Driver, content: &str) -> Result<Vec<Row>, DatabaseError> {
    if content.trim().is_empty() {
        return Ok(Vec::new());
    }
    match driver {
        Driver::Csv => decode_csv(content),
        Driver::Json => Ok(serde_json::from_str(content)?),
        Driver::Yaml => Ok(serde_yaml::from_str(content)?),
    }
}

/// Serializes a full table. Rows need not share keys.
pub fn encode(driver: Driver, rows: &[Row]) -> Result<String, DatabaseError> {
    match driver {
        Driver::Csv => encode_csv(rows),
        Driver::Json => Ok(serde_json::to_string_pretty(rows)?),
        Driver::Yaml => Ok(serde_yaml::to_string(rows)?),
    }
}

/// Every field is read as text, an empty one as NULL; a schema turns them
/// into typed values later.
fn decode_csv(content: &str) -> Result<Vec<Row>, DatabaseError> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(content.as_bytes());

    let headers: Vec<String> = reader.headers()?.iter().map(str::to_string).collect();

    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record?;
        let row: Row = headers
            .iter()
            .zip(record.iter())
            .map(|(h, field)| (h.clone(), csv_field(field)))
            .collect();
        rows.push(row);
    }
    Ok(rows)
}

fn csv_field(field: &str) -> Value {
    if field.is_empty() {
        Value::Null
    } else {
        Value::Text(field.to_string())
    }
}

fn encode_csv(rows: &[Row]) -> Result<String, DatabaseError> {
    let columns = column_union(rows);
    if columns.is_empty() {
        return Ok(String::new());
    }

    let mut writer = csv::WriterBuilder::new().from_writer(Vec::new());
    writer.write_record(&columns)?;
    for row in rows {
        let fields = columns.iter().map(|c| match row.get(c) {
            None | Some(Value::Null) => String::new(),
            Some(v) => v.to_string(),
        });
        writer.write_record(fields)?;
    }

    let bytes = writer.into_inner().map_err(|e| DatabaseError::Io(e.into_error()))?;
    String::from_utf8(bytes).map_err(|e| DatabaseError::ParseError(format!("CSV output is not UTF-8: {e}")))
}
