use serde_json::{Map, Value};

use crate::table::{Record, RowSet};

use super::ExportError;

/// Serializes the store as a pretty-printed JSON array of objects, keys in
/// the store's current column order and missing cells blank.
pub fn export(rowset: &RowSet) -> Result<String, ExportError> {
    if rowset.is_empty() {
        return Err(ExportError::EmptyData);
    }
    serde_json::to_string_pretty(&to_value(rowset)).map_err(|err| ExportError::Serialize {
        detail: err.to_string(),
    })
}

/// Builds the JSON array view of the store. Object key order follows the
/// column list, which `serde_json`'s preserve_order map keeps on the wire.
pub fn to_value(rowset: &RowSet) -> Value {
    let rows: Vec<Value> = (0..rowset.len())
        .map(|row| {
            let mut object = Map::with_capacity(rowset.columns().len());
            for column in rowset.columns() {
                object.insert(
                    column.clone(),
                    Value::String(rowset.cell(row, column).to_string()),
                );
            }
            Value::Object(object)
        })
        .collect();
    Value::Array(rows)
}

/// Interprets a JSON array of objects as records, coercing every cell to a
/// string. Returns the records plus the union of keys in first-seen order;
/// `None` when the value is not an array of objects.
pub fn records_from_value(value: &Value) -> Option<(Vec<Record>, Vec<String>)> {
    let rows = value.as_array()?;
    let mut records = Vec::with_capacity(rows.len());
    let mut columns: Vec<String> = Vec::new();
    for row in rows {
        let object = row.as_object()?;
        let mut record = Record::with_capacity(object.len());
        for (key, cell) in object {
            if !columns.iter().any(|c| c == key) {
                columns.push(key.clone());
            }
            record.insert(key.clone(), coerce_to_string(cell));
        }
        records.push(record);
    }
    Some((records, columns))
}

/// Cell coercion used when data comes back from JSON: strings pass through,
/// scalars render with their display form, null goes blank, nested values
/// keep their compact JSON text.
fn coerce_to_string(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Null => String::new(),
        Value::Array(_) | Value::Object(_) => value.to_string(),
    }
}
