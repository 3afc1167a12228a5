use crate::table::{Record, RowSet};

use super::{ExportError, ImportError};

/// Parses delimited text into a fresh [`RowSet`]. The first row supplies the
/// headers, later rows the records; empty lines are skipped. On any parse
/// failure nothing is returned, so the caller's store stays untouched.
pub fn import(content: &str) -> Result<RowSet, ImportError> {
    let mut reader = ::csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(false)
        .from_reader(content.as_bytes());

    let headers: Vec<String> = reader
        .headers()
        .map_err(|err| ImportError::Malformed {
            detail: err.to_string(),
        })?
        .iter()
        .map(str::to_string)
        .collect();

    let mut records = Vec::new();
    for row in reader.records() {
        let row = row.map_err(|err| ImportError::Malformed {
            detail: err.to_string(),
        })?;
        let record: Record = headers
            .iter()
            .cloned()
            .zip(row.iter().map(str::to_string))
            .collect();
        records.push(record);
    }

    tracing::debug!(rows = records.len(), columns = headers.len(), "parsed CSV");
    let mut rowset = RowSet::new();
    rowset.replace(records, &headers);
    Ok(rowset)
}

/// Serializes the store back to delimited text: header row, then one line per
/// record with columns in the store's current order and missing cells blank.
pub fn export(rowset: &RowSet) -> Result<String, ExportError> {
    if rowset.is_empty() {
        return Err(ExportError::EmptyData);
    }

    let mut writer = ::csv::Writer::from_writer(Vec::new());
    writer
        .write_record(rowset.columns())
        .map_err(|err| ExportError::Serialize {
            detail: err.to_string(),
        })?;
    for row in 0..rowset.len() {
        let cells: Vec<&str> = rowset
            .columns()
            .iter()
            .map(|column| rowset.cell(row, column))
            .collect();
        writer
            .write_record(&cells)
            .map_err(|err| ExportError::Serialize {
                detail: err.to_string(),
            })?;
    }

    let bytes = writer.into_inner().map_err(|err| ExportError::Serialize {
        detail: err.to_string(),
    })?;
    String::from_utf8(bytes).map_err(|err| ExportError::Serialize {
        detail: err.to_string(),
    })
}
