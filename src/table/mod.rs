use std::collections::HashMap;
use std::fmt;

pub mod history;
pub mod view;

pub use history::{History, Snapshot};
pub use view::{SortDirection, ViewState, natural_cmp, project};

/// One row of the dataset. Blank cells are stored as empty strings; a key
/// missing from the map is treated the same as an empty string.
pub type Record = HashMap<String, String>;

#[derive(Debug, PartialEq, Eq)]
pub enum TableError {
    RowOutOfBounds { index: usize, len: usize },
    NoColumns,
}

impl fmt::Display for TableError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TableError::RowOutOfBounds { index, len } => {
                write!(f, "row index {index} out of bounds (table has {len} rows)")
            }
            TableError::NoColumns => {
                write!(f, "cannot add a row before any columns exist")
            }
        }
    }
}

impl std::error::Error for TableError {}

pub type Result<T> = std::result::Result<T, TableError>;

/// The in-memory dataset: ordered records plus the ordered column list. The
/// column list is the union of keys across all records, in first-seen order,
/// and every record's keys stay a subset of it.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RowSet {
    records: Vec<Record>,
    columns: Vec<String>,
}

impl RowSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn records(&self) -> &[Record] {
        &self.records
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Value of a cell, with missing keys rendered as blank.
    pub fn cell(&self, row: usize, column: &str) -> &str {
        self.records
            .get(row)
            .and_then(|record| record.get(column))
            .map(String::as_str)
            .unwrap_or("")
    }

    /// Replaces the whole record sequence and recomputes the column list from
    /// scratch. `column_order` supplies the first-seen order of keys, which a
    /// `HashMap`-backed record cannot carry by itself; keys present in the
    /// records but absent from `column_order` are appended as they appear.
    pub fn replace(&mut self, records: Vec<Record>, column_order: &[String]) {
        self.columns.clear();
        for column in column_order {
            // With no records to consult the hint is all there is; otherwise
            // columns no record carries any more are dropped.
            if (records.is_empty() || records.iter().any(|record| record.contains_key(column)))
                && !self.columns.contains(column)
            {
                self.columns.push(column.clone());
            }
        }
        for record in &records {
            for key in record.keys() {
                if !self.columns.iter().any(|c| c == key) {
                    self.columns.push(key.clone());
                }
            }
        }
        self.records = records;
    }

    /// Reorders the records in place without touching the column list. Used by
    /// sort commits, where the record set is unchanged.
    pub fn reorder(&mut self, records: Vec<Record>) {
        debug_assert_eq!(records.len(), self.records.len());
        self.records = records;
    }

    pub fn set_cell(&mut self, row: usize, column: &str, value: String) -> Result<()> {
        let len = self.records.len();
        let record = self
            .records
            .get_mut(row)
            .ok_or(TableError::RowOutOfBounds { index: row, len })?;
        record.insert(column.to_string(), value);
        // Not reachable through the editor, but tolerated: a write to an
        // unknown column introduces it.
        if !self.columns.iter().any(|c| c == column) {
            self.columns.push(column.to_string());
        }
        Ok(())
    }

    /// Appends a record with every current column blank.
    pub fn add_row(&mut self) -> Result<()> {
        if self.columns.is_empty() {
            return Err(TableError::NoColumns);
        }
        let record: Record = self
            .columns
            .iter()
            .map(|column| (column.clone(), String::new()))
            .collect();
        self.records.push(record);
        Ok(())
    }

    pub fn delete_row(&mut self, row: usize) -> Result<()> {
        let len = self.records.len();
        if row >= len {
            return Err(TableError::RowOutOfBounds { index: row, len });
        }
        self.records.remove(row);
        Ok(())
    }

    pub fn clear(&mut self) {
        self.records.clear();
        self.columns.clear();
    }
}
