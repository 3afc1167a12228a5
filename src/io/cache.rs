use std::fs;
use std::path::PathBuf;

use directories::ProjectDirs;

use crate::table::RowSet;

use super::json;

const SLOT_FILE: &str = "session.json";

/// Single-slot persistence for the current dataset: one JSON file in the user
/// data directory, rewritten after every committed mutation and removed on
/// reset. Last writer wins, no versioning. Failures here are logged by the
/// caller and never abort the session.
#[derive(Debug, Clone)]
pub struct Cache {
    path: PathBuf,
}

impl Cache {
    /// Cache rooted in the platform data directory. `None` when no home
    /// directory can be resolved.
    pub fn new() -> Option<Self> {
        let dirs = ProjectDirs::from("", "", "gridmate")?;
        Some(Self {
            path: dirs.data_dir().join(SLOT_FILE),
        })
    }

    pub fn at(path: PathBuf) -> Self {
        Self { path }
    }

    pub fn path(&self) -> &PathBuf {
        &self.path
    }

    /// Reads the slot back into a row set. `None` when the slot is absent or
    /// does not hold a JSON array of objects.
    pub fn load(&self) -> Option<RowSet> {
        let content = fs::read_to_string(&self.path).ok()?;
        let value: serde_json::Value = match serde_json::from_str(&content) {
            Ok(value) => value,
            Err(err) => {
                tracing::warn!(path = %self.path.display(), error = %err, "discarding unreadable session slot");
                return None;
            }
        };
        let (records, columns) = json::records_from_value(&value)?;
        let mut rowset = RowSet::new();
        rowset.replace(records, &columns);
        tracing::debug!(rows = rowset.len(), "restored session slot");
        Some(rowset)
    }

    pub fn save(&self, rowset: &RowSet) -> std::io::Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let value = json::to_value(rowset);
        fs::write(&self.path, serde_json::to_string(&value)?.as_bytes())
    }

    pub fn clear(&self) -> std::io::Result<()> {
        match fs::remove_file(&self.path) {
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(()),
            other => other,
        }
    }
}
