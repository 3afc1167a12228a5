use super::Record;

/// Upper bound on the undo stack; the oldest snapshot is discarded first.
pub const MAX_SNAPSHOTS: usize = 100;

/// One saved state: the record sequence together with the column list at
/// that point. Restoring records alone is not enough, a mutation can add or
/// drop columns and the column order is not recoverable from the records.
#[derive(Debug, Clone, PartialEq)]
pub struct Snapshot {
    pub records: Vec<Record>,
    pub columns: Vec<String>,
}

impl Snapshot {
    fn capture(records: &[Record], columns: &[String]) -> Self {
        Self {
            records: records.to_vec(),
            columns: columns.to_vec(),
        }
    }
}

/// Bounded undo/redo stacks of full snapshots. The first snapshot pushed by
/// [`History::initialize`] is the floor: it is never popped, so the
/// just-loaded state cannot be undone away. Every snapshot is an independent
/// deep copy; callers never receive aliases into the stacks.
#[derive(Debug, Default)]
pub struct History {
    undo: Vec<Snapshot>,
    redo: Vec<Snapshot>,
}

impl History {
    pub fn new() -> Self {
        Self::default()
    }

    /// Resets the stacks to a single snapshot. Used on fresh load, as opposed
    /// to [`History::commit`] for ordinary mutations.
    pub fn initialize(&mut self, records: &[Record], columns: &[String]) {
        self.undo.clear();
        self.redo.clear();
        self.undo.push(Snapshot::capture(records, columns));
    }

    /// Records the state after a committed mutation. Clears the redo stack:
    /// history does not branch.
    pub fn commit(&mut self, records: &[Record], columns: &[String]) {
        self.undo.push(Snapshot::capture(records, columns));
        if self.undo.len() > MAX_SNAPSHOTS {
            self.undo.remove(0);
        }
        self.redo.clear();
    }

    /// Steps back one snapshot, returning the restored state. `None` when
    /// only the floor snapshot remains.
    pub fn undo(&mut self) -> Option<Snapshot> {
        if self.undo.len() <= 1 {
            return None;
        }
        let popped = self.undo.pop()?;
        self.redo.push(popped);
        self.undo.last().cloned()
    }

    /// Steps forward one snapshot undone earlier. `None` when there is
    /// nothing to redo.
    pub fn redo(&mut self) -> Option<Snapshot> {
        let restored = self.redo.pop()?;
        self.undo.push(restored.clone());
        Some(restored)
    }

    pub fn can_undo(&self) -> bool {
        self.undo.len() > 1
    }

    pub fn can_redo(&self) -> bool {
        !self.redo.is_empty()
    }

    pub fn depth(&self) -> usize {
        self.undo.len()
    }
}
