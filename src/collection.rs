// In-memory mirror of the task store

use crate::models::{TaskId, TaskRecord};
use crate::store::{TaskStore, list_all_or_empty};
use std::collections::HashSet;
use tracing::{debug, warn};

/// Ordered snapshot of every task in a store at the time of the last reload
///
/// The snapshot is only ever replaced as a whole by [`TaskCollection::reload`].
/// There is no way to append, remove or patch individual records, so after a
/// mutation followed by a reload the collection matches the store exactly.
#[derive(Debug, Clone, Default)]
pub struct TaskCollection {
    records: Vec<TaskRecord>,
}

impl TaskCollection {
    pub fn new() -> Self {
        Self::default()
    }

    /// Discard the current snapshot and read the store again
    ///
    /// A failing store yields an empty collection. Returns the new record count.
    pub fn reload<S: TaskStore + ?Sized>(&mut self, store: &S) -> usize {
        let fresh = list_all_or_empty(store);

        let mut seen = HashSet::with_capacity(fresh.len());
        let mut records = Vec::with_capacity(fresh.len());
        for record in fresh {
            if !seen.insert(record.id) {
                warn!(id = record.id, "Store returned duplicate task id, keeping first");
                continue;
            }
            records.push(record);
        }

        self.records = records;
        debug!(count = self.records.len(), "Reloaded task collection");
        self.records.len()
    }

    pub fn records(&self) -> &[TaskRecord] {
        &self.records
    }

    pub fn iter(&self) -> std::slice::Iter<'_, TaskRecord> {
        self.records.iter()
    }

    /// Look up a record by its id
    pub fn get(&self, id: TaskId) -> Option<&TaskRecord> {
        self.records.iter().find(|r| r.id == id)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

impl<'a> IntoIterator for &'a TaskCollection {
    type Item = &'a TaskRecord;
    type IntoIter = std::slice::Iter<'a, TaskRecord>;

    fn into_iter(self) -> Self::IntoIter {
        self.records.iter()
    }
}
