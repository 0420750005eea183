//! Task controller
//!
//! Owns the store, the in-memory collection and the active view settings.
//! Every mutation goes to the store first and is followed by exactly one
//! full reload, whether or not the store call succeeded. Records are always
//! addressed by id, never by their position in a filtered or sorted view.

use crate::collection::TaskCollection;
use crate::error::{Result, TaskError};
use crate::export;
use crate::filter::{Query, SortKey, SortOrder, sort_visible};
use crate::models::{StatusFilter, TaskId, TaskRecord, TaskStatus, validate_title};
use crate::store::TaskStore;
use crate::summary::{Summary, summarize};
use std::path::Path;
use tracing::{debug, info, warn};

/// Per-item outcome of a multi-record operation
#[derive(Debug, Default)]
pub struct BatchReport {
    pub succeeded: Vec<TaskId>,
    pub failed: Vec<(TaskId, TaskError)>,
}

impl BatchReport {
    pub fn is_clean(&self) -> bool {
        self.failed.is_empty()
    }
}

pub struct TaskController<S: TaskStore> {
    store: S,
    collection: TaskCollection,
    query: Query,
    sort: Option<(SortKey, SortOrder)>,
}

impl<S: TaskStore> TaskController<S> {
    /// Take ownership of a store and load its current contents
    pub fn new(store: S) -> Self {
        let mut controller = Self {
            store,
            collection: TaskCollection::new(),
            query: Query::default(),
            sort: None,
        };
        controller.reload();
        controller
    }

    /// Replace the in-memory collection with the store's current contents
    pub fn reload(&mut self) -> usize {
        self.collection.reload(&self.store)
    }

    pub fn collection(&self) -> &TaskCollection {
        &self.collection
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn get(&self, id: TaskId) -> Option<&TaskRecord> {
        self.collection.get(id)
    }

    // ========================================================================
    // Mutations
    // ========================================================================

    /// Create a task from trimmed input and return its new id
    pub fn add(&mut self, title: &str, description: &str, status: TaskStatus) -> Result<TaskId> {
        let title = title.trim();
        validate_title(title)?;

        let result = self.store.create(title, description.trim(), status);
        self.reload();

        match &result {
            Ok(id) => info!(id, title, "Added task"),
            Err(e) => warn!(title, error = %e, "Failed to add task"),
        }
        result
    }

    /// Replace the task `id` with new field values
    pub fn edit(&mut self, id: TaskId, title: &str, description: &str, status: TaskStatus) -> Result<()> {
        let title = title.trim();
        validate_title(title)?;

        let replacement = TaskRecord {
            id,
            title: title.to_string(),
            description: description.trim().to_string(),
            status,
        };
        let result = self.store.update(&replacement);
        self.reload();

        match &result {
            Ok(()) => info!(id, "Edited task"),
            Err(e) => warn!(id, error = %e, "Failed to edit task"),
        }
        result
    }

    /// Mark each task completed, keeping its other fields
    ///
    /// Ids missing from the collection are reported as failures. One failure
    /// does not stop the rest of the batch.
    pub fn mark_completed(&mut self, ids: &[TaskId]) -> BatchReport {
        let mut report = BatchReport::default();

        for &id in ids {
            let result = match self.collection.get(id) {
                Some(record) => self.store.update(&record.with_status(TaskStatus::Completed)),
                None => Err(TaskError::Persistence(format!("task {} not found", id))),
            };
            Self::record_outcome(&mut report, id, result);
        }

        self.reload();
        info!(
            succeeded = report.succeeded.len(),
            failed = report.failed.len(),
            "Marked tasks completed"
        );
        report
    }

    /// Delete each task; unknown ids succeed
    pub fn delete(&mut self, ids: &[TaskId]) -> BatchReport {
        let mut report = BatchReport::default();

        for &id in ids {
            let result = self.store.delete(id);
            Self::record_outcome(&mut report, id, result);
        }

        self.reload();
        info!(
            succeeded = report.succeeded.len(),
            failed = report.failed.len(),
            "Deleted tasks"
        );
        report
    }

    fn record_outcome(report: &mut BatchReport, id: TaskId, result: Result<()>) {
        match result {
            Ok(()) => report.succeeded.push(id),
            Err(e) => {
                warn!(id, error = %e, "Batch item failed, continuing");
                report.failed.push((id, e));
            }
        }
    }

    // ========================================================================
    // View
    // ========================================================================

    pub fn set_search(&mut self, text: impl Into<String>) {
        self.query.text = text.into();
        debug!(text = %self.query.text, "Search changed");
    }

    pub fn set_status_filter(&mut self, filter: StatusFilter) {
        self.query.status = filter;
        debug!(filter = %filter, "Status filter changed");
    }

    /// Order visible rows by `key`, or restore store order with `None`
    pub fn set_sort(&mut self, sort: Option<(SortKey, SortOrder)>) {
        self.sort = sort;
    }

    pub fn active_query(&self) -> &Query {
        &self.query
    }

    /// Rows matching the active search and filter, in display order
    pub fn visible(&self) -> Vec<&TaskRecord> {
        let mut rows = self.query.apply(&self.collection);
        if let Some((key, order)) = self.sort {
            sort_visible(&mut rows, key, order);
        }
        rows
    }

    /// Counts over the whole collection, labelled with the active filter
    ///
    /// Neither the search text nor the status filter narrows the counts.
    pub fn summary(&self) -> Summary {
        summarize(&self.collection, self.query.status)
    }

    /// Write the visible rows to `path` as CSV
    pub fn export<P: AsRef<Path>>(&self, path: P) -> Result<usize> {
        export::write_csv(path, self.visible())
    }
}
