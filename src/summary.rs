// Aggregate counts over a set of tasks

use crate::models::{StatusFilter, TaskRecord, TaskStatus};
use serde::Serialize;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Summary {
    pub total: usize,
    pub pending: usize,
    pub completed: usize,
    /// Status filter active when the summary was taken, shown as a label only
    pub filter: StatusFilter,
}

/// Count the records given, tagging the result with the active filter
pub fn summarize<'a, I>(records: I, filter: StatusFilter) -> Summary
where
    I: IntoIterator<Item = &'a TaskRecord>,
{
    let mut total = 0;
    let mut completed = 0;
    for record in records {
        total += 1;
        if record.status == TaskStatus::Completed {
            completed += 1;
        }
    }

    Summary {
        total,
        pending: total - completed,
        completed,
        filter,
    }
}

impl fmt::Display for Summary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Total: {}   Pending: {}   Completed: {}   | Filter: {}",
            self.total, self.pending, self.completed, self.filter
        )
    }
}
