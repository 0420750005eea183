// Query filtering over the task collection

use crate::error::TaskError;
use crate::models::{StatusFilter, TaskRecord};
use std::cmp::Ordering;
use std::str::FromStr;

/// Combined text search and status restriction
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Query {
    /// Free text, matched case-insensitively against title, description and status
    pub text: String,
    /// Status restriction
    pub status: StatusFilter,
}

/// Column the visible rows are ordered by
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortKey {
    Id,
    Title,
    Status,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortOrder {
    #[default]
    Ascending,
    Descending,
}

impl Query {
    pub fn new(text: impl Into<String>, status: StatusFilter) -> Self {
        Self {
            text: text.into(),
            status,
        }
    }

    /// Visible subset of `records` under this query
    pub fn apply<'a, I>(&self, records: I) -> Vec<&'a TaskRecord>
    where
        I: IntoIterator<Item = &'a TaskRecord>,
    {
        query(records, &self.text, self.status)
    }
}

/// Records matching both the text and the status predicate, in input order
///
/// Blank text matches everything. The id is never searched.
pub fn query<'a, I>(records: I, free_text: &str, status: StatusFilter) -> Vec<&'a TaskRecord>
where
    I: IntoIterator<Item = &'a TaskRecord>,
{
    let needle = free_text.trim().to_lowercase();

    records
        .into_iter()
        .filter(|r| status.admits(r.status))
        .filter(|r| needle.is_empty() || matches_text(r, &needle))
        .collect()
}

fn matches_text(record: &TaskRecord, needle: &str) -> bool {
    [record.title.as_str(), record.description.as_str(), record.status.as_str()]
        .iter()
        .any(|field| field.to_lowercase().contains(needle))
}

/// Stable sort of visible rows; ties keep their collection order
pub fn sort_visible(rows: &mut [&TaskRecord], key: SortKey, order: SortOrder) {
    rows.sort_by(|a, b| {
        let ord = compare(a, b, key);
        match order {
            SortOrder::Ascending => ord,
            SortOrder::Descending => ord.reverse(),
        }
    });
}

fn compare(a: &TaskRecord, b: &TaskRecord, key: SortKey) -> Ordering {
    match key {
        SortKey::Id => a.id.cmp(&b.id),
        SortKey::Title => a.title.to_lowercase().cmp(&b.title.to_lowercase()),
        SortKey::Status => a.status.as_str().cmp(b.status.as_str()),
    }
}

impl std::fmt::Display for SortKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SortKey::Id => write!(f, "id"),
            SortKey::Title => write!(f, "title"),
            SortKey::Status => write!(f, "status"),
        }
    }
}

impl FromStr for SortKey {
    type Err = TaskError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "id" => Ok(SortKey::Id),
            "title" => Ok(SortKey::Title),
            "status" => Ok(SortKey::Status),
            other => Err(TaskError::Validation(format!(
                "invalid sort key: {} (expected id, title or status)",
                other
            ))),
        }
    }
}
