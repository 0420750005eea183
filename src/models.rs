// Data models for tasklist

use crate::error::{Result, TaskError};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Store-assigned task identifier
pub type TaskId = i64;

/// Id carried by a record that has not been persisted yet
pub const UNASSIGNED_ID: TaskId = 0;

/// One task, replaced wholesale on update
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskRecord {
    pub id: TaskId,
    pub title: String,
    pub description: String,
    pub status: TaskStatus,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TaskStatus {
    Pending,
    Completed,
}

/// Status restriction applied by a query
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum StatusFilter {
    #[default]
    All,
    Pending,
    Completed,
}

impl TaskRecord {
    /// Build a record that has not been stored yet
    pub fn new(title: impl Into<String>, description: impl Into<String>, status: TaskStatus) -> Self {
        Self {
            id: UNASSIGNED_ID,
            title: title.into(),
            description: description.into(),
            status,
        }
    }

    pub fn is_persisted(&self) -> bool {
        self.id != UNASSIGNED_ID
    }

    /// Copy of this record with a different status, same id
    pub fn with_status(&self, status: TaskStatus) -> Self {
        Self { status, ..self.clone() }
    }
}

/// Reject titles that are empty or whitespace-only
pub fn validate_title(title: &str) -> Result<()> {
    if title.trim().is_empty() {
        return Err(TaskError::Validation("title is required".to_string()));
    }
    Ok(())
}

impl TaskStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            TaskStatus::Pending => "Pending",
            TaskStatus::Completed => "Completed",
        }
    }
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TaskStatus {
    type Err = TaskError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "pending" => Ok(TaskStatus::Pending),
            "completed" => Ok(TaskStatus::Completed),
            other => Err(TaskError::Validation(format!(
                "invalid status: {} (expected Pending or Completed)",
                other
            ))),
        }
    }
}

impl StatusFilter {
    /// Whether a record with `status` passes this filter
    pub fn admits(self, status: TaskStatus) -> bool {
        match self {
            StatusFilter::All => true,
            StatusFilter::Pending => status == TaskStatus::Pending,
            StatusFilter::Completed => status == TaskStatus::Completed,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            StatusFilter::All => "All",
            StatusFilter::Pending => "Pending",
            StatusFilter::Completed => "Completed",
        }
    }
}

impl From<TaskStatus> for StatusFilter {
    fn from(status: TaskStatus) -> Self {
        match status {
            TaskStatus::Pending => StatusFilter::Pending,
            TaskStatus::Completed => StatusFilter::Completed,
        }
    }
}

impl fmt::Display for StatusFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for StatusFilter {
    type Err = TaskError;

    fn from_str(s: &str) -> Result<Self> {
        if s.trim().eq_ignore_ascii_case("all") {
            return Ok(StatusFilter::All);
        }
        s.parse::<TaskStatus>().map(StatusFilter::from).map_err(|_| {
            TaskError::Validation(format!(
                "invalid status filter: {} (expected All, Pending or Completed)",
                s.trim()
            ))
        })
    }
}
