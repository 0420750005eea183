// tasklist - Single-user task list with SQLite storage, search, filtering and CSV export

pub mod collection;
pub mod config;
pub mod controller;
pub mod error;
pub mod export;
pub mod filter;
pub mod models;
pub mod store;
pub mod summary;

// Re-export main types for convenience
pub use collection::TaskCollection;
pub use config::Config;
pub use controller::{BatchReport, TaskController};
pub use error::{Result, TaskError};
pub use export::{format_csv, write_csv};
pub use filter::{Query, SortKey, SortOrder, query, sort_visible};
pub use models::{StatusFilter, TaskId, TaskRecord, TaskStatus};
pub use store::{SqliteTaskStore, TaskStore, list_all_or_empty};
pub use summary::{Summary, summarize};
