// Task storage: the TaskStore contract and its SQLite implementation

use crate::error::{Result, TaskError};
use crate::models::{TaskId, TaskRecord, TaskStatus, validate_title};
use rusqlite::Connection;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, info, warn};

pub const DEFAULT_BUSY_TIMEOUT_MS: u64 = 5000;

/// Durable storage for task records, keyed by id
///
/// Each operation maps to one statement against the backing store. No
/// operation spans more than one statement.
pub trait TaskStore {
    /// Insert a new task and return the id the store assigned to it
    fn create(&mut self, title: &str, description: &str, status: TaskStatus) -> Result<TaskId>;

    /// Read every stored task, in the store's own order
    fn list_all(&self) -> Result<Vec<TaskRecord>>;

    /// Replace the stored task that has `record.id`
    fn update(&mut self, record: &TaskRecord) -> Result<()>;

    /// Remove a task. Unknown ids are not an error.
    fn delete(&mut self, id: TaskId) -> Result<()>;
}

/// Read all tasks, degrading a store failure into an empty list
///
/// A failed read shows as "no tasks" instead of taking the view down.
pub fn list_all_or_empty<S: TaskStore + ?Sized>(store: &S) -> Vec<TaskRecord> {
    match store.list_all() {
        Ok(records) => records,
        Err(e) => {
            warn!(error = %e, "Failed to list tasks, treating store as empty");
            Vec::new()
        }
    }
}

/// TaskStore backed by a single SQLite table
pub struct SqliteTaskStore {
    path: Option<PathBuf>,
    db: Connection,
}

impl SqliteTaskStore {
    /// Open or create a store at the given database path
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        Self::open_with_timeout(path, Duration::from_millis(DEFAULT_BUSY_TIMEOUT_MS))
    }

    /// Open with an explicit busy timeout for locked databases
    pub fn open_with_timeout<P: AsRef<Path>>(path: P, busy_timeout: Duration) -> Result<Self> {
        let path = path.as_ref();

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|e| {
                TaskError::Persistence(format!("Failed to create store directory {}: {}", parent.display(), e))
            })?;
        }

        let db = Connection::open(path)?;
        db.busy_timeout(busy_timeout)?;

        let store = Self {
            path: Some(path.to_path_buf()),
            db,
        };
        store.create_schema()?;

        info!(path = %path.display(), "Opened task store");
        Ok(store)
    }

    /// Open a store that lives only as long as this value
    pub fn open_in_memory() -> Result<Self> {
        let store = Self {
            path: None,
            db: Connection::open_in_memory()?,
        };
        store.create_schema()?;
        Ok(store)
    }

    /// Database file location, `None` for in-memory stores
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    #[cfg(test)]
    pub(crate) fn db(&self) -> &Connection {
        &self.db
    }

    fn create_schema(&self) -> Result<()> {
        debug!("Creating database schema");

        self.db.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS tasks (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                title TEXT NOT NULL,
                description TEXT NOT NULL DEFAULT '',
                status TEXT NOT NULL
            );
            "#,
        )?;

        Ok(())
    }
}

impl TaskStore for SqliteTaskStore {
    fn create(&mut self, title: &str, description: &str, status: TaskStatus) -> Result<TaskId> {
        validate_title(title)?;

        self.db.execute(
            "INSERT INTO tasks (title, description, status) VALUES (?1, ?2, ?3)",
            rusqlite::params![title, description, status.as_str()],
        )?;
        let id = self.db.last_insert_rowid();

        debug!(id, title, "Created task");
        Ok(id)
    }

    fn list_all(&self) -> Result<Vec<TaskRecord>> {
        let mut stmt = self
            .db
            .prepare("SELECT id, title, description, status FROM tasks ORDER BY id")?;

        let rows = stmt.query_map([], |row| {
            Ok((
                row.get::<_, TaskId>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, String>(2)?,
                row.get::<_, String>(3)?,
            ))
        })?;

        let mut results = Vec::new();
        for row_result in rows {
            let (id, title, description, status_text) = row_result?;

            // Rows written by other tools may carry free-text statuses
            let status = match status_text.parse::<TaskStatus>() {
                Ok(s) => s,
                Err(e) => {
                    warn!(id, status = %status_text, error = %e, "Skipping task with unknown status");
                    continue;
                }
            };

            results.push(TaskRecord {
                id,
                title,
                description,
                status,
            });
        }

        debug!(count = results.len(), "Listed tasks");
        Ok(results)
    }

    fn update(&mut self, record: &TaskRecord) -> Result<()> {
        validate_title(&record.title)?;
        if !record.is_persisted() {
            return Err(TaskError::Persistence("cannot update a task without an id".to_string()));
        }

        let changed = self.db.execute(
            "UPDATE tasks SET title = ?1, description = ?2, status = ?3 WHERE id = ?4",
            rusqlite::params![record.title, record.description, record.status.as_str(), record.id],
        )?;

        if changed == 0 {
            return Err(TaskError::Persistence(format!("task {} not found", record.id)));
        }

        debug!(id = record.id, status = %record.status, "Updated task");
        Ok(())
    }

    fn delete(&mut self, id: TaskId) -> Result<()> {
        let changed = self
            .db
            .execute("DELETE FROM tasks WHERE id = ?1", rusqlite::params![id])?;

        debug!(id, changed, "Deleted task");
        Ok(())
    }
}
