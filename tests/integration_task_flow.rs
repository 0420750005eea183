//! End-to-end task flow against a file-backed store
//!
//! Drives the controller through add, edit, complete, delete and export,
//! reopening the database to check what actually persisted.

use std::fs;
use tasklist::{SortKey, SortOrder, SqliteTaskStore, StatusFilter, TaskController, TaskStatus, TaskStore};
use tempfile::TempDir;

#[test]
fn test_mutations_persist_across_reopen() {
    let temp = TempDir::new().unwrap();
    let db_path = temp.path().join("data").join("tasks.db");

    let (rent, milk) = {
        let mut tasks = TaskController::new(SqliteTaskStore::open(&db_path).unwrap());
        let rent = tasks.add("Pay rent", "", TaskStatus::Pending).unwrap();
        let milk = tasks.add("Buy, milk", "He said \"hi\"", TaskStatus::Pending).unwrap();
        let taxes = tasks.add("File taxes", "", TaskStatus::Pending).unwrap();

        assert!(tasks.mark_completed(&[rent]).is_clean());
        assert!(tasks.delete(&[taxes]).is_clean());
        tasks.edit(milk, "Buy, milk", "oat", TaskStatus::Pending).unwrap();
        (rent, milk)
    };

    let store = SqliteTaskStore::open(&db_path).unwrap();
    let records = store.list_all().unwrap();
    assert_eq!(records.len(), 2);

    let tasks = TaskController::new(store);
    assert_eq!(tasks.get(rent).unwrap().status, TaskStatus::Completed);
    assert_eq!(tasks.get(milk).unwrap().description, "oat");

    let summary = tasks.summary();
    assert_eq!((summary.total, summary.pending, summary.completed), (2, 1, 1));
}

#[test]
fn test_view_never_drifts_from_store() {
    let temp = TempDir::new().unwrap();
    let db_path = temp.path().join("tasks.db");

    let mut tasks = TaskController::new(SqliteTaskStore::open(&db_path).unwrap());
    tasks.add("Visible", "", TaskStatus::Pending).unwrap();

    // A second handle writes behind the controller's back
    {
        let mut other = SqliteTaskStore::open(&db_path).unwrap();
        other.create("Written elsewhere", "", TaskStatus::Completed).unwrap();
    }
    assert_eq!(tasks.collection().len(), 1);

    // Any mutation is followed by a full reload
    tasks.delete(&[424242]);
    assert_eq!(tasks.collection().len(), 2);
    assert_eq!(tasks.collection().records(), tasks.store().list_all().unwrap().as_slice());
}

#[test]
fn test_export_of_sorted_filtered_view() {
    let temp = TempDir::new().unwrap();
    let export_path = temp.path().join("tasks.csv");

    let mut tasks = TaskController::new(SqliteTaskStore::open_in_memory().unwrap());
    tasks.add("beta", "", TaskStatus::Pending).unwrap();
    tasks.add("Alpha", "first", TaskStatus::Pending).unwrap();
    tasks.add("Gamma", "", TaskStatus::Completed).unwrap();

    tasks.set_status_filter(StatusFilter::Pending);
    tasks.set_sort(Some((SortKey::Title, SortOrder::Ascending)));
    assert_eq!(tasks.export(&export_path).unwrap(), 2);

    let content = fs::read_to_string(&export_path).unwrap();
    let titles: Vec<&str> = content
        .lines()
        .skip(1)
        .map(|line| line.split(',').nth(1).unwrap())
        .collect();
    assert_eq!(titles, vec!["Alpha", "beta"]);
    assert_eq!(content.lines().next(), Some("ID,Title,Description,Status"));
}
