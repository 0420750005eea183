// CSV export of task rows

use crate::error::{Result, TaskError};
use crate::models::TaskRecord;
use fs2::FileExt;
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

pub const DEFAULT_EXPORT_FILE: &str = "tasks.csv";

pub const CSV_HEADER: &str = "ID,Title,Description,Status";

#[cfg(windows)]
const LINE_ENDING: &str = "\r\n";
#[cfg(not(windows))]
const LINE_ENDING: &str = "\n";

/// Render rows as CSV, header first, in the order given
pub fn format_csv<'a, I>(records: I) -> String
where
    I: IntoIterator<Item = &'a TaskRecord>,
{
    let mut out = String::from(CSV_HEADER);
    out.push_str(LINE_ENDING);

    for record in records {
        out.push_str(&record.id.to_string());
        out.push(',');
        out.push_str(&escape_field(&record.title));
        out.push(',');
        out.push_str(&escape_field(&record.description));
        out.push(',');
        out.push_str(&escape_field(record.status.as_str()));
        out.push_str(LINE_ENDING);
    }

    out
}

/// Quote a field only when it holds a delimiter, quote or line break
pub fn escape_field(value: &str) -> String {
    if value.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value.to_string()
    }
}

/// Write rows to `path` as CSV, replacing any existing file
///
/// The document goes to a sibling temp file first and is renamed into place
/// once fully synced, so `path` never holds a partial export.
pub fn write_csv<'a, P, I>(path: P, records: I) -> Result<usize>
where
    P: AsRef<Path>,
    I: IntoIterator<Item = &'a TaskRecord>,
{
    let path = path.as_ref();
    let rows: Vec<&TaskRecord> = records.into_iter().collect();
    let document = format_csv(rows.iter().copied());

    let tmp_path = temp_path_for(path);
    if let Err(source) = write_then_rename(&tmp_path, path, document.as_bytes()) {
        if tmp_path.exists() {
            if let Err(e) = fs::remove_file(&tmp_path) {
                warn!(path = %tmp_path.display(), error = %e, "Failed to remove partial export");
            }
        }
        return Err(TaskError::ExportIo {
            path: path.to_path_buf(),
            source,
        });
    }

    info!(path = %path.display(), count = rows.len(), "Exported tasks");
    Ok(rows.len())
}

fn write_then_rename(tmp_path: &Path, path: &Path, bytes: &[u8]) -> std::io::Result<()> {
    let mut file = OpenOptions::new()
        .create(true)
        .write(true)
        .truncate(true)
        .open(tmp_path)?;

    file.lock_exclusive()?;
    file.write_all(bytes)?;
    file.sync_all()?;
    debug!(path = %tmp_path.display(), bytes = bytes.len(), "Wrote export temp file");

    // Lock is released when file is dropped
    drop(file);
    fs::rename(tmp_path, path)
}

fn temp_path_for(path: &Path) -> PathBuf {
    let mut name = path
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_else(|| DEFAULT_EXPORT_FILE.into());
    name.push(".tmp");
    path.with_file_name(name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::TaskStatus;
    use tempfile::TempDir;

    fn task(id: i64, title: &str, description: &str, status: TaskStatus) -> TaskRecord {
        TaskRecord {
            id,
            title: title.to_string(),
            description: description.to_string(),
            status,
        }
    }

    /// Minimal RFC 4180 reader used to check the writer's output
    fn parse_csv(input: &str) -> Vec<Vec<String>> {
        let mut rows = Vec::new();
        let mut row = Vec::new();
        let mut field = String::new();
        let mut in_quotes = false;
        let mut chars = input.chars().peekable();

        while let Some(c) = chars.next() {
            if in_quotes {
                match c {
                    '"' if chars.peek() == Some(&'"') => {
                        field.push('"');
                        chars.next();
                    }
                    '"' => in_quotes = false,
                    _ => field.push(c),
                }
                continue;
            }
            match c {
                '"' => in_quotes = true,
                ',' => row.push(std::mem::take(&mut field)),
                '\r' if chars.peek() == Some(&'\n') => {}
                '\n' => {
                    row.push(std::mem::take(&mut field));
                    rows.push(std::mem::take(&mut row));
                }
                _ => field.push(c),
            }
        }
        if !field.is_empty() || !row.is_empty() {
            row.push(field);
            rows.push(row);
        }
        rows
    }

    #[test]
    fn test_header_only_for_no_rows() {
        let none: Vec<TaskRecord> = Vec::new();
        assert_eq!(format_csv(&none), format!("{}{}", CSV_HEADER, LINE_ENDING));
    }

    #[test]
    fn test_escape_field() {
        assert_eq!(escape_field("plain"), "plain");
        assert_eq!(escape_field(""), "");
        assert_eq!(escape_field("Buy, milk"), "\"Buy, milk\"");
        assert_eq!(escape_field("He said \"hi\""), "\"He said \"\"hi\"\"\"");
        assert_eq!(escape_field("two\nlines"), "\"two\nlines\"");
    }

    #[test]
    fn test_rows_follow_given_order() {
        let records = vec![
            task(9, "Last", "", TaskStatus::Pending),
            task(1, "First", "", TaskStatus::Completed),
        ];
        let csv = format_csv(&records);
        let lines: Vec<&str> = csv.lines().collect();

        assert_eq!(lines, vec![CSV_HEADER, "9,Last,,Pending", "1,First,,Completed"]);
        assert!(!csv.lines().any(|l| l.ends_with(',')));
    }

    #[test]
    fn test_round_trip_through_reader() {
        let records = vec![
            task(1, "Buy, milk", "He said \"hi\"", TaskStatus::Pending),
            task(2, "Multi", "line one\nline two", TaskStatus::Completed),
            task(3, "Plain", "", TaskStatus::Pending),
        ];

        let parsed = parse_csv(&format_csv(&records));
        assert_eq!(parsed.len(), records.len() + 1);
        assert_eq!(parsed[0], vec!["ID", "Title", "Description", "Status"]);

        for (row, record) in parsed[1..].iter().zip(&records) {
            assert_eq!(row[0], record.id.to_string());
            assert_eq!(row[1], record.title);
            assert_eq!(row[2], record.description);
            assert_eq!(row[3], record.status.as_str());
        }
    }

    #[test]
    fn test_write_csv_creates_file() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join(DEFAULT_EXPORT_FILE);
        let records = vec![task(4, "Export me", "", TaskStatus::Pending)];

        let count = write_csv(&path, &records).unwrap();
        assert_eq!(count, 1);

        let content = fs::read_to_string(&path).unwrap();
        assert_eq!(content, format_csv(&records));
        assert!(!temp.path().join("tasks.csv.tmp").exists());
    }

    #[test]
    fn test_write_csv_replaces_existing_file() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("out.csv");
        fs::write(&path, "stale contents that are longer than the new export\n").unwrap();

        let none: Vec<TaskRecord> = Vec::new();
        write_csv(&path, &none).unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), format_csv(&none));
    }

    #[test]
    fn test_write_csv_unwritable_destination() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("missing-dir").join("tasks.csv");
        let records = vec![task(1, "A", "", TaskStatus::Pending)];

        let err = write_csv(&path, &records).unwrap_err();
        match err {
            TaskError::ExportIo { path: failed, .. } => assert_eq!(failed, path),
            other => panic!("unexpected error: {other}"),
        }
        assert!(!path.exists());
    }
}
