// JSONL file operations

use eyre::{Context, Result};
use fs2::FileExt;
use serde::{Serialize, de::DeserializeOwned};
use std::fs::{self, File, OpenOptions};
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Replace the contents of a JSONL file with `records`, one per line, in order
///
/// Writes go to a sibling temp file that is renamed over the target, so readers never see
/// a half-written list. A sibling `.lock` file is held exclusively for the duration.
pub fn write_jsonl<T: Serialize>(path: &Path, records: &[T]) -> Result<()> {
    let lock_path = sibling(path, "lock");
    let lock = OpenOptions::new()
        .create(true)
        .truncate(false)
        .write(true)
        .open(&lock_path)
        .context("Failed to open JSONL lock file")?;

    // Acquire exclusive lock before writing
    lock.lock_exclusive().context("Failed to acquire file lock")?;

    let tmp_path = sibling(path, "tmp");
    {
        let file = File::create(&tmp_path).context("Failed to create temporary JSONL file")?;
        let mut writer = BufWriter::new(file);
        for record in records {
            let json = serde_json::to_string(record).context("Failed to serialize record")?;
            writeln!(writer, "{}", json)?;
        }
        let file = writer.into_inner().map_err(|e| e.into_error())?;
        file.sync_all()?; // Ensure data is flushed to disk
    }

    fs::rename(&tmp_path, path).context("Failed to move JSONL file into place")?;
    debug!(file = ?path, count = records.len(), "Wrote JSONL file");

    // Lock is automatically released when file is dropped
    Ok(())
}

/// Read all records from a JSONL file, in file order
///
/// Returns `None` if the file does not exist. Lines that fail to read or parse are
/// skipped with a warning rather than failing the whole load.
pub fn read_jsonl<T: DeserializeOwned>(path: &Path) -> Result<Option<Vec<T>>> {
    if !path.exists() {
        return Ok(None);
    }

    let file = File::open(path).context("Failed to open JSONL file")?;
    let reader = BufReader::new(file);
    let mut records = Vec::new();

    for (line_num, line) in reader.lines().enumerate() {
        let line = match line {
            Ok(l) => l,
            Err(e) => {
                warn!(
                    file = ?path,
                    line = line_num + 1,
                    error = ?e,
                    "Failed to read line, skipping"
                );
                continue;
            }
        };

        if line.trim().is_empty() {
            continue;
        }

        match serde_json::from_str(&line) {
            Ok(record) => records.push(record),
            Err(e) => {
                warn!(
                    file = ?path,
                    line = line_num + 1,
                    error = ?e,
                    "Failed to parse JSON, skipping"
                );
            }
        }
    }

    info!(file = ?path, count = records.len(), "Loaded records from JSONL");

    Ok(Some(records))
}

/// Serialize records to an in-memory JSONL string
pub fn to_jsonl_string<T: Serialize>(records: &[T]) -> Result<String> {
    let mut out = String::new();
    for record in records {
        out.push_str(&serde_json::to_string(record).context("Failed to serialize record")?);
        out.push('\n');
    }
    Ok(out)
}

/// Parse an in-memory JSONL string, skipping malformed lines
pub fn from_jsonl_str<T: DeserializeOwned>(content: &str) -> Vec<T> {
    content
        .lines()
        .enumerate()
        .filter(|(_, line)| !line.trim().is_empty())
        .filter_map(|(line_num, line)| match serde_json::from_str(line) {
            Ok(record) => Some(record),
            Err(e) => {
                warn!(line = line_num + 1, error = ?e, "Failed to parse JSON, skipping");
                None
            }
        })
        .collect()
}

fn sibling(path: &Path, extension: &str) -> PathBuf {
    let mut name = path.file_name().map(|n| n.to_os_string()).unwrap_or_default();
    name.push(".");
    name.push(extension);
    path.with_file_name(name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::TodoItem;
    use tempfile::TempDir;

    fn sample() -> Vec<TodoItem> {
        vec![
            TodoItem::new(1, "buy milk"),
            TodoItem {
                id: 2,
                text: "call mom".to_string(),
                completed: true,
            },
            TodoItem::new(3, "buy bread"),
        ]
    }

    #[test]
    fn test_write_then_read_preserves_order() {
        let temp = TempDir::new().unwrap();
        let jsonl_path = temp.path().join("todos.jsonl");

        write_jsonl(&jsonl_path, &sample()).unwrap();

        let records: Vec<TodoItem> = read_jsonl(&jsonl_path).unwrap().unwrap();
        assert_eq!(records, sample());
    }

    #[test]
    fn test_write_overwrites_instead_of_appending() {
        let temp = TempDir::new().unwrap();
        let jsonl_path = temp.path().join("todos.jsonl");

        write_jsonl(&jsonl_path, &sample()).unwrap();
        write_jsonl(&jsonl_path, &[TodoItem::new(9, "only")]).unwrap();

        let content = fs::read_to_string(&jsonl_path).unwrap();
        assert_eq!(content.lines().count(), 1);
        assert!(content.contains("\"text\":\"only\""));
        assert!(!temp.path().join("todos.jsonl.tmp").exists());
    }

    #[test]
    fn test_read_jsonl_nonexistent_file() {
        let temp = TempDir::new().unwrap();
        let jsonl_path = temp.path().join("nonexistent.jsonl");

        let records: Option<Vec<TodoItem>> = read_jsonl(&jsonl_path).unwrap();
        assert!(records.is_none());
    }

    #[test]
    fn test_read_jsonl_malformed_line() {
        let temp = TempDir::new().unwrap();
        let jsonl_path = temp.path().join("todos.jsonl");

        // Write valid record, then malformed, then another valid
        fs::write(
            &jsonl_path,
            r#"{"id":1,"text":"Valid","completed":false}
{malformed json}
{"id":2,"text":"Also Valid","completed":true}
"#,
        )
        .unwrap();

        let records: Vec<TodoItem> = read_jsonl(&jsonl_path).unwrap().unwrap();
        // Should skip malformed line and load the two valid records
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].id, 1);
        assert_eq!(records[1].id, 2);
        assert!(records[1].completed);
    }

    #[test]
    fn test_string_helpers() {
        let content = to_jsonl_string(&sample()).unwrap();
        assert_eq!(content.lines().count(), 3);

        let back: Vec<TodoItem> = from_jsonl_str(&format!("{}not json\n", content));
        assert_eq!(back, sample());
    }
}
