//! Append-only progress log.
//!
//! Progress entries are appended to a JSONL (JSON Lines) file with file
//! locking to ensure safe concurrent access.

use crate::{ProgressEntry, Result};
use fs2::FileExt;
use std::fs::{File, OpenOptions};
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};
use uuid::Uuid;

/// Receives finished session summaries for persistence
pub trait ProgressRecorder {
    fn record_progress(&mut self, entry: &ProgressEntry) -> Result<Uuid>;
}

/// JSONL-based progress recorder with file locking
pub struct JsonlProgressLog {
    path: PathBuf,
}

impl JsonlProgressLog {
    /// Create a new JSONL log for the given path
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Ensure the parent directory exists
    fn ensure_parent_dir(&self) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        Ok(())
    }
}

impl ProgressRecorder for JsonlProgressLog {
    fn record_progress(&mut self, entry: &ProgressEntry) -> Result<Uuid> {
        self.ensure_parent_dir()?;

        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;

        file.lock_exclusive()?;

        let mut writer = std::io::BufWriter::new(&file);
        let line = serde_json::to_string(entry)?;
        writer.write_all(line.as_bytes())?;
        writer.write_all(b"\n")?;
        writer.flush()?;

        file.unlock()?;

        tracing::debug!("Appended progress entry {} to log", entry.id);
        Ok(entry.id)
    }
}

/// Read all progress entries from a log file
pub fn read_entries(path: &Path) -> Result<Vec<ProgressEntry>> {
    if !path.exists() {
        return Ok(Vec::new());
    }

    let file = File::open(path)?;
    file.lock_shared()?;

    let reader = BufReader::new(&file);
    let mut entries = Vec::new();

    for (line_num, line_result) in reader.lines().enumerate() {
        let line = line_result?;
        if line.trim().is_empty() {
            continue;
        }

        match serde_json::from_str::<ProgressEntry>(&line) {
            Ok(entry) => entries.push(entry),
            Err(e) => {
                // A torn or hand-edited line must not hide the rest of the log
                tracing::warn!("Failed to parse progress entry at line {}: {}", line_num + 1, e);
            }
        }
    }

    file.unlock()?;
    tracing::debug!("Read {} progress entries from log", entries.len());
    Ok(entries)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Rating;
    use chrono::Utc;
    use std::collections::BTreeMap;

    fn create_test_entry() -> ProgressEntry {
        let mut times = BTreeMap::new();
        times.insert(Uuid::new_v4(), 61);
        ProgressEntry {
            id: Uuid::new_v4(),
            date: Utc::now(),
            workout_id: Uuid::new_v4(),
            workout_name: "Cardio Workout 2".into(),
            completed: true,
            rating: Some(Rating::try_from(3).unwrap()),
            notes: Some("steady".into()),
            exercise_time_spent: times,
        }
    }

    #[test]
    fn test_append_and_read_single_entry() {
        let temp_dir = tempfile::tempdir().unwrap();
        let log_path = temp_dir.path().join("progress.wal");

        let entry = create_test_entry();

        let mut log = JsonlProgressLog::new(&log_path);
        let id = log.record_progress(&entry).unwrap();
        assert_eq!(id, entry.id);

        let entries = read_entries(&log_path).unwrap();
        assert_eq!(entries, vec![entry]);
    }

    #[test]
    fn test_append_multiple_entries() {
        let temp_dir = tempfile::tempdir().unwrap();
        let log_path = temp_dir.path().join("nested/progress.wal");

        let mut log = JsonlProgressLog::new(&log_path);
        for _ in 0..5 {
            log.record_progress(&create_test_entry()).unwrap();
        }

        assert_eq!(read_entries(&log_path).unwrap().len(), 5);
    }

    #[test]
    fn test_read_missing_log() {
        let temp_dir = tempfile::tempdir().unwrap();
        let entries = read_entries(&temp_dir.path().join("nonexistent.wal")).unwrap();
        assert!(entries.is_empty());
    }

    #[test]
    fn test_corrupt_lines_are_skipped() {
        let temp_dir = tempfile::tempdir().unwrap();
        let log_path = temp_dir.path().join("progress.wal");

        let mut log = JsonlProgressLog::new(&log_path);
        log.record_progress(&create_test_entry()).unwrap();
        let mut file = OpenOptions::new().append(true).open(&log_path).unwrap();
        writeln!(file, "{{ invalid json }}").unwrap();
        writeln!(file, r#"{{"id":"00000000-0000-0000-0000-000000000000""#).unwrap();
        log.record_progress(&create_test_entry()).unwrap();

        assert_eq!(read_entries(&log_path).unwrap().len(), 2);
    }
}
