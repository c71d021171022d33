//! CSV rollup for archiving the progress log.
//!
//! The CSV is synced before the log is renamed, so a crash between the two
//! steps duplicates rows instead of losing them. History reads de-duplicate
//! by entry id.

use crate::{ProgressEntry, Result};
use serde::{Deserialize, Serialize};
use std::fs::OpenOptions;
use std::path::Path;

/// Suffix appended to an archived log
pub const PROCESSED_SUFFIX: &str = "processed";

/// A row in `progress.csv`
#[derive(Debug, Serialize, Deserialize)]
pub(crate) struct CsvRow {
    pub id: String,
    pub date: String,
    pub workout_id: String,
    pub workout_name: String,
    pub completed: bool,
    pub rating: Option<u8>,
    pub notes: Option<String>,
    /// Per-exercise seconds as a JSON object
    pub exercise_time_spent: String,
    pub total_seconds: u32,
}

impl CsvRow {
    fn from_entry(entry: &ProgressEntry) -> Result<Self> {
        Ok(CsvRow {
            id: entry.id.to_string(),
            date: entry.date.to_rfc3339(),
            workout_id: entry.workout_id.to_string(),
            workout_name: entry.workout_name.clone(),
            completed: entry.completed,
            rating: entry.rating.map(u8::from),
            notes: entry.notes.clone(),
            exercise_time_spent: serde_json::to_string(&entry.exercise_time_spent)?,
            total_seconds: entry.total_seconds(),
        })
    }
}

/// Roll up the progress log into CSV and archive the log
///
/// 1. Reads all entries from the log
/// 2. Appends them to the CSV file (writing headers if it is new)
/// 3. Syncs the CSV to disk
/// 4. Renames the log to `<name>.processed`
///
/// Returns the number of entries rolled up.
pub fn log_to_csv_and_archive(log_path: &Path, csv_path: &Path) -> Result<usize> {
    let entries = crate::wal::read_entries(log_path)?;

    if entries.is_empty() {
        tracing::info!("No progress entries in log to roll up");
        return Ok(0);
    }

    if let Some(parent) = csv_path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(csv_path)?;

    let needs_headers = file.metadata()?.len() == 0;

    let mut writer = csv::WriterBuilder::new()
        .has_headers(needs_headers)
        .from_writer(file);

    for entry in &entries {
        writer.serialize(CsvRow::from_entry(entry)?)?;
    }

    writer.flush()?;
    let file = writer
        .into_inner()
        .map_err(|e| std::io::Error::new(std::io::ErrorKind::Other, e))?;
    file.sync_all()?;

    tracing::info!("Wrote {} progress entries to CSV", entries.len());

    let processed_path = processed_path(log_path);
    std::fs::rename(log_path, &processed_path)?;

    tracing::info!("Archived progress log to {:?}", processed_path);

    Ok(entries.len())
}

fn processed_path(log_path: &Path) -> std::path::PathBuf {
    let mut name = log_path
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_default();
    name.push(".");
    name.push(PROCESSED_SUFFIX);
    log_path.with_file_name(name)
}

/// Remove every `*.processed` file in `dir`
pub fn cleanup_processed_logs(dir: &Path) -> Result<usize> {
    if !dir.exists() {
        return Ok(0);
    }

    let mut count = 0;
    for entry in std::fs::read_dir(dir)? {
        let path = entry?.path();

        if path.extension().is_some_and(|ext| ext == PROCESSED_SUFFIX) {
            std::fs::remove_file(&path)?;
            tracing::debug!("Removed processed log: {:?}", path);
            count += 1;
        }
    }

    if count > 0 {
        tracing::info!("Cleaned up {} processed log files", count);
    }

    Ok(count)
}
