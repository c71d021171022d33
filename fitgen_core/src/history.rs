//! Progress history loading.
//!
//! Entries come from both the live progress log and the archived CSV, so a
//! rollup never hides anything from the history or stats views.

use crate::csv_rollup::CsvRow;
use crate::{Error, ProgressEntry, Rating, Result};
use chrono::{DateTime, Duration, NaiveDate, Utc};
use csv::ReaderBuilder;
use std::collections::{BTreeMap, HashSet};
use std::path::Path;
use uuid::Uuid;

impl TryFrom<CsvRow> for ProgressEntry {
    type Error = Error;

    fn try_from(row: CsvRow) -> Result<Self> {
        let id = Uuid::parse_str(&row.id)
            .map_err(|e| Error::Other(format!("Invalid UUID: {}", e)))?;
        let workout_id = Uuid::parse_str(&row.workout_id)
            .map_err(|e| Error::Other(format!("Invalid workout UUID: {}", e)))?;

        let date = DateTime::parse_from_rfc3339(&row.date)
            .map_err(|e| Error::Other(format!("Invalid date: {}", e)))?
            .with_timezone(&Utc);

        let rating = row.rating.map(Rating::try_from).transpose()?;

        let exercise_time_spent = if row.exercise_time_spent.trim().is_empty() {
            BTreeMap::new()
        } else {
            serde_json::from_str(&row.exercise_time_spent)?
        };

        Ok(ProgressEntry {
            id,
            date,
            workout_id,
            workout_name: row.workout_name,
            completed: row.completed,
            rating,
            notes: row.notes.filter(|n| !n.is_empty()),
            exercise_time_spent,
        })
    }
}

/// Load every entry from the log and CSV, newest first
pub fn load_all_entries(log_path: &Path, csv_path: &Path) -> Result<Vec<ProgressEntry>> {
    load_entries_since(log_path, csv_path, None)
}

/// Load entries from the last `days` days, newest first
///
/// Entries present in both the log and the CSV are returned once.
pub fn load_recent_entries(
    log_path: &Path,
    csv_path: &Path,
    days: i64,
) -> Result<Vec<ProgressEntry>> {
    load_entries_since(log_path, csv_path, Some(Utc::now() - Duration::days(days)))
}

fn load_entries_since(
    log_path: &Path,
    csv_path: &Path,
    cutoff: Option<DateTime<Utc>>,
) -> Result<Vec<ProgressEntry>> {
    let in_window = |entry: &ProgressEntry| cutoff.map_or(true, |c| entry.date >= c);
    let mut entries = Vec::new();
    let mut seen_ids = HashSet::new();

    // Log first (most recent)
    for entry in crate::wal::read_entries(log_path)? {
        if in_window(&entry) && seen_ids.insert(entry.id) {
            entries.push(entry);
        }
    }
    tracing::debug!("Loaded {} entries from progress log", entries.len());

    if csv_path.exists() {
        let mut csv_count = 0;
        for entry in load_entries_from_csv(csv_path)? {
            if in_window(&entry) && seen_ids.insert(entry.id) {
                entries.push(entry);
                csv_count += 1;
            }
        }
        tracing::debug!("Loaded {} entries from CSV", csv_count);
    }

    entries.sort_by(|a, b| b.date.cmp(&a.date));

    tracing::info!("Loaded {} progress entries", entries.len());
    Ok(entries)
}

fn load_entries_from_csv(path: &Path) -> Result<Vec<ProgressEntry>> {
    let mut reader = ReaderBuilder::new().has_headers(true).from_path(path)?;

    let mut entries = Vec::new();
    for result in reader.deserialize::<CsvRow>() {
        match result {
            Ok(row) => match ProgressEntry::try_from(row) {
                Ok(entry) => entries.push(entry),
                Err(e) => tracing::warn!("Failed to parse CSV row: {}", e),
            },
            Err(e) => tracing::warn!("Failed to deserialize CSV row: {}", e),
        }
    }

    Ok(entries)
}

/// Group entries by UTC calendar day, newest day first
///
/// Order within a day is preserved.
pub fn group_by_day(entries: &[ProgressEntry]) -> Vec<(NaiveDate, Vec<&ProgressEntry>)> {
    let mut days: BTreeMap<NaiveDate, Vec<&ProgressEntry>> = BTreeMap::new();
    for entry in entries {
        days.entry(entry.date.date_naive()).or_default().push(entry);
    }
    days.into_iter().rev().collect()
}
