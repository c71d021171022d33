//! Workout collection persistence with file locking.
//!
//! The collection lives in a single JSON file that is read under a shared
//! lock and replaced atomically on every write.

use crate::{Error, Result, Workout};
use fs2::FileExt;
use serde::{Deserialize, Serialize};
use std::fs::{File, OpenOptions};
use std::io::{Read, Write};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use uuid::Uuid;

/// Workout persistence collaborator
pub trait WorkoutStore {
    fn create_workout(&mut self, workout: &Workout) -> Result<Uuid>;
    fn list_workouts(&self) -> Result<Vec<Workout>>;
    fn mark_completed(&mut self, id: Uuid) -> Result<()>;
}

/// On-disk form of the workout collection
#[derive(Clone, Debug, Serialize, Deserialize, Default)]
pub struct WorkoutCollection {
    pub workouts: Vec<Workout>,
}

impl WorkoutCollection {
    /// Load the collection with shared locking
    ///
    /// Returns an empty collection if the file doesn't exist.
    /// If the file is corrupted, logs a warning and returns an empty collection.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            tracing::info!("No workout file found, starting with an empty collection");
            return Ok(Self::default());
        }

        let file = match File::open(path) {
            Ok(f) => f,
            Err(e) => {
                tracing::warn!("Unable to open workout file {:?}: {}. Using empty collection.", path, e);
                return Ok(Self::default());
            }
        };

        if let Err(e) = file.lock_shared() {
            tracing::warn!("Unable to lock workout file {:?}: {}. Using empty collection.", path, e);
            return Ok(Self::default());
        }

        let mut contents = String::new();
        let mut reader = std::io::BufReader::new(&file);
        if let Err(e) = reader.read_to_string(&mut contents) {
            let _ = file.unlock();
            tracing::warn!("Failed to read workout file {:?}: {}. Using empty collection.", path, e);
            return Ok(Self::default());
        }

        file.unlock()?;

        match serde_json::from_str::<WorkoutCollection>(&contents) {
            Ok(collection) => {
                tracing::debug!(
                    "Loaded {} workouts from {:?}",
                    collection.workouts.len(),
                    path
                );
                Ok(collection)
            }
            Err(e) => {
                tracing::warn!("Failed to parse workout file {:?}: {}. Using empty collection.", path, e);
                Ok(Self::default())
            }
        }
    }

    /// Save the collection with exclusive locking
    ///
    /// Atomically writes by:
    /// 1. Writing to a temp file
    /// 2. Syncing to disk
    /// 3. Renaming over the original
    pub fn save(&self, path: &Path) -> Result<()> {
        let parent = path.parent().ok_or_else(|| {
            std::io::Error::new(std::io::ErrorKind::Other, "workout path missing parent")
        })?;
        std::fs::create_dir_all(parent)?;

        let temp = NamedTempFile::new_in(parent)?;
        temp.as_file().lock_exclusive()?;

        {
            let mut writer = std::io::BufWriter::new(temp.as_file());
            let contents = serde_json::to_string(self)?;
            writer.write_all(contents.as_bytes())?;
            writer.flush()?;
        }

        temp.as_file().sync_all()?;
        temp.as_file().unlock()?;

        temp.persist(path).map_err(|e| Error::Io(e.error))?;

        tracing::debug!("Saved {} workouts to {:?}", self.workouts.len(), path);
        Ok(())
    }

    /// Load, modify and save back
    ///
    /// Holds an exclusive lock on `<path>.lock` for the whole cycle, so
    /// concurrent updates from other processes are applied one after another.
    pub fn update<F, T>(path: &Path, f: F) -> Result<T>
    where
        F: FnOnce(&mut WorkoutCollection) -> Result<T>,
    {
        let _guard = UpdateLock::acquire(path)?;
        let mut collection = Self::load(path)?;
        let out = f(&mut collection)?;
        collection.save(path)?;
        Ok(out)
    }
}

/// Exclusive lock on the sidecar file next to the collection
///
/// The collection itself is replaced by rename on every save, so it can't
/// carry a lock across a load/save cycle.
struct UpdateLock {
    file: File,
}

impl UpdateLock {
    fn acquire(path: &Path) -> Result<Self> {
        let lock_path = lock_path(path);
        if let Some(parent) = lock_path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let file = OpenOptions::new()
            .create(true)
            .truncate(false)
            .write(true)
            .open(&lock_path)?;
        file.lock_exclusive()?;
        Ok(Self { file })
    }
}

impl Drop for UpdateLock {
    fn drop(&mut self) {
        if let Err(e) = self.file.unlock() {
            tracing::warn!("Failed to release workout lock: {}", e);
        }
    }
}

fn lock_path(path: &Path) -> PathBuf {
    let mut name = path
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_default();
    name.push(".lock");
    path.with_file_name(name)
}

/// File-backed [`WorkoutStore`]
pub struct JsonWorkoutStore {
    path: PathBuf,
}

impl JsonWorkoutStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl WorkoutStore for JsonWorkoutStore {
    fn create_workout(&mut self, workout: &Workout) -> Result<Uuid> {
        WorkoutCollection::update(&self.path, |c| {
            c.workouts.retain(|w| w.id != workout.id);
            c.workouts.push(workout.clone());
            Ok(workout.id)
        })
    }

    /// Newest plan first; within a plan, generation order
    fn list_workouts(&self) -> Result<Vec<Workout>> {
        let mut workouts = WorkoutCollection::load(&self.path)?.workouts;
        workouts.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(workouts)
    }

    fn mark_completed(&mut self, id: Uuid) -> Result<()> {
        WorkoutCollection::update(&self.path, |c| {
            let workout = c
                .workouts
                .iter_mut()
                .find(|w| w.id == id)
                .ok_or_else(|| Error::WorkoutNotFound(id.to_string()))?;
            workout.completed = true;
            Ok(())
        })
    }
}
