//! User profile loader.
//!
//! The profile is written by the questionnaire (`fitgen profile set`) and
//! read before generating a plan. A missing profile routes the user back to
//! profile creation.

use crate::{Result, UserProfile};
use std::path::{Path, PathBuf};

/// File-backed profile collaborator
pub struct ProfileStore {
    path: PathBuf,
}

impl ProfileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Load the profile
    ///
    /// Returns None if the file doesn't exist or can't be parsed.
    pub fn load(&self) -> Option<UserProfile> {
        if !self.path.exists() {
            tracing::debug!("No profile found at {:?}", self.path);
            return None;
        }

        let contents = match std::fs::read_to_string(&self.path) {
            Ok(contents) => contents,
            Err(e) => {
                tracing::warn!("Failed to read profile at {:?}: {}. Ignoring profile.", self.path, e);
                return None;
            }
        };

        match serde_json::from_str(&contents) {
            Ok(profile) => Some(profile),
            Err(e) => {
                tracing::warn!("Failed to parse profile at {:?}: {}. Ignoring profile.", self.path, e);
                None
            }
        }
    }

    pub fn save(&self, profile: &UserProfile) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let contents = serde_json::to_string_pretty(profile)?;
        std::fs::write(&self.path, contents)?;
        tracing::info!("Saved profile to {:?}", self.path);
        Ok(())
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}
