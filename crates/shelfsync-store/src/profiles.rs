//! Browser profile directory management.
//!
//! Each login username owns one on-disk profile directory holding the
//! browser's cookies and local storage. The directory shares its lifecycle
//! with the matching identity row: created at login, deleted on rollback.

use std::path::{Path, PathBuf};

use tracing::warn;

use shelfsync_core::Result;

/// Root of the per-username browser profile directories.
#[derive(Debug, Clone)]
pub struct ProfileRoot {
    root: PathBuf,
}

impl ProfileRoot {
    pub fn new(root: impl AsRef<Path>) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
        }
    }

    /// Profile directory for a username. Not created until the browser
    /// launches with it.
    pub fn dir_for(&self, username: &str) -> PathBuf {
        self.root.join(sanitize(username))
    }

    /// Whether a profile directory exists for the username.
    pub fn exists(&self, username: &str) -> bool {
        self.dir_for(username).is_dir()
    }

    /// Recursively delete the profile directory if present.
    pub fn remove(&self, username: &str) -> Result<()> {
        let dir = self.dir_for(username);
        if dir.is_dir() {
            std::fs::remove_dir_all(&dir)?;
        }
        Ok(())
    }

    /// Delete the profile directory, logging instead of failing.
    ///
    /// Used on rollback paths where cleanup must not mask the original error.
    pub fn remove_best_effort(&self, username: &str) {
        if let Err(e) = self.remove(username) {
            warn!("Failed to remove profile for {}: {}", username, e);
        }
    }
}

/// Keep usernames from escaping the sessions root or producing invalid paths.
fn sanitize(username: &str) -> String {
    let cleaned: String = username
        .chars()
        .map(|c| match c {
            '/' | '\\' | ':' => '_',
            c => c,
        })
        .collect();
    if cleaned == "." || cleaned == ".." {
        format!("_{cleaned}")
    } else {
        cleaned
    }
}
