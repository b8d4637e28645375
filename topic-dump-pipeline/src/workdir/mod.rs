//! Working directory scope guard.
//!
//! One run owns one directory at the deterministic path
//! `<base>/<ticket>/<request-id>/<topic>`. Everything the run writes
//! (capture, metadata, archives, sealed artifact, digest, per-request log)
//! lives under it, and dropping the guard removes the tree on every exit
//! path. The un-encrypted dump must never outlive the run, so removal is not
//! optional.

use std::fs;
use std::path::{Path, PathBuf};

use tracing::warn;

use crate::errors::WorkDirError;

/// RAII guard over one run's working directory.
pub struct WorkDir {
    path: PathBuf,
    base: PathBuf,
    removed: bool,
}

impl WorkDir {
    /// Creates the working directory for the given request key.
    ///
    /// A pre-existing directory for the same key is an error: it means a
    /// previous run is still active or died without cleanup, and merging
    /// into it could republish stale data.
    pub fn create(
        base: &Path,
        ticket: &str,
        request_id: &str,
        topic: &str,
    ) -> Result<Self, WorkDirError> {
        let path = base.join(ticket).join(request_id).join(topic);
        if path.exists() {
            return Err(WorkDirError::AlreadyExists { path });
        }
        fs::create_dir_all(&path).map_err(|source| WorkDirError::Io {
            path: path.clone(),
            source,
        })?;
        Ok(Self {
            path,
            base: base.to_path_buf(),
            removed: false,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn capture_path(&self, topic: &str) -> PathBuf {
        self.path.join(format!("{topic}.jsonl"))
    }

    pub fn metadata_path(&self) -> PathBuf {
        self.path.join("metadata.json")
    }

    pub fn archive_path(&self, request_id: &str) -> PathBuf {
        self.path.join(format!("{request_id}.tar.gz"))
    }

    pub fn sealed_path(&self, request_id: &str) -> PathBuf {
        self.path.join(format!("{request_id}.tar.gz.enc"))
    }

    pub fn digest_path(&self, request_id: &str) -> PathBuf {
        self.path.join(format!("{request_id}.tar.gz.enc.sha256"))
    }

    pub fn log_path(&self) -> PathBuf {
        self.path.join("request.log")
    }

    /// Removes the directory now, surfacing any error. `Drop` remains as the
    /// safety net for paths that never reach this call.
    pub fn remove(mut self) -> Result<(), WorkDirError> {
        self.remove_tree().map_err(|source| WorkDirError::Io {
            path: self.path.clone(),
            source,
        })
    }

    fn remove_tree(&mut self) -> std::io::Result<()> {
        if self.removed {
            return Ok(());
        }
        fs::remove_dir_all(&self.path)?;
        self.removed = true;

        // Peel off now-empty parents up to the base dir; other runs may
        // still own siblings, so a non-empty parent just stops the walk.
        let mut parent = self.path.parent();
        while let Some(dir) = parent {
            if dir == self.base || fs::remove_dir(dir).is_err() {
                break;
            }
            parent = dir.parent();
        }
        Ok(())
    }
}

impl Drop for WorkDir {
    fn drop(&mut self) {
        if let Err(error) = self.remove_tree() {
            warn!(path = %self.path.display(), %error, "failed to remove working directory");
        }
    }
}
