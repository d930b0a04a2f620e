//! Scratch workspace for a single deployment.

use super::error::{ErrorExt, Result};
use chrono::{DateTime, Utc};
use std::path::Path;
use tempfile::TempDir;

const WORKSPACE_PREFIX: &str = "simforge-";

/// Uniquely named temporary directory owned by one pipeline run.
///
/// The directory is removed when the workspace is dropped, so every exit path
/// (including unwinding) cleans up. [`ScratchWorkspace::close`] removes it
/// explicitly and reports removal errors.
#[derive(Debug)]
pub struct ScratchWorkspace {
    dir: TempDir,
    created_at: DateTime<Utc>,
}

impl ScratchWorkspace {
    /// Creates a workspace under `root`, or the system temp dir when `None`.
    pub fn create(root: Option<&Path>) -> Result<Self> {
        let mut builder = tempfile::Builder::new();
        builder.prefix(WORKSPACE_PREFIX);

        let dir = match root {
            Some(root) => {
                std::fs::create_dir_all(root).fs_context("creating scratch root", root)?;
                builder
                    .tempdir_in(root)
                    .fs_context("creating scratch workspace in", root)?
            }
            None => builder
                .tempdir()
                .fs_context("creating scratch workspace in", std::env::temp_dir())?,
        };

        log::debug!("Created scratch workspace {}", dir.path().display());

        Ok(Self {
            dir,
            created_at: Utc::now(),
        })
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Removes the workspace and everything in it.
    pub fn close(self) -> Result<()> {
        let path = self.dir.path().to_path_buf();
        let age = Utc::now() - self.created_at;
        self.dir.close().fs_context("removing scratch workspace", &path)?;
        log::debug!(
            "Removed scratch workspace {} after {}ms",
            path.display(),
            age.num_milliseconds()
        );
        Ok(())
    }
}
