//! Execution unit lifecycle
//!
//! An execution unit is the single-use scratch directory created to run one
//! submission: one directory, one source file, one subprocess. Removal is
//! guaranteed on every exit path; the directory is deleted when the unit is
//! dropped, and [`ExecutionUnit::close`] surfaces removal errors for callers
//! that want to check them.

use std::path::{Path, PathBuf};

use tempfile::TempDir;
use tracing::{debug, instrument, warn};

use crate::sandbox::SandboxError;

/// Name of the source file placed in every unit
pub const SOURCE_FILE: &str = "main.py";

/// A single-use scratch directory holding one submission
#[derive(Debug)]
pub struct ExecutionUnit {
    dir: TempDir,
    source_path: PathBuf,
}

impl ExecutionUnit {
    /// Create a unit under `scratch_root` and write the source into it
    #[instrument(skip(source))]
    pub async fn create(scratch_root: &Path, source: &str) -> Result<Self, SandboxError> {
        tokio::fs::create_dir_all(scratch_root)
            .await
            .map_err(SandboxError::Unit)?;

        let dir = tempfile::Builder::new()
            .prefix("classbox-")
            .tempdir_in(scratch_root)
            .map_err(SandboxError::Unit)?;

        let source_path = dir.path().join(SOURCE_FILE);
        tokio::fs::write(&source_path, source)
            .await
            .map_err(SandboxError::Unit)?;

        debug!(path = %source_path.display(), len = source.len(), "wrote submission source");
        Ok(Self { dir, source_path })
    }

    /// Directory the interpreter runs in (also its HOME and TMPDIR)
    pub fn dir(&self) -> &Path {
        self.dir.path()
    }

    /// Host path of the source file
    pub fn source_path(&self) -> &Path {
        &self.source_path
    }

    /// Remove the unit now, surfacing any removal error.
    ///
    /// Dropping the unit removes it as well; use this when the caller wants
    /// the error instead of a log line.
    #[must_use = "removal errors should be handled"]
    pub fn close(self) -> Result<(), SandboxError> {
        let path = self.dir.path().to_path_buf();
        match self.dir.close() {
            Ok(()) => {
                debug!(path = %path.display(), "execution unit removed");
                Ok(())
            }
            Err(e) => {
                warn!(path = %path.display(), error = %e, "failed to remove execution unit");
                Err(SandboxError::Unit(e))
            }
        }
    }
}
