//! Per-job scratch files.
//!
//! Each layout job gets a Pajek input path and a JSON output path in the
//! pool's scratch directory. Names are `<unix millis>_<random u32>` so
//! concurrent jobs never collide. [`ScratchFiles`] removes both files when
//! [`ScratchFiles::remove`] is awaited, or synchronously on drop. Queued
//! jobs own their files, so the drop happens only after the worker is done.

use std::io;
use std::path::{Path, PathBuf};

use chrono::Utc;

use crate::error::LayoutError;

pub const INPUT_EXTENSION: &str = "net";
pub const OUTPUT_EXTENSION: &str = "json";

/// Directory in which per-job files are allocated.
#[derive(Debug, Clone)]
pub struct ScratchDir {
    root: PathBuf,
}

/// The input/output pair for one job.
#[derive(Debug)]
pub struct ScratchFiles {
    input: PathBuf,
    output: PathBuf,
    armed: bool,
}

impl ScratchDir {
    /// Create the directory if needed and resolve it to an absolute path,
    /// since workers may run from a different working directory.
    pub async fn create(root: impl AsRef<Path>) -> Result<Self, LayoutError> {
        let root = root.as_ref();
        tokio::fs::create_dir_all(root)
            .await
            .map_err(|e| LayoutError::io(root, e))?;
        let root = tokio::fs::canonicalize(root)
            .await
            .map_err(|e| LayoutError::io(root, e))?;
        Ok(Self { root })
    }

    pub fn path(&self) -> &Path {
        &self.root
    }

    /// Reserve a fresh, uniquely named input/output pair. Nothing is
    /// created on disk yet.
    pub fn allocate(&self) -> ScratchFiles {
        let stem = format!(
            "{}_{:08x}",
            Utc::now().timestamp_millis(),
            rand::random::<u32>()
        );
        ScratchFiles {
            input: self.root.join(format!("{stem}.{INPUT_EXTENSION}")),
            output: self.root.join(format!("{stem}.{OUTPUT_EXTENSION}")),
            armed: true,
        }
    }
}

impl ScratchFiles {
    pub fn input(&self) -> &Path {
        &self.input
    }

    pub fn output(&self) -> &Path {
        &self.output
    }

    /// Delete both files. A file that was never created is not an error.
    pub async fn remove(mut self) -> Result<(), LayoutError> {
        self.armed = false;
        let input = remove_if_present(&self.input).await;
        let output = remove_if_present(&self.output).await;
        input.and(output)
    }
}

impl Drop for ScratchFiles {
    fn drop(&mut self) {
        if !self.armed {
            return;
        }
        for path in [&self.input, &self.output] {
            if let Err(e) = std::fs::remove_file(path) {
                if e.kind() != io::ErrorKind::NotFound {
                    tracing::warn!(
                        path = %path.display(),
                        error = %e,
                        "Failed to remove scratch file",
                    );
                }
            }
        }
    }
}

async fn remove_if_present(path: &Path) -> Result<(), LayoutError> {
    match tokio::fs::remove_file(path).await {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(LayoutError::io(path, e)),
    }
}
