//! Node data directory management.
//!
//! ```text
//! <data_dir>/
//! ├─ LOCK              # Advisory lock, one node per data directory
//! ├─ <resource>/       # One directory per file-backed resource
//! │  └─ <segment>/     # Segment files placed by the cluster layer
//! └─ ...
//! ```

use crate::error::{CoreError, CoreResult};
use fs2::FileExt;
use std::fs::{self, File, OpenOptions};
use std::path::{Path, PathBuf};

const LOCK_FILE: &str = "LOCK";

/// Exclusive handle on a node's data directory.
///
/// The lock is held for as long as the value lives and released when it is
/// dropped.
#[derive(Debug)]
pub struct InstanceDir {
    path: PathBuf,
    _lock_file: File,
}

impl InstanceDir {
    /// Opens (creating if needed) and locks a data directory.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::DataDirLocked`] if another process holds the
    /// directory, or an I/O error if it cannot be created.
    pub fn open(path: &Path) -> CoreResult<Self> {
        fs::create_dir_all(path)?;

        if !path.is_dir() {
            return Err(CoreError::configuration(format!(
                "data directory {} is not a directory",
                path.display()
            )));
        }

        let lock_file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(path.join(LOCK_FILE))?;

        if lock_file.try_lock_exclusive().is_err() {
            return Err(CoreError::DataDirLocked {
                path: path.to_path_buf(),
            });
        }

        Ok(Self {
            path: path.to_path_buf(),
            _lock_file: lock_file,
        })
    }

    /// Returns the locked directory.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Returns the directory of a resource.
    #[must_use]
    pub fn resource_dir(&self, resource_name: &str) -> PathBuf {
        self.path.join(resource_name)
    }
}
