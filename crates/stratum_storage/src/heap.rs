//! Heap-resident segment storage.

use crate::backend::SegmentStorage;
use crate::error::{StorageError, StorageResult};
use bytes::Bytes;
use std::fs;
use std::path::{Path, PathBuf};

/// Segment data held entirely in memory.
///
/// The whole data file is read once when the store is opened. Reads are
/// zero-copy slices of the shared buffer.
///
/// # Example
///
/// ```rust
/// use stratum_storage::{HeapStorage, SegmentStorage};
///
/// let storage = HeapStorage::from_vec(b"test data".to_vec());
/// assert_eq!(storage.size(), 9);
/// assert!(storage.is_resident());
/// ```
#[derive(Debug, Clone, Default)]
pub struct HeapStorage {
    data: Bytes,
    path: Option<PathBuf>,
}

impl HeapStorage {
    /// Creates an empty store, used for metadata-only segments.
    #[must_use]
    pub fn empty() -> Self {
        Self::default()
    }

    /// Creates a store over existing bytes.
    #[must_use]
    pub fn from_vec(data: Vec<u8>) -> Self {
        Self {
            data: Bytes::from(data),
            path: None,
        }
    }

    /// Reads the whole file at `path` into memory.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read.
    pub fn load(path: &Path) -> StorageResult<Self> {
        let data = fs::read(path)?;
        Ok(Self {
            data: Bytes::from(data),
            path: Some(path.to_path_buf()),
        })
    }
}

impl SegmentStorage for HeapStorage {
    fn read_at(&self, offset: u64, len: usize) -> StorageResult<Bytes> {
        let size = self.data.len() as u64;
        let end = offset.saturating_add(len as u64);

        if offset > size || end > size {
            return Err(StorageError::ReadPastEnd { offset, len, size });
        }

        Ok(self.data.slice(offset as usize..end as usize))
    }

    fn size(&self) -> u64 {
        self.data.len() as u64
    }

    fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    fn is_resident(&self) -> bool {
        true
    }
}
