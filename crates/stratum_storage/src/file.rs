//! File-backed segment storage.

use crate::backend::SegmentStorage;
use crate::error::{StorageError, StorageResult};
use bytes::{Bytes, BytesMut};
use parking_lot::Mutex;
use std::fs::File;
use std::io::{Read, Seek, SeekFrom};
use std::path::{Path, PathBuf};

/// Segment data read from disk on demand.
///
/// The file is opened once and kept open for the lifetime of the store;
/// nothing is cached in memory.
///
/// # Thread Safety
///
/// Reads share one file handle behind a mutex, so a seek and the read
/// that follows it are never interleaved with another reader.
///
/// # Example
///
/// ```no_run
/// use stratum_storage::{FileStorage, SegmentStorage};
/// use std::path::Path;
///
/// let storage = FileStorage::open(Path::new("segment.dat")).unwrap();
/// let header = storage.read_at(0, 16).unwrap();
/// ```
#[derive(Debug)]
pub struct FileStorage {
    path: PathBuf,
    file: Mutex<File>,
    size: u64,
}

impl FileStorage {
    /// Opens an existing data file read-only.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be opened.
    pub fn open(path: &Path) -> StorageResult<Self> {
        let file = File::open(path)?;
        let size = file.metadata()?.len();

        Ok(Self {
            path: path.to_path_buf(),
            file: Mutex::new(file),
            size,
        })
    }
}

impl SegmentStorage for FileStorage {
    fn read_at(&self, offset: u64, len: usize) -> StorageResult<Bytes> {
        let end = offset.saturating_add(len as u64);

        if offset > self.size || end > self.size {
            return Err(StorageError::ReadPastEnd {
                offset,
                len,
                size: self.size,
            });
        }

        if len == 0 {
            return Ok(Bytes::new());
        }

        let mut buffer = BytesMut::zeroed(len);
        let mut file = self.file.lock();
        file.seek(SeekFrom::Start(offset))?;
        file.read_exact(&mut buffer)?;

        Ok(buffer.freeze())
    }

    fn size(&self) -> u64 {
        self.size
    }

    fn path(&self) -> Option<&Path> {
        Some(&self.path)
    }

    fn is_resident(&self) -> bool {
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    fn create_storage(contents: &[u8]) -> (tempfile::TempDir, FileStorage) {
        let dir = tempdir().unwrap();
        let path = dir.path().join("segment.dat");
        fs::write(&path, contents).unwrap();
        let storage = FileStorage::open(&path).unwrap();
        (dir, storage)
    }

    #[test]
    fn file_read_at_returns_correct_data() {
        let (_dir, storage) = create_storage(b"hello world");

        assert_eq!(storage.size(), 11);
        assert_eq!(&storage.read_at(0, 5).unwrap()[..], b"hello");
        assert_eq!(&storage.read_at(6, 5).unwrap()[..], b"world");
        assert!(!storage.is_resident());
    }

    #[test]
    fn file_read_past_end_fails() {
        let (_dir, storage) = create_storage(b"hello");

        let result = storage.read_at(2, 10);
        assert!(matches!(result, Err(StorageError::ReadPastEnd { .. })));
    }

    #[test]
    fn file_empty_read() {
        let (_dir, storage) = create_storage(b"hello");
        assert!(storage.read_at(5, 0).unwrap().is_empty());
    }

    #[test]
    fn file_open_missing_fails() {
        let dir = tempdir().unwrap();
        let result = FileStorage::open(&dir.path().join("nope.dat"));
        assert!(matches!(result, Err(StorageError::Io(_))));
    }

    #[test]
    fn file_concurrent_reads() {
        let data: Vec<u8> = (0..=255u8).collect();
        let (_dir, storage) = create_storage(&data);
        let storage = std::sync::Arc::new(storage);

        let handles: Vec<_> = (0..4u64)
            .map(|t| {
                let storage = std::sync::Arc::clone(&storage);
                std::thread::spawn(move || {
                    for i in 0..64u64 {
                        let offset = (t * 64 + i) % 255;
                        let byte = storage.read_at(offset, 1).unwrap();
                        assert_eq!(byte[0], offset as u8);
                    }
                })
            })
            .collect();

        for handle in handles {
            handle.join().expect("reader panicked");
        }
    }
}
