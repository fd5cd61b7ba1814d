//! Storage mode selection.

use crate::backend::SegmentStorage;
use crate::error::{StorageError, StorageResult};
use crate::file::FileStorage;
use crate::heap::HeapStorage;
use std::fmt;
use std::path::Path;
use std::str::FromStr;

/// How a resource keeps its segments' data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum StorageMode {
    /// Segment data is read fully into memory when the segment is added.
    #[default]
    Heap,
    /// Segment data stays on disk and is read on demand.
    File,
}

impl StorageMode {
    /// Returns the configuration name of this mode.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Heap => "heap",
            Self::File => "file",
        }
    }

    /// Returns true if segments of this mode need a directory on disk.
    #[must_use]
    pub const fn is_persistent(&self) -> bool {
        matches!(self, Self::File)
    }
}

impl fmt::Display for StorageMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for StorageMode {
    type Err = StorageError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "heap" => Ok(Self::Heap),
            // "mmap" is accepted for configurations written for older nodes.
            "file" | "mmap" => Ok(Self::File),
            other => Err(StorageError::UnknownMode(other.to_string())),
        }
    }
}

/// Opens the data file of a segment with the given mode.
///
/// A missing data file yields an empty heap store: segments may be
/// assigned with metadata only.
///
/// # Errors
///
/// Returns an error if the data file exists but cannot be read.
pub fn open_segment_data(
    mode: StorageMode,
    data_file: Option<&Path>,
) -> StorageResult<Box<dyn SegmentStorage>> {
    let Some(path) = data_file.filter(|p| p.is_file()) else {
        return Ok(Box::new(HeapStorage::empty()));
    };

    match mode {
        StorageMode::Heap => Ok(Box::new(HeapStorage::load(path)?)),
        StorageMode::File => Ok(Box::new(FileStorage::open(path)?)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn parse_modes() {
        assert_eq!("heap".parse::<StorageMode>().unwrap(), StorageMode::Heap);
        assert_eq!(" File ".parse::<StorageMode>().unwrap(), StorageMode::File);
        assert_eq!("mmap".parse::<StorageMode>().unwrap(), StorageMode::File);
        assert!(matches!(
            "tape".parse::<StorageMode>(),
            Err(StorageError::UnknownMode(_))
        ));
    }

    #[test]
    fn display_round_trips_through_parse() {
        for mode in [StorageMode::Heap, StorageMode::File] {
            assert_eq!(mode.to_string().parse::<StorageMode>().unwrap(), mode);
        }
    }

    #[test]
    fn open_without_file_is_empty() {
        let storage = open_segment_data(StorageMode::File, None).unwrap();
        assert_eq!(storage.size(), 0);

        let dir = tempdir().unwrap();
        let missing = dir.path().join("segment.dat");
        let storage = open_segment_data(StorageMode::File, Some(&missing)).unwrap();
        assert_eq!(storage.size(), 0);
    }

    #[test]
    fn open_selects_backend() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("segment.dat");
        fs::write(&path, b"abc").unwrap();

        let heap = open_segment_data(StorageMode::Heap, Some(&path)).unwrap();
        assert!(heap.is_resident());
        assert_eq!(heap.size(), 3);

        let file = open_segment_data(StorageMode::File, Some(&path)).unwrap();
        assert!(!file.is_resident());
        assert_eq!(&file.read_at(1, 2).unwrap()[..], b"bc");
    }
}
