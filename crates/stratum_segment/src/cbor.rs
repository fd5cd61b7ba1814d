//! Loader for `metadata.cbor` segment directories.
//!
//! The metadata file is the CBOR encoding of [`SegmentMetadata`]. The
//! `index_dir` stored in the file, if any, is replaced by the directory the
//! segment was actually found in.

use crate::error::{LoadError, LoadResult};
use crate::loader::{check_identity, metadata_file, SegmentLoader};
use crate::metadata::SegmentMetadata;
use std::fs::File;
use std::io::{BufReader, Write};
use std::path::Path;
use tracing::debug;

/// Metadata file read by [`CborLoader`].
pub const CBOR_METADATA_FILE: &str = "metadata.cbor";

/// Loads segments described by a CBOR metadata file.
#[derive(Debug, Clone, Copy, Default)]
pub struct CborLoader;

impl CborLoader {
    /// Creates a new loader.
    #[must_use]
    pub fn new() -> Self {
        Self
    }

    /// Writes `metadata` in the format this loader reads.
    ///
    /// # Errors
    ///
    /// Returns an error if encoding fails.
    pub fn write_metadata<W: Write>(metadata: &SegmentMetadata, writer: W) -> LoadResult<()> {
        ciborium::into_writer(metadata, writer).map_err(|e| {
            LoadError::malformed(metadata.name.as_str(), format!("CBOR encoding failed: {e}"))
        })
    }
}

impl SegmentLoader for CborLoader {
    fn load(&self, path: &Path) -> LoadResult<SegmentMetadata> {
        let file_path = metadata_file(path, CBOR_METADATA_FILE)?;
        let file = File::open(&file_path).map_err(|e| LoadError::io(&file_path, e))?;

        let mut metadata: SegmentMetadata = ciborium::from_reader(BufReader::new(file))
            .map_err(|e| LoadError::malformed(path, format!("CBOR decoding failed: {e}")))?;
        metadata.index_dir = Some(path.to_path_buf());

        check_identity(path, &metadata)?;
        debug!(path = %path.display(), segment = %metadata.name, "loaded CBOR metadata");
        Ok(metadata)
    }

    fn name(&self) -> &str {
        crate::registry::CBOR_LOADER
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn loads_written_metadata() {
        let root = tempdir().unwrap();
        let dir = root.path().join("seg1");
        fs::create_dir(&dir).unwrap();

        let written = SegmentMetadata::new("seg1", "table2")
            .with_total_docs(7)
            .with_index_dir("/somewhere/else")
            .with_property("owner", "ingest");
        let file = File::create(dir.join(CBOR_METADATA_FILE)).unwrap();
        CborLoader::write_metadata(&written, file).unwrap();

        let loaded = CborLoader::new().load(&dir).unwrap();
        assert_eq!(loaded.name, "seg1");
        assert_eq!(loaded.resource_name, "table2");
        assert_eq!(loaded.total_docs, 7);
        assert_eq!(loaded.custom["owner"], "ingest");
        assert_eq!(loaded.index_dir(), Some(dir.as_path()));
    }

    #[test]
    fn truncated_file_is_malformed() {
        let root = tempdir().unwrap();
        let dir = root.path().join("bad");
        fs::create_dir(&dir).unwrap();

        let mut bytes = Vec::new();
        CborLoader::write_metadata(&SegmentMetadata::new("bad", "t"), &mut bytes).unwrap();
        bytes.truncate(bytes.len() / 2);
        fs::write(dir.join(CBOR_METADATA_FILE), bytes).unwrap();

        let err = CborLoader::new().load(&dir).unwrap_err();
        assert!(matches!(err, LoadError::Malformed { .. }));
    }

    #[test]
    fn missing_file_is_not_a_segment() {
        let root = tempdir().unwrap();
        let err = CborLoader::new().load(root.path()).unwrap_err();
        assert!(matches!(err, LoadError::NotASegment { .. }));
    }
}
