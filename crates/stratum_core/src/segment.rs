//! Loaded segment handle.

use std::fmt;
use stratum_segment::SegmentMetadata;
use stratum_storage::{HeapStorage, SegmentStorage};

/// One loaded segment: its metadata plus the storage holding its data.
///
/// Handles are owned by the resource data manager that created them and
/// shared read-only with readers through `Arc`. A handle holds no reference
/// back to its owner.
pub struct SegmentHandle {
    metadata: SegmentMetadata,
    storage: Box<dyn SegmentStorage>,
}

impl SegmentHandle {
    /// Wraps metadata and the storage opened for it.
    pub fn new(metadata: SegmentMetadata, storage: Box<dyn SegmentStorage>) -> Self {
        Self { metadata, storage }
    }

    /// Wraps metadata for a segment with no local data.
    pub fn metadata_only(metadata: SegmentMetadata) -> Self {
        Self::new(metadata, Box::new(HeapStorage::empty()))
    }

    /// Returns the segment name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.metadata.name
    }

    /// Returns the owning resource name.
    #[must_use]
    pub fn resource_name(&self) -> &str {
        &self.metadata.resource_name
    }

    /// Returns the segment metadata.
    #[must_use]
    pub fn metadata(&self) -> &SegmentMetadata {
        &self.metadata
    }

    /// Returns the storage holding the segment data.
    #[must_use]
    pub fn storage(&self) -> &dyn SegmentStorage {
        self.storage.as_ref()
    }

    /// Returns the size of the segment data in bytes.
    #[must_use]
    pub fn size_bytes(&self) -> u64 {
        self.storage.size()
    }
}

impl fmt::Debug for SegmentHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SegmentHandle")
            .field("name", &self.metadata.name)
            .field("resource", &self.metadata.resource_name)
            .field("size_bytes", &self.storage.size())
            .finish_non_exhaustive()
    }
}
