//! Segment storage trait definition.

use crate::error::StorageResult;
use bytes::Bytes;
use std::fmt::Debug;
use std::path::Path;

/// A read-only byte store for one segment's data.
///
/// # Invariants
///
/// - `read_at` returns exactly `len` bytes or fails; it never short-reads
/// - `size` is fixed for the lifetime of the store
/// - Backends must be `Send + Sync` so handles can be shared with readers
///
/// # Implementors
///
/// - [`super::HeapStorage`] - data held in memory
/// - [`super::FileStorage`] - data read from disk on demand
pub trait SegmentStorage: Send + Sync + Debug {
    /// Reads `len` bytes starting at `offset`.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The read would extend beyond the current size
    /// - An I/O error occurs
    fn read_at(&self, offset: u64, len: usize) -> StorageResult<Bytes>;

    /// Returns the size of the segment data in bytes.
    fn size(&self) -> u64;

    /// Returns the file backing this store, if any.
    fn path(&self) -> Option<&Path>;

    /// Returns true if the data is resident in memory.
    fn is_resident(&self) -> bool;
}
