//! Segment loader trait.

use crate::error::{LoadError, LoadResult};
use crate::metadata::SegmentMetadata;
use std::path::{Path, PathBuf};

/// Turns a filesystem path into segment metadata.
///
/// Loaders only read metadata; they never open or keep the segment's data.
/// A loader may be called from several threads at once.
pub trait SegmentLoader: Send + Sync {
    /// Loads the metadata of the segment stored at `path`.
    ///
    /// # Errors
    ///
    /// Returns a [`crate::LoadError`] if `path` does not hold a structurally
    /// valid segment.
    fn load(&self, path: &Path) -> LoadResult<SegmentMetadata>;

    /// Returns the identifier this loader is registered under.
    fn name(&self) -> &str;
}

/// Returns the metadata file inside a segment directory.
pub(crate) fn metadata_file(path: &Path, file_name: &str) -> LoadResult<PathBuf> {
    if !path.is_dir() {
        return Err(LoadError::not_a_segment(path, "not a directory"));
    }

    let file = path.join(file_name);
    if !file.is_file() {
        return Err(LoadError::not_a_segment(
            path,
            format!("{file_name} not found"),
        ));
    }

    Ok(file)
}

/// Rejects metadata without a usable identity.
pub(crate) fn check_identity(path: &Path, metadata: &SegmentMetadata) -> LoadResult<()> {
    if metadata.name.trim().is_empty() {
        return Err(LoadError::malformed(path, "empty segment name"));
    }
    if metadata.resource_name.trim().is_empty() {
        return Err(LoadError::malformed(path, "empty resource name"));
    }
    Ok(())
}
