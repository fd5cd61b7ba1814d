//! Segment metadata.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// Default segment format version.
pub const DEFAULT_VERSION: &str = "v1";

/// Identity and descriptive metadata of one immutable segment.
///
/// A segment name is unique within its resource. Everything besides the
/// name and resource name is carried through untouched by the data
/// managers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SegmentMetadata {
    /// Segment name, unique within the resource.
    pub name: String,
    /// Name of the resource (logical table) owning the segment.
    pub resource_name: String,
    /// Segment format version.
    #[serde(default = "default_version")]
    pub version: String,
    /// Number of documents (rows) in the segment.
    #[serde(default)]
    pub total_docs: u64,
    /// Checksum published by the segment builder, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub crc: Option<String>,
    /// Directory holding the segment files, if it lives on this node.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub index_dir: Option<PathBuf>,
    /// Any other properties published with the segment.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub custom: BTreeMap<String, String>,
}

fn default_version() -> String {
    DEFAULT_VERSION.to_string()
}

impl SegmentMetadata {
    /// Creates metadata for a segment of a resource.
    pub fn new(name: impl Into<String>, resource_name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            resource_name: resource_name.into(),
            version: default_version(),
            total_docs: 0,
            crc: None,
            index_dir: None,
            custom: BTreeMap::new(),
        }
    }

    /// Sets the format version.
    #[must_use]
    pub fn with_version(mut self, version: impl Into<String>) -> Self {
        self.version = version.into();
        self
    }

    /// Sets the document count.
    #[must_use]
    pub fn with_total_docs(mut self, total_docs: u64) -> Self {
        self.total_docs = total_docs;
        self
    }

    /// Sets the checksum.
    #[must_use]
    pub fn with_crc(mut self, crc: impl Into<String>) -> Self {
        self.crc = Some(crc.into());
        self
    }

    /// Sets the directory holding the segment files.
    #[must_use]
    pub fn with_index_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.index_dir = Some(dir.into());
        self
    }

    /// Adds a custom property.
    #[must_use]
    pub fn with_property(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.custom.insert(key.into(), value.into());
        self
    }

    /// Returns the segment directory, if known.
    #[must_use]
    pub fn index_dir(&self) -> Option<&Path> {
        self.index_dir.as_deref()
    }
}
