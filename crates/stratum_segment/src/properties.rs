//! Loader for `metadata.properties` segment directories.
//!
//! ## Format
//!
//! ```text
//! # comment
//! segment.name = segA
//! segment.resource.name = table1
//! segment.total.docs = 1000
//! segment.time.unit: DAYS
//! ```
//!
//! One `key = value` (or `key: value`) pair per line; lines starting with
//! `#` or `!` are comments. Line continuations are not supported.

use crate::error::{LoadError, LoadResult};
use crate::loader::{check_identity, metadata_file, SegmentLoader};
use crate::metadata::SegmentMetadata;
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use tracing::debug;

/// Metadata file read by [`PropertiesLoader`].
pub const PROPERTIES_METADATA_FILE: &str = "metadata.properties";

/// Key holding the segment name.
pub const PROP_SEGMENT_NAME: &str = "segment.name";
/// Key holding the owning resource name.
pub const PROP_RESOURCE_NAME: &str = "segment.resource.name";
/// Key holding the format version.
pub const PROP_VERSION: &str = "segment.version";
/// Key holding the document count.
pub const PROP_TOTAL_DOCS: &str = "segment.total.docs";
/// Key holding the checksum.
pub const PROP_CRC: &str = "segment.crc";

/// Loads segments described by a `metadata.properties` file.
#[derive(Debug, Clone, Copy, Default)]
pub struct PropertiesLoader;

impl PropertiesLoader {
    /// Creates a new loader.
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

impl SegmentLoader for PropertiesLoader {
    fn load(&self, path: &Path) -> LoadResult<SegmentMetadata> {
        let file = metadata_file(path, PROPERTIES_METADATA_FILE)?;
        let text = fs::read_to_string(&file).map_err(|e| LoadError::io(&file, e))?;
        let mut props = parse_properties(path, &text)?;

        let name = take_required(path, &mut props, PROP_SEGMENT_NAME)?;
        let resource_name = take_required(path, &mut props, PROP_RESOURCE_NAME)?;
        let mut metadata = SegmentMetadata::new(name, resource_name).with_index_dir(path);

        if let Some(version) = props.remove(PROP_VERSION) {
            metadata.version = version;
        }
        if let Some(raw) = props.remove(PROP_TOTAL_DOCS) {
            metadata.total_docs = raw.parse().map_err(|_| LoadError::InvalidProperty {
                path: path.to_path_buf(),
                key: PROP_TOTAL_DOCS.to_string(),
                value: raw.clone(),
            })?;
        }
        metadata.crc = props.remove(PROP_CRC);
        metadata.custom = props;

        check_identity(path, &metadata)?;
        debug!(path = %path.display(), segment = %metadata.name, "loaded properties metadata");
        Ok(metadata)
    }

    fn name(&self) -> &str {
        crate::registry::PROPERTIES_LOADER
    }
}

fn parse_properties(path: &Path, text: &str) -> LoadResult<BTreeMap<String, String>> {
    let mut props = BTreeMap::new();

    for (line_no, line) in text.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') || line.starts_with('!') {
            continue;
        }

        let Some(split) = line.find(&['=', ':'][..]) else {
            return Err(LoadError::malformed(
                path,
                format!("line {}: expected key = value", line_no + 1),
            ));
        };

        let key = line[..split].trim();
        if key.is_empty() {
            return Err(LoadError::malformed(
                path,
                format!("line {}: empty key", line_no + 1),
            ));
        }
        props.insert(key.to_string(), line[split + 1..].trim().to_string());
    }

    Ok(props)
}

fn take_required(path: &Path, props: &mut BTreeMap<String, String>, key: &str) -> LoadResult<String> {
    props.remove(key).ok_or_else(|| LoadError::MissingProperty {
        path: path.to_path_buf(),
        key: key.to_string(),
    })
}
