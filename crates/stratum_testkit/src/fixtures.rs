//! Test fixtures for on-disk segments.
//!
//! Writes segment directories in the layouts the built-in loaders read,
//! plus broken entries for exercising bootstrap failure handling.

use std::collections::BTreeMap;
use std::fs::{self, File};
use std::path::{Path, PathBuf};
use stratum_core::{InstanceDataManager, InstanceDataManagerConfig, SegmentMetadata};
use stratum_segment::{
    CborLoader, CBOR_METADATA_FILE, PROPERTIES_METADATA_FILE, PROP_CRC, PROP_RESOURCE_NAME,
    PROP_SEGMENT_NAME, PROP_TOTAL_DOCS, PROP_VERSION, SEGMENT_DATA_FILE,
};
use tempfile::TempDir;

/// Description of a segment to write to disk.
#[derive(Debug, Clone)]
pub struct SegmentFixture {
    /// Segment name.
    pub name: String,
    /// Owning resource.
    pub resource: String,
    /// Format version.
    pub version: String,
    /// Document count.
    pub total_docs: u64,
    /// Checksum.
    pub crc: Option<String>,
    /// Extra properties.
    pub custom: BTreeMap<String, String>,
    /// Contents of the data file, if one should be written.
    pub data: Option<Vec<u8>>,
}

impl SegmentFixture {
    /// Creates a fixture with no data file.
    pub fn new(name: impl Into<String>, resource: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            resource: resource.into(),
            version: "v1".to_string(),
            total_docs: 0,
            crc: None,
            custom: BTreeMap::new(),
            data: None,
        }
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

    /// Adds an extra property.
    #[must_use]
    pub fn with_property(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.custom.insert(key.into(), value.into());
        self
    }

    /// Sets the data file contents.
    #[must_use]
    pub fn with_data(mut self, data: impl Into<Vec<u8>>) -> Self {
        self.data = Some(data.into());
        self
    }

    /// Returns the metadata a loader should produce for `dir`.
    pub fn expected_metadata(&self, dir: &Path) -> SegmentMetadata {
        let mut metadata = SegmentMetadata::new(&self.name, &self.resource)
            .with_version(&self.version)
            .with_total_docs(self.total_docs)
            .with_index_dir(dir);
        metadata.crc = self.crc.clone();
        metadata.custom = self.custom.clone();
        metadata
    }

    /// Writes the segment as a properties segment directory.
    pub fn write_properties(&self, dir: &Path) -> PathBuf {
        fs::create_dir_all(dir).expect("Failed to create segment directory");

        let mut text = String::from("# written by stratum_testkit\n");
        text.push_str(&format!("{PROP_SEGMENT_NAME} = {}\n", self.name));
        text.push_str(&format!("{PROP_RESOURCE_NAME} = {}\n", self.resource));
        text.push_str(&format!("{PROP_VERSION} = {}\n", self.version));
        text.push_str(&format!("{PROP_TOTAL_DOCS} = {}\n", self.total_docs));
        if let Some(crc) = &self.crc {
            text.push_str(&format!("{PROP_CRC} = {crc}\n"));
        }
        for (key, value) in &self.custom {
            text.push_str(&format!("{key} = {value}\n"));
        }

        fs::write(dir.join(PROPERTIES_METADATA_FILE), text).expect("Failed to write metadata");
        self.write_data(dir);
        dir.to_path_buf()
    }

    /// Writes the segment as a CBOR segment directory.
    pub fn write_cbor(&self, dir: &Path) -> PathBuf {
        fs::create_dir_all(dir).expect("Failed to create segment directory");

        let mut metadata = self.expected_metadata(dir);
        metadata.index_dir = None;
        let file = File::create(dir.join(CBOR_METADATA_FILE)).expect("Failed to create metadata");
        CborLoader::write_metadata(&metadata, file).expect("Failed to encode metadata");

        self.write_data(dir);
        dir.to_path_buf()
    }

    fn write_data(&self, dir: &Path) {
        if let Some(data) = &self.data {
            fs::write(dir.join(SEGMENT_DATA_FILE), data).expect("Failed to write segment data");
        }
    }
}

/// A temporary bootstrap directory with automatic cleanup.
pub struct BootstrapDir {
    temp_dir: TempDir,
}

impl BootstrapDir {
    /// Creates an empty bootstrap directory.
    pub fn new() -> Self {
        Self {
            temp_dir: TempDir::new().expect("Failed to create temp directory"),
        }
    }

    /// Returns the directory path.
    pub fn path(&self) -> &Path {
        self.temp_dir.path()
    }

    /// Adds a properties segment in a directory named after the segment.
    pub fn add_properties(&self, fixture: &SegmentFixture) -> PathBuf {
        fixture.write_properties(&self.path().join(&fixture.name))
    }

    /// Adds a CBOR segment in a directory named after the segment.
    pub fn add_cbor(&self, fixture: &SegmentFixture) -> PathBuf {
        fixture.write_cbor(&self.path().join(&fixture.name))
    }

    /// Adds a directory whose metadata no loader accepts.
    pub fn add_corrupt(&self, dir_name: &str) -> PathBuf {
        let dir = self.path().join(dir_name);
        fs::create_dir_all(&dir).expect("Failed to create segment directory");
        fs::write(dir.join(PROPERTIES_METADATA_FILE), "segment.total.docs = many\n")
            .expect("Failed to write metadata");
        fs::write(dir.join(CBOR_METADATA_FILE), [0xffu8, 0x00, 0x13])
            .expect("Failed to write metadata");
        dir
    }

    /// Adds a plain file entry.
    pub fn add_file(&self, name: &str, contents: &[u8]) -> PathBuf {
        let path = self.path().join(name);
        fs::write(&path, contents).expect("Failed to write file");
        path
    }

    /// Returns a node configuration bootstrapping from this directory.
    pub fn config(&self) -> InstanceDataManagerConfig {
        InstanceDataManagerConfig::new().with_bootstrap_segment_dir(self.path())
    }

    /// Returns a node initialized with [`config`](Self::config).
    pub fn node(&self) -> InstanceDataManager {
        let node = InstanceDataManager::default();
        node.init(self.config()).expect("Failed to initialize node");
        node
    }
}

impl Default for BootstrapDir {
    fn default() -> Self {
        Self::new()
    }
}

/// Runs a test with a started node that has no bootstrap directory.
pub fn with_started_node<F, R>(f: F) -> R
where
    F: FnOnce(&InstanceDataManager) -> R,
{
    let node = InstanceDataManager::default();
    node.init(InstanceDataManagerConfig::new())
        .expect("Failed to initialize node");
    node.start().expect("Failed to start node");
    let result = f(&node);
    node.shut_down();
    result
}

/// Common bootstrap layouts.
pub mod scenarios {
    use super::*;

    /// One valid segment `segA` of `table1` and one corrupt entry `segB`.
    pub fn valid_and_corrupt() -> BootstrapDir {
        let dir = BootstrapDir::new();
        dir.add_properties(&SegmentFixture::new("segA", "table1").with_total_docs(100));
        dir.add_corrupt("segB");
        dir
    }

    /// `valid` segments spread over `resources` resources, plus `invalid`
    /// corrupt entries.
    pub fn mixed(valid: usize, invalid: usize, resources: usize) -> BootstrapDir {
        let dir = BootstrapDir::new();
        let resources = resources.max(1);
        for i in 0..valid {
            dir.add_properties(&SegmentFixture::new(
                format!("seg_{i:04}"),
                format!("table_{}", i % resources),
            ));
        }
        for i in 0..invalid {
            dir.add_corrupt(&format!("corrupt_{i:04}"));
        }
        dir
    }
}
