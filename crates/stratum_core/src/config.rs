//! Data manager configuration.
//!
//! Both configuration types are plain values: they are built once, checked
//! once at init time and never change afterwards. Reading configuration
//! files is left to the embedding process; [`InstanceDataManagerConfig`]
//! accepts the already-parsed key/value pairs.

use crate::error::{CoreError, CoreResult};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use stratum_segment::PROPERTIES_LOADER;
use stratum_storage::StorageMode;

/// Key for [`InstanceDataManagerConfig::instance_id`].
pub const KEY_INSTANCE_ID: &str = "id";
/// Key for [`InstanceDataManagerConfig::data_dir`].
pub const KEY_DATA_DIR: &str = "data.dir";
/// Key for [`InstanceDataManagerConfig::bootstrap_segment_dir`].
pub const KEY_BOOTSTRAP_SEGMENT_DIR: &str = "bootstrap.segment.dir";
/// Key for [`InstanceDataManagerConfig::segment_loader`].
pub const KEY_SEGMENT_LOADER: &str = "segment.loader";
/// Key for [`InstanceDataManagerConfig::storage_mode`].
pub const KEY_READ_MODE: &str = "read.mode";

/// Default instance identifier.
pub const DEFAULT_INSTANCE_ID: &str = "stratum-node";

/// Node-level configuration consumed by the instance data manager.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstanceDataManagerConfig {
    /// Identifier of this node, used in logs and reports.
    pub instance_id: String,

    /// Root directory for per-resource data (`<data_dir>/<resource>`).
    pub data_dir: Option<PathBuf>,

    /// Directory whose children are loaded as segments on start.
    pub bootstrap_segment_dir: Option<PathBuf>,

    /// Identifier of the segment loader in the loader registry.
    pub segment_loader: String,

    /// Default storage mode for resources provisioned on this node.
    pub storage_mode: StorageMode,
}

impl Default for InstanceDataManagerConfig {
    fn default() -> Self {
        Self {
            instance_id: DEFAULT_INSTANCE_ID.to_string(),
            data_dir: None,
            bootstrap_segment_dir: None,
            segment_loader: PROPERTIES_LOADER.to_string(),
            storage_mode: StorageMode::Heap,
        }
    }
}

impl InstanceDataManagerConfig {
    /// Creates a configuration with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a configuration from parsed key/value pairs.
    ///
    /// Unknown keys are ignored so a node can share one configuration
    /// source with other components.
    ///
    /// # Errors
    ///
    /// Returns a configuration error if a value cannot be interpreted or
    /// the result fails [`validate`](Self::validate).
    pub fn from_properties(props: &BTreeMap<String, String>) -> CoreResult<Self> {
        let mut config = Self::default();

        if let Some(id) = props.get(KEY_INSTANCE_ID) {
            config.instance_id = id.trim().to_string();
        }
        if let Some(dir) = non_empty(props, KEY_DATA_DIR) {
            config.data_dir = Some(PathBuf::from(dir));
        }
        if let Some(dir) = non_empty(props, KEY_BOOTSTRAP_SEGMENT_DIR) {
            config.bootstrap_segment_dir = Some(PathBuf::from(dir));
        }
        if let Some(loader) = props.get(KEY_SEGMENT_LOADER) {
            config.segment_loader = loader.trim().to_string();
        }
        if let Some(mode) = props.get(KEY_READ_MODE) {
            config.storage_mode = mode
                .parse()
                .map_err(|e| CoreError::configuration(format!("{KEY_READ_MODE}: {e}")))?;
        }

        config.validate()?;
        Ok(config)
    }

    /// Sets the instance identifier.
    #[must_use]
    pub fn with_instance_id(mut self, id: impl Into<String>) -> Self {
        self.instance_id = id.into();
        self
    }

    /// Sets the data directory.
    #[must_use]
    pub fn with_data_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.data_dir = Some(dir.into());
        self
    }

    /// Sets the bootstrap segment directory.
    #[must_use]
    pub fn with_bootstrap_segment_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.bootstrap_segment_dir = Some(dir.into());
        self
    }

    /// Sets the segment loader identifier.
    #[must_use]
    pub fn with_segment_loader(mut self, loader: impl Into<String>) -> Self {
        self.segment_loader = loader.into();
        self
    }

    /// Sets the default storage mode.
    #[must_use]
    pub fn with_storage_mode(mut self, mode: StorageMode) -> Self {
        self.storage_mode = mode;
        self
    }

    /// Checks that the configuration is complete.
    ///
    /// The bootstrap directory does not have to exist; a missing directory
    /// only skips bootstrap.
    ///
    /// # Errors
    ///
    /// Returns a configuration error describing the first problem found.
    pub fn validate(&self) -> CoreResult<()> {
        if self.instance_id.trim().is_empty() {
            return Err(CoreError::configuration("instance id must not be empty"));
        }
        if self.segment_loader.trim().is_empty() {
            return Err(CoreError::configuration(
                "segment loader identifier must not be empty",
            ));
        }
        check_not_file(KEY_DATA_DIR, self.data_dir.as_deref())?;
        check_not_file(KEY_BOOTSTRAP_SEGMENT_DIR, self.bootstrap_segment_dir.as_deref())?;
        Ok(())
    }
}

fn non_empty<'a>(props: &'a BTreeMap<String, String>, key: &str) -> Option<&'a str> {
    props
        .get(key)
        .map(|v| v.trim())
        .filter(|v| !v.is_empty())
}

fn check_not_file(key: &str, dir: Option<&Path>) -> CoreResult<()> {
    match dir {
        Some(dir) if dir.exists() && !dir.is_dir() => Err(CoreError::configuration(format!(
            "{key}: {} is not a directory",
            dir.display()
        ))),
        _ => Ok(()),
    }
}

/// Per-resource configuration, derived from the node configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceDataManagerConfig {
    /// Name of the resource.
    pub resource_name: String,

    /// Directory holding this resource's segments, if any.
    pub data_dir: Option<PathBuf>,

    /// How segment data is kept.
    pub storage_mode: StorageMode,
}

impl ResourceDataManagerConfig {
    /// Creates a heap-backed configuration without a data directory.
    pub fn new(resource_name: impl Into<String>) -> Self {
        Self {
            resource_name: resource_name.into(),
            data_dir: None,
            storage_mode: StorageMode::Heap,
        }
    }

    /// Sets the resource data directory.
    #[must_use]
    pub fn with_data_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.data_dir = Some(dir.into());
        self
    }

    /// Sets the storage mode.
    #[must_use]
    pub fn with_storage_mode(mut self, mode: StorageMode) -> Self {
        self.storage_mode = mode;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn props(pairs: &[(&str, &str)]) -> BTreeMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect()
    }

    #[test]
    fn default_config() {
        let config = InstanceDataManagerConfig::default();
        assert_eq!(config.instance_id, DEFAULT_INSTANCE_ID);
        assert_eq!(config.segment_loader, PROPERTIES_LOADER);
        assert_eq!(config.storage_mode, StorageMode::Heap);
        assert!(config.data_dir.is_none());
        assert!(config.bootstrap_segment_dir.is_none());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn builder_pattern() {
        let config = InstanceDataManagerConfig::new()
            .with_instance_id("server_1")
            .with_bootstrap_segment_dir("/data/bootstrap")
            .with_segment_loader("cbor")
            .with_storage_mode(StorageMode::File);

        assert_eq!(config.instance_id, "server_1");
        assert_eq!(
            config.bootstrap_segment_dir.as_deref(),
            Some(Path::new("/data/bootstrap"))
        );
        assert_eq!(config.segment_loader, "cbor");
        assert_eq!(config.storage_mode, StorageMode::File);
    }

    #[test]
    fn from_properties_reads_known_keys() {
        let config = InstanceDataManagerConfig::from_properties(&props(&[
            (KEY_INSTANCE_ID, "server_7"),
            (KEY_DATA_DIR, "/var/stratum/data"),
            (KEY_BOOTSTRAP_SEGMENT_DIR, " /var/stratum/bootstrap "),
            (KEY_SEGMENT_LOADER, "cbor"),
            (KEY_READ_MODE, "mmap"),
            ("query.executor.threads", "8"),
        ]))
        .unwrap();

        assert_eq!(config.instance_id, "server_7");
        assert_eq!(config.data_dir.as_deref(), Some(Path::new("/var/stratum/data")));
        assert_eq!(
            config.bootstrap_segment_dir.as_deref(),
            Some(Path::new("/var/stratum/bootstrap"))
        );
        assert_eq!(config.segment_loader, "cbor");
        assert_eq!(config.storage_mode, StorageMode::File);
    }

    #[test]
    fn from_properties_rejects_bad_mode() {
        let err = InstanceDataManagerConfig::from_properties(&props(&[(KEY_READ_MODE, "tape")]))
            .unwrap_err();
        assert!(err.is_configuration());
    }

    #[test]
    fn from_properties_rejects_empty_loader() {
        let err =
            InstanceDataManagerConfig::from_properties(&props(&[(KEY_SEGMENT_LOADER, "  ")]))
                .unwrap_err();
        assert!(err.is_configuration());
    }

    #[test]
    fn empty_directory_values_are_unset() {
        let config =
            InstanceDataManagerConfig::from_properties(&props(&[(KEY_BOOTSTRAP_SEGMENT_DIR, "")]))
                .unwrap();
        assert!(config.bootstrap_segment_dir.is_none());
    }

    #[test]
    fn validate_rejects_file_as_directory() {
        let temp = tempdir().unwrap();
        let file = temp.path().join("not_a_dir");
        std::fs::write(&file, b"x").unwrap();

        let err = InstanceDataManagerConfig::new()
            .with_data_dir(&file)
            .validate()
            .unwrap_err();
        assert!(err.is_configuration());
    }

    #[test]
    fn validate_accepts_missing_bootstrap_dir() {
        let config = InstanceDataManagerConfig::new()
            .with_bootstrap_segment_dir("/definitely/not/here/bootstrap");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn resource_config_builder() {
        let config = ResourceDataManagerConfig::new("table1")
            .with_data_dir("/data/table1")
            .with_storage_mode(StorageMode::File);

        assert_eq!(config.resource_name, "table1");
        assert_eq!(config.data_dir.as_deref(), Some(Path::new("/data/table1")));
        assert_eq!(config.storage_mode, StorageMode::File);
    }
}
