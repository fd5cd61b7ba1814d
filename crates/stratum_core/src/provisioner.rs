//! On-demand construction of resource data managers.

use crate::config::{InstanceDataManagerConfig, ResourceDataManagerConfig};
use crate::error::{CoreError, CoreResult};
use crate::resource::ResourceDataManager;
use std::fs;
use stratum_storage::StorageMode;
use tracing::debug;

/// Maximum length of a resource name.
pub const MAX_RESOURCE_NAME_LEN: usize = 128;

/// The closed set of resource kinds a node can host.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResourceKind {
    /// Segment data held on the heap; a data directory is optional.
    InMemory,
    /// Segment data read from files under the node data directory.
    Persistent,
}

impl ResourceKind {
    /// Returns the kind serving a storage mode.
    #[must_use]
    pub const fn for_mode(mode: StorageMode) -> Self {
        match mode {
            StorageMode::Heap => Self::InMemory,
            StorageMode::File => Self::Persistent,
        }
    }
}

/// Builds fully configured resource data managers from the node
/// configuration.
///
/// Provisioning is atomic: it either returns a usable manager or an error,
/// and the caller registers nothing on error.
#[derive(Debug, Clone, Copy, Default)]
pub struct ResourceProvisioner;

impl ResourceProvisioner {
    /// Projects the node configuration onto one resource.
    ///
    /// # Errors
    ///
    /// Returns a configuration error if the name cannot be used as a
    /// resource name, or if a persistent resource is requested on a node
    /// without a data directory.
    pub fn default_config(
        instance: &InstanceDataManagerConfig,
        resource_name: &str,
    ) -> CoreResult<ResourceDataManagerConfig> {
        validate_resource_name(resource_name)?;

        let mut config = ResourceDataManagerConfig::new(resource_name)
            .with_storage_mode(instance.storage_mode);

        match (ResourceKind::for_mode(instance.storage_mode), &instance.data_dir) {
            (_, Some(dir)) => config = config.with_data_dir(dir.join(resource_name)),
            (ResourceKind::InMemory, None) => {}
            (ResourceKind::Persistent, None) => {
                return Err(CoreError::configuration(format!(
                    "resource {resource_name} uses {} storage but the node has no data directory",
                    instance.storage_mode
                )));
            }
        }

        Ok(config)
    }

    /// Provisions a manager for a resource using the node defaults.
    ///
    /// # Errors
    ///
    /// See [`default_config`](Self::default_config) and
    /// [`build`](Self::build).
    pub fn provision(
        instance: &InstanceDataManagerConfig,
        resource_name: &str,
    ) -> CoreResult<ResourceDataManager> {
        let config = Self::default_config(instance, resource_name)?;
        Self::build(config)
    }

    /// Constructs the manager for an already resolved configuration.
    ///
    /// A persistent resource gets its data directory created here.
    ///
    /// # Errors
    ///
    /// Returns a configuration error if a persistent resource has no data
    /// directory, or an I/O error if the directory cannot be created.
    pub fn build(config: ResourceDataManagerConfig) -> CoreResult<ResourceDataManager> {
        match ResourceKind::for_mode(config.storage_mode) {
            ResourceKind::InMemory => {}
            ResourceKind::Persistent => {
                let dir = config.data_dir.as_ref().ok_or_else(|| {
                    CoreError::configuration(format!(
                        "persistent resource {} has no data directory",
                        config.resource_name
                    ))
                })?;
                fs::create_dir_all(dir)?;
            }
        }

        debug!(
            resource = %config.resource_name,
            mode = %config.storage_mode,
            "provisioned resource data manager"
        );
        Ok(ResourceDataManager::new(config))
    }
}

/// Checks that a resource name is usable as a directory name.
///
/// # Errors
///
/// Returns a configuration error describing the violation.
pub fn validate_resource_name(name: &str) -> CoreResult<()> {
    if name.is_empty() || name.len() > MAX_RESOURCE_NAME_LEN {
        return Err(CoreError::configuration(format!(
            "resource name must be 1-{MAX_RESOURCE_NAME_LEN} characters, got {}",
            name.len()
        )));
    }
    if name == "." || name == ".." {
        return Err(CoreError::configuration(format!(
            "resource name {name:?} is reserved"
        )));
    }

    let valid = name
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-' || c == '.');
    if !valid {
        return Err(CoreError::configuration(format!(
            "resource name {name:?} may only contain a-z, A-Z, 0-9, _, - and ."
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resource::ResourceStatus;
    use std::path::Path;
    use tempfile::tempdir;

    #[test]
    fn heap_resource_without_data_dir() {
        let instance = InstanceDataManagerConfig::default();
        let config = ResourceProvisioner::default_config(&instance, "table1").unwrap();

        assert_eq!(config.resource_name, "table1");
        assert_eq!(config.storage_mode, StorageMode::Heap);
        assert!(config.data_dir.is_none());
    }

    #[test]
    fn heap_resource_inherits_data_dir() {
        let instance = InstanceDataManagerConfig::new().with_data_dir("/data");
        let config = ResourceProvisioner::default_config(&instance, "table1").unwrap();
        assert_eq!(config.data_dir.as_deref(), Some(Path::new("/data/table1")));
    }

    #[test]
    fn persistent_resource_requires_data_dir() {
        let instance = InstanceDataManagerConfig::new().with_storage_mode(StorageMode::File);
        let err = ResourceProvisioner::provision(&instance, "table1").unwrap_err();
        assert!(err.is_configuration());
    }

    #[test]
    fn persistent_resource_creates_directory() {
        let temp = tempdir().unwrap();
        let instance = InstanceDataManagerConfig::new()
            .with_data_dir(temp.path())
            .with_storage_mode(StorageMode::File);

        let manager = ResourceProvisioner::provision(&instance, "table1").unwrap();
        assert!(temp.path().join("table1").is_dir());
        assert_eq!(manager.resource_name(), "table1");
        assert_eq!(manager.status(), ResourceStatus::Created);
    }

    #[test]
    fn build_rejects_persistent_without_dir() {
        let config = ResourceDataManagerConfig::new("t").with_storage_mode(StorageMode::File);
        assert!(ResourceProvisioner::build(config).unwrap_err().is_configuration());
    }

    #[test]
    fn resource_name_rules() {
        assert!(validate_resource_name("table_1").is_ok());
        assert!(validate_resource_name("my-table.v2").is_ok());
        assert!(validate_resource_name(&"a".repeat(128)).is_ok());

        for bad in ["", ".", "..", "a/b", "a b", "täble"] {
            assert!(
                validate_resource_name(bad).unwrap_err().is_configuration(),
                "{bad:?}"
            );
        }
        assert!(validate_resource_name(&"a".repeat(129)).is_err());
    }

    #[test]
    fn kind_follows_mode() {
        assert_eq!(ResourceKind::for_mode(StorageMode::Heap), ResourceKind::InMemory);
        assert_eq!(ResourceKind::for_mode(StorageMode::File), ResourceKind::Persistent);
    }
}
