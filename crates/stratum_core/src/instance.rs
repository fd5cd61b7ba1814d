//! Instance data manager.
//!
//! The node-level registry of resources and the owner of the node
//! lifecycle:
//!
//! ```text
//!                 init                start
//! Uninitialized ───────► Initialized ───────► Started
//!       │                    ▲                  │  ▲
//!       │ init fails         │ init             │  │ start
//!       ▼                    │          shut_down  │
//!   FailedInit ──────────────┘                  ▼  │
//!                                             Stopped
//! ```
//!
//! # Locking
//!
//! - The control mutex serializes `init`, `start`, `shut_down` and the
//!   registration of newly provisioned resources.
//! - The resource map lock is only held to look up, insert or copy out
//!   entries, so readers never wait for bootstrap or a segment load.
//! - Each resource guards its own segments (see [`ResourceDataManager`]).
//!
//! Locks are always taken in that order.

use crate::config::{InstanceDataManagerConfig, ResourceDataManagerConfig, DEFAULT_INSTANCE_ID};
use crate::dir::InstanceDir;
use crate::error::{CoreError, CoreResult};
use crate::provisioner::{validate_resource_name, ResourceProvisioner};
use crate::report::{ResourceInfo, ServerInfo};
use crate::resource::{validate_segment, ResourceDataManager};
use parking_lot::{Mutex, RwLock};
use serde::Serialize;
use std::collections::HashMap;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use stratum_segment::{LoaderRegistry, SegmentLoader, SegmentMetadata};
use tracing::{debug, error, info, warn};

/// Lifecycle stage of a node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Lifecycle {
    /// Constructed, `init` not called yet.
    Uninitialized,
    /// Configuration and loader resolved.
    Initialized,
    /// Serving.
    Started,
    /// Shut down; may be started again.
    Stopped,
    /// The last `init` failed; only `init` is accepted.
    FailedInit,
}

impl fmt::Display for Lifecycle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Uninitialized => "uninitialized",
            Self::Initialized => "initialized",
            Self::Started => "started",
            Self::Stopped => "stopped",
            Self::FailedInit => "failed-init",
        };
        f.write_str(s)
    }
}

/// A segment registered by bootstrap.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BootstrappedSegment {
    /// Path handed to the loader.
    pub path: PathBuf,
    /// Owning resource.
    pub resource_name: String,
    /// Segment name.
    pub segment_name: String,
}

/// A bootstrap entry that was skipped.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BootstrapFailure {
    /// Path handed to the loader.
    pub path: PathBuf,
    /// Why the entry was skipped.
    pub error: String,
}

/// Outcome of the bootstrap pass run by [`InstanceDataManager::start`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct BootstrapSummary {
    /// Segments registered, in path order.
    pub loaded: Vec<BootstrappedSegment>,
    /// Entries that failed to load or register, in path order.
    pub failed: Vec<BootstrapFailure>,
    /// True if no bootstrap directory was scanned.
    pub skipped: bool,
}

impl BootstrapSummary {
    fn skipped() -> Self {
        Self {
            skipped: true,
            ..Self::default()
        }
    }

    /// Returns the number of registered segments.
    #[must_use]
    pub fn loaded_count(&self) -> usize {
        self.loaded.len()
    }

    /// Returns the number of skipped entries.
    #[must_use]
    pub fn failed_count(&self) -> usize {
        self.failed.len()
    }

    /// Returns true if every entry was registered.
    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.failed.is_empty()
    }
}

impl fmt::Display for BootstrapSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.skipped {
            return write!(f, "bootstrap skipped");
        }
        write!(
            f,
            "bootstrap loaded {} segment(s), {} failure(s)",
            self.loaded.len(),
            self.failed.len()
        )?;
        for failure in &self.failed {
            write!(f, "\n  {}: {}", failure.path.display(), failure.error)?;
        }
        Ok(())
    }
}

/// Resolved collaborators, only touched under the control mutex.
#[derive(Default)]
struct NodeControl {
    loader: Option<Arc<dyn SegmentLoader>>,
    dir: Option<InstanceDir>,
}

/// What readers may see without waiting on the control mutex.
struct NodeStatus {
    lifecycle: Lifecycle,
    config: Option<Arc<InstanceDataManagerConfig>>,
}

/// The node-level data manager.
///
/// One instance is constructed per process and shared by reference (for
/// example in an `Arc`) with everything that needs it. All methods take
/// `&self`.
///
/// # Example
///
/// ```rust,no_run
/// use stratum_core::{InstanceDataManager, InstanceDataManagerConfig};
///
/// let manager = InstanceDataManager::default();
/// manager.init(
///     InstanceDataManagerConfig::new()
///         .with_instance_id("server_1")
///         .with_bootstrap_segment_dir("/data/bootstrap"),
/// )?;
/// let summary = manager.start()?;
/// println!("{summary}");
/// println!("{}", manager.server_info());
/// manager.shut_down();
/// # Ok::<(), stratum_core::CoreError>(())
/// ```
pub struct InstanceDataManager {
    registry: LoaderRegistry,
    control: Mutex<NodeControl>,
    status: RwLock<NodeStatus>,
    resources: RwLock<HashMap<String, Arc<ResourceDataManager>>>,
}

impl Default for InstanceDataManager {
    fn default() -> Self {
        Self::new(LoaderRegistry::with_builtin())
    }
}

impl InstanceDataManager {
    /// Creates an uninitialized node that resolves loaders from `registry`.
    pub fn new(registry: LoaderRegistry) -> Self {
        Self {
            registry,
            control: Mutex::new(NodeControl::default()),
            status: RwLock::new(NodeStatus {
                lifecycle: Lifecycle::Uninitialized,
                config: None,
            }),
            resources: RwLock::new(HashMap::new()),
        }
    }

    /// Resolves the configuration and the segment loader.
    ///
    /// Calling `init` again re-resolves both. The node data directory, if
    /// configured, is locked for as long as the configuration is in use.
    ///
    /// Re-initialization only affects resources provisioned afterwards.
    /// Resources already registered keep the data directory and storage
    /// mode they were provisioned with.
    ///
    /// # Errors
    ///
    /// Returns an illegal state error while the node is started. Any other
    /// failure leaves the node in [`Lifecycle::FailedInit`] with no
    /// configuration and is returned to the caller.
    pub fn init(&self, config: InstanceDataManagerConfig) -> CoreResult<()> {
        let mut control = self.control.lock();

        if self.lifecycle() == Lifecycle::Started {
            return Err(CoreError::illegal_state(
                "cannot re-initialize a started instance data manager",
            ));
        }

        // Release the previous directory lock first so re-init with the
        // same directory can take it again.
        control.loader = None;
        control.dir = None;

        match self.resolve(&config) {
            Ok((loader, dir)) => {
                info!(
                    instance = %config.instance_id,
                    loader = %config.segment_loader,
                    mode = %config.storage_mode,
                    "instance data manager initialized"
                );
                control.loader = Some(loader);
                control.dir = dir;
                self.set_status(Lifecycle::Initialized, Some(Arc::new(config)));
                Ok(())
            }
            Err(e) => {
                error!(
                    instance = %config.instance_id,
                    loader = %config.segment_loader,
                    error = %e,
                    "failed to initialize instance data manager"
                );
                self.set_status(Lifecycle::FailedInit, None);
                Err(e)
            }
        }
    }

    fn resolve(
        &self,
        config: &InstanceDataManagerConfig,
    ) -> CoreResult<(Arc<dyn SegmentLoader>, Option<InstanceDir>)> {
        config.validate()?;

        let loader = self.registry.resolve(&config.segment_loader).ok_or_else(|| {
            CoreError::configuration(format!(
                "segment loader {:?} is not registered (available: {})",
                config.segment_loader,
                self.registry.names().join(", ")
            ))
        })?;

        let dir = config
            .data_dir
            .as_deref()
            .map(InstanceDir::open)
            .transpose()?;

        Ok((loader, dir))
    }

    /// Starts every registered resource, then bootstraps segments from disk.
    ///
    /// A resource that fails to start is logged and left as it is; the
    /// others still start. A bootstrap entry that fails to load is logged
    /// and skipped. The node is marked started once the bootstrap pass is
    /// over.
    ///
    /// Starting a started node does nothing and returns a skipped summary.
    ///
    /// # Errors
    ///
    /// Returns an illegal state error if the node was never initialized or
    /// its last `init` failed.
    pub fn start(&self) -> CoreResult<BootstrapSummary> {
        let control = self.control.lock();

        match self.lifecycle() {
            Lifecycle::Initialized | Lifecycle::Stopped => {}
            Lifecycle::Started => {
                info!("instance data manager is already started, won't do anything");
                return Ok(BootstrapSummary::skipped());
            }
            stage @ (Lifecycle::Uninitialized | Lifecycle::FailedInit) => {
                return Err(CoreError::illegal_state(format!(
                    "cannot start an instance data manager that is {stage}"
                )));
            }
        }

        for resource in self.get_resource_data_managers() {
            if let Err(e) = resource.start() {
                error!(
                    resource = %resource.resource_name(),
                    error = %e,
                    "failed to start resource data manager"
                );
            }
        }

        let summary = self.bootstrap(&control);

        let mut status = self.status.write();
        status.lifecycle = Lifecycle::Started;
        drop(status);

        info!("instance data manager started");
        info!("\n{}", self.server_info());
        Ok(summary)
    }

    fn bootstrap(&self, control: &NodeControl) -> BootstrapSummary {
        let Some(dir) = self.config().and_then(|c| c.bootstrap_segment_dir.clone()) else {
            info!("no bootstrap segment directory configured, skipping bootstrap");
            return BootstrapSummary::skipped();
        };
        if !dir.is_dir() {
            warn!(path = %dir.display(), "bootstrap segment directory does not exist, skipping bootstrap");
            return BootstrapSummary::skipped();
        }
        let Some(loader) = control.loader.clone() else {
            return BootstrapSummary::skipped();
        };

        let paths = match list_entries(&dir) {
            Ok(paths) => paths,
            Err(e) => {
                error!(path = %dir.display(), error = %e, "failed to list bootstrap segment directory");
                return BootstrapSummary::skipped();
            }
        };

        info!(
            path = %dir.display(),
            entries = paths.len(),
            loader = %loader.name(),
            "bootstrapping segments"
        );

        let mut summary = BootstrapSummary::default();
        for path in paths {
            match self.bootstrap_entry(control, loader.as_ref(), &path) {
                Ok(metadata) => {
                    info!(
                        path = %path.display(),
                        resource = %metadata.resource_name,
                        segment = %metadata.name,
                        "bootstrapped segment"
                    );
                    summary.loaded.push(BootstrappedSegment {
                        path,
                        resource_name: metadata.resource_name,
                        segment_name: metadata.name,
                    });
                }
                Err(e) => {
                    error!(path = %path.display(), error = %e, "failed to bootstrap segment, skipping");
                    summary.failed.push(BootstrapFailure {
                        path,
                        error: e.to_string(),
                    });
                }
            }
        }

        info!(
            loaded = summary.loaded.len(),
            failed = summary.failed.len(),
            "bootstrap finished"
        );
        summary
    }

    fn bootstrap_entry(
        &self,
        control: &NodeControl,
        loader: &dyn SegmentLoader,
        path: &Path,
    ) -> CoreResult<SegmentMetadata> {
        let metadata = loader.load(path)?;
        self.add_segment_locked(control, metadata.clone(), true)?;
        Ok(metadata)
    }

    /// Adds a segment, provisioning its resource on first sight.
    ///
    /// Adds for resources that already exist only take that resource's
    /// lock. Provisioning a new resource happens under the control mutex,
    /// so concurrent first adds for one resource create it exactly once.
    /// A resource is registered only after its first segment was added. A
    /// failed first add removes the resource directory it created.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The node is uninitialized or its last `init` failed (`IllegalState`)
    /// - A resource must be provisioned and the node is neither
    ///   initialized nor started (`IllegalState`)
    /// - The segment name is invalid (`InvalidArgument`)
    /// - Provisioning fails (`Configuration`)
    /// - The owning resource is stopped (`IllegalState`)
    /// - The segment is rejected by its resource
    pub fn add_segment(&self, metadata: SegmentMetadata) -> CoreResult<()> {
        if let Some(resource) = self.get_resource_data_manager(&metadata.resource_name) {
            if let stage @ (Lifecycle::Uninitialized | Lifecycle::FailedInit) = self.lifecycle() {
                return Err(CoreError::illegal_state(format!(
                    "cannot add segments while the instance data manager is {stage}"
                )));
            }
            return resource.add_segment(metadata);
        }

        let control = self.control.lock();
        let start_now = match self.lifecycle() {
            Lifecycle::Initialized => false,
            Lifecycle::Started => true,
            stage => {
                return Err(CoreError::illegal_state(format!(
                    "cannot provision resource {} while the instance data manager is {stage}",
                    metadata.resource_name
                )));
            }
        };
        self.add_segment_locked(&control, metadata, start_now)
    }

    /// Adds a segment with the control mutex held.
    fn add_segment_locked(
        &self,
        _control: &NodeControl,
        metadata: SegmentMetadata,
        start_now: bool,
    ) -> CoreResult<()> {
        if let Some(resource) = self.get_resource_data_manager(&metadata.resource_name) {
            return resource.add_segment(metadata);
        }

        let config = self
            .config()
            .ok_or_else(|| CoreError::illegal_state("instance data manager is not initialized"))?;
        let name = metadata.resource_name.clone();
        validate_resource_name(&name)?;
        validate_segment(&name, &metadata)?;

        let resource_config = ResourceProvisioner::default_config(&config, &name)?;
        let created_dir = resource_config
            .data_dir
            .clone()
            .filter(|dir| resource_config.storage_mode.is_persistent() && !dir.exists());

        let manager = match Self::provision_with_segment(resource_config, metadata, start_now) {
            Ok(manager) => manager,
            Err(e) => {
                if let Some(dir) = created_dir.filter(|dir| dir.exists()) {
                    // Only removes the directory if nothing was written into it.
                    if let Err(cleanup) = fs::remove_dir(&dir) {
                        warn!(
                            resource = %name,
                            path = %dir.display(),
                            error = %cleanup,
                            "failed to remove directory of unregistered resource"
                        );
                    }
                }
                return Err(e);
            }
        };

        self.resources.write().insert(name.clone(), Arc::new(manager));
        info!(resource = %name, started = start_now, "registered resource data manager");
        Ok(())
    }

    fn provision_with_segment(
        config: ResourceDataManagerConfig,
        metadata: SegmentMetadata,
        start_now: bool,
    ) -> CoreResult<ResourceDataManager> {
        let manager = ResourceProvisioner::build(config)?;
        if start_now {
            manager.start()?;
        }
        manager.add_segment(metadata)?;
        Ok(manager)
    }

    /// Removes a segment. Not supported by this data manager.
    ///
    /// # Errors
    ///
    /// Always returns [`CoreError::Unsupported`].
    pub fn remove_segment(&self, segment_name: &str) -> CoreResult<()> {
        debug!(segment = %segment_name, "rejected remove_segment");
        Err(CoreError::unsupported("remove_segment"))
    }

    /// Replaces a segment with a new one. Not supported by this data
    /// manager; re-adding a segment under the same name replaces it.
    ///
    /// # Errors
    ///
    /// Always returns [`CoreError::Unsupported`].
    pub fn refresh_segment(
        &self,
        old_segment_name: &str,
        new_metadata: SegmentMetadata,
    ) -> CoreResult<()> {
        debug!(
            segment = %old_segment_name,
            new_segment = %new_metadata.name,
            "rejected refresh_segment"
        );
        Err(CoreError::unsupported("refresh_segment"))
    }

    /// Shuts every resource down and marks the node stopped.
    ///
    /// Returns `false` without touching any resource if the node is not
    /// started.
    pub fn shut_down(&self) -> bool {
        let _control = self.control.lock();

        let stage = self.lifecycle();
        if stage != Lifecycle::Started {
            warn!(lifecycle = %stage, "instance data manager is not started, won't shut down");
            return false;
        }

        for resource in self.get_resource_data_managers() {
            resource.shut_down();
        }

        self.status.write().lifecycle = Lifecycle::Stopped;
        info!("instance data manager shut down");
        true
    }

    /// Returns the manager of a resource.
    #[must_use]
    pub fn get_resource_data_manager(&self, resource_name: &str) -> Option<Arc<ResourceDataManager>> {
        self.resources.read().get(resource_name).cloned()
    }

    /// Returns every resource manager, sorted by resource name.
    #[must_use]
    pub fn get_resource_data_managers(&self) -> Vec<Arc<ResourceDataManager>> {
        let mut managers: Vec<_> = self.resources.read().values().cloned().collect();
        managers.sort_by(|a, b| a.resource_name().cmp(b.resource_name()));
        managers
    }

    /// Returns the registered resource names, sorted.
    #[must_use]
    pub fn resource_names(&self) -> Vec<String> {
        let mut names: Vec<_> = self.resources.read().keys().cloned().collect();
        names.sort();
        names
    }

    /// Returns the current lifecycle stage.
    #[must_use]
    pub fn lifecycle(&self) -> Lifecycle {
        self.status.read().lifecycle
    }

    /// Returns true if the node is started.
    #[must_use]
    pub fn is_started(&self) -> bool {
        self.lifecycle() == Lifecycle::Started
    }

    /// Returns the configuration in use, if initialized.
    #[must_use]
    pub fn config(&self) -> Option<Arc<InstanceDataManagerConfig>> {
        self.status.read().config.clone()
    }

    /// Returns the loader registry.
    #[must_use]
    pub fn loader_registry(&self) -> &LoaderRegistry {
        &self.registry
    }

    /// Captures the inspection report.
    #[must_use]
    pub fn server_info(&self) -> ServerInfo {
        let (lifecycle, instance_id) = {
            let status = self.status.read();
            let id = status
                .config
                .as_ref()
                .map_or_else(|| DEFAULT_INSTANCE_ID.to_string(), |c| c.instance_id.clone());
            (status.lifecycle, id)
        };

        ServerInfo {
            instance_id,
            lifecycle,
            resources: self
                .get_resource_data_managers()
                .iter()
                .map(|r| ResourceInfo::capture(r))
                .collect(),
        }
    }

    fn set_status(&self, lifecycle: Lifecycle, config: Option<Arc<InstanceDataManagerConfig>>) {
        let mut status = self.status.write();
        status.lifecycle = lifecycle;
        status.config = config;
    }
}

impl fmt::Debug for InstanceDataManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InstanceDataManager")
            .field("lifecycle", &self.lifecycle())
            .field("resources", &self.resource_names())
            .field("loaders", &self.registry.names())
            .finish_non_exhaustive()
    }
}

/// Lists the direct children of a directory in path order.
fn list_entries(dir: &Path) -> std::io::Result<Vec<PathBuf>> {
    let mut paths = Vec::new();
    for entry in fs::read_dir(dir)? {
        match entry {
            Ok(entry) => paths.push(entry.path()),
            Err(e) => warn!(path = %dir.display(), error = %e, "skipping unreadable bootstrap entry"),
        }
    }
    paths.sort();
    Ok(paths)
}
