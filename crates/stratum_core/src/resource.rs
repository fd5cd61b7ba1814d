//! Resource data manager.
//!
//! A resource data manager owns every loaded segment of one logical table.
//! Its segment map and its running status sit behind a single lock; no
//! other resource ever contends on it.

use crate::config::ResourceDataManagerConfig;
use crate::error::{CoreError, CoreResult};
use crate::segment::SegmentHandle;
use crate::stats::{ResourceCounters, ResourceStats};
use parking_lot::RwLock;
use serde::Serialize;
use std::collections::HashMap;
use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;
use stratum_segment::{SegmentMetadata, SEGMENT_DATA_FILE};
use stratum_storage::open_segment_data;
use tracing::{debug, info, warn};

/// Lifecycle status of a resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ResourceStatus {
    /// Provisioned, accepting segments, not yet started.
    Created,
    /// Started and serving.
    Started,
    /// Shut down; rejects mutation until started again.
    Stopped,
}

impl fmt::Display for ResourceStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Created => "created",
            Self::Started => "started",
            Self::Stopped => "stopped",
        };
        f.write_str(s)
    }
}

struct ResourceState {
    status: ResourceStatus,
    segments: HashMap<String, Arc<SegmentHandle>>,
}

/// Owns and serves the segments of one resource.
///
/// # Concurrency
///
/// All methods take `&self`. Adds of different segment names proceed
/// without blocking readers for longer than a map insert; adds of the same
/// name are applied in lock order, so the last one to take the lock wins.
/// Segment data is opened before the lock is taken.
pub struct ResourceDataManager {
    config: ResourceDataManagerConfig,
    state: RwLock<ResourceState>,
    counters: ResourceCounters,
}

impl ResourceDataManager {
    /// Creates a manager from a resolved configuration.
    ///
    /// Use [`crate::ResourceProvisioner`] to derive the configuration from
    /// the node configuration.
    pub(crate) fn new(config: ResourceDataManagerConfig) -> Self {
        Self {
            config,
            state: RwLock::new(ResourceState {
                status: ResourceStatus::Created,
                segments: HashMap::new(),
            }),
            counters: ResourceCounters::default(),
        }
    }

    /// Returns the resource name.
    #[must_use]
    pub fn resource_name(&self) -> &str {
        &self.config.resource_name
    }

    /// Returns the resource configuration.
    #[must_use]
    pub fn config(&self) -> &ResourceDataManagerConfig {
        &self.config
    }

    /// Returns the current status.
    #[must_use]
    pub fn status(&self) -> ResourceStatus {
        self.state.read().status
    }

    /// Returns true if the resource is started.
    #[must_use]
    pub fn is_started(&self) -> bool {
        self.status() == ResourceStatus::Started
    }

    /// Returns a snapshot of the resource counters.
    #[must_use]
    pub fn stats(&self) -> ResourceStats {
        self.counters.snapshot()
    }

    /// Starts the resource.
    ///
    /// Starting a started resource is a no-op. A stopped resource may be
    /// started again; it comes back empty.
    ///
    /// # Errors
    ///
    /// Returns an illegal state error if a file-backed resource has lost
    /// its data directory.
    pub fn start(&self) -> CoreResult<()> {
        let mut state = self.state.write();

        if state.status == ResourceStatus::Started {
            debug!(resource = %self.resource_name(), "resource already started");
            return Ok(());
        }

        if self.config.storage_mode.is_persistent() {
            match &self.config.data_dir {
                Some(dir) if dir.is_dir() => {}
                Some(dir) => {
                    return Err(CoreError::illegal_state(format!(
                        "data directory {} of resource {} is missing",
                        dir.display(),
                        self.resource_name()
                    )));
                }
                None => {
                    return Err(CoreError::illegal_state(format!(
                        "file-backed resource {} has no data directory",
                        self.resource_name()
                    )));
                }
            }
        }

        state.status = ResourceStatus::Started;
        self.counters.record_start();
        info!(
            resource = %self.resource_name(),
            segments = state.segments.len(),
            "resource data manager started"
        );
        Ok(())
    }

    /// Shuts the resource down, releasing every segment handle.
    ///
    /// Returns `false` without doing anything if the resource is already
    /// stopped.
    pub fn shut_down(&self) -> bool {
        let mut state = self.state.write();

        if state.status == ResourceStatus::Stopped {
            warn!(
                resource = %self.resource_name(),
                "resource data manager is already shut down, won't do anything"
            );
            return false;
        }

        let released = state.segments.len();
        state.segments.clear();
        state.status = ResourceStatus::Stopped;
        self.counters.record_shutdown();
        info!(resource = %self.resource_name(), released, "resource data manager shut down");
        true
    }

    /// Adds a segment, replacing any segment with the same name.
    ///
    /// Replacement is how a segment is refreshed: the new handle becomes
    /// visible when the lock is released. Readers holding the old handle
    /// keep it alive until they drop it.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The resource is stopped (`IllegalState`)
    /// - The metadata names another resource or an unusable segment name
    ///   (`InvalidArgument`)
    /// - The segment data exists but cannot be opened
    pub fn add_segment(&self, metadata: SegmentMetadata) -> CoreResult<()> {
        self.check_segment(&metadata)?;
        self.check_not_stopped()?;

        let handle = Arc::new(self.open_handle(metadata)?);
        let name = handle.name().to_string();

        let mut state = self.state.write();
        if state.status == ResourceStatus::Stopped {
            return Err(self.stopped_error());
        }
        let replaced = state.segments.insert(name.clone(), handle).is_some();
        drop(state);

        self.counters.record_add(replaced);
        if replaced {
            info!(resource = %self.resource_name(), segment = %name, "replaced segment");
        } else {
            info!(resource = %self.resource_name(), segment = %name, "added segment");
        }
        Ok(())
    }

    /// Returns a snapshot of the owned segments, sorted by name.
    ///
    /// The snapshot is detached from the registry; later adds do not show
    /// up in it.
    #[must_use]
    pub fn get_all_segments(&self) -> Vec<Arc<SegmentHandle>> {
        let mut segments: Vec<_> = self.state.read().segments.values().cloned().collect();
        segments.sort_by(|a, b| a.name().cmp(b.name()));
        segments
    }

    /// Returns the segment with the given name.
    #[must_use]
    pub fn get_segment(&self, name: &str) -> Option<Arc<SegmentHandle>> {
        self.state.read().segments.get(name).cloned()
    }

    /// Returns the owned segment names, sorted.
    #[must_use]
    pub fn segment_names(&self) -> Vec<String> {
        let mut names: Vec<_> = self.state.read().segments.keys().cloned().collect();
        names.sort();
        names
    }

    /// Returns the number of owned segments.
    #[must_use]
    pub fn segment_count(&self) -> usize {
        self.state.read().segments.len()
    }

    fn check_segment(&self, metadata: &SegmentMetadata) -> CoreResult<()> {
        validate_segment(self.resource_name(), metadata)
    }

    fn check_not_stopped(&self) -> CoreResult<()> {
        if self.status() == ResourceStatus::Stopped {
            return Err(self.stopped_error());
        }
        Ok(())
    }

    fn stopped_error(&self) -> CoreError {
        CoreError::illegal_state(format!(
            "resource {} is shut down and cannot accept segments",
            self.resource_name()
        ))
    }

    /// Resolves where the segment's files live on this node.
    fn segment_dir(&self, metadata: &SegmentMetadata) -> Option<PathBuf> {
        metadata
            .index_dir()
            .map(|dir| dir.to_path_buf())
            .or_else(|| {
                self.config
                    .data_dir
                    .as_ref()
                    .map(|dir| dir.join(&metadata.name))
            })
    }

    fn open_handle(&self, metadata: SegmentMetadata) -> CoreResult<SegmentHandle> {
        let Some(dir) = self.segment_dir(&metadata) else {
            return Ok(SegmentHandle::metadata_only(metadata));
        };
        let data_file = dir.join(SEGMENT_DATA_FILE);
        let storage = open_segment_data(self.config.storage_mode, Some(&data_file))?;
        Ok(SegmentHandle::new(metadata, storage))
    }
}

/// Checks that `metadata` can be added to the resource `resource_name`.
pub(crate) fn validate_segment(resource_name: &str, metadata: &SegmentMetadata) -> CoreResult<()> {
    if metadata.resource_name != resource_name {
        return Err(CoreError::invalid_argument(format!(
            "segment {} belongs to resource {}, not {resource_name}",
            metadata.name, metadata.resource_name
        )));
    }

    let name = metadata.name.as_str();
    if name.trim().is_empty() || name == "." || name == ".." || name.contains(&['/', '\\'][..]) {
        return Err(CoreError::invalid_argument(format!(
            "invalid segment name {name:?} for resource {resource_name}"
        )));
    }
    Ok(())
}

impl fmt::Debug for ResourceDataManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResourceDataManager")
            .field("resource", &self.config.resource_name)
            .field("storage_mode", &self.config.storage_mode)
            .field("status", &self.status())
            .field("segments", &self.segment_count())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use stratum_storage::StorageMode;
    use tempfile::tempdir;

    fn create_manager(name: &str) -> ResourceDataManager {
        ResourceDataManager::new(ResourceDataManagerConfig::new(name))
    }

    #[test]
    fn add_and_list() {
        let manager = create_manager("table1");
        manager.add_segment(SegmentMetadata::new("segB", "table1")).unwrap();
        manager.add_segment(SegmentMetadata::new("segA", "table1")).unwrap();

        let names: Vec<_> = manager
            .get_all_segments()
            .iter()
            .map(|s| s.name().to_string())
            .collect();
        assert_eq!(names, vec!["segA", "segB"]);
        assert_eq!(manager.segment_count(), 2);
        assert_eq!(manager.status(), ResourceStatus::Created);
    }

    #[test]
    fn same_name_replaces() {
        let manager = create_manager("table2");
        manager
            .add_segment(SegmentMetadata::new("seg1", "table2").with_total_docs(1))
            .unwrap();
        manager
            .add_segment(SegmentMetadata::new("seg1", "table2").with_total_docs(2))
            .unwrap();

        assert_eq!(manager.segment_count(), 1);
        let seg = manager.get_segment("seg1").unwrap();
        assert_eq!(seg.metadata().total_docs, 2);

        let stats = manager.stats();
        assert_eq!(stats.segments_added, 2);
        assert_eq!(stats.segments_replaced, 1);
    }

    #[test]
    fn snapshot_is_detached() {
        let manager = create_manager("t");
        manager.add_segment(SegmentMetadata::new("a", "t")).unwrap();

        let snapshot = manager.get_all_segments();
        manager.add_segment(SegmentMetadata::new("b", "t")).unwrap();

        assert_eq!(snapshot.len(), 1);
        assert_eq!(manager.get_all_segments().len(), 2);
    }

    #[test]
    fn replaced_handle_stays_valid_for_holders() {
        let manager = create_manager("t");
        manager
            .add_segment(SegmentMetadata::new("a", "t").with_version("v1"))
            .unwrap();
        let old = manager.get_segment("a").unwrap();

        manager
            .add_segment(SegmentMetadata::new("a", "t").with_version("v2"))
            .unwrap();

        assert_eq!(old.metadata().version, "v1");
        assert_eq!(manager.get_segment("a").unwrap().metadata().version, "v2");
    }

    #[test]
    fn wrong_resource_rejected() {
        let manager = create_manager("table1");
        let err = manager
            .add_segment(SegmentMetadata::new("seg", "table9"))
            .unwrap_err();
        assert!(matches!(err, CoreError::InvalidArgument { .. }));
        assert_eq!(manager.segment_count(), 0);
    }

    #[test]
    fn path_like_segment_name_rejected() {
        let manager = create_manager("t");
        for name in ["", "..", "a/b", "a\\b"] {
            let err = manager
                .add_segment(SegmentMetadata::new(name, "t"))
                .unwrap_err();
            assert!(matches!(err, CoreError::InvalidArgument { .. }), "{name:?}");
        }
    }

    #[test]
    fn start_and_shutdown() {
        let manager = create_manager("t");
        manager.start().unwrap();
        assert!(manager.is_started());

        // Starting twice is harmless.
        manager.start().unwrap();
        assert_eq!(manager.stats().starts, 1);

        manager.add_segment(SegmentMetadata::new("a", "t")).unwrap();
        assert!(manager.shut_down());
        assert_eq!(manager.status(), ResourceStatus::Stopped);
        assert_eq!(manager.segment_count(), 0);
    }

    #[test]
    fn shutdown_twice_is_noop() {
        let manager = create_manager("t");
        manager.start().unwrap();

        assert!(manager.shut_down());
        assert!(!manager.shut_down());
        assert_eq!(manager.stats().shutdowns, 1);
    }

    #[test]
    fn stopped_resource_rejects_adds() {
        let manager = create_manager("t");
        manager.shut_down();

        let err = manager
            .add_segment(SegmentMetadata::new("a", "t"))
            .unwrap_err();
        assert!(err.is_illegal_state());
        assert_eq!(manager.segment_count(), 0);
    }

    #[test]
    fn restart_after_shutdown() {
        let manager = create_manager("t");
        manager.start().unwrap();
        manager.add_segment(SegmentMetadata::new("a", "t")).unwrap();
        manager.shut_down();

        manager.start().unwrap();
        assert!(manager.is_started());
        assert_eq!(manager.segment_count(), 0);
        manager.add_segment(SegmentMetadata::new("b", "t")).unwrap();
        assert_eq!(manager.segment_names(), vec!["b"]);
    }

    #[test]
    fn segment_without_directory_has_no_data() {
        let manager = create_manager("t");
        manager.add_segment(SegmentMetadata::new("a", "t")).unwrap();

        let seg = manager.get_segment("a").unwrap();
        assert_eq!(seg.size_bytes(), 0);
        assert!(seg.storage().path().is_none());
    }

    #[test]
    fn heap_mode_loads_segment_data() {
        let temp = tempdir().unwrap();
        let seg_dir = temp.path().join("segA");
        fs::create_dir(&seg_dir).unwrap();
        fs::write(seg_dir.join(SEGMENT_DATA_FILE), b"abcdef").unwrap();

        let manager = create_manager("t");
        manager
            .add_segment(SegmentMetadata::new("segA", "t").with_index_dir(&seg_dir))
            .unwrap();

        let seg = manager.get_segment("segA").unwrap();
        assert_eq!(seg.size_bytes(), 6);
        assert!(seg.storage().is_resident());
    }

    #[test]
    fn file_mode_resolves_segment_under_data_dir() {
        let temp = tempdir().unwrap();
        let resource_dir = temp.path().join("t");
        let seg_dir = resource_dir.join("segA");
        fs::create_dir_all(&seg_dir).unwrap();
        fs::write(seg_dir.join(SEGMENT_DATA_FILE), b"0123456789").unwrap();

        let manager = ResourceDataManager::new(
            ResourceDataManagerConfig::new("t")
                .with_data_dir(&resource_dir)
                .with_storage_mode(StorageMode::File),
        );
        manager.start().unwrap();
        manager.add_segment(SegmentMetadata::new("segA", "t")).unwrap();

        let seg = manager.get_segment("segA").unwrap();
        assert!(!seg.storage().is_resident());
        assert_eq!(&seg.storage().read_at(3, 3).unwrap()[..], b"345");
    }

    #[test]
    fn file_mode_start_fails_without_directory() {
        let temp = tempdir().unwrap();
        let manager = ResourceDataManager::new(
            ResourceDataManagerConfig::new("t")
                .with_data_dir(temp.path().join("gone"))
                .with_storage_mode(StorageMode::File),
        );

        let err = manager.start().unwrap_err();
        assert!(err.is_illegal_state());
        assert_eq!(manager.status(), ResourceStatus::Created);
    }

    #[test]
    fn concurrent_adds_of_distinct_names() {
        let manager = Arc::new(create_manager("t"));

        let handles: Vec<_> = (0..8)
            .map(|t| {
                let manager = Arc::clone(&manager);
                std::thread::spawn(move || {
                    for i in 0..50 {
                        manager
                            .add_segment(SegmentMetadata::new(format!("seg_{t}_{i}"), "t"))
                            .unwrap();
                        let _ = manager.get_all_segments();
                    }
                })
            })
            .collect();

        for handle in handles {
            handle.join().expect("writer panicked");
        }

        assert_eq!(manager.segment_count(), 400);
        assert_eq!(manager.stats().segments_replaced, 0);
    }

    #[test]
    fn concurrent_adds_of_same_name_keep_one_entry() {
        let manager = Arc::new(create_manager("t"));

        let handles: Vec<_> = (0..8u64)
            .map(|t| {
                let manager = Arc::clone(&manager);
                std::thread::spawn(move || {
                    for i in 0..50u64 {
                        manager
                            .add_segment(
                                SegmentMetadata::new("hot", "t").with_total_docs(t * 100 + i),
                            )
                            .unwrap();
                    }
                })
            })
            .collect();

        for handle in handles {
            handle.join().expect("writer panicked");
        }

        assert_eq!(manager.segment_count(), 1);
        let stats = manager.stats();
        assert_eq!(stats.segments_added, 400);
        assert_eq!(stats.segments_replaced, 399);
    }
}
