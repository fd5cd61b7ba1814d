//! # Stratum Core
//!
//! Per-node data managers for Stratum.
//!
//! This crate provides the three-level ownership hierarchy of a storage
//! node:
//! - [`InstanceDataManager`], the node registry of resources and owner of
//!   the node lifecycle, including bootstrap from a local directory
//! - [`ResourceDataManager`], which owns the segments of one resource
//! - [`SegmentHandle`], one loaded segment
//!
//! Resources are created on demand by [`ResourceProvisioner`] the first
//! time a segment for them is added. [`ServerInfo`] renders the registry
//! for operators.
//!
//! Ownership only points downward: nothing below the node refers back to
//! its owner.

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod config;
mod dir;
mod error;
mod instance;
mod provisioner;
mod report;
mod resource;
mod segment;
mod stats;

pub use config::{
    InstanceDataManagerConfig, ResourceDataManagerConfig, DEFAULT_INSTANCE_ID,
    KEY_BOOTSTRAP_SEGMENT_DIR, KEY_DATA_DIR, KEY_INSTANCE_ID, KEY_READ_MODE, KEY_SEGMENT_LOADER,
};
pub use dir::InstanceDir;
pub use error::{CoreError, CoreResult};
pub use instance::{
    BootstrapFailure, BootstrapSummary, BootstrappedSegment, InstanceDataManager, Lifecycle,
};
pub use provisioner::{
    validate_resource_name, ResourceKind, ResourceProvisioner, MAX_RESOURCE_NAME_LEN,
};
pub use report::{ResourceInfo, ServerInfo};
pub use resource::{ResourceDataManager, ResourceStatus};
pub use segment::SegmentHandle;
pub use stats::ResourceStats;

pub use stratum_segment::{LoaderRegistry, SegmentLoader, SegmentMetadata};
pub use stratum_storage::StorageMode;

/// Version of the data manager crates.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
