//! # Stratum Segment
//!
//! Segment identity and the boundary to the segment format.
//!
//! This crate provides:
//! - [`SegmentMetadata`], the identity of one immutable segment and the
//!   resource (logical table) it belongs to
//! - [`SegmentLoader`], which turns a segment path into metadata
//! - Built-in loaders for `metadata.properties` and `metadata.cbor`
//!   segment directories
//! - [`LoaderRegistry`], which resolves a configured loader identifier to a
//!   loader instance
//!
//! ## Usage
//!
//! ```rust,no_run
//! use stratum_segment::LoaderRegistry;
//! use std::path::Path;
//!
//! let registry = LoaderRegistry::with_builtin();
//! let loader = registry.resolve("properties").expect("built-in loader");
//! let metadata = loader.load(Path::new("/data/bootstrap/segA"))?;
//! println!("{} belongs to {}", metadata.name, metadata.resource_name);
//! # Ok::<(), stratum_segment::LoadError>(())
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod cbor;
mod error;
mod loader;
mod metadata;
mod properties;
mod registry;

pub use cbor::{CborLoader, CBOR_METADATA_FILE};
pub use error::{LoadError, LoadResult};
pub use loader::SegmentLoader;
pub use metadata::SegmentMetadata;
pub use properties::{
    PropertiesLoader, PROPERTIES_METADATA_FILE, PROP_CRC, PROP_RESOURCE_NAME, PROP_SEGMENT_NAME,
    PROP_TOTAL_DOCS, PROP_VERSION,
};
pub use registry::{LoaderFactory, LoaderRegistry, CBOR_LOADER, PROPERTIES_LOADER};

/// Name of the data file inside a segment directory.
pub const SEGMENT_DATA_FILE: &str = "segment.dat";
