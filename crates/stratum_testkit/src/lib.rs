//! # Stratum Testkit
//!
//! Test utilities for Stratum.
//!
//! This crate provides:
//! - Fixtures writing segment directories and bootstrap directories
//! - Property-based test generators using proptest
//! - Concurrent stress drivers for the data managers
//!
//! ## Usage
//!
//! ```rust,ignore
//! use stratum_testkit::prelude::*;
//!
//! #[test]
//! fn bootstraps_one_segment() {
//!     let bootstrap = BootstrapDir::new();
//!     bootstrap.add_properties(&SegmentFixture::new("segA", "table1"));
//!     let node = bootstrap.node();
//!     node.start().unwrap();
//! }
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

pub mod fixtures;
pub mod generators;
pub mod stress;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::fixtures::*;
    pub use crate::generators::*;
    pub use crate::stress::*;
}

pub use fixtures::*;
pub use generators::*;
pub use stress::*;
