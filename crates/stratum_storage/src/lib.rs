//! # Stratum Storage
//!
//! Read-only storage backends holding the data of one loaded segment.
//!
//! Segments are immutable once built, so a backend only needs to answer
//! positional reads. Backends are **opaque byte stores**: they know nothing
//! about column layouts or index formats.
//!
//! ## Available Backends
//!
//! - [`HeapStorage`] - whole segment data held in memory
//! - [`FileStorage`] - segment data read on demand from its file
//!
//! [`StorageMode`] selects between them and [`open_segment_data`] builds the
//! right one for a data file.
//!
//! ## Example
//!
//! ```rust
//! use stratum_storage::{HeapStorage, SegmentStorage};
//!
//! let storage = HeapStorage::from_vec(b"hello world".to_vec());
//! let data = storage.read_at(6, 5).unwrap();
//! assert_eq!(&data[..], b"world");
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod backend;
mod error;
mod file;
mod heap;
mod mode;

pub use backend::SegmentStorage;
pub use error::{StorageError, StorageResult};
pub use file::FileStorage;
pub use heap::HeapStorage;
pub use mode::{open_segment_data, StorageMode};
