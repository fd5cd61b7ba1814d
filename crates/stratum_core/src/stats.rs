//! Per-resource counters.
//!
//! All counters are atomic and can be read while the resource is being
//! mutated. Values only ever increase.

use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};

/// Live counters owned by one resource data manager.
#[derive(Debug, Default)]
pub(crate) struct ResourceCounters {
    segments_added: AtomicU64,
    segments_replaced: AtomicU64,
    starts: AtomicU64,
    shutdowns: AtomicU64,
}

impl ResourceCounters {
    pub(crate) fn record_add(&self, replaced: bool) {
        self.segments_added.fetch_add(1, Ordering::Relaxed);
        if replaced {
            self.segments_replaced.fetch_add(1, Ordering::Relaxed);
        }
    }

    pub(crate) fn record_start(&self) {
        self.starts.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_shutdown(&self) {
        self.shutdowns.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn snapshot(&self) -> ResourceStats {
        ResourceStats {
            segments_added: self.segments_added.load(Ordering::Relaxed),
            segments_replaced: self.segments_replaced.load(Ordering::Relaxed),
            starts: self.starts.load(Ordering::Relaxed),
            shutdowns: self.shutdowns.load(Ordering::Relaxed),
        }
    }
}

/// Point-in-time copy of a resource's counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ResourceStats {
    /// Segments added, including replacements.
    pub segments_added: u64,
    /// Adds that replaced a segment with the same name.
    pub segments_replaced: u64,
    /// Times the resource was started.
    pub starts: u64,
    /// Times the resource was shut down.
    pub shutdowns: u64,
}
