//! Inspection report of a node.

use crate::instance::Lifecycle;
use crate::resource::{ResourceDataManager, ResourceStatus};
use crate::stats::ResourceStats;
use serde::Serialize;
use std::fmt;

/// What one resource serves at the time of the report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResourceInfo {
    /// Resource name.
    pub name: String,
    /// Resource status.
    pub status: ResourceStatus,
    /// Segment names, sorted.
    pub segments: Vec<String>,
    /// Resource counters.
    pub stats: ResourceStats,
}

impl ResourceInfo {
    pub(crate) fn capture(manager: &ResourceDataManager) -> Self {
        Self {
            name: manager.resource_name().to_string(),
            status: manager.status(),
            segments: manager.segment_names(),
            stats: manager.stats(),
        }
    }
}

/// Snapshot of a node's registry for operators.
///
/// The text form lists every resource in name order with its segment
/// names:
///
/// ```text
/// [instance data manager: server_1]
///   resource: table1
///     segments: [segA, segB]
///   resource: table2
///     segments: []
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ServerInfo {
    /// Identifier of the node.
    pub instance_id: String,
    /// Node lifecycle stage.
    pub lifecycle: Lifecycle,
    /// Resources, sorted by name.
    pub resources: Vec<ResourceInfo>,
}

impl ServerInfo {
    /// Returns the total number of segments across all resources.
    #[must_use]
    pub fn segment_count(&self) -> usize {
        self.resources.iter().map(|r| r.segments.len()).sum()
    }

    /// Returns the report entry of a resource.
    #[must_use]
    pub fn resource(&self, name: &str) -> Option<&ResourceInfo> {
        self.resources.iter().find(|r| r.name == name)
    }
}

impl fmt::Display for ServerInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "[instance data manager: {}]", self.instance_id)?;
        if self.resources.is_empty() {
            return write!(f, "  (no resources)");
        }

        for (i, resource) in self.resources.iter().enumerate() {
            if i > 0 {
                writeln!(f)?;
            }
            writeln!(f, "  resource: {}", resource.name)?;
            write!(f, "    segments: [{}]", resource.segments.join(", "))?;
        }
        Ok(())
    }
}
