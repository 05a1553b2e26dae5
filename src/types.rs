//! Core data types shared across the crate
//!
//! # Main Types
//!
//! - [`NodeId`] / [`EdgeId`] - Stable graph identities (not snapshot indices)
//! - [`GraphEvent`] - Change notifications published by a graph
//! - [`LayoutEvent`] - Lifecycle and progress notifications published by the supervisor
//!
//! Graph identities are allocated monotonically, so ascending id order is
//! also insertion order. The snapshot codec relies on this for a stable
//! traversal order.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Identity of a node in an attributed graph.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct NodeId(pub u32);

impl fmt::Debug for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "NodeId({})", self.0)
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// Identity of an edge in an attributed graph.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct EdgeId(pub u32);

impl fmt::Debug for EdgeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "EdgeId({})", self.0)
    }
}

impl fmt::Display for EdgeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// Change notification published by a graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GraphEvent {
    NodeAdded(NodeId),
    NodeRemoved(NodeId),
    EdgeAdded(EdgeId),
    EdgeRemoved(EdgeId),
    /// A node or edge was hidden or shown
    VisibilityChanged,
    /// A node's position or pin state changed; topology is unaffected
    NodeMoved(NodeId),
}

impl GraphEvent {
    /// Whether this event invalidates a snapshot's index space.
    pub fn changes_topology(&self) -> bool {
        !matches!(self, GraphEvent::NodeMoved(_))
    }
}

/// Notification published by the layout supervisor to the UI.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum LayoutEvent {
    /// A Start was issued; `true` for continuous (background) mode
    Started(bool),
    /// A Stop was issued
    Stopped,
    /// Worker results were decoded into the graph
    Updated,
    /// Periodic report from a continuous run
    Progress(ProgressReport),
}

/// Iteration count and rate reported during a continuous run.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ProgressReport {
    /// Kernel steps completed in the current run
    pub iteration_count: u64,
    /// Kernel steps per second since the previous report
    pub speed: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_id_display() {
        assert_eq!(NodeId(3).to_string(), "NodeId(3)");
        assert_eq!(EdgeId(9).to_string(), "EdgeId(9)");
    }

    #[test]
    fn test_topology_events() {
        assert!(GraphEvent::NodeAdded(NodeId(0)).changes_topology());
        assert!(GraphEvent::EdgeRemoved(EdgeId(0)).changes_topology());
        assert!(GraphEvent::VisibilityChanged.changes_topology());
        assert!(!GraphEvent::NodeMoved(NodeId(0)).changes_topology());
    }
}
