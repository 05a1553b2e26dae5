//! Attributed graph interface consumed by the layout supervisor
//!
//! The supervisor never owns the graph. It reads through the
//! [`LayoutGraph`] trait when encoding a snapshot, writes positions back
//! when decoding, and listens to the graph's [`EventBus`] for topology
//! changes.
//!
//! [`AttributedGraph`] is a small in-memory implementation used by the demo
//! binary and the tests. Any host graph can take its place by implementing
//! the trait.

use crate::error::{LayoutError, Result};
use crate::events::EventBus;
use crate::types::{EdgeId, GraphEvent, NodeId};
use std::collections::BTreeMap;

/// Layout-relevant view of one node.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NodeView {
    pub id: NodeId,
    pub x: f64,
    pub y: f64,
    pub size: f64,
    /// Pinned nodes are never moved by the layout
    pub fixed: bool,
}

/// Layout-relevant view of one edge.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EdgeView {
    pub id: EdgeId,
    pub source: NodeId,
    pub target: NodeId,
    /// Raw `weight` attribute, if the edge carries one
    pub weight: Option<f64>,
}

/// Read/write access the layout needs from a graph.
pub trait LayoutGraph {
    /// Visible nodes in a stable order (repeated calls agree while topology is unchanged)
    fn visible_nodes(&self) -> Vec<NodeView>;

    /// Visible edges in a stable order. Edges may reference hidden endpoints;
    /// the codec filters those out.
    fn visible_edges(&self) -> Vec<EdgeView>;

    /// Look up a node, visible or not
    fn node(&self, id: NodeId) -> Option<NodeView>;

    /// Write a layout result. Must not publish a topology event.
    fn write_position(&mut self, id: NodeId, x: f64, y: f64) -> bool;

    /// Change notifications for this graph
    fn events(&self) -> &EventBus<GraphEvent>;
}

/// Node attributes stored by [`AttributedGraph`]
#[derive(Debug, Clone, PartialEq)]
pub struct NodeAttributes {
    pub label: String,
    pub x: f64,
    pub y: f64,
    pub size: f64,
    pub fixed: bool,
    pub hidden: bool,
}

impl NodeAttributes {
    pub fn new(label: impl Into<String>, x: f64, y: f64) -> Self {
        Self {
            label: label.into(),
            x,
            y,
            size: 1.0,
            fixed: false,
            hidden: false,
        }
    }

    pub fn with_size(mut self, size: f64) -> Self {
        self.size = size;
        self
    }

    pub fn pinned(mut self) -> Self {
        self.fixed = true;
        self
    }

    pub fn hidden(mut self) -> Self {
        self.hidden = true;
        self
    }
}

/// Edge attributes stored by [`AttributedGraph`]
#[derive(Debug, Clone, PartialEq)]
pub struct EdgeAttributes {
    pub source: NodeId,
    pub target: NodeId,
    pub weight: Option<f64>,
    pub hidden: bool,
}

/// In-memory attributed graph with change notifications.
#[derive(Debug, Default)]
pub struct AttributedGraph {
    nodes: BTreeMap<NodeId, NodeAttributes>,
    edges: BTreeMap<EdgeId, EdgeAttributes>,
    next_node: u32,
    next_edge: u32,
    events: EventBus<GraphEvent>,
}

impl AttributedGraph {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    pub fn attributes(&self, id: NodeId) -> Option<&NodeAttributes> {
        self.nodes.get(&id)
    }

    pub fn edge_attributes(&self, id: EdgeId) -> Option<&EdgeAttributes> {
        self.edges.get(&id)
    }

    pub fn position(&self, id: NodeId) -> Option<(f64, f64)> {
        self.nodes.get(&id).map(|n| (n.x, n.y))
    }

    pub fn node_ids(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.nodes.keys().copied()
    }

    pub fn add_node(&mut self, attributes: NodeAttributes) -> NodeId {
        let id = NodeId(self.next_node);
        self.next_node += 1;
        self.nodes.insert(id, attributes);
        self.events.emit(&GraphEvent::NodeAdded(id));
        id
    }

    /// Remove a node and every edge touching it.
    pub fn remove_node(&mut self, id: NodeId) -> Result<NodeAttributes> {
        let attributes = self.nodes.remove(&id).ok_or(LayoutError::UnknownNode(id))?;

        let incident: Vec<EdgeId> = self
            .edges
            .iter()
            .filter(|(_, e)| e.source == id || e.target == id)
            .map(|(edge_id, _)| *edge_id)
            .collect();
        for edge_id in incident {
            self.edges.remove(&edge_id);
            self.events.emit(&GraphEvent::EdgeRemoved(edge_id));
        }

        self.events.emit(&GraphEvent::NodeRemoved(id));
        Ok(attributes)
    }

    pub fn add_edge(&mut self, source: NodeId, target: NodeId, weight: Option<f64>) -> Result<EdgeId> {
        for endpoint in [source, target] {
            if !self.nodes.contains_key(&endpoint) {
                return Err(LayoutError::UnknownNode(endpoint));
            }
        }

        let id = EdgeId(self.next_edge);
        self.next_edge += 1;
        self.edges.insert(
            id,
            EdgeAttributes {
                source,
                target,
                weight,
                hidden: false,
            },
        );
        self.events.emit(&GraphEvent::EdgeAdded(id));
        Ok(id)
    }

    pub fn remove_edge(&mut self, id: EdgeId) -> Result<EdgeAttributes> {
        let attributes = self.edges.remove(&id).ok_or(LayoutError::UnknownEdge(id))?;
        self.events.emit(&GraphEvent::EdgeRemoved(id));
        Ok(attributes)
    }

    pub fn set_node_hidden(&mut self, id: NodeId, hidden: bool) -> Result<()> {
        let node = self.nodes.get_mut(&id).ok_or(LayoutError::UnknownNode(id))?;
        if node.hidden != hidden {
            node.hidden = hidden;
            self.events.emit(&GraphEvent::VisibilityChanged);
        }
        Ok(())
    }

    pub fn set_edge_hidden(&mut self, id: EdgeId, hidden: bool) -> Result<()> {
        let edge = self.edges.get_mut(&id).ok_or(LayoutError::UnknownEdge(id))?;
        if edge.hidden != hidden {
            edge.hidden = hidden;
            self.events.emit(&GraphEvent::VisibilityChanged);
        }
        Ok(())
    }

    /// Pin or unpin a node.
    pub fn set_fixed(&mut self, id: NodeId, fixed: bool) -> Result<()> {
        let node = self.nodes.get_mut(&id).ok_or(LayoutError::UnknownNode(id))?;
        node.fixed = fixed;
        self.events.emit(&GraphEvent::NodeMoved(id));
        Ok(())
    }

    /// Move a node on behalf of the user (e.g. dragging a pinned node).
    pub fn move_node(&mut self, id: NodeId, x: f64, y: f64) -> Result<()> {
        let node = self.nodes.get_mut(&id).ok_or(LayoutError::UnknownNode(id))?;
        node.x = x;
        node.y = y;
        self.events.emit(&GraphEvent::NodeMoved(id));
        Ok(())
    }
}

impl LayoutGraph for AttributedGraph {
    fn visible_nodes(&self) -> Vec<NodeView> {
        self.nodes
            .iter()
            .filter(|(_, n)| !n.hidden)
            .map(|(id, n)| NodeView {
                id: *id,
                x: n.x,
                y: n.y,
                size: n.size,
                fixed: n.fixed,
            })
            .collect()
    }

    fn visible_edges(&self) -> Vec<EdgeView> {
        self.edges
            .iter()
            .filter(|(_, e)| !e.hidden)
            .map(|(id, e)| EdgeView {
                id: *id,
                source: e.source,
                target: e.target,
                weight: e.weight,
            })
            .collect()
    }

    fn node(&self, id: NodeId) -> Option<NodeView> {
        self.nodes.get(&id).map(|n| NodeView {
            id,
            x: n.x,
            y: n.y,
            size: n.size,
            fixed: n.fixed,
        })
    }

    fn write_position(&mut self, id: NodeId, x: f64, y: f64) -> bool {
        match self.nodes.get_mut(&id) {
            Some(node) => {
                node.x = x;
                node.y = y;
                true
            }
            None => false,
        }
    }

    fn events(&self) -> &EventBus<GraphEvent> {
        &self.events
    }
}
