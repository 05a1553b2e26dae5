//! Snapshot codec: live graph <-> flat numeric buffers.
//!
//! A snapshot is a node buffer and an edge buffer of `f64` records plus the
//! [`IndexMap`] that assigned each visible node its record position. The
//! buffers deliberately do not implement `Clone`: handing one to the worker
//! is a move, and the sender keeps nothing.
//!
//! # Node record (stride 10)
//!
//! | offset | field |
//! |---|---|
//! | 0, 1 | x, y |
//! | 2, 3 | dx, dy |
//! | 4, 5 | old_dx, old_dy |
//! | 6 | mass |
//! | 7 | convergence |
//! | 8 | size |
//! | 9 | fixed (0 or 1) |
//!
//! # Edge record (stride 3)
//!
//! source index, target index, weight.

use crate::graph::{EdgeView, LayoutGraph};
use crate::types::NodeId;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Values per node record
pub const NODE_STRIDE: usize = 10;
/// Values per edge record
pub const EDGE_STRIDE: usize = 3;

pub const NODE_X: usize = 0;
pub const NODE_Y: usize = 1;
pub const NODE_DX: usize = 2;
pub const NODE_DY: usize = 3;
pub const NODE_OLD_DX: usize = 4;
pub const NODE_OLD_DY: usize = 5;
pub const NODE_MASS: usize = 6;
pub const NODE_CONVERGENCE: usize = 7;
pub const NODE_SIZE: usize = 8;
pub const NODE_FIXED: usize = 9;

pub const EDGE_SOURCE: usize = 0;
pub const EDGE_TARGET: usize = 1;
pub const EDGE_WEIGHT: usize = 2;

/// Node records, indexed by snapshot position.
#[derive(Debug, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeBuffer {
    data: Vec<f64>,
}

impl NodeBuffer {
    pub fn from_vec(data: Vec<f64>) -> Self {
        debug_assert_eq!(data.len() % NODE_STRIDE, 0);
        Self { data }
    }

    pub fn node_count(&self) -> usize {
        self.data.len() / NODE_STRIDE
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    #[inline]
    pub fn get(&self, node: usize, field: usize) -> f64 {
        self.data[node * NODE_STRIDE + field]
    }

    #[inline]
    pub fn set(&mut self, node: usize, field: usize, value: f64) {
        self.data[node * NODE_STRIDE + field] = value;
    }

    #[inline]
    pub fn add(&mut self, node: usize, field: usize, value: f64) {
        self.data[node * NODE_STRIDE + field] += value;
    }

    pub fn position(&self, node: usize) -> (f64, f64) {
        (self.get(node, NODE_X), self.get(node, NODE_Y))
    }

    pub fn is_fixed(&self, node: usize) -> bool {
        self.get(node, NODE_FIXED) != 0.0
    }

    pub fn mass(&self, node: usize) -> f64 {
        self.get(node, NODE_MASS)
    }

    pub fn as_slice(&self) -> &[f64] {
        &self.data
    }

    pub fn into_vec(self) -> Vec<f64> {
        self.data
    }
}

/// Edge records. Immutable once encoded.
#[derive(Debug, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EdgeBuffer {
    data: Vec<f64>,
}

impl EdgeBuffer {
    pub fn from_vec(data: Vec<f64>) -> Self {
        debug_assert_eq!(data.len() % EDGE_STRIDE, 0);
        Self { data }
    }

    pub fn edge_count(&self) -> usize {
        self.data.len() / EDGE_STRIDE
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// `(source index, target index, weight)` of one edge record
    #[inline]
    pub fn edge(&self, edge: usize) -> (usize, usize, f64) {
        let base = edge * EDGE_STRIDE;
        (
            self.data[base + EDGE_SOURCE] as usize,
            self.data[base + EDGE_TARGET] as usize,
            self.data[base + EDGE_WEIGHT],
        )
    }

    pub fn iter(&self) -> impl Iterator<Item = (usize, usize, f64)> + '_ {
        (0..self.edge_count()).map(move |e| self.edge(e))
    }

    pub fn as_slice(&self) -> &[f64] {
        &self.data
    }
}

/// Graph id <-> snapshot position for one encode.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct IndexMap {
    order: Vec<NodeId>,
    positions: HashMap<NodeId, usize>,
}

impl IndexMap {
    fn push(&mut self, id: NodeId) -> usize {
        let index = self.order.len();
        self.order.push(id);
        self.positions.insert(id, index);
        index
    }

    pub fn index_of(&self, id: NodeId) -> Option<usize> {
        self.positions.get(&id).copied()
    }

    pub fn node_at(&self, index: usize) -> Option<NodeId> {
        self.order.get(index).copied()
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Node ids in snapshot order
    pub fn iter(&self) -> impl Iterator<Item = (usize, NodeId)> + '_ {
        self.order.iter().copied().enumerate()
    }
}

/// The three parts produced by [`encode`].
#[derive(Debug)]
pub struct Snapshot {
    pub nodes: NodeBuffer,
    pub edges: EdgeBuffer,
    pub index: IndexMap,
}

/// Reads the `weight` attribute; missing, negative, or non-finite weights count as 1.
pub fn default_edge_weight(edge: &EdgeView) -> f64 {
    match edge.weight {
        Some(w) if w.is_finite() && w >= 0.0 => w,
        _ => 1.0,
    }
}

/// Encode the visible part of `graph`.
pub fn encode<G, F>(graph: &G, edge_weight: F) -> Snapshot
where
    G: LayoutGraph + ?Sized,
    F: Fn(&EdgeView) -> f64,
{
    let visible = graph.visible_nodes();
    let mut index = IndexMap::default();
    let mut nodes = vec![0.0f64; visible.len() * NODE_STRIDE];

    for view in &visible {
        let i = index.push(view.id);
        let record = &mut nodes[i * NODE_STRIDE..(i + 1) * NODE_STRIDE];
        record[NODE_X] = view.x;
        record[NODE_Y] = view.y;
        record[NODE_MASS] = 1.0;
        record[NODE_CONVERGENCE] = 1.0;
        record[NODE_SIZE] = view.size;
        record[NODE_FIXED] = fixed_flag(view.fixed);
    }

    let mut edges = Vec::new();
    for view in graph.visible_edges() {
        let (Some(source), Some(target)) = (index.index_of(view.source), index.index_of(view.target))
        else {
            continue;
        };
        let weight = edge_weight(&view);

        nodes[source * NODE_STRIDE + NODE_MASS] += weight;
        nodes[target * NODE_STRIDE + NODE_MASS] += weight;

        edges.extend_from_slice(&[source as f64, target as f64, weight]);
    }

    tracing::debug!(
        "Encoded snapshot: {} nodes, {} edges",
        index.len(),
        edges.len() / EDGE_STRIDE
    );

    Snapshot {
        nodes: NodeBuffer::from_vec(nodes),
        edges: EdgeBuffer::from_vec(edges),
        index,
    }
}

/// Write a node buffer back into `graph`.
///
/// Non-fixed nodes take the buffer's position. With `volatile`, the buffer's
/// fixed flags are refreshed from the graph and fixed nodes push their
/// current graph position into the buffer, so a worker that keeps stepping
/// sees pins made or released since the encode. Returns the number of nodes
/// written.
pub fn decode<G>(graph: &mut G, nodes: &mut NodeBuffer, index: &IndexMap, volatile: bool) -> usize
where
    G: LayoutGraph + ?Sized,
{
    let mut written = 0;

    for (i, id) in index.iter() {
        if i >= nodes.node_count() {
            break;
        }
        let Some(view) = graph.node(id) else {
            continue;
        };

        if volatile {
            nodes.set(i, NODE_FIXED, fixed_flag(view.fixed));
            if view.fixed {
                nodes.set(i, NODE_X, view.x);
                nodes.set(i, NODE_Y, view.y);
            }
        }
        if view.fixed {
            continue;
        }

        let (x, y) = nodes.position(i);
        if graph.write_position(id, x, y) {
            written += 1;
        }
    }

    written
}

/// Copy current graph positions and pin state into a buffer that is about
/// to be sent again, so edits made while it sat idle are not overwritten.
/// Forces and convergence are kept.
pub fn refresh<G>(graph: &G, nodes: &mut NodeBuffer, index: &IndexMap)
where
    G: LayoutGraph + ?Sized,
{
    for (i, id) in index.iter() {
        if i >= nodes.node_count() {
            break;
        }
        let Some(view) = graph.node(id) else {
            continue;
        };
        nodes.set(i, NODE_X, view.x);
        nodes.set(i, NODE_Y, view.y);
        nodes.set(i, NODE_FIXED, fixed_flag(view.fixed));
    }
}

fn fixed_flag(fixed: bool) -> f64 {
    if fixed {
        1.0
    } else {
        0.0
    }
}
