//! Test data builders for creating test graphs

use forcelayout_rs::{AttributedGraph, NodeAttributes, NodeId};

/// Builder for creating test graphs by label
pub struct GraphBuilder {
    graph: AttributedGraph,
    ids: Vec<(String, NodeId)>,
}

impl GraphBuilder {
    pub fn new() -> Self {
        Self {
            graph: AttributedGraph::new(),
            ids: Vec::new(),
        }
    }

    pub fn node(mut self, label: &str, x: f64, y: f64) -> Self {
        let id = self.graph.add_node(NodeAttributes::new(label, x, y));
        self.ids.push((label.to_string(), id));
        self
    }

    pub fn pinned(mut self, label: &str, x: f64, y: f64) -> Self {
        let id = self
            .graph
            .add_node(NodeAttributes::new(label, x, y).pinned());
        self.ids.push((label.to_string(), id));
        self
    }

    pub fn hidden(mut self, label: &str, x: f64, y: f64) -> Self {
        let id = self
            .graph
            .add_node(NodeAttributes::new(label, x, y).hidden());
        self.ids.push((label.to_string(), id));
        self
    }

    pub fn edge(mut self, source: &str, target: &str, weight: Option<f64>) -> Self {
        let (s, t) = (self.id(source), self.id(target));
        self.graph.add_edge(s, t, weight).unwrap();
        self
    }

    /// Connect every pair of the given labels
    pub fn clique(mut self, labels: &[&str]) -> Self {
        for (i, a) in labels.iter().enumerate() {
            for b in &labels[i + 1..] {
                self = self.edge(a, b, None);
            }
        }
        self
    }

    pub fn id(&self, label: &str) -> NodeId {
        self.ids
            .iter()
            .find(|(l, _)| l == label)
            .map(|(_, id)| *id)
            .unwrap_or_else(|| panic!("no node labelled {}", label))
    }

    pub fn build(self) -> (AttributedGraph, Vec<(String, NodeId)>) {
        (self.graph, self.ids)
    }
}

/// A, B, C with A-B weight 1 and B-C weight 2
pub fn abc_graph() -> (AttributedGraph, Vec<(String, NodeId)>) {
    GraphBuilder::new()
        .node("A", 0.0, 0.0)
        .node("B", 10.0, 0.0)
        .node("C", 0.0, 10.0)
        .edge("A", "B", Some(1.0))
        .edge("B", "C", Some(2.0))
        .build()
}

/// Look up an id returned by [`GraphBuilder::build`]
pub fn id_of(ids: &[(String, NodeId)], label: &str) -> NodeId {
    ids.iter()
        .find(|(l, _)| l == label)
        .map(|(_, id)| *id)
        .unwrap_or_else(|| panic!("no node labelled {}", label))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_graph_builder() {
        let (graph, ids) = GraphBuilder::new()
            .node("a", 0.0, 0.0)
            .node("b", 1.0, 1.0)
            .node("c", 2.0, 2.0)
            .clique(&["a", "b", "c"])
            .build();

        assert_eq!(graph.node_count(), 3);
        assert_eq!(graph.edge_count(), 3);
        assert_eq!(graph.position(id_of(&ids, "b")), Some((1.0, 1.0)));
    }
}
