//! Physics kernels run by the layout worker.
//!
//! A kernel advances the simulation by one step, mutating only the node
//! buffer. It must be deterministic for a given input and must tolerate
//! empty buffers.
//!
//! - [`ForceAtlas2Kernel`] - the default continuous force-directed step
//! - [`NoopKernel`] - leaves positions untouched (useful for tests and dry runs)

use crate::config::LayoutSettings;
use crate::layout::barnes_hut::{pair_factor, QuadTree};
use crate::layout::codec::{
    EdgeBuffer, NodeBuffer, NODE_CONVERGENCE, NODE_DX, NODE_DY, NODE_MASS, NODE_OLD_DX,
    NODE_OLD_DY, NODE_SIZE, NODE_X, NODE_Y,
};
use std::sync::Arc;

/// Displacement cap applied when sizes are adjusted
const MAX_FORCE: f64 = 10.0;

/// One simulation step over a snapshot.
#[cfg_attr(test, mockall::automock)]
pub trait LayoutKernel {
    /// Apply one step to `nodes` in place.
    fn step(&mut self, settings: &LayoutSettings, nodes: &mut NodeBuffer, edges: &EdgeBuffer);

    /// Name used in log messages
    fn name(&self) -> &'static str {
        "kernel"
    }
}

/// Creates a fresh kernel for every spawned worker.
pub type KernelFactory = Arc<dyn Fn() -> Box<dyn LayoutKernel + Send> + Send + Sync>;

/// Factory for the default kernel
pub fn default_kernel_factory() -> KernelFactory {
    Arc::new(|| Box::new(ForceAtlas2Kernel::new()) as Box<dyn LayoutKernel + Send>)
}

/// Kernel that does nothing.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopKernel;

impl LayoutKernel for NoopKernel {
    fn step(&mut self, _settings: &LayoutSettings, _nodes: &mut NodeBuffer, _edges: &EdgeBuffer) {}

    fn name(&self) -> &'static str {
        "noop"
    }
}

/// ForceAtlas2 step: repulsion between all pairs, attraction along edges,
/// gravity toward the origin, and per-node adaptive speed.
#[derive(Debug, Clone, Default)]
pub struct ForceAtlas2Kernel;

impl ForceAtlas2Kernel {
    pub fn new() -> Self {
        Self
    }

    fn reset_forces(nodes: &mut NodeBuffer) {
        for n in 0..nodes.node_count() {
            nodes.set(n, NODE_OLD_DX, nodes.get(n, NODE_DX));
            nodes.set(n, NODE_OLD_DY, nodes.get(n, NODE_DY));
            nodes.set(n, NODE_DX, 0.0);
            nodes.set(n, NODE_DY, 0.0);
        }
    }

    fn apply_repulsion(settings: &LayoutSettings, nodes: &mut NodeBuffer) {
        let count = nodes.node_count();
        let coefficient = settings.scaling_ratio;

        if settings.barnes_hut_optimize {
            let tree = QuadTree::build(nodes);
            let theta = settings.barnes_hut_theta;
            let forces: Vec<(f64, f64)> = (0..count)
                .map(|n| tree.repulsion(nodes, n, coefficient, theta, settings.adjust_sizes))
                .collect();
            for (n, (fx, fy)) in forces.into_iter().enumerate() {
                nodes.add(n, NODE_DX, fx);
                nodes.add(n, NODE_DY, fy);
            }
            return;
        }

        for n1 in 0..count {
            let (x1, y1) = nodes.position(n1);
            let m1 = nodes.get(n1, NODE_MASS);
            let s1 = nodes.get(n1, NODE_SIZE);
            for n2 in (n1 + 1)..count {
                let (x2, y2) = nodes.position(n2);
                let (dx, dy) = (x1 - x2, y1 - y2);
                let factor = pair_factor(
                    dx,
                    dy,
                    m1,
                    nodes.get(n2, NODE_MASS),
                    s1,
                    nodes.get(n2, NODE_SIZE),
                    coefficient,
                    settings.adjust_sizes,
                );
                nodes.add(n1, NODE_DX, dx * factor);
                nodes.add(n1, NODE_DY, dy * factor);
                nodes.add(n2, NODE_DX, -dx * factor);
                nodes.add(n2, NODE_DY, -dy * factor);
            }
        }
    }

    fn apply_gravity(settings: &LayoutSettings, nodes: &mut NodeBuffer) {
        let coefficient = settings.gravity;
        if coefficient == 0.0 {
            return;
        }
        for n in 0..nodes.node_count() {
            let (x, y) = nodes.position(n);
            let mass = nodes.get(n, NODE_MASS);
            let distance = (x * x + y * y).sqrt();
            let factor = if settings.strong_gravity_mode {
                coefficient * mass
            } else if distance > 0.0 {
                coefficient * mass / distance
            } else {
                continue;
            };
            nodes.add(n, NODE_DX, -x * factor);
            nodes.add(n, NODE_DY, -y * factor);
        }
    }

    fn apply_attraction(settings: &LayoutSettings, nodes: &mut NodeBuffer, edges: &EdgeBuffer) {
        let count = nodes.node_count();
        let outbound = settings.outbound_attraction_distribution;
        let coefficient = if outbound && count > 0 {
            // Compensate so hubs do not collapse the layout
            (0..count).map(|n| nodes.get(n, NODE_MASS)).sum::<f64>() / count as f64
        } else {
            1.0
        };
        let influence = settings.edge_weight_influence;

        for (source, target, weight) in edges.iter() {
            if source >= count || target >= count {
                continue;
            }
            let ewc = if influence == 0.0 {
                1.0
            } else if influence == 1.0 {
                weight
            } else {
                weight.powf(influence)
            };

            let (xs, ys) = nodes.position(source);
            let (xt, yt) = nodes.position(target);
            let (dx, dy) = (xs - xt, ys - yt);
            let mut distance = (dx * dx + dy * dy).sqrt();
            if settings.adjust_sizes {
                distance -= nodes.get(source, NODE_SIZE) + nodes.get(target, NODE_SIZE);
            }
            let divisor = if outbound { nodes.get(source, NODE_MASS) } else { 1.0 };

            let factor = if settings.lin_log_mode {
                if distance <= 0.0 {
                    continue;
                }
                -coefficient * ewc * (1.0 + distance).ln() / distance / divisor
            } else {
                if settings.adjust_sizes && distance <= 0.0 {
                    continue;
                }
                -coefficient * ewc / divisor
            };

            nodes.add(source, NODE_DX, dx * factor);
            nodes.add(source, NODE_DY, dy * factor);
            nodes.add(target, NODE_DX, -dx * factor);
            nodes.add(target, NODE_DY, -dy * factor);
        }
    }

    fn apply_forces(settings: &LayoutSettings, nodes: &mut NodeBuffer) {
        let slow_down = settings.slow_down;

        for n in 0..nodes.node_count() {
            if nodes.is_fixed(n) {
                continue;
            }
            let mut dx = nodes.get(n, NODE_DX);
            let mut dy = nodes.get(n, NODE_DY);
            let old_dx = nodes.get(n, NODE_OLD_DX);
            let old_dy = nodes.get(n, NODE_OLD_DY);
            let mass = nodes.get(n, NODE_MASS);

            if settings.adjust_sizes {
                let force = (dx * dx + dy * dy).sqrt();
                if force > MAX_FORCE {
                    dx = dx * MAX_FORCE / force;
                    dy = dy * MAX_FORCE / force;
                    nodes.set(n, NODE_DX, dx);
                    nodes.set(n, NODE_DY, dy);
                }
            }

            let swinging = mass * ((old_dx - dx).powi(2) + (old_dy - dy).powi(2)).sqrt();
            let traction = ((old_dx + dx).powi(2) + (old_dy + dy).powi(2)).sqrt() / 2.0;

            let speed = if settings.adjust_sizes {
                0.1 * (1.0 + traction).ln() / (1.0 + swinging.sqrt())
            } else {
                let convergence = nodes.get(n, NODE_CONVERGENCE);
                let speed = convergence * (1.0 + traction).ln() / (1.0 + swinging.sqrt());
                let next = (speed * (dx * dx + dy * dy) / (1.0 + swinging.sqrt()))
                    .sqrt()
                    .min(1.0);
                nodes.set(n, NODE_CONVERGENCE, next);
                speed
            };

            nodes.add(n, NODE_X, dx * speed / slow_down);
            nodes.add(n, NODE_Y, dy * speed / slow_down);
        }
    }
}

impl LayoutKernel for ForceAtlas2Kernel {
    fn step(&mut self, settings: &LayoutSettings, nodes: &mut NodeBuffer, edges: &EdgeBuffer) {
        if nodes.is_empty() {
            return;
        }
        Self::reset_forces(nodes);
        Self::apply_repulsion(settings, nodes);
        Self::apply_gravity(settings, nodes);
        Self::apply_attraction(settings, nodes, edges);
        Self::apply_forces(settings, nodes);
    }

    fn name(&self) -> &'static str {
        "forceatlas2"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::{AttributedGraph, NodeAttributes};
    use crate::layout::codec::{default_edge_weight, encode};

    fn distance(nodes: &NodeBuffer, a: usize, b: usize) -> f64 {
        let (xa, ya) = nodes.position(a);
        let (xb, yb) = nodes.position(b);
        ((xa - xb).powi(2) + (ya - yb).powi(2)).sqrt()
    }

    #[test]
    fn test_empty_buffers_are_a_noop() {
        let mut nodes = NodeBuffer::from_vec(Vec::new());
        let edges = EdgeBuffer::from_vec(Vec::new());
        ForceAtlas2Kernel::new().step(&LayoutSettings::default(), &mut nodes, &edges);
        assert!(nodes.is_empty());
    }

    #[test]
    fn test_connected_pair_attracts() {
        let mut graph = AttributedGraph::new();
        let a = graph.add_node(NodeAttributes::new("a", -50.0, 0.0));
        let b = graph.add_node(NodeAttributes::new("b", 50.0, 0.0));
        graph.add_edge(a, b, None).unwrap();
        let mut snapshot = encode(&graph, default_edge_weight);

        let settings = LayoutSettings {
            gravity: 0.0,
            ..LayoutSettings::default()
        };
        let before = distance(&snapshot.nodes, 0, 1);
        let mut kernel = ForceAtlas2Kernel::new();
        for _ in 0..10 {
            kernel.step(&settings, &mut snapshot.nodes, &snapshot.edges);
        }
        assert!(distance(&snapshot.nodes, 0, 1) < before);
    }

    #[test]
    fn test_unconnected_pair_repels() {
        let mut graph = AttributedGraph::new();
        graph.add_node(NodeAttributes::new("a", -0.5, 0.0));
        graph.add_node(NodeAttributes::new("b", 0.5, 0.0));
        let mut snapshot = encode(&graph, default_edge_weight);

        let settings = LayoutSettings {
            gravity: 0.0,
            ..LayoutSettings::default()
        };
        let before = distance(&snapshot.nodes, 0, 1);
        let mut kernel = ForceAtlas2Kernel::new();
        for _ in 0..5 {
            kernel.step(&settings, &mut snapshot.nodes, &snapshot.edges);
        }
        assert!(distance(&snapshot.nodes, 0, 1) > before);
    }

    #[test]
    fn test_fixed_nodes_do_not_move() {
        let mut graph = AttributedGraph::new();
        let a = graph.add_node(NodeAttributes::new("a", 10.0, 10.0).pinned());
        let b = graph.add_node(NodeAttributes::new("b", 12.0, 10.0));
        graph.add_edge(a, b, None).unwrap();
        let mut snapshot = encode(&graph, default_edge_weight);

        let mut kernel = ForceAtlas2Kernel::new();
        for _ in 0..20 {
            kernel.step(&LayoutSettings::default(), &mut snapshot.nodes, &snapshot.edges);
        }
        assert_eq!(snapshot.nodes.position(0), (10.0, 10.0));
        assert_ne!(snapshot.nodes.position(1), (12.0, 10.0));
    }

    #[test]
    fn test_deterministic() {
        let mut graph = AttributedGraph::new();
        let ids: Vec<_> = (0..12)
            .map(|i| {
                let angle = i as f64 * 0.5;
                graph.add_node(NodeAttributes::new(format!("n{}", i), angle.cos() * 10.0, angle.sin() * 10.0))
            })
            .collect();
        for w in ids.windows(2) {
            graph.add_edge(w[0], w[1], None).unwrap();
        }

        let settings = LayoutSettings {
            barnes_hut_optimize: true,
            lin_log_mode: true,
            ..LayoutSettings::default()
        };
        let run = || {
            let mut snapshot = encode(&graph, default_edge_weight);
            let mut kernel = ForceAtlas2Kernel::new();
            for _ in 0..15 {
                kernel.step(&settings, &mut snapshot.nodes, &snapshot.edges);
            }
            snapshot.nodes.into_vec()
        };
        assert_eq!(run(), run());
    }

    #[test]
    fn test_noop_kernel_leaves_buffer() {
        let mut nodes = NodeBuffer::from_vec(vec![1.0; 20]);
        let edges = EdgeBuffer::from_vec(vec![0.0, 1.0, 1.0]);
        NoopKernel.step(&LayoutSettings::default(), &mut nodes, &edges);
        assert_eq!(nodes.as_slice(), &[1.0; 20]);
    }
}
