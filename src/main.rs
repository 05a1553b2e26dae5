//! forcelayout - headless layout demo
//!
//! Builds a clustered sample graph, runs the layout in background mode for a
//! few seconds while pumping like a UI frame loop would, then stops and
//! reports where the nodes ended up.
//!
//! Usage: `forcelayout [CONFIG.toml]`

use anyhow::Context;
use forcelayout_rs::{
    AttributedGraph, LayoutConfig, LayoutEvent, LayoutSupervisor, NodeAttributes, NodeId,
};
use std::time::{Duration, Instant};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

const CLUSTERS: usize = 4;
const NODES_PER_CLUSTER: usize = 25;
const RUN_TIME: Duration = Duration::from_secs(3);
const FRAME: Duration = Duration::from_millis(16);

fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,forcelayout_rs=debug")),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting forcelayout demo");

    let config = match std::env::args().nth(1) {
        Some(path) => LayoutConfig::load_from(&path)
            .with_context(|| format!("failed to load config from {}", path))?,
        None => LayoutConfig::load_or_default(),
    };

    let mut graph = sample_graph().context("failed to build sample graph")?;
    tracing::info!(
        "Sample graph: {} nodes, {} edges",
        graph.node_count(),
        graph.edge_count()
    );

    let mut supervisor = LayoutSupervisor::new(config.supervisor.clone())?;
    supervisor.configure(&config.settings)?;
    supervisor.events().subscribe(|event| {
        if let LayoutEvent::Progress(report) = event {
            tracing::info!(
                "{} iterations ({:.0} it/s)",
                report.iteration_count,
                report.speed
            );
        }
    });

    supervisor.start(&mut graph, true)?;
    let began = Instant::now();
    while began.elapsed() < RUN_TIME {
        supervisor.pump(&mut graph)?;
        std::thread::sleep(FRAME);
    }

    if let Err(e) = supervisor.stop(&mut graph) {
        tracing::warn!("Stop failed ({}); killing worker", e);
        supervisor.kill();
    }

    let (min, max) = bounding_box(&graph);
    tracing::info!(
        "Layout finished: bounding box ({:.1}, {:.1}) - ({:.1}, {:.1})",
        min.0,
        min.1,
        max.0,
        max.1
    );
    Ok(())
}

/// Dense clusters joined in a ring by single bridge edges.
fn sample_graph() -> forcelayout_rs::Result<AttributedGraph> {
    let mut graph = AttributedGraph::new();
    let mut hubs: Vec<NodeId> = Vec::with_capacity(CLUSTERS);

    for c in 0..CLUSTERS {
        let mut members = Vec::with_capacity(NODES_PER_CLUSTER);
        for i in 0..NODES_PER_CLUSTER {
            // Golden-angle spiral gives distinct, deterministic start positions.
            let k = (c * NODES_PER_CLUSTER + i) as f64;
            let angle = k * 2.399_963;
            let radius = 10.0 * k.sqrt();
            let id = graph.add_node(NodeAttributes::new(
                format!("c{}n{}", c, i),
                radius * angle.cos(),
                radius * angle.sin(),
            ));
            members.push(id);
        }

        for (i, &a) in members.iter().enumerate() {
            for &b in members.iter().skip(i + 1).step_by(3) {
                graph.add_edge(a, b, None)?;
            }
        }
        hubs.push(members[0]);
    }

    for i in 0..hubs.len() {
        graph.add_edge(hubs[i], hubs[(i + 1) % hubs.len()], Some(0.5))?;
    }

    Ok(graph)
}

fn bounding_box(graph: &AttributedGraph) -> ((f64, f64), (f64, f64)) {
    let mut min = (f64::INFINITY, f64::INFINITY);
    let mut max = (f64::NEG_INFINITY, f64::NEG_INFINITY);
    for id in graph.node_ids() {
        if let Some((x, y)) = graph.position(id) {
            min = (min.0.min(x), min.1.min(y));
            max = (max.0.max(x), max.1.max(y));
        }
    }
    (min, max)
}
