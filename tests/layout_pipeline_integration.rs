//! Integration tests for the encode -> kernel -> decode pipeline
//!
//! These tests run the default kernel directly over snapshots, without a
//! worker thread, and check the configuration round trip that feeds it.

mod common;

use common::assert_float_eq;
use common::builders::{abc_graph, id_of, GraphBuilder};
use forcelayout_rs::layout::{
    decode, default_edge_weight, encode, ForceAtlas2Kernel, LayoutKernel, LayoutSupervisor,
    NoopKernel,
};
use forcelayout_rs::{LayoutConfig, LayoutGraph, LayoutSettings, SettingsOverrides};
use tempfile::TempDir;

fn distance(graph: &forcelayout_rs::AttributedGraph, a: forcelayout_rs::NodeId, b: forcelayout_rs::NodeId) -> f64 {
    let (ax, ay) = graph.position(a).unwrap();
    let (bx, by) = graph.position(b).unwrap();
    ((ax - bx).powi(2) + (ay - by).powi(2)).sqrt()
}

#[test]
fn test_identity_kernel_preserves_positions() {
    let (mut graph, ids) = GraphBuilder::new()
        .node("a", 0.1, 1234.567)
        .pinned("b", 7.3, -0.7)
        .node("c", -3.0e-7, 98765.4321)
        .hidden("d", 100.0, 100.0)
        .edge("a", "b", None)
        .edge("b", "c", Some(3.0))
        .build();
    let before: Vec<_> = ids.iter().map(|(_, id)| graph.position(*id)).collect();

    for volatile in [false, true] {
        let mut snapshot = encode(&graph, default_edge_weight);
        NoopKernel.step(&LayoutSettings::default(), &mut snapshot.nodes, &snapshot.edges);
        decode(&mut graph, &mut snapshot.nodes, &snapshot.index, volatile);

        let after: Vec<_> = ids.iter().map(|(_, id)| graph.position(*id)).collect();
        assert_eq!(before, after);
    }
}

#[test]
fn test_buffer_lengths_match_visible_counts() {
    let (mut graph, ids) = abc_graph();
    graph.set_node_hidden(id_of(&ids, "A"), true).unwrap();

    let snapshot = encode(&graph, default_edge_weight);
    assert_eq!(snapshot.nodes.node_count(), graph.visible_nodes().len());
    assert_eq!(snapshot.nodes.node_count(), 2);
    assert_eq!(snapshot.edges.edge_count(), 1);
}

#[test]
fn test_abc_masses() {
    let (graph, ids) = abc_graph();
    let snapshot = encode(&graph, default_edge_weight);

    let mass = |label| {
        let i = snapshot.index.index_of(id_of(&ids, label)).unwrap();
        snapshot.nodes.mass(i)
    };
    assert_float_eq(mass("A"), 2.0, 1e-6);
    assert_float_eq(mass("B"), 4.0, 1e-6);
    assert_float_eq(mass("C"), 3.0, 1e-6);
}

#[test]
fn test_force_atlas_pulls_connected_nodes_together() {
    let (mut graph, ids) = GraphBuilder::new()
        .node("a", -100.0, 0.0)
        .node("b", 100.0, 0.0)
        .node("c", 0.0, 150.0)
        .edge("a", "b", None)
        .build();
    let (a, b) = (id_of(&ids, "a"), id_of(&ids, "b"));
    let initial = distance(&graph, a, b);

    let settings = LayoutSettings::default();
    let mut snapshot = encode(&graph, default_edge_weight);
    let mut kernel = ForceAtlas2Kernel::new();
    for _ in 0..100 {
        kernel.step(&settings, &mut snapshot.nodes, &snapshot.edges);
    }
    decode(&mut graph, &mut snapshot.nodes, &snapshot.index, false);

    assert!(distance(&graph, a, b) < initial);
    for (_, id) in &ids {
        let (x, y) = graph.position(*id).unwrap();
        assert!(x.is_finite() && y.is_finite());
    }
}

#[test]
fn test_barnes_hut_stays_finite_and_respects_pins() {
    let labels: Vec<String> = (0..40).map(|i| format!("n{}", i)).collect();
    let mut builder = GraphBuilder::new().pinned("hub", 0.0, 0.0);
    for (i, label) in labels.iter().enumerate() {
        let angle = i as f64 * 0.7;
        builder = builder
            .node(label, 20.0 * angle.cos() * (1.0 + i as f64 / 10.0), 20.0 * angle.sin())
            .edge("hub", label, None);
    }
    let (mut graph, ids) = builder.build();

    let overrides = SettingsOverrides::new().with_barnes_hut(true);
    let settings = LayoutSettings::from_overrides(&overrides).unwrap();
    let mut snapshot = encode(&graph, default_edge_weight);
    let mut kernel = ForceAtlas2Kernel::new();
    for _ in 0..50 {
        kernel.step(&settings, &mut snapshot.nodes, &snapshot.edges);
    }
    decode(&mut graph, &mut snapshot.nodes, &snapshot.index, false);

    assert_eq!(graph.position(id_of(&ids, "hub")), Some((0.0, 0.0)));
    for (_, id) in &ids {
        let (x, y) = graph.position(*id).unwrap();
        assert!(x.is_finite() && y.is_finite());
    }
}

#[test]
fn test_saved_config_configures_supervisor() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("nested").join("layout.toml");

    let mut config = LayoutConfig::new();
    config.settings = SettingsOverrides::new()
        .with_gravity(0.25)
        .with_scaling_ratio(4.0);
    config.supervisor.report_interval = 20;
    config.save_to(&path).unwrap();

    let loaded = LayoutConfig::load_from(&path).unwrap();
    assert_eq!(loaded, config);

    let mut supervisor = LayoutSupervisor::new(loaded.supervisor.clone()).unwrap();
    supervisor.configure(&loaded.settings).unwrap();
    assert_eq!(supervisor.settings().gravity, 0.25);
    assert_eq!(supervisor.settings().scaling_ratio, 4.0);
    assert_eq!(supervisor.options().report_interval, 20);
}

#[test]
fn test_invalid_config_file_is_rejected() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("layout.toml");
    std::fs::write(&path, "[settings]\nslow_down = 0.0\n").unwrap();

    let result = LayoutConfig::load_from(&path);
    assert!(matches!(
        result,
        Err(forcelayout_rs::LayoutError::Configuration { field: "slow_down", .. })
    ));
}
