//! Kernel helpers for driving the supervisor in tests

use forcelayout_rs::config::LayoutSettings;
use forcelayout_rs::layout::codec::NODE_X;
use forcelayout_rs::layout::{EdgeBuffer, KernelFactory, LayoutKernel, NodeBuffer, NoopKernel};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// Moves every node one unit along x per step
pub struct ShiftKernel;

impl LayoutKernel for ShiftKernel {
    fn step(&mut self, _settings: &LayoutSettings, nodes: &mut NodeBuffer, _edges: &EdgeBuffer) {
        for n in 0..nodes.node_count() {
            nodes.add(n, NODE_X, 1.0);
        }
    }
}

/// Moves every non-fixed node one unit along x per step
pub struct FreeShiftKernel;

impl LayoutKernel for FreeShiftKernel {
    fn step(&mut self, _settings: &LayoutSettings, nodes: &mut NodeBuffer, _edges: &EdgeBuffer) {
        for n in 0..nodes.node_count() {
            if !nodes.is_fixed(n) {
                nodes.add(n, NODE_X, 1.0);
            }
        }
    }
}

/// Sleeps for a fixed time on every step
pub struct SlowKernel(pub Duration);

impl LayoutKernel for SlowKernel {
    fn step(&mut self, _settings: &LayoutSettings, _nodes: &mut NodeBuffer, _edges: &EdgeBuffer) {
        std::thread::sleep(self.0);
    }
}

/// Panics on the first step
pub struct PanicKernel;

impl LayoutKernel for PanicKernel {
    fn step(&mut self, _settings: &LayoutSettings, _nodes: &mut NodeBuffer, _edges: &EdgeBuffer) {
        panic!("kernel failure");
    }
}

/// Records the node count and settings of every step
pub struct RecordingKernel {
    pub steps: Arc<AtomicUsize>,
    pub node_counts: Arc<std::sync::Mutex<Vec<usize>>>,
    pub gravities: Arc<std::sync::Mutex<Vec<f64>>>,
}

impl LayoutKernel for RecordingKernel {
    fn step(&mut self, settings: &LayoutSettings, nodes: &mut NodeBuffer, _edges: &EdgeBuffer) {
        self.steps.fetch_add(1, Ordering::SeqCst);
        self.node_counts.lock().unwrap().push(nodes.node_count());
        self.gravities.lock().unwrap().push(settings.gravity);
        // Keep continuous runs from spinning a core flat out.
        std::thread::sleep(Duration::from_micros(200));
    }
}

pub fn factory<K, F>(make: F) -> KernelFactory
where
    K: LayoutKernel + Send + 'static,
    F: Fn() -> K + Send + Sync + 'static,
{
    Arc::new(move || Box::new(make()) as Box<dyn LayoutKernel + Send>)
}

pub fn noop_factory() -> KernelFactory {
    factory(|| NoopKernel)
}
