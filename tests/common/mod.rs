//! Common test utilities and helpers

#![allow(dead_code)] // Test utilities may not all be used in every test file

pub mod builders;
pub mod mock_helpers;

use forcelayout_rs::{LayoutEvent, LayoutSupervisor};
use std::sync::{Arc, Mutex};

/// Assert two floats are approximately equal
pub fn assert_float_eq(a: f64, b: f64, epsilon: f64) {
    assert!(
        (a - b).abs() < epsilon,
        "Expected {} to be approximately equal to {} (epsilon: {})",
        a,
        b,
        epsilon
    );
}

/// Collect every event the supervisor emits
pub fn record_events(supervisor: &LayoutSupervisor) -> Arc<Mutex<Vec<LayoutEvent>>> {
    let seen = Arc::new(Mutex::new(Vec::new()));
    let sink = seen.clone();
    supervisor
        .events()
        .subscribe(move |event| sink.lock().unwrap().push(*event));
    seen
}

/// Count `Started(continuous)` events
pub fn count_started(events: &[LayoutEvent], continuous: bool) -> usize {
    events
        .iter()
        .filter(|e| **e == LayoutEvent::Started(continuous))
        .count()
}
