//! Force-directed layout engine
//!
//! This module runs a physics layout on a separate thread so the
//! coordinating thread (usually the UI) never blocks on a simulation step.
//! Buffers move between the two threads through crossbeam channels; neither
//! side ever reads a buffer the other holds.
//!
//! # Architecture
//!
//! - [`codec`] - Encodes the visible graph into flat node/edge buffers and writes results back
//! - [`protocol`] - [`WorkerCommand`] / [`WorkerMessage`] exchanged with the worker
//! - [`worker`] - The worker run loop ([`LayoutWorker`]) and its handle ([`WorkerHandle`])
//! - [`supervisor`] - [`LayoutSupervisor`], which owns the worker lifecycle
//! - [`kernel`] - The physics step ([`LayoutKernel`], [`ForceAtlas2Kernel`])
//!
//! # Example
//!
//! ```ignore
//! use forcelayout_rs::config::SupervisorOptions;
//! use forcelayout_rs::layout::LayoutSupervisor;
//!
//! let mut supervisor = LayoutSupervisor::new(SupervisorOptions::default())?;
//! supervisor.start(&mut graph, true)?;
//!
//! // Once per frame
//! supervisor.pump(&mut graph)?;
//!
//! supervisor.stop(&mut graph)?;
//! ```

pub mod barnes_hut;
pub mod codec;
pub mod kernel;
pub mod progress;
pub mod protocol;
pub mod supervisor;
pub mod worker;

pub use codec::{
    decode, default_edge_weight, encode, refresh, EdgeBuffer, IndexMap, NodeBuffer, Snapshot, EDGE_STRIDE,
    NODE_STRIDE,
};
pub use kernel::{default_kernel_factory, ForceAtlas2Kernel, KernelFactory, LayoutKernel, NoopKernel};
pub use progress::ProgressMeter;
pub use protocol::{WorkerCommand, WorkerMessage};
pub use supervisor::{EdgeWeightFn, LayoutSupervisor, SupervisorStats};
pub use worker::{LayoutWorker, WorkerHandle};
