//! # forcelayout-rs: Supervised force-directed graph layout
//!
//! Runs a continuous force-directed layout on a worker thread while the
//! graph stays owned by the coordinating thread.
//!
//! ## Architecture
//!
//! - **Graph**: the host graph is reached through the [`graph::LayoutGraph`] trait
//! - **Codec**: visible nodes and edges are flattened into numeric buffers
//! - **Worker**: steps a [`layout::LayoutKernel`] over the buffers on its own thread
//! - **Supervisor**: moves buffers to and from the worker, decodes results,
//!   and restarts the worker when the graph's topology changes
//! - **Communication**: Crossbeam channels; buffers are moved, never shared
//!
//! ## Configuration
//!
//! Kernel settings and supervisor options are stored as TOML in the
//! platform-appropriate config directory under `dev.forcelayout.forcelayout-rs`
//! (see [`config`]).
//!
//! ## Example
//!
//! ```ignore
//! use forcelayout_rs::{AttributedGraph, LayoutSupervisor, NodeAttributes};
//! use forcelayout_rs::config::LayoutConfig;
//!
//! fn main() -> forcelayout_rs::Result<()> {
//!     let config = LayoutConfig::load_or_default();
//!
//!     let mut graph = AttributedGraph::new();
//!     let a = graph.add_node(NodeAttributes::new("a", 0.0, 0.0));
//!     let b = graph.add_node(NodeAttributes::new("b", 1.0, 0.0));
//!     graph.add_edge(a, b, None)?;
//!
//!     let mut supervisor = LayoutSupervisor::new(config.supervisor.clone())?;
//!     supervisor.configure(&config.settings)?;
//!     supervisor.start(&mut graph, true)?;
//!
//!     loop {
//!         supervisor.pump(&mut graph)?;
//!         // render graph ...
//!     }
//! }
//! ```

pub mod config;
pub mod error;
pub mod events;
pub mod graph;
pub mod layout;
pub mod types;

// Re-export commonly used types
pub use config::{LayoutConfig, LayoutSettings, SettingsOverrides, SupervisorOptions};
pub use error::{LayoutError, Result, ResultExt};
pub use events::{EventBus, SubscriptionId};
pub use graph::{AttributedGraph, EdgeAttributes, EdgeView, LayoutGraph, NodeAttributes, NodeView};
pub use layout::{LayoutKernel, LayoutSupervisor};
pub use types::{EdgeId, GraphEvent, LayoutEvent, NodeId, ProgressReport};
