//! Layout supervisor
//!
//! Owns the lifecycle of at most one layout worker on behalf of the
//! coordinating thread. The supervisor encodes the graph, moves the node
//! buffer to the worker with every Start, decodes whatever comes back, and
//! restarts the worker whenever the graph's topology changes.
//!
//! # Buffer ownership
//!
//! The node buffer lives in `Option<NodeBuffer>`. A Start takes it out and
//! an Update puts it back, so a second Start cannot be issued while one is
//! outstanding.
//!
//! # Modes
//!
//! - **Background** (`start(graph, true)`): the worker steps continuously
//!   and reports progress until `stop`.
//! - **Foreground** (`start(graph, false)`): the worker performs one step per
//!   Start. Every Update received by [`LayoutSupervisor::pump`] immediately
//!   triggers the next Start, so the host's frame rate drives the step rate.

use crate::config::{LayoutSettings, SettingsOverrides, SupervisorOptions};
use crate::error::{LayoutError, Result, ResultExt};
use crate::events::{EventBus, SubscriptionId};
use crate::graph::{EdgeView, LayoutGraph};
use crate::layout::codec::{self, default_edge_weight, IndexMap, NodeBuffer};
use crate::layout::kernel::{default_kernel_factory, KernelFactory};
use crate::layout::progress::ProgressMeter;
use crate::layout::protocol::{WorkerCommand, WorkerMessage};
use crate::layout::worker::WorkerHandle;
use crate::types::{GraphEvent, LayoutEvent};
use crossbeam_channel::Receiver;
use std::sync::Arc;
use std::time::Instant;

/// Maps an edge to the weight the kernel sees.
pub type EdgeWeightFn = Arc<dyn Fn(&EdgeView) -> f64 + Send + Sync>;

/// Counters for commands sent and workers spawned
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SupervisorStats {
    pub spawns: u64,
    pub inits_sent: u64,
    pub starts_sent: u64,
    pub stops_sent: u64,
    pub restarts: u64,
}

/// Subscription to the graph's change notifications
struct GraphWatch {
    bus: EventBus<GraphEvent>,
    id: SubscriptionId,
    rx: Receiver<GraphEvent>,
}

/// Coordinates one layout worker for one graph.
pub struct LayoutSupervisor {
    options: SupervisorOptions,
    settings: LayoutSettings,
    kernel_factory: KernelFactory,
    edge_weight: EdgeWeightFn,
    worker: Option<WorkerHandle>,
    /// `None` while checked out by the worker
    nodes: Option<NodeBuffer>,
    index: IndexMap,
    running: bool,
    background: bool,
    progress: ProgressMeter,
    events: EventBus<LayoutEvent>,
    watch: Option<GraphWatch>,
    stats: SupervisorStats,
}

impl LayoutSupervisor {
    /// Create a supervisor running the default ForceAtlas2 kernel
    pub fn new(options: SupervisorOptions) -> Result<Self> {
        Self::with_kernel(options, default_kernel_factory())
    }

    /// Create a supervisor whose workers run kernels from `kernel_factory`
    pub fn with_kernel(options: SupervisorOptions, kernel_factory: KernelFactory) -> Result<Self> {
        options.validate()?;
        Ok(Self {
            progress: ProgressMeter::new(options.report_interval),
            options,
            settings: LayoutSettings::default(),
            kernel_factory,
            edge_weight: Arc::new(default_edge_weight),
            worker: None,
            nodes: None,
            index: IndexMap::default(),
            running: false,
            background: false,
            events: EventBus::new(),
            watch: None,
            stats: SupervisorStats::default(),
        })
    }

    /// Replace the edge weight mapping. Takes effect on the next spawn.
    pub fn with_edge_weight(mut self, edge_weight: EdgeWeightFn) -> Self {
        self.edge_weight = edge_weight;
        self
    }

    /// Notifications for the UI
    pub fn events(&self) -> &EventBus<LayoutEvent> {
        &self.events
    }

    pub fn settings(&self) -> &LayoutSettings {
        &self.settings
    }

    pub fn options(&self) -> &SupervisorOptions {
        &self.options
    }

    pub fn stats(&self) -> SupervisorStats {
        self.stats
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    /// Whether the current (or last) run is continuous
    pub fn is_background(&self) -> bool {
        self.background
    }

    pub fn has_worker(&self) -> bool {
        self.worker.is_some()
    }

    /// Whether the node buffer is currently held by the worker
    pub fn is_checked_out(&self) -> bool {
        self.worker.is_some() && self.nodes.is_none()
    }

    /// Merge `overrides` over the default settings. Applied on the next Start.
    ///
    /// Fails on the first invalid field; nothing is clamped and the active
    /// settings are left untouched on error.
    pub fn configure(&mut self, overrides: &SettingsOverrides) -> Result<()> {
        let settings = LayoutSettings::from_overrides(overrides)?;
        tracing::debug!("Layout settings updated: {:?}", settings);
        self.settings = settings;
        Ok(())
    }

    /// Start (or switch) the layout.
    ///
    /// `continuous` selects background mode. Starting in the mode that is
    /// already running does nothing. Positions and pins edited while the
    /// layout was stopped are copied into the buffer before it is sent.
    pub fn start<G>(&mut self, graph: &mut G, continuous: bool) -> Result<()>
    where
        G: LayoutGraph + ?Sized,
    {
        if self.running {
            if self.background == continuous {
                tracing::debug!("Layout already running (continuous: {})", continuous);
                return Ok(());
            }
            tracing::info!("Switching layout mode (continuous: {})", continuous);
            self.stop(graph).context("Failed to stop before switching mode")?;
        }

        if self.worker.is_none() {
            self.spawn(&*graph)?;
        }

        let mut nodes = self.nodes.take().ok_or(LayoutError::BufferCheckedOut)?;
        codec::refresh(&*graph, &mut nodes, &self.index);
        self.running = true;
        self.background = continuous;
        self.progress.reset(Instant::now());
        self.send_start(nodes, !continuous)?;

        tracing::info!("Layout started (continuous: {})", continuous);
        self.events.emit(&LayoutEvent::Started(continuous));
        Ok(())
    }

    /// Stop the layout and wait for the node buffer to come back.
    ///
    /// Resolves immediately when the buffer is not checked out. Otherwise
    /// blocks for at most the configured stop timeout; on
    /// [`LayoutError::Timeout`] the buffer stays with the worker and the
    /// caller should [`kill`](Self::kill).
    pub fn stop<G>(&mut self, graph: &mut G) -> Result<()>
    where
        G: LayoutGraph + ?Sized,
    {
        let Some(worker) = self.worker.as_ref() else {
            self.running = false;
            return Ok(());
        };

        if let Err(e) = worker.send(WorkerCommand::Stop) {
            self.handle_terminated();
            return Err(e);
        }
        self.stats.stops_sent += 1;

        let was_running = self.running;
        self.running = false;
        if was_running {
            tracing::info!("Layout stopped");
            self.events.emit(&LayoutEvent::Stopped);
        }

        let deadline = Instant::now() + self.options.stop_timeout();
        while self.nodes.is_none() {
            let remaining = deadline.saturating_duration_since(Instant::now());
            let received = match self.worker.as_ref() {
                Some(worker) => worker.recv_timeout(remaining),
                None => break,
            };

            match received {
                Ok(msg) => self.handle_message(graph, msg)?,
                Err(e @ LayoutError::WorkerTerminated(_)) => {
                    self.handle_terminated();
                    return Err(e);
                }
                Err(e) => {
                    tracing::warn!("Worker did not return the node buffer: {}", e);
                    return Err(e);
                }
            }
        }

        Ok(())
    }

    /// Tear the worker down without waiting for it.
    ///
    /// All buffers are discarded and the graph subscription is dropped; the
    /// next `start` spawns a fresh worker from a new snapshot.
    pub fn kill(&mut self) {
        if let Some(worker) = self.worker.take() {
            tracing::info!("Killing layout worker");
            worker.terminate();
        }
        if let Some(watch) = self.watch.take() {
            watch.bus.unsubscribe(watch.id);
        }
        self.nodes = None;
        self.index = IndexMap::default();
        self.running = false;
    }

    /// Respawn against the current graph and resume in the same mode.
    pub fn on_graph_mutated<G>(&mut self, graph: &mut G) -> Result<()>
    where
        G: LayoutGraph + ?Sized,
    {
        if self.worker.is_none() {
            // Nothing encoded yet; the next start takes a fresh snapshot anyway.
            return Ok(());
        }

        let was_running = self.running;
        let continuous = self.background;
        tracing::info!("Graph topology changed; restarting layout worker");

        self.kill();
        self.spawn(&*graph)?;
        self.stats.restarts += 1;

        if was_running {
            self.start(graph, continuous)?;
        }
        Ok(())
    }

    /// Process pending graph events and worker messages. Call once per frame.
    pub fn pump<G>(&mut self, graph: &mut G) -> Result<()>
    where
        G: LayoutGraph + ?Sized,
    {
        let mut topology_changed = false;
        if let Some(watch) = &self.watch {
            for event in watch.rx.try_iter() {
                topology_changed |= event.changes_topology();
            }
        }
        if topology_changed {
            self.on_graph_mutated(graph)?;
        }

        loop {
            let received = match self.worker.as_ref() {
                Some(worker) => worker.try_recv(),
                None => return Ok(()),
            };

            match received {
                Ok(Some(msg)) => {
                    let update = matches!(msg, WorkerMessage::Update { .. });
                    self.handle_message(graph, msg)?;
                    // One Update per frame keeps foreground stepping at the frame rate.
                    if update {
                        return Ok(());
                    }
                }
                Ok(None) => return Ok(()),
                Err(e) => {
                    self.handle_terminated();
                    return Err(e);
                }
            }
        }
    }

    fn spawn<G>(&mut self, graph: &G) -> Result<()>
    where
        G: LayoutGraph + ?Sized,
    {
        let edge_weight = Arc::clone(&self.edge_weight);
        let snapshot = codec::encode(graph, |edge| edge_weight(edge));

        let worker = WorkerHandle::spawn(
            (self.kernel_factory)(),
            self.options.command_channel_capacity,
        )
        .context("Failed to spawn layout worker")?;
        worker.send(WorkerCommand::Init {
            edges: snapshot.edges,
        })?;
        self.stats.spawns += 1;
        self.stats.inits_sent += 1;

        tracing::info!(
            "Layout worker spawned for {} nodes",
            snapshot.index.len()
        );

        self.worker = Some(worker);
        self.nodes = Some(snapshot.nodes);
        self.index = snapshot.index;

        if self.watch.is_none() {
            let bus = graph.events().clone();
            let (id, rx) = bus.channel();
            self.watch = Some(GraphWatch { bus, id, rx });
        }
        Ok(())
    }

    fn send_start(&mut self, nodes: NodeBuffer, single_iteration: bool) -> Result<()> {
        let Some(worker) = self.worker.as_ref() else {
            return Err(LayoutError::WorkerTerminated("no worker".to_string()));
        };
        let cmd = WorkerCommand::Start {
            settings: self.settings.clone(),
            single_iteration,
            nodes,
            report_interval: self.options.report_interval,
        };
        if let Err(e) = worker.send(cmd) {
            self.handle_terminated();
            return Err(e);
        }
        self.stats.starts_sent += 1;
        Ok(())
    }

    fn handle_message<G>(&mut self, graph: &mut G, msg: WorkerMessage) -> Result<()>
    where
        G: LayoutGraph + ?Sized,
    {
        match msg {
            WorkerMessage::Update { mut nodes } => {
                let foreground = self.running && !self.background;
                let written = codec::decode(graph, &mut nodes, &self.index, foreground);
                tracing::debug!("Decoded {} node positions", written);
                self.events.emit(&LayoutEvent::Updated);

                if foreground {
                    self.send_start(nodes, true)?;
                } else {
                    self.nodes = Some(nodes);
                }
            }
            WorkerMessage::Progress { iteration_count } => {
                if self.running && self.background {
                    let report = self.progress.record(iteration_count, Instant::now());
                    tracing::debug!(
                        "Layout progress: {} iterations ({:.1}/s)",
                        report.iteration_count,
                        report.speed
                    );
                    self.events.emit(&LayoutEvent::Progress(report));
                } else {
                    tracing::debug!("Dropping progress report from a stopped run");
                }
            }
            WorkerMessage::Unknown => {
                tracing::warn!("Ignoring unknown message kind from worker");
            }
        }
        Ok(())
    }

    fn handle_terminated(&mut self) {
        tracing::error!("Layout worker terminated unexpectedly");
        self.kill();
    }
}

impl Drop for LayoutSupervisor {
    fn drop(&mut self) {
        self.kill();
    }
}

impl std::fmt::Debug for LayoutSupervisor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LayoutSupervisor")
            .field("running", &self.running)
            .field("background", &self.background)
            .field("has_worker", &self.worker.is_some())
            .field("checked_out", &self.is_checked_out())
            .field("stats", &self.stats)
            .finish()
    }
}
