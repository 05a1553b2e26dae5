//! Layout worker thread implementation
//!
//! This module contains the loop that runs on a dedicated thread and owns
//! the simulation state while a node buffer is checked out. It communicates
//! with the supervisor exclusively through crossbeam channels.
//!
//! # Responsibilities
//!
//! - **Init**: keep the edge buffer for the worker's whole lifetime
//! - **Single-iteration Start**: one kernel step, then hand the buffer back
//! - **Continuous Start**: step until stopped, reporting progress every
//!   `report_interval` steps
//! - **Stop**: observed only between steps; the step in flight always finishes
//!
//! # Cooperative scheduling
//!
//! While running continuously the worker drains its command channel
//! without blocking after every step. That drain is the only point where a
//! Stop can be observed, so no step begins once a Stop has been read.
//!
//! # Termination
//!
//! The loop exits when the supervisor drops its command sender or clears
//! the shared `alive` flag. A panicking kernel unwinds the thread; the
//! supervisor notices the closed reply channel.

use crate::config::LayoutSettings;
use crate::error::{LayoutError, Result};
use crate::layout::codec::{EdgeBuffer, NodeBuffer};
use crate::layout::kernel::LayoutKernel;
use crate::layout::protocol::{WorkerCommand, WorkerMessage};
use crossbeam_channel::{bounded, unbounded, Receiver, RecvTimeoutError, Sender, TryRecvError};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::Duration;

/// The worker that runs the kernel loop
pub struct LayoutWorker {
    /// Command receiver from the supervisor
    command_rx: Receiver<WorkerCommand>,
    /// Message sender to the supervisor
    message_tx: Sender<WorkerMessage>,
    /// Cleared by the supervisor to kill this worker
    alive: Arc<AtomicBool>,
    /// Physics step
    kernel: Box<dyn LayoutKernel + Send>,
    /// Edge buffer received with Init
    edges: Option<EdgeBuffer>,
    /// Steps completed in the current continuous run
    iterations: u64,
    /// Set when a Stop is read during a continuous run
    stop_requested: bool,
    /// Set when the supervisor's command sender is gone
    disconnected: bool,
}

impl LayoutWorker {
    /// Create a new worker
    pub fn new(
        kernel: Box<dyn LayoutKernel + Send>,
        command_rx: Receiver<WorkerCommand>,
        message_tx: Sender<WorkerMessage>,
        alive: Arc<AtomicBool>,
    ) -> Self {
        Self {
            command_rx,
            message_tx,
            alive,
            kernel,
            edges: None,
            iterations: 0,
            stop_requested: false,
            disconnected: false,
        }
    }

    fn is_alive(&self) -> bool {
        !self.disconnected && self.alive.load(Ordering::SeqCst)
    }

    /// Run the main worker loop
    pub fn run(&mut self) {
        tracing::info!("Layout worker started (kernel: {})", self.kernel.name());

        while self.is_alive() {
            match self.command_rx.recv() {
                Ok(cmd) => self.handle_command(cmd),
                Err(_) => self.disconnected = true,
            }
        }

        tracing::info!("Layout worker stopped");
    }

    /// Handle a command received while idle
    fn handle_command(&mut self, cmd: WorkerCommand) {
        match cmd {
            WorkerCommand::Init { edges } => {
                if self.edges.is_some() {
                    tracing::warn!("Ignoring second Init; edge buffer is fixed for this worker");
                } else {
                    tracing::debug!("Worker received {} edges", edges.edge_count());
                    self.edges = Some(edges);
                }
            }
            WorkerCommand::Start {
                settings,
                single_iteration,
                nodes,
                report_interval,
            } => {
                self.handle_start(settings, single_iteration, nodes, report_interval);
            }
            WorkerCommand::Stop => {
                tracing::debug!("Stop received while idle; nothing to stop");
            }
            WorkerCommand::Unknown => {
                tracing::warn!("Ignoring unknown command kind");
            }
        }
    }

    fn handle_start(
        &mut self,
        settings: LayoutSettings,
        single_iteration: bool,
        mut nodes: NodeBuffer,
        report_interval: u32,
    ) {
        // Held outside `self` for the duration of the run so the command
        // drain can borrow the worker mutably.
        let Some(edges) = self.edges.take() else {
            tracing::warn!("Start received before Init; returning node buffer untouched");
            self.send(WorkerMessage::Update { nodes });
            return;
        };

        if single_iteration {
            self.kernel.step(&settings, &mut nodes, &edges);
            self.send(WorkerMessage::Update { nodes });
        } else {
            self.run_continuous(&settings, nodes, &edges, report_interval.max(1));
        }

        self.edges = Some(edges);
    }

    fn run_continuous(
        &mut self,
        settings: &LayoutSettings,
        mut nodes: NodeBuffer,
        edges: &EdgeBuffer,
        report_interval: u32,
    ) {
        self.iterations = 0;
        self.stop_requested = false;
        tracing::debug!("Continuous run started (report every {} steps)", report_interval);

        loop {
            self.kernel.step(settings, &mut nodes, edges);
            self.iterations += 1;

            if self.iterations % report_interval as u64 == 0 {
                self.send(WorkerMessage::Progress {
                    iteration_count: self.iterations,
                });
            }

            // Yield point: let the supervisor's thread run, then look for a Stop.
            std::thread::yield_now();
            self.drain_commands();

            if !self.is_alive() {
                tracing::debug!("Worker killed mid-run after {} steps", self.iterations);
                return;
            }
            if self.stop_requested {
                tracing::debug!("Continuous run stopped after {} steps", self.iterations);
                self.send(WorkerMessage::Update { nodes });
                return;
            }
        }
    }

    /// Process pending commands without blocking
    fn drain_commands(&mut self) {
        loop {
            match self.command_rx.try_recv() {
                Ok(WorkerCommand::Stop) => self.stop_requested = true,
                Ok(WorkerCommand::Start { .. }) => {
                    tracing::warn!("Ignoring Start while a run is in progress");
                }
                Ok(WorkerCommand::Init { .. }) => {
                    tracing::warn!("Ignoring Init while a run is in progress");
                }
                Ok(WorkerCommand::Unknown) => {
                    tracing::warn!("Ignoring unknown command kind");
                }
                Err(TryRecvError::Empty) => break,
                Err(TryRecvError::Disconnected) => {
                    self.disconnected = true;
                    break;
                }
            }
        }
    }

    fn send(&mut self, msg: WorkerMessage) {
        if self.message_tx.send(msg).is_err() {
            // Supervisor has gone away; nothing left to report to.
            self.disconnected = true;
        }
    }
}

/// Supervisor-side handle to a running worker thread.
pub struct WorkerHandle {
    command_tx: Sender<WorkerCommand>,
    message_rx: Receiver<WorkerMessage>,
    alive: Arc<AtomicBool>,
    thread: Option<JoinHandle<()>>,
}

impl WorkerHandle {
    /// Spawn a worker thread running `kernel`.
    pub fn spawn(kernel: Box<dyn LayoutKernel + Send>, command_capacity: usize) -> Result<Self> {
        let (command_tx, command_rx) = bounded(command_capacity.max(1));
        // Unbounded: the worker must never block while holding the node buffer.
        let (message_tx, message_rx) = unbounded();
        let alive = Arc::new(AtomicBool::new(true));

        let worker_alive = alive.clone();
        let thread = std::thread::Builder::new()
            .name("layout-worker".to_string())
            .spawn(move || {
                let mut worker = LayoutWorker::new(kernel, command_rx, message_tx, worker_alive);
                let outcome =
                    std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| worker.run()));
                if outcome.is_err() {
                    tracing::error!("Layout worker panicked; dropping its channels");
                }
            })?;

        Ok(Self {
            command_tx,
            message_rx,
            alive,
            thread: Some(thread),
        })
    }

    /// Send a command, moving any buffers it carries.
    pub fn send(&self, cmd: WorkerCommand) -> Result<()> {
        let kind = cmd.kind();
        self.command_tx
            .send(cmd)
            .map_err(|_| LayoutError::WorkerTerminated(format!("could not deliver {}", kind)))
    }

    /// Next message if one is queued.
    pub fn try_recv(&self) -> Result<Option<WorkerMessage>> {
        match self.message_rx.try_recv() {
            Ok(msg) => Ok(Some(msg)),
            Err(TryRecvError::Empty) => Ok(None),
            Err(TryRecvError::Disconnected) => Err(LayoutError::WorkerTerminated(
                "reply channel closed".to_string(),
            )),
        }
    }

    /// Wait up to `timeout` for the next message.
    pub fn recv_timeout(&self, timeout: Duration) -> Result<WorkerMessage> {
        match self.message_rx.recv_timeout(timeout) {
            Ok(msg) => Ok(msg),
            Err(RecvTimeoutError::Timeout) => Err(LayoutError::Timeout(format!(
                "worker did not respond within {:?}",
                timeout
            ))),
            Err(RecvTimeoutError::Disconnected) => Err(LayoutError::WorkerTerminated(
                "reply channel closed".to_string(),
            )),
        }
    }

    /// Kill the worker without waiting. In-flight messages are discarded.
    pub fn terminate(mut self) {
        self.alive.store(false, Ordering::SeqCst);
        // Dropping the sender wakes an idle worker; the thread is detached.
        drop(self.thread.take());
    }
}

impl Drop for WorkerHandle {
    fn drop(&mut self) {
        self.alive.store(false, Ordering::SeqCst);
    }
}
