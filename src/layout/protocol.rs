//! Messages exchanged between the supervisor and a layout worker.
//!
//! Every buffer field is moved into the message and out again on receipt;
//! no message kind copies a buffer. Both enums are tagged by `kind` when
//! serialized, and a frame with an unrecognised kind decodes to `Unknown`
//! so that an older peer can log it and carry on.
//!
//! | Direction | Kind | Payload |
//! |---|---|---|
//! | supervisor -> worker | `Init` | edge buffer |
//! | supervisor -> worker | `Start` | settings, single-iteration flag, node buffer, report interval |
//! | supervisor -> worker | `Stop` | none |
//! | worker -> supervisor | `Update` | node buffer |
//! | worker -> supervisor | `Progress` | iteration count |

use crate::config::LayoutSettings;
use crate::error::Result;
use crate::layout::codec::{EdgeBuffer, NodeBuffer};
use serde::{Deserialize, Serialize};

/// Commands sent to the worker
#[derive(Debug, Serialize, Deserialize)]
#[serde(tag = "kind")]
pub enum WorkerCommand {
    /// Hand the worker the edge buffer for its whole lifetime
    Init { edges: EdgeBuffer },
    /// Check the node buffer out for one or more kernel steps
    Start {
        settings: LayoutSettings,
        single_iteration: bool,
        nodes: NodeBuffer,
        report_interval: u32,
    },
    /// Finish the current step and return the node buffer
    Stop,
    /// A kind this build does not understand
    #[serde(other)]
    Unknown,
}

impl WorkerCommand {
    pub fn kind(&self) -> &'static str {
        match self {
            WorkerCommand::Init { .. } => "Init",
            WorkerCommand::Start { .. } => "Start",
            WorkerCommand::Stop => "Stop",
            WorkerCommand::Unknown => "Unknown",
        }
    }
}

/// Messages sent back to the supervisor
#[derive(Debug, Serialize, Deserialize)]
#[serde(tag = "kind")]
pub enum WorkerMessage {
    /// Check the node buffer back in
    Update { nodes: NodeBuffer },
    /// Steps completed so far in the current continuous run
    Progress { iteration_count: u64 },
    /// A kind this build does not understand
    #[serde(other)]
    Unknown,
}

impl WorkerMessage {
    pub fn kind(&self) -> &'static str {
        match self {
            WorkerMessage::Update { .. } => "Update",
            WorkerMessage::Progress { .. } => "Progress",
            WorkerMessage::Unknown => "Unknown",
        }
    }
}

/// Encode a command as a JSON frame, for transports that cross a process boundary.
pub fn encode_command(command: &WorkerCommand) -> Result<String> {
    Ok(serde_json::to_string(command)?)
}

/// Decode a JSON command frame. Unrecognised kinds become [`WorkerCommand::Unknown`].
pub fn decode_command(frame: &str) -> Result<WorkerCommand> {
    Ok(serde_json::from_str(frame)?)
}

/// Encode a worker message as a JSON frame.
pub fn encode_message(message: &WorkerMessage) -> Result<String> {
    Ok(serde_json::to_string(message)?)
}

/// Decode a JSON message frame. Unrecognised kinds become [`WorkerMessage::Unknown`].
pub fn decode_message(frame: &str) -> Result<WorkerMessage> {
    Ok(serde_json::from_str(frame)?)
}
