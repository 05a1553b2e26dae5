//! Error handling for the layout supervisor
//!
//! This module defines custom error types and a Result alias for use
//! throughout the crate.

use crate::types::{EdgeId, NodeId};
use thiserror::Error;

/// Main error type for forcelayout-rs operations
#[derive(Error, Debug)]
pub enum LayoutError {
    /// A layout setting was rejected during validation
    #[error("Invalid setting `{field}`: {reason}")]
    Configuration { field: &'static str, reason: String },

    /// The worker did not acknowledge a request in time
    #[error("Timeout: {0}")]
    Timeout(String),

    /// The worker thread is gone (panicked, killed, or disconnected)
    #[error("Worker terminated: {0}")]
    WorkerTerminated(String),

    /// The node buffer is still held by the worker
    #[error("Node buffer is checked out by the worker")]
    BufferCheckedOut,

    /// Reference to a node that is not in the graph
    #[error("Unknown node {0}")]
    UnknownNode(NodeId),

    /// Reference to an edge that is not in the graph
    #[error("Unknown edge {0}")]
    UnknownEdge(EdgeId),

    /// Errors related to configuration loading/saving
    #[error("Configuration error: {0}")]
    Config(String),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization errors
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Generic errors with context
    #[error("{context}: {source}")]
    WithContext {
        context: String,
        #[source]
        source: Box<LayoutError>,
    },
}

impl LayoutError {
    /// Add context to an error
    pub fn with_context(self, context: impl Into<String>) -> Self {
        LayoutError::WithContext {
            context: context.into(),
            source: Box::new(self),
        }
    }

    /// Shorthand for a configuration error on `field`
    pub fn invalid(field: &'static str, reason: impl Into<String>) -> Self {
        LayoutError::Configuration {
            field,
            reason: reason.into(),
        }
    }

    /// Whether the worker should be considered dead after this error
    pub fn is_worker_fatal(&self) -> bool {
        match self {
            LayoutError::Timeout(_) | LayoutError::WorkerTerminated(_) => true,
            LayoutError::WithContext { source, .. } => source.is_worker_fatal(),
            _ => false,
        }
    }
}

impl From<serde_json::Error> for LayoutError {
    fn from(err: serde_json::Error) -> Self {
        LayoutError::Serialization(err.to_string())
    }
}

/// Result type alias for forcelayout-rs operations
pub type Result<T> = std::result::Result<T, LayoutError>;

/// Extension trait for adding context to Results
pub trait ResultExt<T> {
    /// Add context to an error result
    fn context(self, context: impl Into<String>) -> Result<T>;

    /// Add context lazily to an error result
    fn with_context<F>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> String;
}

impl<T> ResultExt<T> for Result<T> {
    fn context(self, context: impl Into<String>) -> Result<T> {
        self.map_err(|e| e.with_context(context))
    }

    fn with_context<F>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> String,
    {
        self.map_err(|e| e.with_context(f()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_configuration_error_names_field() {
        let err = LayoutError::invalid("gravity", "must be >= 0, got -1");
        assert_eq!(
            err.to_string(),
            "Invalid setting `gravity`: must be >= 0, got -1"
        );
    }

    #[test]
    fn test_error_with_context() {
        let err = LayoutError::Timeout("stop".to_string());
        let with_ctx = err.with_context("Failed to switch mode");
        assert!(with_ctx.to_string().contains("Failed to switch mode"));
        assert!(with_ctx.is_worker_fatal());
    }

    #[test]
    fn test_unknown_node_display() {
        let err = LayoutError::UnknownNode(NodeId(7));
        assert_eq!(err.to_string(), "Unknown node NodeId(7)");
        assert!(!err.is_worker_fatal());
    }
}
