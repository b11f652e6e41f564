//! Error types for Polymath Core
//!
//! Provides a unified error type for all backend operations.

use crate::llm::LlmError;
use crate::orchestration::{NextStep, Role, RunId};
use thiserror::Error;

/// Result type for Polymath Core operations
pub type Result<T> = std::result::Result<T, PolymathError>;

/// Unified error type for Polymath Core
#[derive(Error, Debug)]
pub enum PolymathError {
    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// The model backend failed (connection, API status, timeout)
    #[error("LLM error: {0}")]
    Llm(#[from] LlmError),

    /// The model produced no terminal message for a role
    #[error("{role} agent returned an empty response")]
    EmptyResponse { role: Role },

    /// The router named a role outside its target set
    #[error("Router chose '{value}', expected one of: {allowed}")]
    Routing { value: String, allowed: String },

    /// A role asked for an edge that is not in the graph
    #[error("Invalid transition from {from} to {to}")]
    InvalidTransition { from: Role, to: NextStep },

    /// A role returned an update that breaks a state invariant
    #[error("Invalid update from {role} agent: {reason}")]
    InvalidUpdate { role: Role, reason: String },

    /// A new run was requested under an identifier that already has a checkpoint
    #[error("Run {run_id} already exists")]
    RunExists { run_id: RunId },

    /// Another execution is driving this run
    #[error("Run {run_id} is already in progress")]
    RunInProgress { run_id: RunId },

    /// The run did not reach the terminal state in time
    #[error("Run did not terminate within {limit} steps")]
    StepLimit { limit: usize },

    /// Attachment type the core does not accept
    #[error("Unsupported attachment: {0}")]
    UnsupportedAttachment(String),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Not found error
    #[error("Not found: {0}")]
    NotFound(String),

    /// Run store error
    #[error("Checkpoint error: {0}")]
    Checkpoint(String),
}

impl PolymathError {
    /// Create a configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        PolymathError::Config(msg.into())
    }

    /// Create a not found error
    pub fn not_found(msg: impl Into<String>) -> Self {
        PolymathError::NotFound(msg.into())
    }

    /// Create a run store error
    pub fn checkpoint(msg: impl Into<String>) -> Self {
        PolymathError::Checkpoint(msg.into())
    }

    /// Create an unsupported attachment error
    pub fn unsupported_attachment(msg: impl Into<String>) -> Self {
        PolymathError::UnsupportedAttachment(msg.into())
    }

    /// Create an invalid update error
    pub fn invalid_update(role: Role, reason: impl Into<String>) -> Self {
        PolymathError::InvalidUpdate {
            role,
            reason: reason.into(),
        }
    }

    /// Whether this error means the model call produced no usable output.
    ///
    /// Routing failures count as adapter failures: a decision outside the
    /// target set is a malformed generation.
    pub fn is_adapter_failure(&self) -> bool {
        matches!(
            self,
            PolymathError::Llm(_) | PolymathError::EmptyResponse { .. } | PolymathError::Routing { .. }
        )
    }
}

impl From<serde_json::Error> for PolymathError {
    fn from(err: serde_json::Error) -> Self {
        PolymathError::Serialization(err.to_string())
    }
}

impl From<toml::de::Error> for PolymathError {
    fn from(err: toml::de::Error) -> Self {
        PolymathError::Config(err.to_string())
    }
}
