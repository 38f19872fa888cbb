//! Error types for the edge client and its capabilities

use ie_01_rendezvous::SlotError;
use std::path::PathBuf;
use thiserror::Error;

use crate::domain::lifecycle::ClientState;

/// Errors reported by the connectivity handle.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConnError {
    #[error("Could not connect: {0}")]
    Open(String),

    #[error("Could not close client: {0}")]
    Close(String),

    #[error("Could not complete message: {0}")]
    Complete(String),

    #[error("Method handler already registered for '{0}'")]
    HandlerRegistered(String),

    /// Asynchronous transport error raised outside any call.
    #[error("Transport error: {0}")]
    Transport(String),
}

/// Errors sending data through the connectivity handle.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SendError {
    #[error("Could not send message to output '{output}': {reason}")]
    Output { output: String, reason: String },

    #[error("Could not send method response: {0}")]
    Response(String),

    #[error("Client is not open")]
    NotOpen,
}

/// Errors from the twin (synchronized state) handle.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StateError {
    #[error("Could not get twin: {0}")]
    Fetch(String),

    #[error("Could not update reported properties: {0}")]
    Update(String),
}

/// Rejected client lifecycle transition.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LifecycleError {
    #[error("Invalid client transition from {from} to {to}")]
    InvalidTransition { from: ClientState, to: ClientState },
}

/// Fatal errors of one initialization attempt.
#[derive(Debug, Error)]
pub enum InitError {
    #[error(transparent)]
    Connection(#[from] ConnError),

    #[error(transparent)]
    State(#[from] StateError),

    #[error(transparent)]
    Lifecycle(#[from] LifecycleError),

    #[error(transparent)]
    Slot(#[from] SlotError),
}

/// Invalid configuration or unreadable credential files.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing environment variable {0}")]
    MissingVar(&'static str),

    #[error("Invalid value for {var}: {reason}")]
    InvalidValue { var: &'static str, reason: String },

    #[error("Could not read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid capability definitions in {path}: {source}")]
    Capabilities {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Invalid capability '{id}': {reason}")]
    InvalidCapability { id: String, reason: String },
}

/// Errors talking to a running capability.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CapabilityError {
    #[error("Capability '{0}' is closed")]
    Closed(String),
}
