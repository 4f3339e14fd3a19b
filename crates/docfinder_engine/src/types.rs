use std::fmt;

use docfinder_core::{
    ActionKind, ActionOutcome, FileBody, IngestReport, InventoryPurpose, ProbeFailure,
    RemoteFolder, SearchId, SearchResults, StreamEvent, StreamOutcome, TaskId,
};
use thiserror::Error;

use crate::bridge::BridgeError;

/// Completion notices sent from the engine back to the application.
#[derive(Debug, Clone, PartialEq)]
pub enum EngineEvent {
    InventoryLoaded {
        purpose: InventoryPurpose,
        result: Result<Vec<RemoteFolder>, ServiceError>,
    },
    FoldersPicked(Result<Vec<String>, BridgeError>),
    FoldersProbed {
        paths: Vec<String>,
        rejected: Vec<String>,
        result: Result<(), ProbeFailure>,
    },
    IngestFinished(Result<IngestReport, ServiceError>),
    FolderDeleted {
        path: String,
        result: Result<u64, ServiceError>,
    },
    SearchFinished {
        search_id: SearchId,
        result: Result<SearchResults, ServiceError>,
    },
    ActionExecuted {
        search_id: SearchId,
        kind: ActionKind,
        result: Result<ActionOutcome, ServiceError>,
    },
    FileLoaded {
        path: String,
        name: String,
        result: Result<FileBody, BridgeError>,
    },
    Stream {
        task_id: TaskId,
        event: StreamEvent,
    },
    StreamFinished {
        task_id: TaskId,
        outcome: StreamOutcome,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{kind}: {message}")]
pub struct ServiceError {
    pub kind: FailureKind,
    pub message: String,
}

impl ServiceError {
    pub fn new(kind: FailureKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FailureKind {
    InvalidUrl,
    HttpStatus(u16),
    Timeout,
    Network,
    /// The body did not have the expected shape.
    Decode,
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FailureKind::InvalidUrl => write!(f, "invalid url"),
            FailureKind::HttpStatus(code) => write!(f, "HTTP {code}"),
            FailureKind::Timeout => write!(f, "timeout"),
            FailureKind::Network => write!(f, "network error"),
            FailureKind::Decode => write!(f, "invalid response"),
        }
    }
}

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("failed to start engine runtime: {0}")]
    Runtime(#[from] std::io::Error),
    #[error("failed to build service client: {0}")]
    Client(#[from] ServiceError),
}
