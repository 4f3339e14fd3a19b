//! Docfinder engine: service client, event streams, and local capabilities.
mod bridge;
mod client;
mod engine;
mod persist;
mod preview;
mod sse;
mod stream;
mod types;

pub use bridge::{
    decode_text, decode_text_prefix, probe_folders, BridgeError, CapabilityBridge, DirEntry,
    FileContent, FileHead, FileStats, LocalFsBridge, PickerCommand,
};
pub use client::{AgentReply, ServiceClient, ServiceSettings, DEFAULT_BASE_URL};
pub use engine::{EngineCommand, EngineHandle, EngineSettings};
pub use persist::{ensure_state_dir, AtomicFileWriter, PersistError};
pub use preview::{load_preview, truncate_preview, DEFAULT_MAX_PREVIEW_BYTES, TRUNCATED_MARKER};
pub use sse::{parse_event_line, EventStreamDecoder};
pub use stream::{ChannelEventSink, EventSink, StreamingTaskController};
pub use types::{EngineError, EngineEvent, FailureKind, ServiceError};
