//! Docfinder core: pure client state machine and view-model helpers.
//!
//! Owns the folder collection, the single streaming task, and the current
//! search results. All mutation goes through [`update`]; I/O is requested
//! as [`Effect`]s and its results come back as [`Msg`]s.
mod effect;
mod folder;
mod intent;
mod msg;
mod search;
mod state;
mod stream;
mod update;
mod view_model;

pub use effect::{Effect, InventoryPurpose};
pub use folder::{
    display_name, ArchiveOutcome, Folder, FolderSet, IngestFolderReport, IngestReport,
    ProbeFailure, RegistrationOutcome, RemoteFolder,
};
pub use intent::is_agent_query;
pub use msg::Msg;
pub use search::{
    ActionKind, ActionOutcome, PendingAction, SearchId, SearchQuery, SearchResult, SearchResults,
    TagColor,
};
pub use state::{
    AppState, FileBody, Notice, NoticeLevel, SelectedFile, DEFAULT_MATCH_COUNT, MAX_NOTICES,
};
pub use stream::{
    StreamEvent, StreamOutcome, StreamPhase, StreamRequest, StreamTask, TaskId, TaskMetadata,
};
pub use update::update;
pub use view_model::{AppViewModel, FolderRow, StreamView};
