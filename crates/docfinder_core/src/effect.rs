use crate::{ActionKind, PendingAction, SearchId, SearchQuery, StreamRequest, TaskId};

/// Work the update function asks the engine to perform. Results come back
/// as `Msg`s.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    LoadInventory {
        purpose: InventoryPurpose,
    },
    PickFolders,
    /// Directory-read probe of every path; all must succeed.
    ProbeFolders {
        paths: Vec<String>,
        rejected: Vec<String>,
    },
    Ingest {
        paths: Vec<String>,
    },
    DeleteFolder {
        path: String,
    },
    Search {
        search_id: SearchId,
        query: SearchQuery,
    },
    /// Start a streaming task. Any other running task has already been
    /// given a `CancelStream` earlier in the same effect list.
    StartStream {
        task_id: TaskId,
        request: StreamRequest,
    },
    CancelStream {
        task_id: TaskId,
    },
    ExecuteAction {
        search_id: SearchId,
        kind: ActionKind,
        action: PendingAction,
    },
    ReadFile {
        path: String,
        name: String,
    },
    /// The set of archived folder paths changed and should be saved.
    PersistArchived {
        paths: Vec<String>,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InventoryPurpose {
    /// Seed the collection when the client starts.
    Startup,
    /// Second phase of an ingest: merge file lists for these paths.
    AfterIngest { completed: Vec<String> },
}
