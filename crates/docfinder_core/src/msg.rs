use crate::{
    ActionKind, ActionOutcome, FileBody, IngestReport, InventoryPurpose, ProbeFailure,
    RemoteFolder, SearchId, SearchResults, StreamEvent, StreamOutcome, TaskId,
};

#[derive(Debug, Clone, PartialEq)]
pub enum Msg {
    /// Client started; load the backend inventory.
    AppStarted,
    /// Archived folder paths restored from disk.
    RestoreArchived(Vec<String>),
    InventoryLoaded {
        purpose: InventoryPurpose,
        result: Result<Vec<RemoteFolder>, String>,
    },
    /// User asked for the directory dialog.
    PickFoldersClicked,
    /// Directories chosen in the dialog (empty when cancelled).
    FoldersPicked(Vec<String>),
    FolderPickFailed(String),
    FoldersProbed {
        paths: Vec<String>,
        rejected: Vec<String>,
        result: Result<(), ProbeFailure>,
    },
    ArchiveFolder {
        path: String,
    },
    UnarchiveFolder {
        path: String,
    },
    DeleteFolder {
        path: String,
    },
    FolderDeleted {
        path: String,
        result: Result<u64, String>,
    },
    /// User clicked "process" for all unprocessed folders.
    IngestClicked,
    IngestFinished(Result<IngestReport, String>),
    MatchCountChanged(u32),
    QuerySubmitted(String),
    SearchFinished {
        search_id: SearchId,
        result: Result<SearchResults, String>,
    },
    /// Confirm a pending action; `None` means the move action.
    ConfirmAction {
        kind: Option<ActionKind>,
    },
    ActionExecuted {
        search_id: SearchId,
        kind: ActionKind,
        result: Result<ActionOutcome, String>,
    },
    OpenFile {
        path: String,
        name: String,
    },
    FileLoaded {
        path: String,
        name: String,
        result: Result<FileBody, String>,
    },
    CloseFile,
    SummarizeFile {
        file_name: String,
        file_path: String,
        content: Option<String>,
    },
    StreamEvent {
        task_id: TaskId,
        event: StreamEvent,
    },
    StreamFinished {
        task_id: TaskId,
        outcome: StreamOutcome,
    },
    CancelStream,
    CloseOutputPanel,
    DismissNotices,
    /// Blank input; changes nothing.
    NoOp,
}
