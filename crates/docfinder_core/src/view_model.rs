use crate::{
    ActionKind, IngestReport, Notice, RegistrationOutcome, SearchResults, SelectedFile,
    StreamPhase, TaskMetadata,
};

#[derive(Debug, Clone, PartialEq, Default)]
pub struct AppViewModel {
    pub folders: Vec<FolderRow>,
    pub search_disabled: bool,
    pub has_unprocessed: bool,
    pub ingest_in_flight: bool,
    pub last_registration: Option<RegistrationOutcome>,
    pub last_ingest: Option<IngestReport>,
    pub match_count: u32,
    pub query: String,
    pub search_loading: bool,
    pub results: Option<SearchResults>,
    pub confirmable_actions: Vec<ActionKind>,
    pub tag_color: Option<&'static str>,
    pub selected_file: Option<SelectedFile>,
    pub stream: StreamView,
    pub notices: Vec<Notice>,
    pub dirty: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FolderRow {
    pub path: String,
    pub name: String,
    pub processed: bool,
    pub archived: bool,
    pub file_count: usize,
    /// A permanent delete is outstanding.
    pub deleting: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct StreamView {
    pub phase: StreamPhase,
    pub output: String,
    pub metadata: Option<TaskMetadata>,
    pub panel_open: bool,
}
