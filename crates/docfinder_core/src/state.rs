use std::collections::{BTreeSet, VecDeque};

use crate::view_model::{AppViewModel, FolderRow, StreamView};
use crate::{
    ActionKind, FolderSet, IngestReport, RegistrationOutcome, SearchId, SearchResults, StreamTask,
};

pub const DEFAULT_MATCH_COUNT: u32 = 10;
pub const MAX_NOTICES: usize = 8;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeLevel {
    Info,
    Success,
    Error,
}

/// A user-visible notification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    /// Increases by one per notice within a session.
    pub id: u64,
    pub level: NoticeLevel,
    pub text: String,
}

/// Text loaded for the preview pane.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct FileBody {
    /// `None` when the file is not readable as text.
    pub content: Option<String>,
    pub truncated: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectedFile {
    pub path: String,
    pub name: String,
    pub content: Option<String>,
    pub truncated: bool,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub(crate) struct SearchState {
    pub(crate) last_id: SearchId,
    pub(crate) in_flight: Option<SearchId>,
    pub(crate) current: Option<(SearchId, SearchResults)>,
    pub(crate) executing: Option<(SearchId, ActionKind)>,
}

impl SearchState {
    pub(crate) fn next_id(&mut self) -> SearchId {
        self.last_id += 1;
        self.in_flight = Some(self.last_id);
        self.last_id
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct AppState {
    pub(crate) folders: FolderSet,
    /// Archived paths as persisted; re-applied when folders become known.
    pub(crate) archive_memory: BTreeSet<String>,
    pub(crate) last_registration: Option<RegistrationOutcome>,
    pub(crate) ingest_in_flight: bool,
    pub(crate) last_ingest: Option<IngestReport>,
    pub(crate) deleting: BTreeSet<String>,
    pub(crate) match_count: u32,
    pub(crate) query: String,
    pub(crate) search: SearchState,
    pub(crate) selected_file: Option<SelectedFile>,
    pub(crate) pending_preview: Option<String>,
    pub(crate) stream: StreamTask,
    pub(crate) notices: VecDeque<Notice>,
    last_notice_id: u64,
    dirty: bool,
}

impl Default for AppState {
    fn default() -> Self {
        Self {
            folders: FolderSet::default(),
            archive_memory: BTreeSet::new(),
            last_registration: None,
            ingest_in_flight: false,
            last_ingest: None,
            deleting: BTreeSet::new(),
            match_count: DEFAULT_MATCH_COUNT,
            query: String::new(),
            search: SearchState::default(),
            selected_file: None,
            pending_preview: None,
            stream: StreamTask::default(),
            notices: VecDeque::new(),
            last_notice_id: 0,
            dirty: false,
        }
    }
}

impl AppState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn folders(&self) -> &FolderSet {
        &self.folders
    }

    pub fn stream(&self) -> &StreamTask {
        &self.stream
    }

    pub fn results(&self) -> Option<&SearchResults> {
        self.search.current.as_ref().map(|(_, results)| results)
    }

    pub fn selected_file(&self) -> Option<&SelectedFile> {
        self.selected_file.as_ref()
    }

    pub fn match_count(&self) -> u32 {
        self.match_count
    }

    pub fn ingest_in_flight(&self) -> bool {
        self.ingest_in_flight
    }

    /// Archived paths to persist across restarts.
    pub fn archived_snapshot(&self) -> Vec<String> {
        self.archive_memory.iter().cloned().collect()
    }

    pub fn view(&self) -> AppViewModel {
        let results = self.results().cloned();
        AppViewModel {
            folders: self
                .folders
                .iter()
                .map(|folder| FolderRow {
                    path: folder.path.clone(),
                    name: folder.name.clone(),
                    processed: folder.processed,
                    archived: folder.archived,
                    file_count: folder.files.len(),
                    deleting: self.deleting.contains(&folder.path),
                })
                .collect(),
            search_disabled: self.folders.is_empty(),
            has_unprocessed: !self.folders.unprocessed_paths().is_empty(),
            ingest_in_flight: self.ingest_in_flight,
            last_registration: self.last_registration.clone(),
            last_ingest: self.last_ingest.clone(),
            match_count: self.match_count,
            query: self.query.clone(),
            search_loading: self.search.in_flight.is_some(),
            confirmable_actions: results
                .as_ref()
                .map(SearchResults::confirmable)
                .unwrap_or_default(),
            tag_color: results.as_ref().and_then(SearchResults::tag_color_name),
            results,
            selected_file: self.selected_file.clone(),
            stream: StreamView {
                phase: self.stream.phase(),
                output: self.stream.output().to_string(),
                metadata: self.stream.metadata().cloned(),
                panel_open: self.stream.panel_open(),
            },
            notices: self.notices.iter().cloned().collect(),
            dirty: self.dirty,
        }
    }

    pub fn consume_dirty(&mut self) -> bool {
        std::mem::take(&mut self.dirty)
    }

    pub(crate) fn mark_dirty(&mut self) {
        self.dirty = true;
    }

    pub(crate) fn notify(&mut self, level: NoticeLevel, text: impl Into<String>) {
        if self.notices.len() == MAX_NOTICES {
            self.notices.pop_front();
        }
        self.last_notice_id += 1;
        self.notices.push_back(Notice {
            id: self.last_notice_id,
            level,
            text: text.into(),
        });
        self.dirty = true;
    }

    /// Drops displayed results, the preview, and any search still in
    /// flight; they may reference folders whose inclusion just changed.
    pub(crate) fn invalidate_results(&mut self) {
        self.search.current = None;
        self.search.in_flight = None;
        self.selected_file = None;
        self.pending_preview = None;
        self.dirty = true;
    }
}
