use crate::folder::ArchiveOutcome;
use crate::{
    intent, ActionKind, AppState, Effect, FileBody, InventoryPurpose, Msg, NoticeLevel,
    RegistrationOutcome, RemoteFolder, SearchQuery, SelectedFile, StreamOutcome, StreamRequest,
};

/// Pure update function: applies a message to state and returns any effects.
pub fn update(mut state: AppState, msg: Msg) -> (AppState, Vec<Effect>) {
    let effects = match msg {
        Msg::AppStarted => vec![Effect::LoadInventory {
            purpose: InventoryPurpose::Startup,
        }],
        Msg::RestoreArchived(paths) => {
            state.archive_memory = paths.into_iter().collect();
            if state.folders.apply_archived(&state.archive_memory) > 0 {
                state.mark_dirty();
            }
            Vec::new()
        }
        Msg::InventoryLoaded { purpose, result } => on_inventory(&mut state, purpose, result),
        Msg::PickFoldersClicked => vec![Effect::PickFolders],
        Msg::FolderPickFailed(message) => {
            state.notify(NoticeLevel::Error, format!("Failed to open folder: {message}"));
            Vec::new()
        }
        Msg::FoldersPicked(paths) => on_folders_picked(&mut state, paths),
        Msg::FoldersProbed {
            paths,
            rejected,
            result,
        } => {
            let outcome = match result {
                Ok(()) => {
                    let mut outcome = state.folders.register(&paths);
                    let added = outcome.added.len();
                    if added > 0 {
                        let plural = if added == 1 { "" } else { "s" };
                        state.notify(NoticeLevel::Success, format!("{added} folder{plural} added"));
                    }
                    let mut all_rejected = rejected;
                    all_rejected.append(&mut outcome.rejected);
                    outcome.rejected = all_rejected;
                    outcome
                }
                Err(failure) => {
                    state.notify(
                        NoticeLevel::Error,
                        format!("Failed to read folder: {}", failure.path),
                    );
                    RegistrationOutcome {
                        added: Vec::new(),
                        rejected,
                        failed_probe: Some(failure.path),
                    }
                }
            };
            state.last_registration = Some(outcome);
            state.mark_dirty();
            Vec::new()
        }
        Msg::ArchiveFolder { path } => {
            let name = folder_name(&state, &path);
            match state.folders.archive(&path) {
                ArchiveOutcome::Unknown => Vec::new(),
                ArchiveOutcome::Removed => {
                    state.notify(NoticeLevel::Info, format!("Folder \"{name}\" removed"));
                    state.invalidate_results();
                    Vec::new()
                }
                ArchiveOutcome::Archived => {
                    state.archive_memory.insert(path);
                    state.notify(NoticeLevel::Info, format!("Folder \"{name}\" archived"));
                    state.invalidate_results();
                    vec![persist_archived(&state)]
                }
            }
        }
        Msg::UnarchiveFolder { path } => {
            if !state.folders.unarchive(&path) {
                return (state, Vec::new());
            }
            let name = folder_name(&state, &path);
            state.archive_memory.remove(&path);
            state.notify(NoticeLevel::Success, format!("Folder \"{name}\" unarchived"));
            state.invalidate_results();
            vec![persist_archived(&state)]
        }
        Msg::DeleteFolder { path } => {
            if !state.folders.contains(&path) || !state.deleting.insert(path.clone()) {
                return (state, Vec::new());
            }
            state.mark_dirty();
            vec![Effect::DeleteFolder { path }]
        }
        Msg::FolderDeleted { path, result } => {
            state.deleting.remove(&path);
            state.mark_dirty();
            match result {
                Ok(deleted_count) => {
                    let name = folder_name(&state, &path);
                    state.folders.remove(&path);
                    state.notify(
                        NoticeLevel::Success,
                        format!(
                            "Folder \"{name}\" permanently deleted. Deleted {deleted_count} files."
                        ),
                    );
                    state.invalidate_results();
                    if state.archive_memory.remove(&path) {
                        vec![persist_archived(&state)]
                    } else {
                        Vec::new()
                    }
                }
                Err(message) => {
                    state.notify(
                        NoticeLevel::Error,
                        format!("Failed to delete folder: {message}"),
                    );
                    Vec::new()
                }
            }
        }
        Msg::IngestClicked => {
            if state.ingest_in_flight {
                state.notify(NoticeLevel::Error, "Folders are already being processed");
                return (state, Vec::new());
            }
            let paths = state.folders.unprocessed_paths();
            if paths.is_empty() {
                state.notify(
                    NoticeLevel::Error,
                    "All selected folders have already been processed",
                );
                return (state, Vec::new());
            }
            state.ingest_in_flight = true;
            state.mark_dirty();
            vec![Effect::Ingest { paths }]
        }
        Msg::IngestFinished(result) => match result {
            Ok(report) => {
                // Phase 1: promote only what the backend confirmed, then
                // refetch the inventory for the file lists.
                let completed = state.folders.mark_processed(&report.completed);
                state.last_ingest = Some(report);
                state.mark_dirty();
                vec![Effect::LoadInventory {
                    purpose: InventoryPurpose::AfterIngest { completed },
                }]
            }
            Err(message) => {
                state.ingest_in_flight = false;
                state.notify(
                    NoticeLevel::Error,
                    format!("Failed to process folders: {message}"),
                );
                Vec::new()
            }
        },
        Msg::MatchCountChanged(count) => {
            state.match_count = count.max(1);
            state.mark_dirty();
            Vec::new()
        }
        Msg::QuerySubmitted(text) => on_query(&mut state, text),
        Msg::SearchFinished { search_id, result } => {
            if state.search.in_flight != Some(search_id) {
                return (state, Vec::new());
            }
            state.search.in_flight = None;
            match result {
                Ok(results) => state.search.current = Some((search_id, results)),
                Err(message) => state.notify(NoticeLevel::Error, format!("Search failed: {message}")),
            }
            state.mark_dirty();
            Vec::new()
        }
        Msg::ConfirmAction { kind } => {
            let kind = kind.unwrap_or(ActionKind::MoveFiles);
            if state.search.executing.is_some() {
                state.notify(NoticeLevel::Error, "An action is already being executed");
                return (state, Vec::new());
            }
            let pending = state.search.current.as_ref().and_then(|(search_id, results)| {
                results
                    .pending(kind)
                    .map(|action| (*search_id, action.clone()))
            });
            match pending {
                Some((search_id, action)) => {
                    state.search.executing = Some((search_id, kind));
                    state.mark_dirty();
                    vec![Effect::ExecuteAction {
                        search_id,
                        kind,
                        action,
                    }]
                }
                None => {
                    state.notify(
                        NoticeLevel::Error,
                        format!("No pending {} action to confirm", kind.key()),
                    );
                    Vec::new()
                }
            }
        }
        Msg::ActionExecuted {
            search_id,
            kind,
            result,
        } => {
            state.search.executing = None;
            match result {
                Ok(outcome) => {
                    if let Some((current_id, results)) = state.search.current.as_mut() {
                        if *current_id == search_id {
                            results.apply_action_outcome(kind, &outcome);
                        }
                    }
                    let text = outcome
                        .message
                        .clone()
                        .unwrap_or_else(|| format!("{} completed", kind.key()));
                    state.notify(NoticeLevel::Success, text);
                }
                Err(message) => {
                    state.notify(
                        NoticeLevel::Error,
                        format!("Failed to execute {}: {message}", kind.key()),
                    );
                }
            }
            Vec::new()
        }
        Msg::OpenFile { path, name } => {
            state.pending_preview = Some(path.clone());
            vec![Effect::ReadFile { path, name }]
        }
        Msg::FileLoaded { path, name, result } => {
            if state.pending_preview.as_deref() != Some(path.as_str()) {
                return (state, Vec::new());
            }
            state.pending_preview = None;
            match result {
                Ok(FileBody { content, truncated }) => {
                    state.selected_file = Some(SelectedFile {
                        path,
                        name,
                        content,
                        truncated,
                    });
                    state.mark_dirty();
                }
                Err(message) => {
                    state.notify(NoticeLevel::Error, format!("Failed to read file: {message}"));
                }
            }
            Vec::new()
        }
        Msg::CloseFile => {
            state.selected_file = None;
            state.pending_preview = None;
            state.mark_dirty();
            Vec::new()
        }
        Msg::SummarizeFile {
            file_name,
            file_path,
            content,
        } => start_stream(
            &mut state,
            StreamRequest::Summarize {
                file_name,
                file_path,
                content,
            },
        ),
        Msg::StreamEvent { task_id, event } => {
            if state.stream.apply_event(task_id, event) {
                state.mark_dirty();
            }
            Vec::new()
        }
        Msg::StreamFinished { task_id, outcome } => on_stream_finished(&mut state, task_id, outcome),
        Msg::CancelStream => match state.stream.cancel() {
            Some(task_id) => {
                state.mark_dirty();
                vec![Effect::CancelStream { task_id }]
            }
            None => Vec::new(),
        },
        Msg::CloseOutputPanel => {
            let running = state.stream.close();
            state.mark_dirty();
            running
                .map(|task_id| Effect::CancelStream { task_id })
                .into_iter()
                .collect()
        }
        Msg::DismissNotices => {
            if !state.notices.is_empty() {
                state.notices.clear();
                state.mark_dirty();
            }
            Vec::new()
        }
        Msg::NoOp => Vec::new(),
    };

    (state, effects)
}

fn on_inventory(
    state: &mut AppState,
    purpose: InventoryPurpose,
    result: Result<Vec<RemoteFolder>, String>,
) -> Vec<Effect> {
    match purpose {
        InventoryPurpose::Startup => {
            // A backend that is not up yet is not worth a notice.
            if let Ok(remote) = result {
                state.folders.seed_from_inventory(remote);
                state.folders.apply_archived(&state.archive_memory);
                state.mark_dirty();
                // Restored paths the backend no longer knows are dropped.
                let before = state.archive_memory.len();
                let folders = &state.folders;
                state
                    .archive_memory
                    .retain(|path| folders.get(path).is_some_and(|folder| folder.archived));
                if state.archive_memory.len() != before {
                    return vec![persist_archived(state)];
                }
            }
        }
        InventoryPurpose::AfterIngest { completed } => {
            state.ingest_in_flight = false;
            match result {
                Ok(remote) => {
                    state.folders.merge_inventory_files(&remote, &completed);
                    let count = completed.len();
                    let plural = if count == 1 { "" } else { "s" };
                    let failed = state
                        .last_ingest
                        .as_ref()
                        .map(|report| report.failed_file_count())
                        .unwrap_or(0);
                    let text = if failed > 0 {
                        format!("Finished processing {count} folder{plural} ({failed} files failed)")
                    } else {
                        format!("Finished processing {count} folder{plural}")
                    };
                    state.notify(NoticeLevel::Success, text);
                }
                Err(message) => {
                    state.notify(
                        NoticeLevel::Error,
                        format!("Folders processed but file lists could not be refreshed: {message}"),
                    );
                }
            }
        }
    }
    Vec::new()
}

fn on_folders_picked(state: &mut AppState, paths: Vec<String>) -> Vec<Effect> {
    if paths.is_empty() {
        return Vec::new();
    }
    let (fresh, rejected) = state.folders.partition_candidates(&paths);
    if fresh.is_empty() {
        state.notify(
            NoticeLevel::Error,
            "All selected folder(s) have already been added",
        );
        state.last_registration = Some(RegistrationOutcome {
            added: Vec::new(),
            rejected,
            failed_probe: None,
        });
        return Vec::new();
    }
    vec![Effect::ProbeFolders {
        paths: fresh,
        rejected,
    }]
}

fn on_query(state: &mut AppState, text: String) -> Vec<Effect> {
    let text = text.trim().to_string();
    if text.is_empty() {
        return Vec::new();
    }
    if state.folders.is_empty() {
        state.notify(NoticeLevel::Error, "Add a folder before searching");
        return Vec::new();
    }
    state.query = text.clone();
    state.selected_file = None;
    state.pending_preview = None;

    if intent::is_agent_query(&text) {
        let match_count = state.match_count;
        return start_stream(
            state,
            StreamRequest::Agent {
                prompt: text,
                match_count,
            },
        );
    }

    // A plain search closes the output panel.
    let mut effects: Vec<Effect> = state
        .stream
        .close()
        .map(|task_id| Effect::CancelStream { task_id })
        .into_iter()
        .collect();
    effects.push(issue_search(state, text));
    effects
}

fn issue_search(state: &mut AppState, text: String) -> Effect {
    let search_id = state.search.next_id();
    state.mark_dirty();
    Effect::Search {
        search_id,
        query: SearchQuery {
            text,
            match_count: state.match_count,
            folders: state.folders.searchable_paths(),
            archived_folders: state.folders.archived_paths(),
        },
    }
}

fn start_stream(state: &mut AppState, request: StreamRequest) -> Vec<Effect> {
    let is_agent = matches!(request, StreamRequest::Agent { .. });
    let (task_id, superseded) = state.stream.begin(request.clone());
    state.selected_file = None;
    state.pending_preview = None;
    if is_agent {
        state.search.current = None;
        state.search.in_flight = None;
    }
    state.mark_dirty();

    let mut effects = Vec::with_capacity(2);
    if let Some(previous) = superseded {
        effects.push(Effect::CancelStream { task_id: previous });
    }
    effects.push(Effect::StartStream { task_id, request });
    effects
}

fn on_stream_finished(
    state: &mut AppState,
    task_id: crate::TaskId,
    outcome: StreamOutcome,
) -> Vec<Effect> {
    let fallback_prompt = match state.stream.request() {
        Some(StreamRequest::Agent { prompt, .. }) => Some(prompt.clone()),
        _ => None,
    };
    match state.stream.finish(task_id, outcome) {
        None => Vec::new(),
        Some(StreamOutcome::Completed) | Some(StreamOutcome::Cancelled) => {
            state.mark_dirty();
            Vec::new()
        }
        Some(StreamOutcome::Failed(message)) => {
            state.notify(NoticeLevel::Error, message);
            Vec::new()
        }
        Some(StreamOutcome::NotAgentTask) => {
            state.mark_dirty();
            match fallback_prompt {
                Some(prompt) => vec![issue_search(state, prompt)],
                None => Vec::new(),
            }
        }
    }
}

fn folder_name(state: &AppState, path: &str) -> String {
    state
        .folders
        .get(path)
        .map(|folder| folder.name.clone())
        .unwrap_or_else(|| path.to_string())
}

fn persist_archived(state: &AppState) -> Effect {
    Effect::PersistArchived {
        paths: state.archived_snapshot(),
    }
}
