use docfinder_core::{
    update, ActionKind, ActionOutcome, AppState, Effect, FileBody, IngestReport, InventoryPurpose,
    Msg, NoticeLevel, PendingAction, RemoteFolder, SearchId, SearchResult, SearchResults,
    StreamRequest,
};
use pretty_assertions::assert_eq;
use serde_json::json;
use std::collections::BTreeMap;

fn init_logging() {
    docfinder_logging::initialize_for_tests();
}

fn remote(path: &str) -> RemoteFolder {
    RemoteFolder {
        path: path.to_string(),
        name: docfinder_core::display_name(path),
        files: Vec::new(),
    }
}

fn seeded(paths: &[&str]) -> AppState {
    let (state, _) = update(
        AppState::new(),
        Msg::InventoryLoaded {
            purpose: InventoryPurpose::Startup,
            result: Ok(paths.iter().map(|p| remote(p)).collect()),
        },
    );
    state
}

fn hit(name: &str) -> SearchResult {
    SearchResult {
        file_name: name.to_string(),
        file_path: format!("/docs/{name}"),
        content: None,
        similarity: Some(0.8),
        last_modified_at: None,
    }
}

fn results_with_move() -> SearchResults {
    let mut pending = BTreeMap::new();
    pending.insert(
        "move_files".to_string(),
        PendingAction::from_json(json!({
            "action": "move_files",
            "destination": "/archive",
            "files": ["/docs/a.pdf"]
        })),
    );
    SearchResults {
        results: vec![hit("a.pdf"), hit("b.pdf")],
        confirm_required: true,
        pending_actions: pending,
        action: Some("move_files".to_string()),
        ..SearchResults::default()
    }
}

fn search(state: AppState, text: &str) -> (AppState, SearchId) {
    let (state, effects) = update(state, Msg::QuerySubmitted(text.to_string()));
    let search_id = effects
        .iter()
        .find_map(|effect| match effect {
            Effect::Search { search_id, .. } => Some(*search_id),
            _ => None,
        })
        .expect("search effect");
    (state, search_id)
}

fn with_results(results: SearchResults) -> (AppState, SearchId) {
    let (state, search_id) = search(seeded(&["/docs"]), "move invoices to archive");
    let (state, _) = update(
        state,
        Msg::SearchFinished {
            search_id,
            result: Ok(results),
        },
    );
    (state, search_id)
}

#[test]
fn plain_query_carries_limit_and_exclusions() {
    init_logging();
    let state = seeded(&["/docs", "/old"]);
    let (state, _) = update(
        state,
        Msg::ArchiveFolder {
            path: "/old".to_string(),
        },
    );
    let (state, _) = update(state, Msg::MatchCountChanged(25));
    let (_, effects) = update(state, Msg::QuerySubmitted("  invoices  ".to_string()));
    match effects.as_slice() {
        [Effect::Search { query, .. }] => {
            assert_eq!(query.text, "invoices");
            assert_eq!(query.match_count, 25);
            assert_eq!(query.folders, vec!["/docs".to_string()]);
            assert_eq!(query.archived_folders, vec!["/old".to_string()]);
        }
        other => panic!("expected search, got {other:?}"),
    }
}

#[test]
fn query_without_folders_is_refused() {
    init_logging();
    let (state, effects) = update(AppState::new(), Msg::QuerySubmitted("invoices".to_string()));
    assert!(effects.is_empty());
    let view = state.view();
    assert!(view.search_disabled);
    assert_eq!(view.notices.last().map(|n| n.level), Some(NoticeLevel::Error));
}

#[test]
fn blank_query_is_ignored() {
    init_logging();
    let state = seeded(&["/docs"]);
    let (next, effects) = update(state.clone(), Msg::QuerySubmitted("   ".to_string()));
    assert!(effects.is_empty());
    assert_eq!(next, state);
}

#[test]
fn match_count_never_drops_below_one() {
    init_logging();
    let (state, _) = update(AppState::new(), Msg::MatchCountChanged(0));
    assert_eq!(state.match_count(), 1);
}

#[test]
fn search_results_replace_current_results() {
    init_logging();
    let (state, _) = with_results(results_with_move());
    let (state, search_id) = search(state, "reports");
    assert!(state.view().search_loading);
    let (state, _) = update(
        state,
        Msg::SearchFinished {
            search_id,
            result: Ok(SearchResults {
                results: vec![hit("r.pdf")],
                ..SearchResults::default()
            }),
        },
    );
    let view = state.view();
    let results = view.results.expect("results");
    assert_eq!(results.results, vec![hit("r.pdf")]);
    assert!(view.confirmable_actions.is_empty());
    assert!(!view.search_loading);
}

#[test]
fn stale_search_results_are_dropped() {
    init_logging();
    let (state, first) = search(seeded(&["/docs"]), "first");
    let (state, second) = search(state, "second");
    let (state, _) = update(
        state,
        Msg::SearchFinished {
            search_id: first,
            result: Ok(SearchResults {
                results: vec![hit("stale.pdf")],
                ..SearchResults::default()
            }),
        },
    );
    assert!(state.results().is_none());
    let (state, _) = update(
        state,
        Msg::SearchFinished {
            search_id: second,
            result: Ok(SearchResults::default()),
        },
    );
    assert!(state.results().is_some());
}

#[test]
fn search_failure_notifies() {
    init_logging();
    let (state, search_id) = search(seeded(&["/docs"]), "invoices");
    let (state, _) = update(
        state,
        Msg::SearchFinished {
            search_id,
            result: Err("HTTP 500: internal".to_string()),
        },
    );
    let view = state.view();
    assert!(view.results.is_none());
    assert!(!view.search_loading);
    assert!(view.notices.iter().any(|n| n.text.contains("HTTP 500")));
}

#[test]
fn confirm_forwards_descriptor_verbatim() {
    init_logging();
    let (state, search_id) = with_results(results_with_move());
    assert_eq!(state.view().confirmable_actions, vec![ActionKind::MoveFiles]);

    let (_, effects) = update(state, Msg::ConfirmAction { kind: None });
    assert_eq!(
        effects,
        vec![Effect::ExecuteAction {
            search_id,
            kind: ActionKind::MoveFiles,
            action: PendingAction::from_json(json!({
                "action": "move_files",
                "destination": "/archive",
                "files": ["/docs/a.pdf"]
            })),
        }]
    );
}

#[test]
fn confirmed_move_clears_pending_state_but_keeps_results() {
    init_logging();
    let (state, search_id) = with_results(results_with_move());
    let (state, _) = update(state, Msg::ConfirmAction { kind: None });
    let (state, _) = update(
        state,
        Msg::ActionExecuted {
            search_id,
            kind: ActionKind::MoveFiles,
            result: Ok(ActionOutcome {
                status: "success".to_string(),
                message: Some("Moved 1 file".to_string()),
                color: None,
                tagged_count: None,
            }),
        },
    );
    let results = state.results().expect("results kept");
    assert!(!results.confirm_required);
    assert!(results.pending_actions.is_empty());
    assert_eq!(results.results, vec![hit("a.pdf"), hit("b.pdf")]);
    assert_eq!(
        state.view().notices.last().map(|n| n.text.clone()),
        Some("Moved 1 file".to_string())
    );
}

#[test]
fn failed_action_leaves_results_untouched() {
    init_logging();
    let (state, search_id) = with_results(results_with_move());
    let before = state.results().cloned();
    let (state, _) = update(state, Msg::ConfirmAction { kind: None });
    let (state, _) = update(
        state,
        Msg::ActionExecuted {
            search_id,
            kind: ActionKind::MoveFiles,
            result: Err("HTTP 409: destination exists".to_string()),
        },
    );
    assert_eq!(state.results().cloned(), before);
    assert_eq!(
        state.view().notices.last().map(|n| n.level),
        Some(NoticeLevel::Error)
    );
}

#[test]
fn confirm_without_pending_action_is_an_error_noop() {
    init_logging();
    let (state, _) = with_results(SearchResults {
        results: vec![hit("a.pdf")],
        ..SearchResults::default()
    });
    let (state, effects) = update(state, Msg::ConfirmAction { kind: None });
    assert!(effects.is_empty());
    assert_eq!(
        state.view().notices.last().map(|n| n.level),
        Some(NoticeLevel::Error)
    );
}

#[test]
fn only_one_action_executes_at_a_time() {
    init_logging();
    let (state, _) = with_results(results_with_move());
    let (state, _) = update(state, Msg::ConfirmAction { kind: None });
    let (_, effects) = update(state, Msg::ConfirmAction { kind: None });
    assert!(effects.is_empty());
}

#[test]
fn tag_outcome_updates_color_and_count() {
    init_logging();
    let mut pending = BTreeMap::new();
    pending.insert(
        "tag_files".to_string(),
        PendingAction::from_json(json!({"action": "tag_files", "tag": "urgent", "files": []})),
    );
    let (state, search_id) = with_results(SearchResults {
        results: vec![hit("a.pdf")],
        confirm_required: true,
        pending_actions: pending,
        tag: Some("urgent".to_string()),
        tag_color: Some(2),
        taggable_count: Some(1),
        ..SearchResults::default()
    });
    assert_eq!(state.view().tag_color, Some("green"));

    let (state, effects) = update(
        state,
        Msg::ConfirmAction {
            kind: Some(ActionKind::TagFiles),
        },
    );
    assert!(matches!(
        effects.as_slice(),
        [Effect::ExecuteAction {
            kind: ActionKind::TagFiles,
            ..
        }]
    ));
    let (state, _) = update(
        state,
        Msg::ActionExecuted {
            search_id,
            kind: ActionKind::TagFiles,
            result: Ok(ActionOutcome {
                status: "success".to_string(),
                message: None,
                color: Some(4),
                tagged_count: Some(1),
            }),
        },
    );
    let view = state.view();
    assert_eq!(view.tag_color, Some("blue"));
    assert_eq!(view.results.expect("results").tagged_count, Some(1));
}

#[test]
fn archiving_invalidates_results_and_preview() {
    init_logging();
    let (state, _) = with_results(results_with_move());
    let (state, _) = update(
        state,
        Msg::OpenFile {
            path: "/docs/a.pdf".to_string(),
            name: "a.pdf".to_string(),
        },
    );
    let (state, _) = update(
        state,
        Msg::FileLoaded {
            path: "/docs/a.pdf".to_string(),
            name: "a.pdf".to_string(),
            result: Ok(FileBody {
                content: None,
                truncated: false,
            }),
        },
    );
    assert!(state.selected_file().is_some());

    let (state, _) = update(
        state,
        Msg::ArchiveFolder {
            path: "/docs".to_string(),
        },
    );
    assert!(state.results().is_none());
    assert!(state.selected_file().is_none());
}

#[test]
fn newer_preview_supersedes_older_one() {
    init_logging();
    let state = seeded(&["/docs"]);
    let (state, _) = update(
        state,
        Msg::OpenFile {
            path: "/docs/a.txt".to_string(),
            name: "a.txt".to_string(),
        },
    );
    let (state, _) = update(
        state,
        Msg::OpenFile {
            path: "/docs/b.txt".to_string(),
            name: "b.txt".to_string(),
        },
    );
    let (state, _) = update(
        state,
        Msg::FileLoaded {
            path: "/docs/a.txt".to_string(),
            name: "a.txt".to_string(),
            result: Ok(FileBody {
                content: Some("old".to_string()),
                truncated: false,
            }),
        },
    );
    assert!(state.selected_file().is_none());
    let (state, _) = update(
        state,
        Msg::FileLoaded {
            path: "/docs/b.txt".to_string(),
            name: "b.txt".to_string(),
            result: Ok(FileBody {
                content: Some("new".to_string()),
                truncated: true,
            }),
        },
    );
    let selected = state.selected_file().expect("preview");
    assert_eq!(selected.name, "b.txt");
    assert_eq!(selected.content.as_deref(), Some("new"));
    assert!(selected.truncated);

    let (state, _) = update(state, Msg::CloseFile);
    assert!(state.selected_file().is_none());
}

#[test]
fn end_to_end_register_ingest_and_agent_query() {
    init_logging();
    let (state, effects) = update(AppState::new(), Msg::FoldersPicked(vec!["/docs".to_string()]));
    assert_eq!(
        effects,
        vec![Effect::ProbeFolders {
            paths: vec!["/docs".to_string()],
            rejected: Vec::new(),
        }]
    );
    let (state, _) = update(
        state,
        Msg::FoldersProbed {
            paths: vec!["/docs".to_string()],
            rejected: Vec::new(),
            result: Ok(()),
        },
    );
    let folder = state.folders().get("/docs").cloned().expect("registered");
    assert!(!folder.processed && !folder.archived && folder.files.is_empty());

    let (state, _) = update(state, Msg::IngestClicked);
    let (state, _) = update(
        state,
        Msg::IngestFinished(Ok(IngestReport {
            completed: vec!["/docs".to_string()],
            folders: Vec::new(),
        })),
    );
    assert!(state.folders().get("/docs").expect("docs").processed);

    let (_, effects) = update(state, Msg::QuerySubmitted("summarize the reports".to_string()));
    assert!(effects.iter().any(|effect| matches!(
        effect,
        Effect::StartStream {
            request: StreamRequest::Agent { .. },
            ..
        }
    )));
    assert!(!effects
        .iter()
        .any(|effect| matches!(effect, Effect::Search { .. })));
}
