use std::path::PathBuf;

use docfinder_core::{Effect, Msg};
use docfinder_engine::{EngineCommand, EngineEvent, EngineHandle};
use docfinder_logging::df_debug;

use crate::persistence::save_archived;

/// Hands effects to the engine and turns engine events back into messages.
pub(crate) struct EffectRunner {
    engine: EngineHandle,
    state_dir: PathBuf,
}

impl EffectRunner {
    pub fn new(engine: EngineHandle, state_dir: PathBuf) -> Self {
        Self { engine, state_dir }
    }

    pub fn run(&self, effects: Vec<Effect>) {
        for effect in effects {
            match to_command(effect) {
                Ok(command) => self.engine.submit(command),
                Err(archived) => save_archived(&self.state_dir, &archived),
            }
        }
    }

    /// Drain every event the engine has produced so far.
    pub fn poll(&self) -> Vec<Msg> {
        let mut msgs = Vec::new();
        while let Some(event) = self.engine.try_recv() {
            msgs.push(map_event(event));
        }
        if !msgs.is_empty() {
            df_debug!("engine delivered {} event(s)", msgs.len());
        }
        msgs
    }
}

/// Local effects come back as `Err` with the archived paths to save.
fn to_command(effect: Effect) -> Result<EngineCommand, Vec<String>> {
    Ok(match effect {
        Effect::LoadInventory { purpose } => EngineCommand::LoadInventory { purpose },
        Effect::PickFolders => EngineCommand::PickFolders,
        Effect::ProbeFolders { paths, rejected } => EngineCommand::ProbeFolders { paths, rejected },
        Effect::Ingest { paths } => EngineCommand::Ingest { paths },
        Effect::DeleteFolder { path } => EngineCommand::DeleteFolder { path },
        Effect::Search { search_id, query } => EngineCommand::Search { search_id, query },
        Effect::StartStream { task_id, request } => EngineCommand::StartStream { task_id, request },
        Effect::CancelStream { task_id } => EngineCommand::CancelStream { task_id },
        Effect::ExecuteAction {
            search_id,
            kind,
            action,
        } => EngineCommand::ExecuteAction {
            search_id,
            kind,
            action,
        },
        Effect::ReadFile { path, name } => EngineCommand::ReadFile { path, name },
        Effect::PersistArchived { paths } => return Err(paths),
    })
}

pub(crate) fn map_event(event: EngineEvent) -> Msg {
    match event {
        EngineEvent::InventoryLoaded { purpose, result } => Msg::InventoryLoaded {
            purpose,
            result: result.map_err(|e| e.to_string()),
        },
        EngineEvent::FoldersPicked(Ok(paths)) => Msg::FoldersPicked(paths),
        EngineEvent::FoldersPicked(Err(err)) => Msg::FolderPickFailed(err.to_string()),
        EngineEvent::FoldersProbed {
            paths,
            rejected,
            result,
        } => Msg::FoldersProbed {
            paths,
            rejected,
            result,
        },
        EngineEvent::IngestFinished(result) => {
            Msg::IngestFinished(result.map_err(|e| e.to_string()))
        }
        EngineEvent::FolderDeleted { path, result } => Msg::FolderDeleted {
            path,
            result: result.map_err(|e| e.to_string()),
        },
        EngineEvent::SearchFinished { search_id, result } => Msg::SearchFinished {
            search_id,
            result: result.map_err(|e| e.to_string()),
        },
        EngineEvent::ActionExecuted {
            search_id,
            kind,
            result,
        } => Msg::ActionExecuted {
            search_id,
            kind,
            result: result.map_err(|e| e.to_string()),
        },
        EngineEvent::FileLoaded { path, name, result } => Msg::FileLoaded {
            path,
            name,
            result: result.map_err(|e| e.to_string()),
        },
        EngineEvent::Stream { task_id, event } => Msg::StreamEvent { task_id, event },
        EngineEvent::StreamFinished { task_id, outcome } => {
            Msg::StreamFinished { task_id, outcome }
        }
    }
}
