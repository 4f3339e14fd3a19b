use std::path::Path;

use docfinder_engine::AtomicFileWriter;
use docfinder_logging::{df_error, df_info, df_warn};
use serde::{Deserialize, Serialize};

const STATE_FILENAME: &str = ".docfinder_state.ron";

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
struct PersistedArchive {
    archived: Vec<String>,
}

/// Archived folder paths saved by a previous session. Missing or unreadable
/// state yields an empty list.
pub(crate) fn load_archived(state_dir: &Path) -> Vec<String> {
    let writer = AtomicFileWriter::new(state_dir.to_path_buf());
    let content = match writer.read(STATE_FILENAME) {
        Ok(Some(text)) => text,
        Ok(None) => return Vec::new(),
        Err(err) => {
            df_warn!(
                "Failed to read persisted state from {:?}: {}",
                state_dir.join(STATE_FILENAME),
                err
            );
            return Vec::new();
        }
    };

    let state: PersistedArchive = match ron::from_str(&content) {
        Ok(state) => state,
        Err(err) => {
            df_warn!(
                "Failed to parse persisted state from {:?}: {}",
                state_dir.join(STATE_FILENAME),
                err
            );
            return Vec::new();
        }
    };

    df_info!("Restored {} archived folder(s)", state.archived.len());
    state.archived
}

pub(crate) fn save_archived(state_dir: &Path, archived: &[String]) {
    let state = PersistedArchive {
        archived: archived.to_vec(),
    };
    let pretty = ron::ser::PrettyConfig::new();
    let content = match ron::ser::to_string_pretty(&state, pretty) {
        Ok(text) => text,
        Err(err) => {
            df_error!("Failed to serialize archived folders: {}", err);
            return;
        }
    };

    let writer = AtomicFileWriter::new(state_dir.to_path_buf());
    match writer.write(STATE_FILENAME, &content) {
        Ok(path) => df_info!("Saved {} archived folder(s) to {:?}", archived.len(), path),
        Err(err) => df_error!("Failed to write archived folders: {}", err),
    }
}
