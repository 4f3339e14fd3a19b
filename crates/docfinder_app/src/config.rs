use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::Context;
use docfinder_core::DEFAULT_MATCH_COUNT;
use docfinder_engine::{
    EngineSettings, PickerCommand, ServiceSettings, DEFAULT_BASE_URL, DEFAULT_MAX_PREVIEW_BYTES,
};
use docfinder_logging::LogDestination;
use serde::{Deserialize, Serialize};

const CONFIG_ENV: &str = "DOCFINDER_CONFIG";
const DEFAULT_CONFIG_FILE: &str = "docfinder.ron";

/// Client settings read from a RON file. Every field is optional in the file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub(crate) struct ClientConfig {
    pub base_url: String,
    pub match_count: u32,
    pub connect_timeout_secs: u64,
    pub request_timeout_secs: u64,
    pub max_preview_bytes: usize,
    pub log_destination: LogDestination,
    pub log_level: String,
    /// Where archived folders and the log file are kept.
    pub state_dir: PathBuf,
    /// External directory chooser; `None` disables `pick`.
    pub picker: Option<PickerConfig>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub(crate) struct PickerConfig {
    pub program: String,
    #[serde(default)]
    pub args: Vec<String>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            match_count: DEFAULT_MATCH_COUNT,
            connect_timeout_secs: 10,
            request_timeout_secs: 120,
            max_preview_bytes: DEFAULT_MAX_PREVIEW_BYTES,
            log_destination: LogDestination::File,
            log_level: "info".to_string(),
            state_dir: PathBuf::from("."),
            picker: Some(PickerConfig {
                program: "zenity".to_string(),
                args: vec![
                    "--file-selection".to_string(),
                    "--directory".to_string(),
                    "--multiple".to_string(),
                    "--separator=\n".to_string(),
                ],
            }),
        }
    }
}

impl ClientConfig {
    /// Reads `$DOCFINDER_CONFIG`, or `docfinder.ron` in the working directory.
    pub fn load() -> anyhow::Result<Self> {
        let path = std::env::var_os(CONFIG_ENV)
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_FILE));
        Self::load_from(&path)
    }

    pub fn load_from(path: &Path) -> anyhow::Result<Self> {
        let content = match fs::read_to_string(path) {
            Ok(text) => text,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                return Ok(Self::default());
            }
            Err(err) => {
                return Err(err).with_context(|| format!("reading config {}", path.display()))
            }
        };
        ron::from_str(&content).with_context(|| format!("parsing config {}", path.display()))
    }

    pub fn engine_settings(&self) -> EngineSettings {
        EngineSettings {
            service: ServiceSettings {
                base_url: self.base_url.clone(),
                connect_timeout: Duration::from_secs(self.connect_timeout_secs),
                request_timeout: Duration::from_secs(self.request_timeout_secs),
            },
            max_preview_bytes: self.max_preview_bytes,
            picker: self.picker.as_ref().map(|picker| PickerCommand {
                program: picker.program.clone(),
                args: picker.args.clone(),
            }),
        }
    }
}
