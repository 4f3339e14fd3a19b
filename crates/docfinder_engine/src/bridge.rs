use std::io;
use std::path::Path;

use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use chrono::{DateTime, Utc};
use docfinder_core::ProbeFailure;
use docfinder_logging::{df_debug, df_info};
use encoding_rs::{DecoderResult, Encoding, UTF_8};
use thiserror::Error;
use tokio::io::AsyncReadExt;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BridgeError {
    #[error("no such file or directory: {0}")]
    NotFound(String),
    #[error("not a directory: {0}")]
    NotADirectory(String),
    #[error("is a directory: {0}")]
    IsADirectory(String),
    #[error("{path}: {message}")]
    Io { path: String, message: String },
    #[error("unsupported: {0}")]
    Unsupported(String),
}

impl BridgeError {
    fn from_io(path: &str, err: io::Error) -> Self {
        match err.kind() {
            io::ErrorKind::NotFound => BridgeError::NotFound(path.to_string()),
            _ => BridgeError::Io {
                path: path.to_string(),
                message: err.to_string(),
            },
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirEntry {
    pub name: String,
    pub is_directory: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FileContent {
    Text(String),
    /// Bytes that do not decode as text.
    Binary(Vec<u8>),
}

/// The first bytes of a file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileHead {
    pub bytes: Vec<u8>,
    /// The whole file fit within the limit.
    pub complete: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileStats {
    pub is_directory: bool,
    pub is_file: bool,
    pub size: u64,
    pub modified: Option<DateTime<Utc>>,
}

/// Local capability surface: directory picking, listing, and file reads.
#[async_trait]
pub trait CapabilityBridge: Send + Sync {
    /// Asks the user for directories. An empty list means the dialog was
    /// dismissed.
    async fn open_directory(&self) -> Result<Vec<String>, BridgeError>;
    async fn read_directory(&self, path: &str) -> Result<Vec<DirEntry>, BridgeError>;
    async fn read_file(&self, path: &str) -> Result<FileContent, BridgeError>;
    /// Reads at most `limit` bytes from the start of a file.
    async fn read_file_head(&self, path: &str, limit: usize) -> Result<FileHead, BridgeError>;
    async fn read_file_as_data_url(&self, path: &str) -> Result<String, BridgeError>;
    async fn get_stats(&self, path: &str) -> Result<FileStats, BridgeError>;
}

/// External program that prints chosen directories, one per line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PickerCommand {
    pub program: String,
    pub args: Vec<String>,
}

#[derive(Debug, Clone, Default)]
pub struct LocalFsBridge {
    picker: Option<PickerCommand>,
}

impl LocalFsBridge {
    pub fn new(picker: Option<PickerCommand>) -> Self {
        Self { picker }
    }
}

#[async_trait]
impl CapabilityBridge for LocalFsBridge {
    async fn open_directory(&self) -> Result<Vec<String>, BridgeError> {
        let Some(picker) = &self.picker else {
            return Err(BridgeError::Unsupported(
                "no directory picker configured".to_string(),
            ));
        };
        let output = tokio::process::Command::new(&picker.program)
            .args(&picker.args)
            .output()
            .await
            .map_err(|err| BridgeError::from_io(&picker.program, err))?;
        if !output.status.success() {
            // Pickers exit non-zero when the dialog is dismissed.
            df_info!("directory picker exited with {}", output.status);
            return Ok(Vec::new());
        }
        Ok(String::from_utf8_lossy(&output.stdout)
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .map(ToOwned::to_owned)
            .collect())
    }

    async fn read_directory(&self, path: &str) -> Result<Vec<DirEntry>, BridgeError> {
        let mut reader = tokio::fs::read_dir(path).await.map_err(|err| {
            if Path::new(path).is_file() {
                BridgeError::NotADirectory(path.to_string())
            } else {
                BridgeError::from_io(path, err)
            }
        })?;
        let mut entries = Vec::new();
        while let Some(entry) = reader
            .next_entry()
            .await
            .map_err(|err| BridgeError::from_io(path, err))?
        {
            let is_directory = entry
                .file_type()
                .await
                .map(|kind| kind.is_dir())
                .unwrap_or(false);
            entries.push(DirEntry {
                name: entry.file_name().to_string_lossy().into_owned(),
                is_directory,
            });
        }
        entries.sort_by(|a, b| a.name.cmp(&b.name));
        df_debug!("listed {} entries in {path}", entries.len());
        Ok(entries)
    }

    async fn read_file(&self, path: &str) -> Result<FileContent, BridgeError> {
        let stats = self.get_stats(path).await?;
        if stats.is_directory {
            return Err(BridgeError::IsADirectory(path.to_string()));
        }
        let bytes = tokio::fs::read(path)
            .await
            .map_err(|err| BridgeError::from_io(path, err))?;
        Ok(match decode_text(&bytes) {
            Some(text) => FileContent::Text(text),
            None => FileContent::Binary(bytes),
        })
    }

    async fn read_file_head(&self, path: &str, limit: usize) -> Result<FileHead, BridgeError> {
        let stats = self.get_stats(path).await?;
        if stats.is_directory {
            return Err(BridgeError::IsADirectory(path.to_string()));
        }
        let file = tokio::fs::File::open(path)
            .await
            .map_err(|err| BridgeError::from_io(path, err))?;
        let mut bytes = Vec::new();
        // One byte past the limit tells whether anything was left unread.
        file.take((limit as u64).saturating_add(1))
            .read_to_end(&mut bytes)
            .await
            .map_err(|err| BridgeError::from_io(path, err))?;
        let complete = bytes.len() <= limit;
        bytes.truncate(limit);
        Ok(FileHead { bytes, complete })
    }

    async fn read_file_as_data_url(&self, path: &str) -> Result<String, BridgeError> {
        let bytes = tokio::fs::read(path)
            .await
            .map_err(|err| BridgeError::from_io(path, err))?;
        Ok(format!(
            "data:{};base64,{}",
            mime_for(path),
            STANDARD.encode(bytes)
        ))
    }

    async fn get_stats(&self, path: &str) -> Result<FileStats, BridgeError> {
        let meta = tokio::fs::metadata(path)
            .await
            .map_err(|err| BridgeError::from_io(path, err))?;
        Ok(FileStats {
            is_directory: meta.is_dir(),
            is_file: meta.is_file(),
            size: meta.len(),
            modified: meta.modified().ok().map(DateTime::<Utc>::from),
        })
    }
}

/// Reads every path as a directory; the first failure aborts the batch.
pub async fn probe_folders(
    bridge: &dyn CapabilityBridge,
    paths: &[String],
) -> Result<(), ProbeFailure> {
    for path in paths {
        bridge
            .read_directory(path)
            .await
            .map_err(|err| ProbeFailure {
                path: path.clone(),
                message: err.to_string(),
            })?;
    }
    Ok(())
}

/// Text for BOM-marked or valid UTF-8 content, `None` otherwise.
pub fn decode_text(bytes: &[u8]) -> Option<String> {
    if let Some((encoding, bom_len)) = Encoding::for_bom(bytes) {
        let (text, had_errors) = encoding.decode_without_bom_handling(&bytes[bom_len..]);
        return (!had_errors).then(|| text.into_owned());
    }
    std::str::from_utf8(bytes).ok().map(ToOwned::to_owned)
}

/// `decode_text` for the head of a longer file: a character cut off at the
/// end is dropped rather than failing the decode.
pub fn decode_text_prefix(bytes: &[u8]) -> Option<String> {
    let (encoding, body) = match Encoding::for_bom(bytes) {
        Some((encoding, bom_len)) => (encoding, &bytes[bom_len..]),
        None => (UTF_8, bytes),
    };
    let mut decoder = encoding.new_decoder_without_bom_handling();
    let capacity = decoder.max_utf8_buffer_length_without_replacement(body.len())?;
    let mut text = String::with_capacity(capacity);
    let (result, _) = decoder.decode_to_string_without_replacement(body, &mut text, false);
    match result {
        DecoderResult::InputEmpty => Some(text),
        DecoderResult::Malformed(..) | DecoderResult::OutputFull => None,
    }
}

fn mime_for(path: &str) -> &'static str {
    let extension = Path::new(path)
        .extension()
        .and_then(|ext| ext.to_str())
        .map(str::to_ascii_lowercase);
    match extension.as_deref() {
        Some("pdf") => "application/pdf",
        Some("png") => "image/png",
        Some("jpg" | "jpeg") => "image/jpeg",
        Some("gif") => "image/gif",
        Some("svg") => "image/svg+xml",
        Some("txt" | "md") => "text/plain",
        Some("html" | "htm") => "text/html",
        Some("json") => "application/json",
        Some("docx") => {
            "application/vnd.openxmlformats-officedocument.wordprocessingml.document"
        }
        _ => "application/octet-stream",
    }
}
