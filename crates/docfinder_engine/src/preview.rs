use docfinder_core::FileBody;

use crate::bridge::{decode_text, decode_text_prefix, BridgeError, CapabilityBridge};

pub const TRUNCATED_MARKER: &str = "\n.[truncated]";
pub const DEFAULT_MAX_PREVIEW_BYTES: usize = 1024 * 1024;

/// Loads `path` for the preview pane, reading no more than `max_bytes`.
/// Directories are rejected; content that is not text yields
/// `content: None`.
pub async fn load_preview(
    bridge: &dyn CapabilityBridge,
    path: &str,
    max_bytes: usize,
) -> Result<FileBody, BridgeError> {
    let head = bridge.read_file_head(path, max_bytes).await?;
    let text = if head.complete {
        decode_text(&head.bytes)
    } else {
        decode_text_prefix(&head.bytes)
    };
    let Some(text) = text else {
        return Ok(FileBody {
            content: None,
            truncated: false,
        });
    };
    let (content, truncated) = if head.complete {
        truncate_preview(&text, max_bytes)
    } else {
        (format!("{text}{TRUNCATED_MARKER}"), true)
    };
    Ok(FileBody {
        content: Some(content),
        truncated,
    })
}

/// Cuts `text` to at most `max_bytes` on a char boundary and appends the
/// marker when anything was dropped.
pub fn truncate_preview(text: &str, max_bytes: usize) -> (String, bool) {
    if text.len() <= max_bytes {
        return (text.to_string(), false);
    }
    let mut end = max_bytes;
    while end > 0 && !text.is_char_boundary(end) {
        end -= 1;
    }
    (format!("{}{TRUNCATED_MARKER}", &text[..end]), true)
}
