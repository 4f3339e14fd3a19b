use bytes::{Buf, BytesMut};
use docfinder_core::{StreamEvent, TaskMetadata};
use docfinder_logging::df_debug;
use serde_json::Value;

const DATA_PREFIX: &str = "data:";

/// Incremental decoder for `data: {json}` event-stream bodies.
///
/// Bytes after the last newline of a chunk are carried over to the next
/// one, so lines (and UTF-8 sequences) split across network reads decode
/// correctly. Complete lines that do not parse are dropped.
#[derive(Debug, Default)]
pub struct EventStreamDecoder {
    pending: BytesMut,
}

impl EventStreamDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Decodes every complete line in `chunk` plus any carried-over prefix.
    pub fn feed(&mut self, chunk: &[u8]) -> Vec<StreamEvent> {
        self.pending.extend_from_slice(chunk);
        let mut events = Vec::new();
        while let Some(newline) = self.pending.iter().position(|byte| *byte == b'\n') {
            let line = self.pending.split_to(newline);
            self.pending.advance(1);
            if let Some(event) = decode_line(&line) {
                events.push(event);
            }
        }
        events
    }

    /// Flushes a final line that was not newline-terminated.
    pub fn finish(&mut self) -> Option<StreamEvent> {
        if self.pending.is_empty() {
            return None;
        }
        let rest = self.pending.split();
        decode_line(&rest)
    }

    /// Bytes waiting for the rest of their line.
    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }
}

fn decode_line(raw: &[u8]) -> Option<StreamEvent> {
    let Ok(line) = std::str::from_utf8(raw) else {
        df_debug!("skipping event line that is not UTF-8 ({} bytes)", raw.len());
        return None;
    };
    parse_event_line(line.strip_suffix('\r').unwrap_or(line))
}

/// Parses one `data: ...` line. Other lines (comments, `event:` fields,
/// blank separators) and malformed payloads yield `None`.
pub fn parse_event_line(line: &str) -> Option<StreamEvent> {
    let payload = line.strip_prefix(DATA_PREFIX)?.trim_start();
    let value: Value = match serde_json::from_str(payload) {
        Ok(value) => value,
        Err(err) => {
            df_debug!("skipping malformed event line: {err}");
            return None;
        }
    };

    if let Some(metadata) = value.get("metadata").filter(|m| m.is_object()) {
        return match serde_json::from_value::<TaskMetadata>(metadata.clone()) {
            Ok(metadata) => Some(StreamEvent::Metadata(metadata)),
            Err(err) => {
                df_debug!("skipping metadata event: {err}");
                None
            }
        };
    }
    if let Some(content) = value.get("content").and_then(Value::as_str) {
        if content.is_empty() {
            return None;
        }
        return Some(StreamEvent::Content(content.to_string()));
    }
    if value.get("done").and_then(Value::as_bool) == Some(true) {
        return Some(StreamEvent::Done);
    }
    None
}
