//! Incremental decoder for newline-delimited JSON response bodies.
//!
//! Bytes are buffered until a `\n` arrives, so a chunk boundary may fall
//! anywhere, including inside a multi-byte UTF-8 sequence.

use engine_logging::{engine_trace, engine_warn};
use serde::Deserialize;
use serde_json::Value;

const PREVIEW_CHARS: usize = 200;

#[derive(Debug, Deserialize)]
struct StreamLine {
    #[serde(rename = "type")]
    kind: Option<String>,
    content: Option<Value>,
}

/// Holds the unterminated tail of the stream. Every complete line has already
/// been decoded and removed, so `pending` never contains a `\n`.
#[derive(Debug, Default)]
pub struct StreamBuffer {
    pending: Vec<u8>,
}

impl StreamBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends `chunk` and returns the `content` of every `item` line it
    /// completed, in stream order.
    pub fn push(&mut self, chunk: &[u8]) -> Vec<String> {
        self.pending.extend_from_slice(chunk);
        let Some(last_newline) = self.pending.iter().rposition(|b| *b == b'\n') else {
            return Vec::new();
        };

        let rest = self.pending.split_off(last_newline + 1);
        let complete = std::mem::replace(&mut self.pending, rest);
        complete
            .split(|b| *b == b'\n')
            .filter_map(decode_line)
            .collect()
    }

    /// Decodes whatever is left once the stream has ended. The final line may
    /// lack a terminator.
    pub fn finish(self) -> Option<String> {
        decode_line(&self.pending)
    }

    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }
}

fn decode_line(line: &[u8]) -> Option<String> {
    let text = match std::str::from_utf8(line) {
        Ok(text) => text.trim(),
        Err(err) => {
            engine_warn!("Skipping stream line with invalid UTF-8: {}", err);
            return None;
        }
    };
    if text.is_empty() {
        return None;
    }

    match serde_json::from_str::<StreamLine>(text) {
        Ok(StreamLine {
            kind: Some(kind),
            content: Some(Value::String(content)),
        }) if kind == "item" && !content.is_empty() => Some(content),
        Ok(_) => {
            engine_trace!("Ignoring non-item stream line");
            None
        }
        Err(err) => {
            engine_warn!(
                "Skipping malformed stream line ({}): {}",
                err,
                preview(text)
            );
            None
        }
    }
}

fn preview(text: &str) -> String {
    text.chars().take(PREVIEW_CHARS).collect()
}
