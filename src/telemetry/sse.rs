//! Server-sent events framing and the realtime database event model.

use serde::Deserialize;
use serde_json::{Map, Value};
use tracing::warn;

use super::error::TelemetryError;

/// One dispatched server-sent event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SseEvent {
    pub event: String,
    pub data: String,
}

/// Longest line kept while waiting for its newline.
pub const MAX_LINE_BYTES: usize = 1024 * 1024;

/// Incremental parser over a chunked byte stream.
///
/// Chunks may split lines (and UTF-8 sequences) anywhere; complete events
/// are returned as soon as their terminating blank line arrives. A line
/// longer than the limit is dropped together with the event it belongs to.
#[derive(Debug)]
pub struct SseParser {
    buffer: Vec<u8>,
    event: Option<String>,
    data: Vec<String>,
    max_line: usize,
    discarding: bool,
}

impl Default for SseParser {
    fn default() -> Self {
        Self::with_max_line(MAX_LINE_BYTES)
    }
}

impl SseParser {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_max_line(max_line: usize) -> Self {
        Self {
            buffer: Vec::new(),
            event: None,
            data: Vec::new(),
            max_line,
            discarding: false,
        }
    }

    pub fn feed(&mut self, chunk: &[u8]) -> Vec<SseEvent> {
        self.buffer.extend_from_slice(chunk);
        let mut events = Vec::new();

        while let Some(pos) = self.buffer.iter().position(|b| *b == b'\n') {
            let mut line: Vec<u8> = self.buffer.drain(..=pos).collect();
            if self.discarding {
                self.discarding = false;
                continue;
            }
            line.pop();
            if line.last() == Some(&b'\r') {
                line.pop();
            }
            let line = String::from_utf8_lossy(&line);
            if let Some(event) = self.process_line(&line) {
                events.push(event);
            }
        }

        if self.buffer.len() > self.max_line {
            if !self.discarding {
                warn!(
                    "Dropping stream line over {} bytes and its event",
                    self.max_line
                );
            }
            self.buffer.clear();
            self.event = None;
            self.data.clear();
            self.discarding = true;
        }
        events
    }

    fn process_line(&mut self, line: &str) -> Option<SseEvent> {
        if line.is_empty() {
            if self.event.is_none() && self.data.is_empty() {
                return None;
            }
            let event = SseEvent {
                event: self.event.take().unwrap_or_else(|| "message".to_string()),
                data: self.data.join("\n"),
            };
            self.data.clear();
            return Some(event);
        }
        if line.starts_with(':') {
            return None;
        }

        let (field, value) = match line.split_once(':') {
            Some((field, value)) => (field, value.strip_prefix(' ').unwrap_or(value)),
            None => (line, ""),
        };
        match field {
            "event" => self.event = Some(value.to_string()),
            "data" => self.data.push(value.to_string()),
            _ => {}
        }
        None
    }
}

/// Data of a `put` or `patch` event.
#[derive(Debug, Deserialize)]
pub struct PathData {
    pub path: String,
    pub data: Value,
}

/// Realtime database stream events.
#[derive(Debug)]
pub enum FeedEvent {
    Put(PathData),
    Patch(PathData),
    KeepAlive,
    Cancel(String),
    AuthRevoked,
}

impl FeedEvent {
    pub fn parse(event: &SseEvent) -> Result<Self, TelemetryError> {
        let path_data = || {
            serde_json::from_str::<PathData>(&event.data)
                .map_err(|e| TelemetryError::MalformedEvent(format!("{}: {}", event.event, e)))
        };
        match event.event.as_str() {
            "put" => Ok(Self::Put(path_data()?)),
            "patch" => Ok(Self::Patch(path_data()?)),
            "keep-alive" => Ok(Self::KeepAlive),
            "cancel" => Ok(Self::Cancel(event.data.clone())),
            "auth_revoked" => Ok(Self::AuthRevoked),
            other => Err(TelemetryError::MalformedEvent(format!(
                "unknown event type '{}'",
                other
            ))),
        }
    }
}

fn segments(path: &str) -> Vec<&str> {
    path.split('/').filter(|s| !s.is_empty()).collect()
}

/// Replaces the value at `path`, creating intermediate objects.
/// A null `data` deletes the entry.
pub fn apply_put(root: &mut Value, path: &str, data: Value) {
    put_at(root, &segments(path), data);
}

/// Merges each key of `data` as a put relative to `path`.
pub fn apply_patch(root: &mut Value, path: &str, data: Value) -> Result<(), TelemetryError> {
    let children = match data {
        Value::Object(children) => children,
        other => {
            return Err(TelemetryError::MalformedEvent(format!(
                "patch data must be an object, got {}",
                other
            )))
        }
    };
    let base = path.trim_end_matches('/');
    for (key, value) in children {
        apply_put(root, &format!("{}/{}", base, key), value);
    }
    Ok(())
}

/// Arrays are promoted to index-keyed objects so they can take child writes.
fn put_at(node: &mut Value, parts: &[&str], data: Value) {
    let Some((first, rest)) = parts.split_first() else {
        *node = data;
        return;
    };

    let mut map = match std::mem::take(node) {
        Value::Object(map) => map,
        Value::Array(items) => items
            .into_iter()
            .enumerate()
            .map(|(i, v)| (i.to_string(), v))
            .collect(),
        _ => Map::new(),
    };
    if rest.is_empty() && data.is_null() {
        map.remove(*first);
    } else {
        put_at(
            map.entry(first.to_string()).or_insert(Value::Null),
            rest,
            data,
        );
    }
    *node = Value::Object(map);
}
