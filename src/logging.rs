//! In-memory log capture for the console's logs page
//!
//! A tracing layer copies every event into a bounded buffer and broadcasts
//! it, so `/admin/logs` can show recent history and `/admin/logs/stream`
//! can push new lines over SSE.

use std::collections::VecDeque;
use std::fmt::Write as _;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use serde::Serialize;
use tokio::sync::broadcast;
use tracing::field::{Field, Visit};
use tracing::{Event, Level, Subscriber};
use tracing_subscriber::layer::Context;
use tracing_subscriber::Layer;

/// Capacity of the live broadcast channel
const BROADCAST_CAPACITY: usize = 256;

#[derive(Debug, Clone, Serialize)]
pub struct LogEntry {
    pub timestamp: DateTime<Utc>,
    pub level: String,
    pub target: String,
    pub message: String,
    /// Structured fields other than `message`, as `key=value`
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub fields: Vec<String>,
}

impl LogEntry {
    pub fn new(level: Level, target: &str, message: impl Into<String>) -> Self {
        Self {
            timestamp: Utc::now(),
            level: level.to_string(),
            target: target.to_string(),
            message: message.into(),
            fields: Vec::new(),
        }
    }

    /// One line for the logs page
    pub fn format(&self) -> String {
        let mut line = format!(
            "{} {:>5} {} {}",
            self.timestamp.format("%H:%M:%S%.3f"),
            self.level,
            self.target,
            self.message
        );
        for field in &self.fields {
            let _ = write!(line, " {}", field);
        }
        line
    }

    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_default()
    }

    /// Whether this entry is at least as severe as `min`
    pub fn at_least(&self, min: Level) -> bool {
        self.level
            .parse::<Level>()
            .map(|level| level <= min)
            .unwrap_or(true)
    }
}

/// Bounded history plus a live feed
pub struct LogBuffer {
    history: RwLock<VecDeque<LogEntry>>,
    capacity: usize,
    live: broadcast::Sender<LogEntry>,
}

impl LogBuffer {
    pub fn new(capacity: usize) -> Self {
        let (live, _) = broadcast::channel(BROADCAST_CAPACITY);
        Self {
            history: RwLock::new(VecDeque::with_capacity(capacity.min(4096))),
            capacity: capacity.max(1),
            live,
        }
    }

    pub fn push(&self, entry: LogEntry) {
        {
            let mut history = self.history.write();
            while history.len() >= self.capacity {
                history.pop_front();
            }
            history.push_back(entry.clone());
        }
        // No subscribers is fine
        let _ = self.live.send(entry);
    }

    /// The last `count` entries at or above `min`, oldest first
    pub fn recent(&self, count: usize, min: Level) -> Vec<LogEntry> {
        let history = self.history.read();
        let mut entries: Vec<LogEntry> = history
            .iter()
            .rev()
            .filter(|e| e.at_least(min))
            .take(count)
            .cloned()
            .collect();
        entries.reverse();
        entries
    }

    pub fn subscribe(&self) -> broadcast::Receiver<LogEntry> {
        self.live.subscribe()
    }

    pub fn len(&self) -> usize {
        self.history.read().len()
    }
}

pub type SharedLogBuffer = Arc<LogBuffer>;

pub fn create_log_buffer(capacity: usize) -> SharedLogBuffer {
    Arc::new(LogBuffer::new(capacity))
}

/// Tracing layer feeding a [`LogBuffer`]
pub struct LogCaptureLayer {
    buffer: SharedLogBuffer,
}

impl LogCaptureLayer {
    pub fn new(buffer: SharedLogBuffer) -> Self {
        Self { buffer }
    }
}

impl<S: Subscriber> Layer<S> for LogCaptureLayer {
    fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
        let metadata = event.metadata();
        let mut visitor = EntryVisitor::default();
        event.record(&mut visitor);

        let mut entry = LogEntry::new(*metadata.level(), metadata.target(), visitor.message);
        entry.fields = visitor.fields;
        self.buffer.push(entry);
    }
}

#[derive(Default)]
struct EntryVisitor {
    message: String,
    fields: Vec<String>,
}

impl Visit for EntryVisitor {
    fn record_str(&mut self, field: &Field, value: &str) {
        if field.name() == "message" {
            self.message = value.to_string();
        } else {
            self.fields.push(format!("{}={}", field.name(), value));
        }
    }

    fn record_debug(&mut self, field: &Field, value: &dyn std::fmt::Debug) {
        if field.name() == "message" {
            self.message = format!("{:?}", value);
        } else {
            self.fields.push(format!("{}={:?}", field.name(), value));
        }
    }
}
