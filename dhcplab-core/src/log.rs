//! Bounded activity log shared by the engine and its attack tasks
//!
//! This is the operator-facing journal returned by status queries, kept
//! separate from `tracing` diagnostics. It holds the most recent entries
//! across every attack; appending past capacity evicts the oldest entry.

use crate::types::AttackKind;
use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use serde::{Serialize, Serializer};
use std::collections::VecDeque;
use std::fmt;

/// Number of entries kept by default
pub const DEFAULT_LOG_CAPACITY: usize = 100;

/// Who wrote a log entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LogSource {
    /// Engine lifecycle events
    System,
    /// A running attack task
    Attack(AttackKind),
}

impl fmt::Display for LogSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LogSource::System => f.write_str("System"),
            LogSource::Attack(kind) => write!(f, "{}", kind),
        }
    }
}

impl Serialize for LogSource {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl From<AttackKind> for LogSource {
    fn from(kind: AttackKind) -> Self {
        LogSource::Attack(kind)
    }
}

/// One activity log line
#[derive(Debug, Clone, Serialize)]
pub struct LogEntry {
    pub time: DateTime<Utc>,
    #[serde(rename = "type")]
    pub source: LogSource,
    pub msg: String,
}

impl fmt::Display for LogEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{}] {}: {}",
            self.time.format("%H:%M:%S%.3f"),
            self.source,
            self.msg
        )
    }
}

/// Thread-safe ring of the most recent log entries
#[derive(Debug)]
pub struct ActivityLog {
    capacity: usize,
    entries: Mutex<VecDeque<LogEntry>>,
}

impl ActivityLog {
    /// Create a log holding at most `capacity` entries (minimum 1)
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            capacity,
            entries: Mutex::new(VecDeque::with_capacity(capacity)),
        }
    }

    /// Append an entry, evicting the oldest one when full
    pub fn push<S: Into<LogSource>, M: Into<String>>(&self, source: S, msg: M) {
        let entry = LogEntry {
            time: Utc::now(),
            source: source.into(),
            msg: msg.into(),
        };

        let mut entries = self.entries.lock();
        while entries.len() >= self.capacity {
            entries.pop_front();
        }
        entries.push_back(entry);
    }

    /// Append a lifecycle entry
    pub fn system<M: Into<String>>(&self, msg: M) {
        self.push(LogSource::System, msg);
    }

    /// Copy of the current entries, oldest first
    pub fn snapshot(&self) -> Vec<LogEntry> {
        self.entries.lock().iter().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn clear(&self) {
        self.entries.lock().clear();
    }
}

impl Default for ActivityLog {
    fn default() -> Self {
        Self::new(DEFAULT_LOG_CAPACITY)
    }
}
