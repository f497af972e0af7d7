//! Bounded in-memory diagnostics log
//!
//! Operator-facing record of bridge activity (connects, sends, receives,
//! errors). This is separate from `tracing`: tracing goes to whatever
//! subscriber the embedding application installs, while this ring buffer is
//! queryable state that a UI can render directly.

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

/// Maximum number of retained entries
pub const LOG_CAPACITY: usize = 100;

/// Milliseconds since the Unix epoch
pub fn epoch_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}

/// A single diagnostics entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LogEntry {
    /// Unix epoch milliseconds at insertion
    pub timestamp: u64,
    pub message: String,
}

/// Append-only capacity-bounded log, oldest entry evicted first
///
/// Cloning produces another handle to the same underlying buffer. Insertion
/// never blocks on I/O and never fails.
#[derive(Debug, Clone, Default)]
pub struct DiagnosticsLog {
    entries: Arc<Mutex<VecDeque<LogEntry>>>,
}

impl DiagnosticsLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an entry, timestamped now, evicting the oldest if at capacity
    pub fn push(&self, message: impl Into<String>) {
        let entry = LogEntry {
            timestamp: epoch_ms(),
            message: message.into(),
        };

        let mut entries = self.entries.lock();
        if entries.len() == LOG_CAPACITY {
            entries.pop_front();
        }
        entries.push_back(entry);
    }

    /// All retained entries, oldest first
    pub fn snapshot(&self) -> Vec<LogEntry> {
        self.entries.lock().iter().cloned().collect()
    }

    /// Drop all entries
    pub fn clear(&self) {
        self.entries.lock().clear();
    }

    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }
}
