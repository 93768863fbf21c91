//! The accumulated output shown to the user.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use chrono::{DateTime, Local, Utc};

/// Text printed so far plus when it last changed.
///
/// Append-only until cleared.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OutputRecord {
    text: String,
    updated_at: Option<DateTime<Utc>>,
}

impl OutputRecord {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append `line` and a newline, and refresh the timestamp.
    pub fn append(&mut self, line: &str) {
        self.text.push_str(line);
        self.text.push('\n');
        self.updated_at = Some(Utc::now());
    }

    /// Drop all text and the timestamp.
    pub fn clear(&mut self) {
        self.text.clear();
        self.updated_at = None;
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn lines(&self) -> impl Iterator<Item = &str> {
        self.text.lines()
    }

    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }

    pub fn updated_at(&self) -> Option<DateTime<Utc>> {
        self.updated_at
    }

    /// `LAST UPDATE: HH:MM:SS` in local time, if anything was printed.
    pub fn last_update_label(&self) -> Option<String> {
        self.updated_at.map(|at| {
            format!(
                "LAST UPDATE: {}",
                at.with_timezone(&Local).format("%H:%M:%S")
            )
        })
    }
}

/// An output record shared between the facade and the module's print import.
#[derive(Debug, Clone, Default)]
pub struct SharedOutput {
    inner: Arc<Mutex<OutputRecord>>,
}

impl SharedOutput {
    pub fn new() -> Self {
        Self::default()
    }

    /// Lock the record. A panic while holding the lock cannot leave the
    /// record half-written, so poisoning is ignored.
    pub fn lock(&self) -> MutexGuard<'_, OutputRecord> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn append(&self, line: &str) {
        self.lock().append(line);
    }

    pub fn clear(&self) {
        self.lock().clear();
    }

    /// A copy of the record as it is now.
    pub fn snapshot(&self) -> OutputRecord {
        self.lock().clone()
    }
}
