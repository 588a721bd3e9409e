//! The durable, append-only event log.
//!
//! [`LogStore`] is the consumer of `addToLog`. Every delivered event becomes
//! a [`LogEntry`] stamped with an id and the wall-clock time it arrived.
//! Entries are never edited or removed individually; the whole log can be
//! saved through a [`SaveStore`] and restored at the next session start.

use std::cell::RefCell;
use std::rc::Rc;

use chrono::{DateTime, Utc};
use lifesim_events::{EventBus, Subscription};
use lifesim_types::{BusMessage, LogEntryId, NotificationEvent, Topic};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::LogError;
use crate::save_store::SaveStore;

/// Current layout version of [`SavedLog`].
const SAVE_VERSION: u32 = 1;

/// One event that made it into the log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogEntry {
    /// Unique entry id.
    pub id: LogEntryId,
    /// The logged event, unchanged.
    pub event: NotificationEvent,
    /// When the entry was appended.
    pub logged_at: DateTime<Utc>,
}

/// Serialized form of the whole log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SavedLog {
    /// Layout version.
    pub version: u32,
    /// Entries in append order.
    pub entries: Vec<LogEntry>,
}

/// Append-only store of demoted events.
#[derive(Debug, Default)]
pub struct LogStore {
    entries: RefCell<Vec<LogEntry>>,
}

impl LogStore {
    /// Create an empty log.
    pub fn new() -> Rc<Self> {
        Rc::new(Self::default())
    }

    /// Subscribe the log to `addToLog` on `bus`.
    pub fn attach(self: &Rc<Self>, bus: &EventBus) -> Subscription {
        let weak = Rc::downgrade(self);
        bus.subscribe(Topic::AddToLog, move |msg| {
            if let (Some(store), BusMessage::AddToLog(event)) = (weak.upgrade(), msg) {
                store.append(event.clone());
            }
        })
    }

    /// Append an event and return the new entry's id.
    pub fn append(&self, event: NotificationEvent) -> LogEntryId {
        let entry = LogEntry {
            id: LogEntryId::new(),
            event,
            logged_at: Utc::now(),
        };
        let id = entry.id;
        debug!(%id, text = %entry.event.text, "log entry appended");
        self.entries.borrow_mut().push(entry);
        id
    }

    /// A copy of every entry, oldest first.
    pub fn entries(&self) -> Vec<LogEntry> {
        self.entries.borrow().clone()
    }

    /// The `n` most recent entries, oldest first.
    pub fn recent(&self, n: usize) -> Vec<LogEntry> {
        let entries = self.entries.borrow();
        let skip = entries.len().saturating_sub(n);
        entries.iter().skip(skip).cloned().collect()
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.entries.borrow().len()
    }

    /// Whether the log has no entries.
    pub fn is_empty(&self) -> bool {
        self.entries.borrow().is_empty()
    }

    /// Drop every entry.
    pub fn clear(&self) {
        self.entries.borrow_mut().clear();
    }

    /// Snapshot of the log in its saved form.
    pub fn snapshot(&self) -> SavedLog {
        SavedLog {
            version: SAVE_VERSION,
            entries: self.entries(),
        }
    }

    /// Replace the log's contents with a snapshot.
    pub fn restore(&self, saved: SavedLog) {
        *self.entries.borrow_mut() = saved.entries;
    }

    /// Serialize the log and store it under `key`.
    ///
    /// # Errors
    ///
    /// Returns [`LogError`] if encoding or the store write fails.
    pub fn persist(&self, store: &mut dyn SaveStore, key: &str) -> Result<(), LogError> {
        let blob = serde_json::to_string(&self.snapshot())?;
        store.save(key, &blob)?;
        info!(key, entries = self.len(), "event log saved");
        Ok(())
    }

    /// Load the log saved under `key`, replacing the current contents.
    /// Returns the number of restored entries; a missing save restores
    /// nothing and leaves the log untouched.
    ///
    /// # Errors
    ///
    /// Returns [`LogError::Corrupt`] if the blob does not decode, or the
    /// store's error if it cannot be read.
    pub fn load(&self, store: &dyn SaveStore, key: &str) -> Result<usize, LogError> {
        let Some(blob) = store.load(key)? else {
            debug!(key, "no saved event log");
            return Ok(0);
        };
        let saved: SavedLog = serde_json::from_str(&blob).map_err(|source| LogError::Corrupt {
            key: key.to_owned(),
            source,
        })?;
        let count = saved.entries.len();
        self.restore(saved);
        info!(key, entries = count, "event log restored");
        Ok(count)
    }
}
