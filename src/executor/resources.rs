//! Scoped resource bookkeeping
//!
//! Every handle acquired by a Try header lives in the [`ResourceTable`] until
//! the Try frame releases it. Release removes the entry, so a handle can be
//! released at most once; the counters let callers assert that nothing leaked.

use super::errors::Exception;
use super::host::{FileSystem, LineReader};
use super::types::ResourceId;
use std::collections::BTreeMap;
use std::fmt;
use tracing::{debug, warn};

/// Most recent events kept by [`ResourceTable::history`]
pub const HISTORY_LIMIT: usize = 1024;

/// Acquire/release event, recorded in order
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResourceEvent {
    Acquired(String),
    Released(String),
}

struct Entry {
    path: String,
    reader: Box<dyn LineReader>,
}

#[derive(Default)]
pub struct ResourceTable {
    next_id: u32,
    live: BTreeMap<ResourceId, Entry>,
    acquired: usize,
    released: usize,
    history: Vec<ResourceEvent>,
}

impl ResourceTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Open `path` through the file system and register the handle
    pub fn acquire(
        &mut self,
        files: &mut dyn FileSystem,
        path: &str,
    ) -> Result<ResourceId, Exception> {
        let reader = files.open(path)?;
        let id = ResourceId(self.next_id);
        self.next_id += 1;
        self.live.insert(
            id,
            Entry {
                path: path.to_string(),
                reader,
            },
        );
        self.acquired += 1;
        self.record(ResourceEvent::Acquired(path.to_string()));
        debug!(resource = id.0, path, "resource acquired");
        Ok(id)
    }

    pub fn read_line(&mut self, id: ResourceId) -> Result<Option<String>, Exception> {
        match self.live.get_mut(&id) {
            Some(entry) => entry.reader.read_line(),
            None => Err(Exception::resource("Stream closed")),
        }
    }

    /// Close the handle and forget it
    ///
    /// The entry is removed even when closing fails, so a second release is a
    /// no-op.
    pub fn release(&mut self, id: ResourceId) -> Result<(), Exception> {
        let Some(mut entry) = self.live.remove(&id) else {
            debug!(resource = id.0, "release of unknown resource ignored");
            return Ok(());
        };
        self.released += 1;
        self.record(ResourceEvent::Released(entry.path.clone()));
        debug!(resource = id.0, path = %entry.path, "resource released");
        entry.reader.close()
    }

    /// Release every live handle, newest first
    pub fn release_all(&mut self) -> Vec<Exception> {
        let ids = self.live.keys().rev().copied().collect::<Vec<_>>();
        let mut failures = Vec::new();
        for id in ids {
            if let Err(e) = self.release(id) {
                warn!(resource = id.0, error = %e, "release failed during teardown");
                failures.push(e);
            }
        }
        failures
    }

    /// Number of handles currently held
    pub fn live(&self) -> usize {
        self.live.len()
    }

    pub fn acquired(&self) -> usize {
        self.acquired
    }

    pub fn released(&self) -> usize {
        self.released
    }

    /// The last [`HISTORY_LIMIT`] events, oldest first
    pub fn history(&self) -> &[ResourceEvent] {
        let start = self.history.len().saturating_sub(HISTORY_LIMIT);
        &self.history[start..]
    }

    /// Older events are dropped in batches once twice the limit is buffered
    fn record(&mut self, event: ResourceEvent) {
        if self.history.len() >= 2 * HISTORY_LIMIT {
            self.history.drain(..HISTORY_LIMIT);
        }
        self.history.push(event);
    }
}

impl fmt::Debug for ResourceTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResourceTable")
            .field("live", &self.live.keys().collect::<Vec<_>>())
            .field("acquired", &self.acquired)
            .field("released", &self.released)
            .finish()
    }
}
