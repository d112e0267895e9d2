//! Shared player presence store
//!
//! Maps player identity to online/offline. The log pipeline is the only
//! writer; any number of scrape handlers read snapshots concurrently.
//! Entries are never removed, a player who leaves keeps an `Offline` entry.

use parking_lot::{Mutex, RwLock};
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

/// Online/offline state of a single player
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Presence {
    Online,
    Offline,
}

impl Presence {
    /// Gauge value exported for this state
    pub const fn gauge_value(&self) -> i64 {
        match self {
            Presence::Online => 1,
            Presence::Offline => 0,
        }
    }

    pub const fn as_str(&self) -> &'static str {
        match self {
            Presence::Online => "online",
            Presence::Offline => "offline",
        }
    }
}

impl fmt::Display for Presence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Thread-safe presence map, cheap to clone and share between tasks.
///
/// The map is copy-on-write: writers build a new map and publish it with a
/// pointer swap, readers take the current `Arc`. A snapshot is therefore the
/// state between two updates, never a mix of them, and the read lock is only
/// held for an `Arc` clone.
#[derive(Clone, Default)]
pub struct PresenceStore {
    current: Arc<RwLock<Arc<BTreeMap<String, Presence>>>>,
    writer: Arc<Mutex<()>>,
}

impl PresenceStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Upsert the state for a player, returning the previous state if any
    pub fn set(&self, identity: &str, state: Presence) -> Option<Presence> {
        let _writer = self.writer.lock();

        let mut next = BTreeMap::clone(&self.load());
        let previous = next.insert(identity.to_string(), state);
        *self.current.write() = Arc::new(next);

        previous
    }

    pub fn get(&self, identity: &str) -> Option<Presence> {
        self.load().get(identity).copied()
    }

    /// Copy of every entry, sorted by identity
    pub fn snapshot(&self) -> Vec<(String, Presence)> {
        self.load()
            .iter()
            .map(|(identity, state)| (identity.clone(), *state))
            .collect()
    }

    pub fn online_count(&self) -> usize {
        self.load()
            .values()
            .filter(|state| **state == Presence::Online)
            .count()
    }

    pub fn len(&self) -> usize {
        self.load().len()
    }

    pub fn is_empty(&self) -> bool {
        self.load().is_empty()
    }

    fn load(&self) -> Arc<BTreeMap<String, Presence>> {
        self.current.read().clone()
    }
}
