//! Player presence: log line parsing and the shared online/offline store.

pub mod parser;
pub mod store;
pub mod tracker;

pub use parser::{parse_line, PresenceEvent};
pub use store::{Presence, PresenceStore};
pub use tracker::PresenceTracker;
