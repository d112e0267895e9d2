//! Bedrock server log line parser
//!
//! Recognises the two lines the dedicated server prints when a player joins
//! or leaves:
//!
//! ```text
//! [INFO] Player connected: Steve, xuid: 2533274790395904
//! [INFO] Player disconnected: Steve, xuid: 2533274790395904
//! ```
//!
//! Everything else in the log is ignored.

use std::fmt;

const LOGIN_MARKER: &str = "Player connected:";
const LOGOUT_MARKER: &str = "Player disconnected:";

/// Presence change carried by a single log line
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PresenceEvent {
    Login(String),
    Logout(String),
    None,
}

impl PresenceEvent {
    pub fn identity(&self) -> Option<&str> {
        match self {
            PresenceEvent::Login(name) | PresenceEvent::Logout(name) => Some(name),
            PresenceEvent::None => None,
        }
    }

    pub const fn kind(&self) -> &'static str {
        match self {
            PresenceEvent::Login(_) => "login",
            PresenceEvent::Logout(_) => "logout",
            PresenceEvent::None => "none",
        }
    }
}

impl fmt::Display for PresenceEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.identity() {
            Some(name) => write!(f, "{} {}", self.kind(), name),
            None => write!(f, "{}", self.kind()),
        }
    }
}

/// Parse one log line into a presence event.
///
/// The identity is the text between the marker and the next comma, trimmed.
/// Identities containing a comma are cut at the comma; the server log format
/// gives no way to tell them apart.
pub fn parse_line(line: &str) -> PresenceEvent {
    if let Some(name) = capture_after(line, LOGIN_MARKER) {
        return PresenceEvent::Login(name.to_string());
    }

    if let Some(name) = capture_after(line, LOGOUT_MARKER) {
        return PresenceEvent::Logout(name.to_string());
    }

    PresenceEvent::None
}

fn capture_after<'a>(line: &'a str, marker: &str) -> Option<&'a str> {
    let start = line.find(marker)? + marker.len();
    let rest = &line[start..];
    let end = rest.find(',')?;
    let name = rest[..end].trim();

    // The upstream exporter's `Player connected:\s*([^,]+),` pattern reports
    // an empty identity here; a blank name is treated as no event instead.
    if name.is_empty() {
        None
    } else {
        Some(name)
    }
}
