use crate::metrics::ExporterMetrics;
use crate::presence::parser::{parse_line, PresenceEvent};
use crate::presence::store::{Presence, PresenceStore};
use tracing::{debug, info};

/// Applies parsed log lines to the presence store. The only writer of the store.
#[derive(Clone)]
pub struct PresenceTracker {
    store: PresenceStore,
    metrics: Option<ExporterMetrics>,
}

impl PresenceTracker {
    pub fn new(store: PresenceStore) -> Self {
        Self {
            store,
            metrics: None,
        }
    }

    pub fn with_metrics(mut self, metrics: ExporterMetrics) -> Self {
        self.metrics = Some(metrics);
        self
    }

    pub fn handle_line(&self, line: &str) -> PresenceEvent {
        if let Some(metrics) = &self.metrics {
            metrics.log_lines.inc();
        }

        let event = parse_line(line.trim());

        let (identity, presence) = match &event {
            PresenceEvent::Login(name) => {
                info!("Login detected: {}", name);
                (name.as_str(), Presence::Online)
            }
            PresenceEvent::Logout(name) => {
                info!("Logout detected: {}", name);
                (name.as_str(), Presence::Offline)
            }
            PresenceEvent::None => return event,
        };

        self.store.set(identity, presence);
        debug!("{} players online", self.store.online_count());

        if let Some(metrics) = &self.metrics {
            metrics
                .presence_events
                .with_label_values(&[event.kind()])
                .inc();
        }

        event
    }

    pub fn store(&self) -> &PresenceStore {
        &self.store
    }

    pub fn metrics(&self) -> Option<&ExporterMetrics> {
        self.metrics.as_ref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_login_then_logout() {
        let tracker = PresenceTracker::new(PresenceStore::new());

        for line in [
            "Player connected: X, xuid:1",
            "noise",
            "Player disconnected: X, xuid:1",
        ] {
            tracker.handle_line(line);
        }

        assert_eq!(
            tracker.store().snapshot(),
            vec![("X".to_string(), Presence::Offline)]
        );
    }

    #[test]
    fn test_noise_does_not_create_entries() {
        let tracker = PresenceTracker::new(PresenceStore::new());

        assert_eq!(tracker.handle_line("[INFO] Level Name: Bedrock level"), PresenceEvent::None);
        assert!(tracker.store().is_empty());
    }

    #[test]
    fn test_counts_lines_and_events() {
        let metrics = ExporterMetrics::new().unwrap();
        let tracker = PresenceTracker::new(PresenceStore::new()).with_metrics(metrics.clone());

        tracker.handle_line("Player connected: A, xuid: 1");
        tracker.handle_line("Player connected: B, xuid: 2");
        tracker.handle_line("Player disconnected: A, xuid: 1");
        tracker.handle_line("Running AutoCompaction...");

        assert_eq!(metrics.log_lines.get(), 4);
        assert_eq!(metrics.presence_events.with_label_values(&["login"]).get(), 2);
        assert_eq!(metrics.presence_events.with_label_values(&["logout"]).get(), 1);
        assert_eq!(tracker.store().online_count(), 1);
    }
}
