use crate::presence::PresenceStore;
use crate::Result;
use prometheus::core::{Collector, Desc};
use prometheus::proto::MetricFamily;
use prometheus::{IntGaugeVec, Opts};
use tracing::warn;

pub const PLAYER_ONLINE_METRIC: &str = "minecraft_player_online_status";
pub const PLAYER_ONLINE_HELP: &str =
    "Current online status of the player (1 for online, 0 for offline)";
pub const USER_LABEL: &str = "user_name";

/// Prometheus collector exposing one gauge series per known player.
///
/// Each gather renders a fresh snapshot of the store, so a scrape never
/// sees the store change underneath it.
pub struct PresenceCollector {
    store: PresenceStore,
    proto: IntGaugeVec,
}

impl PresenceCollector {
    pub fn new(store: PresenceStore) -> Result<Self> {
        let proto = Self::gauge_vec()?;
        Ok(Self { store, proto })
    }

    fn gauge_vec() -> prometheus::Result<IntGaugeVec> {
        IntGaugeVec::new(
            Opts::new(PLAYER_ONLINE_METRIC, PLAYER_ONLINE_HELP),
            &[USER_LABEL],
        )
    }

    fn render(&self) -> prometheus::Result<Vec<MetricFamily>> {
        let gauges = Self::gauge_vec()?;

        for (identity, presence) in self.store.snapshot() {
            gauges
                .with_label_values(&[identity.as_str()])
                .set(presence.gauge_value());
        }

        Ok(gauges.collect())
    }
}

impl Collector for PresenceCollector {
    fn desc(&self) -> Vec<&Desc> {
        self.proto.desc()
    }

    fn collect(&self) -> Vec<MetricFamily> {
        match self.render() {
            Ok(families) => families,
            Err(e) => {
                warn!("Failed to render presence metrics: {}", e);
                Vec::new()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::presence::Presence;
    use prometheus::{Encoder, TextEncoder};

    fn encode(collector: &PresenceCollector) -> String {
        let mut buffer = Vec::new();
        TextEncoder::new()
            .encode(&collector.collect(), &mut buffer)
            .unwrap();
        String::from_utf8(buffer).unwrap()
    }

    #[test]
    fn test_collect_renders_snapshot() {
        let store = PresenceStore::new();
        store.set("Alice", Presence::Online);
        store.set("Bob", Presence::Offline);

        let collector = PresenceCollector::new(store).unwrap();
        let output = encode(&collector);

        assert!(output.contains("# TYPE minecraft_player_online_status gauge"));
        assert!(output.contains("minecraft_player_online_status{user_name=\"Alice\"} 1"));
        assert!(output.contains("minecraft_player_online_status{user_name=\"Bob\"} 0"));
    }

    #[test]
    fn test_collect_follows_store_updates() {
        let store = PresenceStore::new();
        let collector = PresenceCollector::new(store.clone()).unwrap();

        store.set("Alice", Presence::Online);
        assert!(encode(&collector).contains("{user_name=\"Alice\"} 1"));

        store.set("Alice", Presence::Offline);
        let output = encode(&collector);
        assert!(output.contains("{user_name=\"Alice\"} 0"));
        assert!(!output.contains("{user_name=\"Alice\"} 1"));
    }
}
