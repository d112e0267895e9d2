use crate::status::query::{MetricsQuery, Sample};
use serde::{Deserialize, Serialize};
use tracing::warn;

pub const PLAYERS_ONLINE_QUERY: &str = "minecraft_status_players_online_count";
pub const PLAYERS_MAX_QUERY: &str = "minecraft_status_players_max_count";
pub const HEALTHY_QUERY: &str = "minecraft_status_healthy";
pub const CPU_QUERY: &str = "sum(rate(container_cpu_usage_seconds_total{container_label_io_kubernetes_container_name=\"minecraft\"}[1m])) * 100";
pub const MEMORY_QUERY: &str = "sum(container_memory_working_set_bytes{container_label_io_kubernetes_container_name=\"minecraft\"})";
pub const MEMORY_LIMIT_QUERY: &str = "sum(container_spec_memory_limit_bytes{container_label_io_kubernetes_container_name=\"minecraft\"})";

const VERSION_LABEL: &str = "server_version";
const NOT_AVAILABLE: &str = "N/A";
const UNKNOWN: &str = "Unknown";

const MIB: f64 = 1_048_576.0;
const GIB: f64 = 1_073_741_824.0;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServerStatus {
    pub status: String,
    pub players: Players,
    pub server: ServerInfo,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Players {
    pub online: i64,
    pub max: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServerInfo {
    pub version: String,
    pub cpu_usage: String,
    pub memory_usage: String,
    pub memory_limit: String,
    pub memory_percent: String,
}

/// Query every series and assemble the status document.
///
/// A failed or empty query only blanks its own field.
pub async fn collect_status<Q: MetricsQuery + ?Sized>(prometheus: &Q) -> ServerStatus {
    let online = fetch(prometheus, PLAYERS_ONLINE_QUERY).await;
    let max = fetch(prometheus, PLAYERS_MAX_QUERY).await;
    let healthy = fetch(prometheus, HEALTHY_QUERY).await;
    let cpu = fetch(prometheus, CPU_QUERY).await;
    let memory = fetch(prometheus, MEMORY_QUERY).await;
    let limit = fetch(prometheus, MEMORY_LIMIT_QUERY).await;

    build_status(
        online.as_ref(),
        max.as_ref(),
        healthy.as_ref(),
        cpu.as_ref(),
        memory.as_ref(),
        limit.as_ref(),
    )
}

async fn fetch<Q: MetricsQuery + ?Sized>(prometheus: &Q, promql: &str) -> Option<Sample> {
    match prometheus.query(promql).await {
        Ok(sample) => sample,
        Err(e) => {
            warn!("Error querying Prometheus for {}: {}", promql, e);
            None
        }
    }
}

pub fn build_status(
    online: Option<&Sample>,
    max: Option<&Sample>,
    healthy: Option<&Sample>,
    cpu: Option<&Sample>,
    memory: Option<&Sample>,
    limit: Option<&Sample>,
) -> ServerStatus {
    // Having a player count at all means the status exporter can reach the server
    let status = if online.is_some() { "Online" } else { "Offline" };

    let version = healthy
        .and_then(|s| s.label(VERSION_LABEL))
        .unwrap_or(UNKNOWN)
        .to_string();

    let memory_bytes = memory.and_then(Sample::as_f64);
    let limit_bytes = limit.and_then(Sample::as_f64);

    ServerStatus {
        status: status.to_string(),
        players: Players {
            online: count(online),
            max: count(max),
        },
        server: ServerInfo {
            version,
            cpu_usage: cpu
                .and_then(Sample::as_f64)
                .map(format_cpu)
                .unwrap_or_else(|| NOT_AVAILABLE.to_string()),
            memory_usage: memory_bytes
                .map(format_mib)
                .unwrap_or_else(|| NOT_AVAILABLE.to_string()),
            memory_limit: limit_bytes
                .map(format_gib)
                .unwrap_or_else(|| NOT_AVAILABLE.to_string()),
            memory_percent: match (memory_bytes, limit_bytes) {
                (Some(used), Some(total)) if used > 0.0 && total > 0.0 => {
                    format_percent(used, total)
                }
                _ => NOT_AVAILABLE.to_string(),
            },
        },
    }
}

fn count(sample: Option<&Sample>) -> i64 {
    sample.and_then(Sample::as_f64).map(|v| v as i64).unwrap_or(0)
}

pub fn format_cpu(percent: f64) -> String {
    format!("{:.1}%", percent)
}

pub fn format_mib(bytes: f64) -> String {
    format!("{:.0} MB", bytes / MIB)
}

pub fn format_gib(bytes: f64) -> String {
    format!("{:.1} GB", bytes / GIB)
}

pub fn format_percent(used: f64, total: f64) -> String {
    format!("({:.1}%)", used / total * 100.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{McwatchError, Result};
    use async_trait::async_trait;
    use std::collections::HashMap;

    fn sample(value: &str) -> Sample {
        Sample {
            metric: HashMap::new(),
            value: (0.0, value.to_string()),
        }
    }

    struct FakePrometheus {
        answers: HashMap<&'static str, Sample>,
        failing: Vec<&'static str>,
    }

    #[async_trait]
    impl MetricsQuery for FakePrometheus {
        async fn query(&self, promql: &str) -> Result<Option<Sample>> {
            if self.failing.iter().any(|f| *f == promql) {
                return Err(McwatchError::QueryError("connection refused".to_string()));
            }
            Ok(self.answers.get(promql).cloned())
        }
    }

    #[test]
    fn test_formatting() {
        assert_eq!(format_cpu(12.345), "12.3%");
        assert_eq!(format_mib(536_870_912.0), "512 MB");
        assert_eq!(format_gib(4.0 * GIB), "4.0 GB");
        assert_eq!(format_percent(1.0, 8.0), "(12.5%)");
    }

    #[test]
    fn test_everything_missing() {
        let status = build_status(None, None, None, None, None, None);

        assert_eq!(status.status, "Offline");
        assert_eq!(status.players, Players { online: 0, max: 0 });
        assert_eq!(status.server.version, "Unknown");
        assert_eq!(status.server.cpu_usage, "N/A");
        assert_eq!(status.server.memory_usage, "N/A");
        assert_eq!(status.server.memory_limit, "N/A");
        assert_eq!(status.server.memory_percent, "N/A");
    }

    #[test]
    fn test_percent_needs_both_values() {
        let memory = sample("536870912");
        let status = build_status(None, None, None, None, Some(&memory), None);

        assert_eq!(status.server.memory_usage, "512 MB");
        assert_eq!(status.server.memory_percent, "N/A");
    }

    #[tokio::test]
    async fn test_collect_full_status() {
        let mut healthy = sample("1");
        healthy
            .metric
            .insert("server_version".to_string(), "1.21.2".to_string());

        let prometheus = FakePrometheus {
            answers: HashMap::from([
                (PLAYERS_ONLINE_QUERY, sample("3")),
                (PLAYERS_MAX_QUERY, sample("10")),
                (HEALTHY_QUERY, healthy),
                (CPU_QUERY, sample("25.04")),
                (MEMORY_QUERY, sample("1073741824")),
                (MEMORY_LIMIT_QUERY, sample("4294967296")),
            ]),
            failing: Vec::new(),
        };

        let status = collect_status(&prometheus).await;

        assert_eq!(status.status, "Online");
        assert_eq!(status.players, Players { online: 3, max: 10 });
        assert_eq!(status.server.version, "1.21.2");
        assert_eq!(status.server.cpu_usage, "25.0%");
        assert_eq!(status.server.memory_usage, "1024 MB");
        assert_eq!(status.server.memory_limit, "4.0 GB");
        assert_eq!(status.server.memory_percent, "(25.0%)");
    }

    #[tokio::test]
    async fn test_failed_query_only_blanks_its_field() {
        let prometheus = FakePrometheus {
            answers: HashMap::from([
                (PLAYERS_ONLINE_QUERY, sample("2")),
                (CPU_QUERY, sample("5")),
            ]),
            failing: vec![CPU_QUERY],
        };

        let status = collect_status(&prometheus).await;

        assert_eq!(status.status, "Online");
        assert_eq!(status.players.online, 2);
        assert_eq!(status.server.cpu_usage, "N/A");
    }
}
