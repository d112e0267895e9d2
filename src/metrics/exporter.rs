use crate::metrics::collector::PresenceCollector;
use crate::presence::PresenceStore;
use crate::{McwatchError, Result};
use prometheus::{Encoder, IntCounter, IntCounterVec, Opts, Registry, TextEncoder};
use tracing::info;

pub const METRICS_PORT: u16 = 8000;

/// Operational counters for the log pipeline.
///
/// Cheap to clone; every clone updates the same series.
#[derive(Clone)]
pub struct ExporterMetrics {
    pub log_lines: IntCounter,
    pub presence_events: IntCounterVec,
    pub stream_sessions: IntCounter,
    pub search_failures: IntCounter,
}

impl ExporterMetrics {
    pub fn new() -> Result<Self> {
        Ok(Self {
            log_lines: IntCounter::new(
                "mcwatch_log_lines_total",
                "Log lines read from the server",
            )?,
            presence_events: IntCounterVec::new(
                Opts::new(
                    "mcwatch_presence_events_total",
                    "Login and logout events detected in the server log",
                ),
                &["event"],
            )?,
            stream_sessions: IntCounter::new(
                "mcwatch_stream_sessions_total",
                "Log streams opened against the server pod",
            )?,
            search_failures: IntCounter::new(
                "mcwatch_pod_search_failures_total",
                "Pod searches that found no running server",
            )?,
        })
    }

    fn register(&self, registry: &Registry) -> Result<()> {
        registry.register(Box::new(self.log_lines.clone()))?;
        registry.register(Box::new(self.presence_events.clone()))?;
        registry.register(Box::new(self.stream_sessions.clone()))?;
        registry.register(Box::new(self.search_failures.clone()))?;
        Ok(())
    }
}

pub struct PrometheusExporter {
    registry: Registry,
    metrics: ExporterMetrics,
    port: u16,
}

impl PrometheusExporter {
    pub fn new(store: PresenceStore, port: u16) -> Result<Self> {
        let registry = Registry::new();

        registry.register(Box::new(PresenceCollector::new(store)?))?;

        let metrics = ExporterMetrics::new()?;
        metrics.register(&registry)?;

        #[cfg(target_os = "linux")]
        {
            let process = prometheus::process_collector::ProcessCollector::for_self();
            registry.register(Box::new(process))?;
        }

        info!("Prometheus exporter configured for port {}", port);

        Ok(Self {
            registry,
            metrics,
            port,
        })
    }

    pub fn metrics(&self) -> ExporterMetrics {
        self.metrics.clone()
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    pub fn content_type(&self) -> String {
        TextEncoder::new().format_type().to_string()
    }

    /// Render every registered metric in the text exposition format
    pub fn format_current_metrics(&self) -> Result<String> {
        let encoder = TextEncoder::new();
        let metric_families = self.registry.gather();
        let mut buffer = Vec::new();
        encoder.encode(&metric_families, &mut buffer)?;
        String::from_utf8(buffer).map_err(|e| McwatchError::MetricsError(e.to_string()))
    }
}
