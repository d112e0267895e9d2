pub mod collector;
pub mod exporter;
pub mod server;

pub use collector::PresenceCollector;
pub use exporter::{ExporterMetrics, PrometheusExporter, METRICS_PORT};
