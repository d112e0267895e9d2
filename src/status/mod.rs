//! Status API
//!
//! Small JSON service for the front-end. It summarises the game server's
//! player counts, version and container resource usage by querying
//! Prometheus, and keeps answering (with placeholder values) when any of
//! those series are missing.

pub mod api;
pub mod query;
pub mod report;

pub use api::status_router;
pub use query::{MetricsQuery, PrometheusClient, Sample, DEFAULT_PROMETHEUS_URL};
pub use report::{collect_status, ServerStatus};

pub const STATUS_PORT: u16 = 5000;
