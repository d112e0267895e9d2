use thiserror::Error;

#[derive(Error, Debug)]
pub enum McwatchError {
    #[error("Kubernetes error: {0}")]
    KubernetesError(String),

    #[error("No running pod matching {selector} in namespace {namespace}")]
    DiscoveryFailure { namespace: String, selector: String },

    #[error("Log stream interrupted: {0}")]
    StreamInterruption(String),

    #[error("Metrics error: {0}")]
    MetricsError(String),

    #[error("Prometheus query failed: {0}")]
    QueryError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

impl From<prometheus::Error> for McwatchError {
    fn from(e: prometheus::Error) -> Self {
        McwatchError::MetricsError(e.to_string())
    }
}

impl From<reqwest::Error> for McwatchError {
    fn from(e: reqwest::Error) -> Self {
        McwatchError::QueryError(e.to_string())
    }
}

pub type Result<T> = std::result::Result<T, McwatchError>;
