use crate::{McwatchError, Result};
use async_trait::async_trait;
use serde::Deserialize;
use std::collections::HashMap;
use tracing::debug;

pub const DEFAULT_PROMETHEUS_URL: &str = "http://prometheus:9090";

/// One instant-vector sample from `/api/v1/query`
#[derive(Debug, Clone, Deserialize)]
pub struct Sample {
    #[serde(default)]
    pub metric: HashMap<String, String>,
    pub value: (f64, String),
}

impl Sample {
    pub fn as_f64(&self) -> Option<f64> {
        self.value.1.parse().ok()
    }

    pub fn label(&self, name: &str) -> Option<&str> {
        self.metric.get(name).map(String::as_str)
    }
}

#[derive(Debug, Deserialize)]
struct QueryResponse {
    status: String,
    #[serde(default)]
    data: Option<QueryData>,
    #[serde(default)]
    error: Option<String>,
}

#[derive(Debug, Deserialize)]
struct QueryData {
    #[serde(default)]
    result: Vec<Sample>,
}

#[async_trait]
pub trait MetricsQuery: Send + Sync {
    /// Run an instant query and return its first sample, if any
    async fn query(&self, promql: &str) -> Result<Option<Sample>>;
}

pub struct PrometheusClient {
    http: reqwest::Client,
    base_url: String,
}

impl PrometheusClient {
    pub fn new(base_url: &str) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }
}

#[async_trait]
impl MetricsQuery for PrometheusClient {
    async fn query(&self, promql: &str) -> Result<Option<Sample>> {
        debug!("Querying Prometheus: {}", promql);

        let response: QueryResponse = self
            .http
            .get(format!("{}/api/v1/query", self.base_url))
            .query(&[("query", promql)])
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        first_sample(response)
    }
}

fn first_sample(response: QueryResponse) -> Result<Option<Sample>> {
    if response.status != "success" {
        return Err(McwatchError::QueryError(
            response.error.unwrap_or_else(|| response.status.clone()),
        ));
    }

    Ok(response
        .data
        .and_then(|data| data.result.into_iter().next()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(body: &str) -> Result<Option<Sample>> {
        first_sample(serde_json::from_str(body).unwrap())
    }

    #[test]
    fn test_first_sample_is_returned() {
        let body = r#"{
            "status": "success",
            "data": {
                "resultType": "vector",
                "result": [
                    {"metric": {"server_version": "1.21.2"}, "value": [1714560000.123, "1"]},
                    {"metric": {}, "value": [1714560000.123, "0"]}
                ]
            }
        }"#;

        let sample = parse(body).unwrap().expect("Should have a sample");
        assert_eq!(sample.label("server_version"), Some("1.21.2"));
        assert_eq!(sample.as_f64(), Some(1.0));
    }

    #[test]
    fn test_empty_result_is_none() {
        let body = r#"{"status": "success", "data": {"resultType": "vector", "result": []}}"#;
        assert!(parse(body).unwrap().is_none());
    }

    #[test]
    fn test_error_status_is_error() {
        let body = r#"{"status": "error", "errorType": "bad_data", "error": "parse error"}"#;
        let err = parse(body).unwrap_err();
        assert!(err.to_string().contains("parse error"));
    }

    #[test]
    fn test_non_numeric_value() {
        let body = r#"{"status": "success", "data": {"result": [{"value": [0, "NaN?"]}]}}"#;
        let sample = parse(body).unwrap().unwrap();
        assert_eq!(sample.as_f64(), None);
    }

    #[test]
    fn test_base_url_trailing_slash() {
        assert_eq!(
            PrometheusClient::new("http://prometheus:9090/").base_url(),
            "http://prometheus:9090"
        );
    }
}
