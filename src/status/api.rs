use crate::status::query::MetricsQuery;
use crate::status::report::{collect_status, ServerStatus};
use crate::Result;
use axum::extract::State;
use axum::response::Json;
use axum::routing::get;
use axum::Router;
use serde_json::{json, Value};
use std::net::SocketAddr;
use std::sync::Arc;
use tracing::info;

pub type SharedQuery = Arc<dyn MetricsQuery>;

pub fn status_router(prometheus: SharedQuery) -> Router {
    Router::new()
        .route("/", get(health))
        .route("/api/status", get(status))
        .with_state(prometheus)
}

async fn health() -> Json<Value> {
    Json(json!({
        "message": "Minecraft Monitor API OK",
        "status": "Running"
    }))
}

async fn status(State(prometheus): State<SharedQuery>) -> Json<ServerStatus> {
    Json(collect_status(prometheus.as_ref()).await)
}

pub async fn serve(prometheus: SharedQuery, port: u16) -> Result<()> {
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let listener = tokio::net::TcpListener::bind(addr).await?;

    info!("Status API listening on {}", addr);

    axum::serve(listener, status_router(prometheus)).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::status::query::Sample;
    use crate::status::report::PLAYERS_ONLINE_QUERY;
    use async_trait::async_trait;
    use axum::body::{to_bytes, Body};
    use axum::http::{Request, StatusCode};
    use std::collections::HashMap;
    use tower::ServiceExt;

    struct OnlyPlayers;

    #[async_trait]
    impl MetricsQuery for OnlyPlayers {
        async fn query(&self, promql: &str) -> Result<Option<Sample>> {
            if promql == PLAYERS_ONLINE_QUERY {
                Ok(Some(Sample {
                    metric: HashMap::new(),
                    value: (0.0, "4".to_string()),
                }))
            } else {
                Ok(None)
            }
        }
    }

    async fn get_json(uri: &str) -> (StatusCode, Value) {
        let router = status_router(Arc::new(OnlyPlayers));
        let response = router
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn test_health() {
        let (status, body) = get_json("/").await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["message"], "Minecraft Monitor API OK");
        assert_eq!(body["status"], "Running");
    }

    #[tokio::test]
    async fn test_status_document() {
        let (status, body) = get_json("/api/status").await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "Online");
        assert_eq!(body["players"]["online"], 4);
        assert_eq!(body["players"]["max"], 0);
        assert_eq!(body["server"]["version"], "Unknown");
        assert_eq!(body["server"]["memory_percent"], "N/A");
    }
}
