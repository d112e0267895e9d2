//! Scrape endpoint
//!
//! Serves the exposition text on `/metrics` (and `/`, which is what
//! collectors configured against the bare port hit). Runs independently of
//! the log pipeline.

use crate::metrics::exporter::PrometheusExporter;
use crate::Result;
use axum::extract::State;
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::Router;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::{debug, info, warn};

pub fn scrape_router(exporter: Arc<PrometheusExporter>) -> Router {
    Router::new()
        .route("/", get(scrape))
        .route("/metrics", get(scrape))
        .with_state(exporter)
}

async fn scrape(State(exporter): State<Arc<PrometheusExporter>>) -> Response {
    match exporter.format_current_metrics() {
        Ok(body) => {
            debug!("Served scrape ({} bytes)", body.len());
            (
                StatusCode::OK,
                [(header::CONTENT_TYPE, exporter.content_type())],
                body,
            )
                .into_response()
        }
        Err(e) => {
            warn!("Scrape failed: {}", e);
            (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()).into_response()
        }
    }
}

/// Bind the scrape port. Done up front so a taken port fails start-up.
pub async fn bind(port: u16) -> Result<TcpListener> {
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let listener = TcpListener::bind(addr).await?;
    info!("Prometheus metrics server listening on {}", addr);
    Ok(listener)
}

pub async fn serve(listener: TcpListener, exporter: Arc<PrometheusExporter>) -> Result<()> {
    axum::serve(listener, scrape_router(exporter)).await?;
    Ok(())
}
