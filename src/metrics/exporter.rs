use crate::{PodscanError, Result};
use axum::extract::State;
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::Router;
use prometheus::{Encoder, Registry, TextEncoder};
use std::net::SocketAddr;
use tokio::net::TcpListener;
use tokio::task::JoinHandle;
use tracing::{error, info};

/// Serves the registry in Prometheus text format on `GET /metrics`.
pub struct PrometheusExporter {
    registry: Registry,
    port: u16,
}

impl PrometheusExporter {
    pub fn new(registry: Registry, port: u16) -> Self {
        Self { registry, port }
    }

    /// Bind the listener and serve in the background. Binding errors are
    /// returned directly; a later server failure is the task's output.
    pub async fn start(&self) -> Result<JoinHandle<Result<()>>> {
        let addr = SocketAddr::from(([0, 0, 0, 0], self.port));
        let listener = TcpListener::bind(addr).await?;

        info!("Starting Prometheus exporter on {}", addr);

        let app = router(self.registry.clone());
        Ok(tokio::spawn(async move {
            axum::serve(listener, app).await.map_err(|e| {
                error!("Metrics server failed: {}", e);
                PodscanError::IoError(e)
            })
        }))
    }

    pub fn format_metrics(&self) -> Result<String> {
        encode_registry(&self.registry)
    }
}

pub fn router(registry: Registry) -> Router {
    Router::new()
        .route("/metrics", get(metrics_handler))
        .with_state(registry)
}

async fn metrics_handler(State(registry): State<Registry>) -> Response {
    match encode_registry(&registry) {
        Ok(body) => (
            StatusCode::OK,
            [(header::CONTENT_TYPE, TextEncoder::new().format_type().to_string())],
            body,
        )
            .into_response(),
        Err(e) => {
            error!("Failed to encode metrics: {}", e);
            (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()).into_response()
        }
    }
}

pub fn encode_registry(registry: &Registry) -> Result<String> {
    let encoder = TextEncoder::new();
    let mut buffer = Vec::new();
    encoder
        .encode(&registry.gather(), &mut buffer)
        .map_err(|e| PodscanError::MetricsError(format!("Failed to encode metrics: {}", e)))?;

    String::from_utf8(buffer)
        .map_err(|e| PodscanError::MetricsError(format!("Metrics output is not UTF-8: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metrics::sink::{Gauge, MetricsSink, PrometheusSink};
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpStream;

    #[test]
    fn test_format_metrics_includes_help_and_type() {
        let registry = Registry::new();
        let sink = PrometheusSink::new(&registry).unwrap();
        sink.set(Gauge::ContainerImageCount, Some("nginx:1.25"), 3);

        let exporter = PrometheusExporter::new(registry, 0);
        let output = exporter.format_metrics().unwrap();

        assert!(output.contains("# HELP container_image_count"));
        assert!(output.contains("# TYPE container_image_count gauge"));
        assert!(output.contains("container_image_count{image=\"nginx:1.25\"} 3"));
    }

    #[tokio::test]
    async fn test_metrics_endpoint_serves_text() {
        let registry = Registry::new();
        let sink = PrometheusSink::new(&registry).unwrap();
        sink.set(Gauge::PodsPerNamespace, Some("default"), 5);

        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let app = router(registry);
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        let mut stream = TcpStream::connect(addr).await.unwrap();
        stream
            .write_all(b"GET /metrics HTTP/1.1\r\nHost: localhost\r\nConnection: close\r\n\r\n")
            .await
            .unwrap();
        let mut response = String::new();
        stream.read_to_string(&mut response).await.unwrap();

        assert!(response.starts_with("HTTP/1.1 200"));
        assert!(response.contains("pods_per_namespace{namespace=\"default\"} 5"));
    }
}
