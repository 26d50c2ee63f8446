//! Health Check Endpoint
//!
//! Liveness endpoint for container orchestrators and load balancers.
//!
//! # Endpoints
//!
//! - `GET /` - Returns `200 OK` with body `OK`

use std::net::SocketAddr;

use axum::{Router, http::StatusCode, response::IntoResponse, routing::get};
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;

/// Health check HTTP server.
///
/// Binding and serving are separate steps so a bind failure can stop
/// startup before anything else runs.
pub struct HealthServer {
    listener: TcpListener,
    cancel: CancellationToken,
}

impl HealthServer {
    /// Bind the listener on `0.0.0.0:port`.
    ///
    /// # Errors
    ///
    /// Returns `HealthServerError::BindFailed` if the port cannot be bound.
    pub async fn bind(port: u16, cancel: CancellationToken) -> Result<Self, HealthServerError> {
        let addr = SocketAddr::from(([0, 0, 0, 0], port));
        let listener = TcpListener::bind(addr)
            .await
            .map_err(|e| HealthServerError::BindFailed(port, e.to_string()))?;

        Ok(Self { listener, cancel })
    }

    /// Address the listener is bound to.
    ///
    /// # Errors
    ///
    /// Returns an error if the socket address cannot be read.
    pub fn local_addr(&self) -> std::io::Result<SocketAddr> {
        self.listener.local_addr()
    }

    /// Serve requests until cancelled.
    ///
    /// # Errors
    ///
    /// Returns `HealthServerError::ServerFailed` if the HTTP server stops
    /// with an error.
    pub async fn run(self) -> Result<(), HealthServerError> {
        if let Ok(addr) = self.listener.local_addr() {
            tracing::info!(%addr, "Health server listening");
        }

        axum::serve(self.listener, router())
            .with_graceful_shutdown(self.cancel.cancelled_owned())
            .await
            .map_err(|e| HealthServerError::ServerFailed(e.to_string()))?;

        tracing::info!("Health server stopped");
        Ok(())
    }
}

/// Router with the single liveness route.
pub fn router() -> Router {
    Router::new().route("/", get(liveness_handler))
}

async fn liveness_handler() -> impl IntoResponse {
    (StatusCode::OK, "OK")
}

/// Health server errors.
#[derive(Debug, thiserror::Error)]
pub enum HealthServerError {
    /// Failed to bind to port.
    #[error("failed to bind to port {0}: {1}")]
    BindFailed(u16, String),

    /// Server error.
    #[error("server error: {0}")]
    ServerFailed(String),
}

#[cfg(test)]
mod tests {
    use axum::body::Body;
    use axum::http::{Method, Request};
    use tower::ServiceExt;

    use super::*;

    async fn call(method: Method, uri: &str) -> (StatusCode, String) {
        let response = router()
            .oneshot(
                Request::builder()
                    .method(method)
                    .uri(uri)
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        let status = response.status();
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, String::from_utf8(body.to_vec()).unwrap())
    }

    #[tokio::test]
    async fn root_returns_ok() {
        assert_eq!(call(Method::GET, "/").await, (StatusCode::OK, "OK".to_string()));
    }

    #[tokio::test]
    async fn other_paths_are_not_found() {
        let (status, _) = call(Method::GET, "/healthz").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn non_get_is_rejected() {
        let (status, _) = call(Method::POST, "/").await;
        assert_eq!(status, StatusCode::METHOD_NOT_ALLOWED);
    }

    #[tokio::test]
    async fn second_bind_on_same_port_fails() {
        let cancel = CancellationToken::new();
        let first = HealthServer::bind(0, cancel.clone()).await.unwrap();
        let port = first.local_addr().unwrap().port();

        let err = HealthServer::bind(port, cancel).await.err().unwrap();

        assert!(matches!(err, HealthServerError::BindFailed(p, _) if p == port));
    }

    #[tokio::test]
    async fn serves_until_cancelled() {
        let cancel = CancellationToken::new();
        let server = HealthServer::bind(0, cancel.clone()).await.unwrap();
        let handle = tokio::spawn(server.run());

        cancel.cancel();

        assert!(handle.await.unwrap().is_ok());
    }
}
