//! HTTP server implementation.

use std::future::Future;
use std::net::SocketAddr;
use tokio::net::TcpListener;
use tracing::{error, info};

use super::router::{router, AppState};
use crate::error::{Result, ShelfError};

/// HTTP server for the book service.
pub struct HttpServer {
    /// Address to bind to
    addr: SocketAddr,
    /// Shared handler state
    state: AppState,
}

impl HttpServer {
    /// Create a new HTTP server.
    pub fn new(addr: SocketAddr, state: AppState) -> Self {
        Self { addr, state }
    }

    /// Start the HTTP server.
    ///
    /// This method will block until the server fails.
    pub async fn serve(self) -> Result<()> {
        self.serve_with_shutdown(std::future::pending()).await
    }

    /// Start the HTTP server with graceful shutdown.
    ///
    /// The server stops accepting connections when the provided signal
    /// resolves and returns once in-flight requests complete.
    pub async fn serve_with_shutdown<F>(self, signal: F) -> Result<()>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let listener = TcpListener::bind(self.addr).await.map_err(|e| {
            error!(addr = %self.addr, error = %e, "Failed to bind HTTP listener");
            ShelfError::Io(e)
        })?;

        info!(
            addr = %listener.local_addr()?,
            scope = %self.state.admission.scope(),
            "Starting HTTP server"
        );

        let app = router(self.state).into_make_service_with_connect_info::<SocketAddr>();

        axum::serve(listener, app)
            .with_graceful_shutdown(signal)
            .await
            .map_err(|e| {
                error!(error = %e, "HTTP server failed");
                ShelfError::Io(e)
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ratelimit::{AdmissionControl, LimitPolicy, LimiterScope, MonotonicClock};
    use crate::store::InMemoryBookStore;
    use std::sync::Arc;

    fn state() -> AppState {
        let admission = AdmissionControl::new(
            LimiterScope::PerRoute,
            LimitPolicy::default(),
            Arc::new(MonotonicClock),
        )
        .unwrap();
        AppState::new(Arc::new(InMemoryBookStore::new()), Arc::new(admission))
    }

    #[test]
    fn test_server_creation() {
        let addr: SocketAddr = "127.0.0.1:8080".parse().unwrap();
        let _server = HttpServer::new(addr, state());
    }

    #[tokio::test]
    async fn test_serve_stops_on_signal() {
        let addr: SocketAddr = "127.0.0.1:0".parse().unwrap();
        let server = HttpServer::new(addr, state());

        let result = server.serve_with_shutdown(async {}).await;
        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn test_bind_failure_is_io_error() {
        let taken = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = taken.local_addr().unwrap();

        let result = HttpServer::new(addr, state()).serve().await;
        assert!(matches!(result, Err(ShelfError::Io(_))));
    }
}
