//! Transport service - orchestrates different transport types.
//!
//! This service provides a unified interface for starting the MCP server
//! with the transport selected at startup, and owns process-wide shutdown.

use tokio_util::sync::CancellationToken;
use tracing::info;

use super::http::HttpTransport;
use super::sse::SseTransport;
use super::stdio::StdioTransport;
use super::{TransportConfig, TransportResult};
use crate::core::McpServer;

/// Transport service - manages the transport layer for the MCP server.
pub struct TransportService {
    config: TransportConfig,
}

impl TransportService {
    /// Create a new transport service with the given configuration.
    pub fn new(config: TransportConfig) -> Self {
        Self { config }
    }

    /// Start the transport with the given MCP server.
    ///
    /// Blocks until the client disconnects (STDIO) or a shutdown signal
    /// arrives.
    pub async fn run(self, server: McpServer) -> TransportResult<()> {
        let shutdown = CancellationToken::new();
        tokio::spawn({
            let shutdown = shutdown.clone();
            async move {
                shutdown_signal().await;
                info!("Shutdown signal received");
                shutdown.cancel();
            }
        });

        self.run_until(server, shutdown).await
    }

    /// Start the transport and stop when `shutdown` is cancelled.
    pub async fn run_until(
        self,
        server: McpServer,
        shutdown: CancellationToken,
    ) -> TransportResult<()> {
        info!("Starting transport: {}", self.config.description());

        match self.config {
            TransportConfig::Stdio => StdioTransport::run(server, shutdown).await,
            TransportConfig::Sse(cfg) => SseTransport::new(cfg).run(server, shutdown).await,
            TransportConfig::StreamableHttp(cfg) => {
                HttpTransport::new(cfg).run(server, shutdown).await
            }
        }
    }
}

/// Resolves on Ctrl-C or SIGTERM.
async fn shutdown_signal() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{SignalKind, signal};
        let mut sigterm = signal(SignalKind::terminate()).ok();

        tokio::select! {
            _ = tokio::signal::ctrl_c() => {},
            _ = async {
                if let Some(ref mut s) = sigterm {
                    s.recv().await;
                } else {
                    futures::future::pending::<()>().await;
                }
            } => {},
        }
    }

    #[cfg(not(unix))]
    {
        let _ = tokio::signal::ctrl_c().await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::Config;
    use crate::core::transport::{HttpConfig, TransportError};
    use crate::domains::coveo::stub::{StubApi, StubBehaviour};
    use std::sync::Arc;
    use std::time::Duration;

    fn server() -> McpServer {
        McpServer::with_api(
            Config::default(),
            Arc::new(StubApi::new(StubBehaviour::Succeed)),
        )
    }

    #[tokio::test]
    async fn test_http_stops_on_shutdown() {
        let http = HttpConfig {
            port: 0,
            ..HttpConfig::default()
        };
        let shutdown = CancellationToken::new();
        let handle = tokio::spawn(
            TransportService::new(TransportConfig::StreamableHttp(http))
                .run_until(server(), shutdown.clone()),
        );

        tokio::time::sleep(Duration::from_millis(50)).await;
        shutdown.cancel();
        let result = tokio::time::timeout(Duration::from_secs(5), handle)
            .await
            .unwrap()
            .unwrap();
        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn test_bind_failure_reported() {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let port = listener.local_addr().unwrap().port();
        let http = HttpConfig {
            port,
            ..HttpConfig::default()
        };

        let result = TransportService::new(TransportConfig::Sse(http))
            .run_until(server(), CancellationToken::new())
            .await;
        assert!(matches!(result, Err(TransportError::BindError { .. })));
    }
}
