//! STDIO transport implementation.
//!
//! Newline-delimited JSON-RPC on stdin/stdout, served by rmcp. Logging goes
//! to stderr so stdout only ever carries protocol messages.

use rmcp::ServiceExt;
use rmcp::service::ServerInitializeError;
use tokio::io::{AsyncRead, AsyncWrite};
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use super::{TransportError, TransportResult};
use crate::core::McpServer;

/// STDIO transport handler.
pub struct StdioTransport;

impl StdioTransport {
    /// Run the STDIO transport until the client disconnects or `shutdown` is
    /// cancelled.
    pub async fn run(server: McpServer, shutdown: CancellationToken) -> TransportResult<()> {
        info!("Ready - communicating via stdin/stdout");
        let (stdin, stdout) = rmcp::transport::stdio();
        Self::serve_io(server, stdin, stdout, shutdown).await
    }

    /// Serve one MCP session over an arbitrary reader/writer pair.
    pub async fn serve_io<R, W>(
        server: McpServer,
        reader: R,
        writer: W,
        shutdown: CancellationToken,
    ) -> TransportResult<()>
    where
        R: AsyncRead + Send + Unpin + 'static,
        W: AsyncWrite + Send + Unpin + 'static,
    {
        let service = tokio::select! {
            service = server.serve_with_ct((reader, writer), shutdown.child_token()) => {
                match service {
                    Ok(service) => service,
                    Err(ServerInitializeError::ConnectionClosed(context)) => {
                        warn!("Client disconnected before initializing ({})", context);
                        return Ok(());
                    }
                    Err(e) => return Err(TransportError::init(e.to_string())),
                }
            }
            _ = shutdown.cancelled() => {
                info!("Shutdown requested before the client initialized");
                return Ok(());
            }
        };

        let reason = service
            .waiting()
            .await
            .map_err(|e| TransportError::service(e.to_string()))?;

        info!("STDIO transport finished: {:?}", reason);
        Ok(())
    }
}
