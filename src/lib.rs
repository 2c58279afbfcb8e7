//! Coveo MCP Server Library
//!
//! This crate exposes the Coveo platform's search, passage retrieval and
//! generative answering APIs as Model Context Protocol (MCP) tools.
//!
//! # Architecture
//!
//! The server is organized into the following modules:
//!
//! - **core**: Core infrastructure including configuration, error handling, the main server
//!   and the transports (streamable HTTP, SSE, STDIO)
//! - **domains**: Business logic organized by bounded contexts
//!   - **coveo**: Remote client for the Coveo platform
//!   - **response**: Formatting of remote payloads into tool results
//!   - **tools**: The tool surface and its registry
//!
//! # Example
//!
//! ```rust,no_run
//! use coveo_mcp_server::core::{Config, McpServer, TransportService};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = Config::from_env();
//!     config.validate()?;
//!     let server = McpServer::new(config.clone())?;
//!     TransportService::new(config.transport).run(server).await?;
//!     Ok(())
//! }
//! ```

pub mod core;
pub mod domains;

// Re-export commonly used types for convenience
pub use core::{Config, Error, McpServer, Result};
