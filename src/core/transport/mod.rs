//! Transport layer for the MCP server.
//!
//! This module provides three transport implementations, all compiled in and
//! selected at startup:
//! - **Streamable HTTP** (default): JSON-RPC over `POST /mcp` with sessions
//! - **SSE**: legacy `GET /sse` event stream plus `POST /messages`
//! - **STDIO**: newline-delimited JSON-RPC on stdin/stdout
//!
//! Each transport handles the connection lifecycle and delegates message
//! processing to the MCP server handler.

mod config;
mod error;
mod service;

pub mod http;
pub mod jsonrpc;
pub mod sse;
pub mod stdio;

pub use config::{HttpConfig, TransportConfig, parse_flag};
pub use error::{TransportError, TransportResult};
pub use service::TransportService;
