//! Domains module containing business logic organized by bounded contexts.
//!
//! - **coveo**: client for the remote search platform
//! - **response**: formatting of remote payloads into tool results
//! - **tools**: the tool surface exposed to MCP clients

pub mod coveo;
pub mod response;
pub mod tools;
