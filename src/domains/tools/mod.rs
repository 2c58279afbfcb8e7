//! Tools domain module.
//!
//! This module handles all tool-related functionality for the MCP server.
//!
//! ## Architecture
//!
//! - `definitions/` - Individual tool implementations (one file per tool)
//! - `definition.rs` - Static tool/parameter declarations and validation
//! - `handlers.rs` - The `ToolHandler` trait and `ToolInvocation`
//! - `registry.rs` - Central tool registry and dispatch
//! - `error.rs` - Tool-specific error types

pub mod definition;
pub mod definitions;
mod error;
mod handlers;
mod registry;

pub use definition::{ParamKind, ParameterSpec, ToolDefinition, ValidatedArguments};
pub use error::ToolError;
pub use handlers::{ToolHandler, ToolInvocation};
pub use registry::ToolRegistry;
