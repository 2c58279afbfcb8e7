//! Transport configuration types.

use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::warn;

/// Transport configuration options.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum TransportConfig {
    /// Newline-delimited JSON-RPC over standard input/output.
    Stdio,

    /// Legacy server-sent events transport.
    Sse(HttpConfig),

    /// Streamable HTTP transport (default).
    StreamableHttp(HttpConfig),
}

/// Listener configuration shared by both HTTP-based transports.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HttpConfig {
    /// Port number to listen on.
    #[serde(default = "default_port")]
    pub port: u16,

    /// Host address to bind to.
    #[serde(default = "default_host")]
    pub host: String,

    /// Path for the streamable HTTP JSON-RPC endpoint.
    #[serde(default = "default_rpc_path")]
    pub rpc_path: String,

    /// Enable CORS for browser clients.
    #[serde(default = "default_cors")]
    pub enable_cors: bool,

    /// Streamable HTTP sessions idle for longer than this are dropped.
    #[serde(default = "default_session_ttl")]
    pub session_ttl_secs: u64,

    /// Upper bound on open streamable HTTP sessions.
    #[serde(default = "default_max_sessions")]
    pub max_sessions: usize,
}

fn default_port() -> u16 {
    8000
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_rpc_path() -> String {
    "/mcp".to_string()
}

fn default_cors() -> bool {
    true
}

fn default_session_ttl() -> u64 {
    1800
}

fn default_max_sessions() -> usize {
    10_000
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self::StreamableHttp(HttpConfig::default())
    }
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            port: default_port(),
            host: default_host(),
            rpc_path: default_rpc_path(),
            enable_cors: default_cors(),
            session_ttl_secs: default_session_ttl(),
            max_sessions: default_max_sessions(),
        }
    }
}

impl HttpConfig {
    /// Get the bind address.
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn session_ttl(&self) -> Duration {
        Duration::from_secs(self.session_ttl_secs)
    }
}

/// `true`, `1` and `yes` (any case) are truthy; everything else is not.
pub fn parse_flag(value: Option<&str>) -> bool {
    value
        .map(|v| matches!(v.trim().to_lowercase().as_str(), "true" | "1" | "yes"))
        .unwrap_or(false)
}

impl TransportConfig {
    /// Pick the transport from the two selection flags.
    ///
    /// Precedence is stdio, then SSE, then streamable HTTP.
    pub fn select(use_stdio: bool, use_sse: bool, http: HttpConfig) -> Self {
        if use_stdio {
            Self::Stdio
        } else if use_sse {
            Self::Sse(http)
        } else {
            Self::StreamableHttp(http)
        }
    }

    /// Build transport config from an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let use_stdio = parse_flag(lookup("USE_STDIO").as_deref());
        let use_sse = parse_flag(lookup("USE_SSE").as_deref());
        if use_stdio && use_sse {
            warn!("Both USE_STDIO and USE_SSE are set; stdio takes precedence");
        }

        let mut http = HttpConfig::default();

        if let Some(host) = lookup("MCP_HOST").filter(|h| !h.trim().is_empty()) {
            http.host = host.trim().to_string();
        }

        if let Some(port) = lookup("MCP_PORT") {
            match port.trim().parse::<u16>() {
                Ok(port) => http.port = port,
                Err(_) => warn!("Ignoring invalid MCP_PORT value: {}", port),
            }
        }

        if let Some(path) = lookup("MCP_HTTP_PATH").filter(|p| p.starts_with('/')) {
            http.rpc_path = path;
        }

        if let Some(cors) = lookup("MCP_HTTP_CORS") {
            http.enable_cors = cors.to_lowercase() != "false" && cors != "0";
        }

        if let Some(ttl) = lookup("MCP_SESSION_TTL_SECS") {
            match ttl.trim().parse::<u64>() {
                Ok(ttl) if ttl > 0 => http.session_ttl_secs = ttl,
                _ => warn!("Ignoring invalid MCP_SESSION_TTL_SECS value: {}", ttl),
            }
        }

        if let Some(max) = lookup("MCP_MAX_SESSIONS") {
            match max.trim().parse::<usize>() {
                Ok(max) if max > 0 => http.max_sessions = max,
                _ => warn!("Ignoring invalid MCP_MAX_SESSIONS value: {}", max),
            }
        }

        Self::select(use_stdio, use_sse, http)
    }

    /// Get a description of this transport for logging.
    pub fn description(&self) -> String {
        match self {
            Self::Stdio => "STDIO".to_string(),
            Self::Sse(cfg) => format!("SSE on {} (GET /sse, POST /messages)", cfg.address()),
            Self::StreamableHttp(cfg) => {
                format!("streamable HTTP on {}{}", cfg.address(), cfg.rpc_path)
            }
        }
    }
}
