//! Streamable HTTP transport implementation.
//!
//! One JSON-RPC message per `POST` on the RPC path. `initialize` opens a
//! session whose id is returned in the `Mcp-Session-Id` header; requests that
//! carry an unknown id are rejected with 404. Requests without the header are
//! served statelessly. Sessions idle for longer than the configured TTL are
//! swept, and the number of open sessions is capped.

use axum::{
    Json, Router,
    body::Bytes,
    extract::State,
    http::{HeaderMap, HeaderName, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
};
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use serde_json::{Value, json};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio_util::sync::CancellationToken;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing::{error, info, instrument, warn};
use uuid::Uuid;

use super::jsonrpc::{self, JsonRpcResponse};
use super::{TransportError, TransportResult, config::HttpConfig};
use crate::core::McpServer;

/// Header carrying the session id.
pub const SESSION_HEADER: &str = "mcp-session-id";

/// HTTP transport handler.
pub struct HttpTransport {
    config: HttpConfig,
}

/// Application state shared across HTTP handlers.
#[derive(Clone)]
pub struct AppState {
    /// The MCP server instance.
    server: McpServer,
    /// Open sessions keyed by id.
    sessions: Arc<DashMap<String, SessionState>>,
    /// Idle time after which a session is dropped.
    session_ttl: Duration,
    /// Maximum number of open sessions.
    max_sessions: usize,
}

/// Session state for a client.
#[derive(Debug, Clone)]
struct SessionState {
    protocol_version: String,
    created_at: DateTime<Utc>,
    last_seen: Instant,
}

impl AppState {
    pub fn new(server: McpServer, config: &HttpConfig) -> Self {
        Self {
            server,
            sessions: Arc::new(DashMap::new()),
            session_ttl: config.session_ttl(),
            max_sessions: config.max_sessions.max(1),
        }
    }

    /// Number of open sessions.
    pub fn session_count(&self) -> usize {
        self.sessions.len()
    }

    /// Drop every session idle for longer than the TTL. Returns how many went.
    pub fn evict_idle(&self) -> usize {
        let before = self.sessions.len();
        let ttl = self.session_ttl;
        self.sessions.retain(|_, session| session.last_seen.elapsed() < ttl);
        before.saturating_sub(self.sessions.len())
    }

    /// Refresh a session's idle timer. `false` if it is unknown or expired.
    fn touch(&self, id: &str) -> bool {
        let live = match self.sessions.get_mut(id) {
            Some(mut session) if session.last_seen.elapsed() < self.session_ttl => {
                session.last_seen = Instant::now();
                true
            }
            _ => false,
        };
        if !live {
            self.sessions.remove(id);
        }
        live
    }

    fn open_session(&self, protocol_version: String) -> String {
        if self.sessions.len() >= self.max_sessions {
            self.evict_idle();
        }
        while self.sessions.len() >= self.max_sessions {
            let oldest = self
                .sessions
                .iter()
                .min_by_key(|entry| entry.last_seen)
                .map(|entry| entry.key().clone());
            let Some(oldest) = oldest else { break };
            warn!("Session limit reached, closing least recent session {}", oldest);
            self.sessions.remove(&oldest);
        }

        let id = Uuid::new_v4().to_string();
        info!("Opened session {} ({})", id, protocol_version);
        self.sessions.insert(
            id.clone(),
            SessionState {
                protocol_version,
                created_at: Utc::now(),
                last_seen: Instant::now(),
            },
        );
        id
    }

    /// Sweep idle sessions periodically until `shutdown` is cancelled.
    fn spawn_sweeper(&self, shutdown: CancellationToken) {
        let state = self.clone();
        let period = self
            .session_ttl
            .min(Duration::from_secs(60))
            .max(Duration::from_secs(1));
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(period);
            loop {
                tokio::select! {
                    _ = shutdown.cancelled() => break,
                    _ = interval.tick() => {
                        let evicted = state.evict_idle();
                        if evicted > 0 {
                            info!("Evicted {} idle session(s)", evicted);
                        }
                    }
                }
            }
        });
    }
}

impl HttpTransport {
    /// Create a new HTTP transport with the given config.
    pub fn new(config: HttpConfig) -> Self {
        Self { config }
    }

    /// Run the HTTP transport until `shutdown` is cancelled.
    pub async fn run(self, server: McpServer, shutdown: CancellationToken) -> TransportResult<()> {
        let addr = self.config.address();
        let state = AppState::new(server, &self.config);
        let app = router(state.clone(), &self.config);

        let listener = tokio::net::TcpListener::bind(&addr)
            .await
            .map_err(|e| TransportError::bind(&addr, e))?;

        let cors_status = if self.config.enable_cors {
            "enabled"
        } else {
            "disabled"
        };
        info!(
            "Ready - listening on {} (streamable HTTP, CORS {})",
            addr, cors_status
        );
        info!("  → JSON-RPC: POST {}", self.config.rpc_path);
        info!("  → Health:   GET /health");

        state.spawn_sweeper(shutdown.clone());

        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown.cancelled_owned())
            .await
            .map_err(|e| TransportError::http(e.to_string()))?;

        info!("HTTP transport stopped");
        Ok(())
    }
}

/// Build the router for the streamable HTTP transport.
pub fn router(state: AppState, config: &HttpConfig) -> Router {
    let info = api_info(
        &state.server,
        "streamable_http",
        json!({
            "rpc": config.rpc_path,
            "health": "/health"
        }),
    );
    let app = Router::new()
        .route(
            &config.rpc_path,
            post(handle_rpc).delete(handle_delete_session),
        )
        .route("/health", get(health_check))
        .route("/", get(move || async move { Json(info) }))
        .with_state(state)
        .layer(TraceLayer::new_for_http());

    if config.enable_cors {
        app.layer(cors_layer())
    } else {
        app
    }
}

/// Permissive CORS that still exposes the session header to browsers.
pub(super) fn cors_layer() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any)
        .expose_headers([HeaderName::from_static(SESSION_HEADER)])
}

/// API info served on `/`, describing only the endpoints of one listener.
pub(super) fn api_info(server: &McpServer, transport: &str, endpoints: Value) -> Value {
    let tools: Vec<String> = server
        .list_tools()
        .into_iter()
        .map(|tool| tool.name.to_string())
        .collect();
    json!({
        "name": server.name(),
        "version": server.version(),
        "transport": transport,
        "endpoints": endpoints,
        "protocol": "JSON-RPC 2.0",
        "tools": tools
    })
}

/// Health check endpoint.
pub(super) async fn health_check() -> impl IntoResponse {
    Json(json!({
        "status": "healthy",
        "timestamp": Utc::now().to_rfc3339()
    }))
}

fn session_id(headers: &HeaderMap) -> Option<String> {
    headers
        .get(SESSION_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string)
}

fn rpc_error(status: StatusCode, response: JsonRpcResponse) -> Response {
    (status, Json(response)).into_response()
}

/// Handle one JSON-RPC message.
#[instrument(skip_all, fields(method, session))]
async fn handle_rpc(State(state): State<AppState>, headers: HeaderMap, body: Bytes) -> Response {
    let request = match jsonrpc::parse_message(&body) {
        Ok(request) => request,
        Err(response) => {
            warn!("Rejected malformed JSON-RPC message");
            return rpc_error(StatusCode::BAD_REQUEST, response);
        }
    };
    tracing::Span::current().record("method", request.method.as_str());

    let mut session = session_id(&headers);
    if let Some(id) = &session {
        tracing::Span::current().record("session", id.as_str());
        if !state.touch(id) {
            warn!("Unknown or expired session: {}", id);
            return rpc_error(
                StatusCode::NOT_FOUND,
                JsonRpcResponse::error(request.id, -32001, "Session not found"),
            );
        }
    }

    let is_initialize = request.method == "initialize";
    let request_id = request.id.clone();

    // Run the call on its own task so a client hanging up mid-request does not
    // cancel work already sent to the platform.
    let server = state.server.clone();
    let dispatched =
        tokio::spawn(async move { jsonrpc::dispatch(&server, request).await }).await;
    let response = match dispatched {
        Ok(response) => response,
        Err(e) => {
            error!("Request task failed: {}", e);
            Some(JsonRpcResponse::internal_error(request_id, "Request failed"))
        }
    };
    let Some(response) = response else {
        return StatusCode::ACCEPTED.into_response();
    };

    if is_initialize && response.error.is_none() {
        let protocol_version = response
            .result
            .as_ref()
            .and_then(|r| r["protocolVersion"].as_str())
            .unwrap_or_default()
            .to_string();
        session = Some(state.open_session(protocol_version));
    }

    let mut http_response = (StatusCode::OK, Json(response)).into_response();
    if let Some(value) = session.and_then(|id| HeaderValue::from_str(&id).ok()) {
        http_response.headers_mut().insert(SESSION_HEADER, value);
    }
    http_response
}

/// Terminate a session.
async fn handle_delete_session(State(state): State<AppState>, headers: HeaderMap) -> StatusCode {
    let Some(id) = session_id(&headers) else {
        return StatusCode::BAD_REQUEST;
    };

    match state.sessions.remove(&id) {
        Some((_, session)) => {
            info!(
                "Closed session {} ({}, opened {})",
                id,
                session.protocol_version,
                session.created_at.to_rfc3339()
            );
            StatusCode::NO_CONTENT
        }
        None => StatusCode::NOT_FOUND,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::Config;
    use crate::domains::coveo::stub::{StubApi, StubBehaviour};
    use axum::body::Body;
    use axum::http::{Method, Request};
    use http_body_util::BodyExt;
    use serde_json::{Value, json};
    use tower::ServiceExt;

    fn app() -> (Router, AppState) {
        app_with(HttpConfig::default())
    }

    fn app_with(config: HttpConfig) -> (Router, AppState) {
        let server = McpServer::with_api(
            Config::default(),
            Arc::new(StubApi::new(StubBehaviour::Succeed)),
        );
        let state = AppState::new(server, &config);
        (router(state.clone(), &config), state)
    }

    async fn initialize(app: &Router) -> String {
        let response = app.clone().oneshot(post_rpc(INITIALIZE, None)).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        response.headers()[SESSION_HEADER].to_str().unwrap().to_string()
    }

    const PING: &str = r#"{"jsonrpc":"2.0","id":9,"method":"ping"}"#;

    fn post_rpc(body: impl Into<String>, session: Option<&str>) -> Request<Body> {
        let mut builder = Request::builder()
            .method(Method::POST)
            .uri("/mcp")
            .header("content-type", "application/json");
        if let Some(id) = session {
            builder = builder.header(SESSION_HEADER, id);
        }
        builder.body(Body::from(body.into())).unwrap()
    }

    async fn json_body(response: Response) -> Value {
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        serde_json::from_slice(&bytes).unwrap()
    }

    const INITIALIZE: &str = r#"{"jsonrpc":"2.0","id":1,"method":"initialize","params":{"protocolVersion":"2025-03-26","capabilities":{},"clientInfo":{"name":"test","version":"0"}}}"#;

    #[tokio::test]
    async fn test_initialize_opens_session() {
        let (app, state) = app();
        let response = app.oneshot(post_rpc(INITIALIZE, None)).await.unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert!(response.headers().contains_key(SESSION_HEADER));
        assert_eq!(state.session_count(), 1);

        let body = json_body(response).await;
        assert_eq!(body["result"]["protocolVersion"], "2025-03-26");
    }

    #[tokio::test]
    async fn test_session_lifecycle() {
        let (app, state) = app();
        let response = app.clone().oneshot(post_rpc(INITIALIZE, None)).await.unwrap();
        let session = response.headers()[SESSION_HEADER].to_str().unwrap().to_string();

        let list = app
            .clone()
            .oneshot(post_rpc(
                r#"{"jsonrpc":"2.0","id":2,"method":"tools/list"}"#,
                Some(&session),
            ))
            .await
            .unwrap();
        assert_eq!(list.status(), StatusCode::OK);
        assert_eq!(list.headers()[SESSION_HEADER], session.as_str());
        let body = json_body(list).await;
        assert_eq!(body["result"]["tools"][0]["name"], "search_coveo");

        let delete = Request::builder()
            .method(Method::DELETE)
            .uri("/mcp")
            .header(SESSION_HEADER, &session)
            .body(Body::empty())
            .unwrap();
        let deleted = app.clone().oneshot(delete).await.unwrap();
        assert_eq!(deleted.status(), StatusCode::NO_CONTENT);
        assert_eq!(state.session_count(), 0);

        let stale = app
            .oneshot(post_rpc(
                r#"{"jsonrpc":"2.0","id":3,"method":"ping"}"#,
                Some(&session),
            ))
            .await
            .unwrap();
        assert_eq!(stale.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_stateless_tool_call() {
        let (app, _) = app();
        let response = app
            .oneshot(post_rpc(
                json!({
                    "jsonrpc": "2.0",
                    "id": 7,
                    "method": "tools/call",
                    "params": { "name": "answer_question", "arguments": { "query": "where?" } }
                })
                .to_string(),
                None,
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = json_body(response).await;
        assert_eq!(body["id"], 7);
        assert_eq!(body["result"]["isError"], false);
    }

    #[tokio::test]
    async fn test_notification_accepted() {
        let (app, _) = app();
        let response = app
            .oneshot(post_rpc(
                r#"{"jsonrpc":"2.0","method":"notifications/initialized"}"#,
                None,
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::ACCEPTED);
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        assert!(bytes.is_empty());
    }

    #[tokio::test]
    async fn test_malformed_json_is_parse_error() {
        let (app, _) = app();
        let response = app.oneshot(post_rpc("{oops", None)).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = json_body(response).await;
        assert_eq!(body["error"]["code"], -32700);
    }

    #[tokio::test]
    async fn test_get_rpc_path_not_allowed() {
        let (app, _) = app();
        let request = Request::builder()
            .method(Method::GET)
            .uri("/mcp")
            .body(Body::empty())
            .unwrap();
        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
    }

    #[tokio::test]
    async fn test_delete_without_session() {
        let (app, _) = app();
        let request = Request::builder()
            .method(Method::DELETE)
            .uri("/mcp")
            .body(Body::empty())
            .unwrap();
        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_health() {
        let (app, _) = app();
        let request = Request::builder()
            .uri("/health")
            .body(Body::empty())
            .unwrap();
        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(json_body(response).await["status"], "healthy");
    }

    #[tokio::test]
    async fn test_idle_session_expires() {
        let (_, mut state) = app();
        state.session_ttl = Duration::from_millis(50);
        let app = router(state.clone(), &HttpConfig::default());

        let session = initialize(&app).await;
        tokio::time::sleep(Duration::from_millis(100)).await;

        let stale = app.oneshot(post_rpc(PING, Some(&session))).await.unwrap();
        assert_eq!(stale.status(), StatusCode::NOT_FOUND);
        assert_eq!(json_body(stale).await["error"]["code"], -32001);
        assert_eq!(state.session_count(), 0);
    }

    #[tokio::test]
    async fn test_active_session_survives_sweep() {
        let (_, mut state) = app();
        state.session_ttl = Duration::from_millis(200);
        let app = router(state.clone(), &HttpConfig::default());

        let active = initialize(&app).await;
        let idle = initialize(&app).await;
        for _ in 0..4 {
            tokio::time::sleep(Duration::from_millis(80)).await;
            let response = app
                .clone()
                .oneshot(post_rpc(PING, Some(&active)))
                .await
                .unwrap();
            assert_eq!(response.status(), StatusCode::OK);
        }

        assert_eq!(state.evict_idle(), 1);
        assert_eq!(state.session_count(), 1);
        let gone = app.oneshot(post_rpc(PING, Some(&idle))).await.unwrap();
        assert_eq!(gone.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_session_cap_closes_least_recent() {
        let (app, state) = app_with(HttpConfig {
            max_sessions: 2,
            ..HttpConfig::default()
        });

        let first = initialize(&app).await;
        tokio::time::sleep(Duration::from_millis(5)).await;
        let second = initialize(&app).await;
        tokio::time::sleep(Duration::from_millis(5)).await;
        let third = initialize(&app).await;
        assert_eq!(state.session_count(), 2);

        let closed = app
            .clone()
            .oneshot(post_rpc(PING, Some(&first)))
            .await
            .unwrap();
        assert_eq!(closed.status(), StatusCode::NOT_FOUND);
        for session in [second, third] {
            let response = app
                .clone()
                .oneshot(post_rpc(PING, Some(&session)))
                .await
                .unwrap();
            assert_eq!(response.status(), StatusCode::OK);
        }
    }

    #[tokio::test]
    async fn test_root_reports_configured_rpc_path() {
        let (app, _) = app_with(HttpConfig {
            rpc_path: "/rpc".to_string(),
            ..HttpConfig::default()
        });
        let request = Request::builder().uri("/").body(Body::empty()).unwrap();
        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let info = json_body(response).await;
        assert_eq!(info["transport"], "streamable_http");
        assert_eq!(info["endpoints"]["rpc"], "/rpc");
        assert!(info["endpoints"].get("sse").is_none());
        assert_eq!(info["tools"][0], "search_coveo");
    }

    #[tokio::test]
    async fn test_tool_call_finishes_after_client_disconnects() {
        use tokio::io::AsyncWriteExt;

        let api = Arc::new(StubApi::new(StubBehaviour::Delay(Duration::from_millis(300))));
        let server = McpServer::with_api(Config::default(), api.clone());
        let config = HttpConfig::default();
        let app = router(AppState::new(server, &config), &config);

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move { axum::serve(listener, app).await });

        let body = json!({
            "jsonrpc": "2.0",
            "id": 1,
            "method": "tools/call",
            "params": { "name": "search_coveo", "arguments": { "query": "onboarding" } }
        })
        .to_string();
        let request = format!(
            "POST /mcp HTTP/1.1\r\nhost: {addr}\r\ncontent-type: application/json\r\ncontent-length: {}\r\n\r\n{body}",
            body.len()
        );

        let mut socket = tokio::net::TcpStream::connect(addr).await.unwrap();
        socket.write_all(request.as_bytes()).await.unwrap();
        tokio::time::sleep(Duration::from_millis(100)).await;
        drop(socket);

        tokio::time::sleep(Duration::from_millis(600)).await;
        assert_eq!(api.calls(), 1);
        assert_eq!(api.completed(), 1);
    }
}
