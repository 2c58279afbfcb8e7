//! Legacy SSE transport implementation.
//!
//! `GET /sse` opens an event stream whose first event (`endpoint`) tells the
//! client where to post messages. Each `POST /messages?session_id=...` is
//! acknowledged with 202 and its response is pushed on the stream as a
//! `message` event.

use axum::{
    Router,
    body::Bytes,
    extract::{Query, State},
    http::StatusCode,
    response::{
        IntoResponse, Response,
        sse::{Event, KeepAlive, Sse},
    },
    routing::{get, post},
};
use dashmap::DashMap;
use futures::{Stream, StreamExt, stream};
use serde::Deserialize;
use serde_json::json;
use std::convert::Infallible;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio_stream::wrappers::UnboundedReceiverStream;
use tokio_util::sync::CancellationToken;
use tower_http::trace::TraceLayer;
use tracing::{debug, info, warn};
use uuid::Uuid;

use super::http::{api_info, cors_layer, health_check};
use super::jsonrpc::{self, JsonRpcResponse};
use super::{TransportError, TransportResult, config::HttpConfig};
use crate::core::McpServer;

type SessionMap = DashMap<String, mpsc::UnboundedSender<JsonRpcResponse>>;

/// SSE transport handler.
pub struct SseTransport {
    config: HttpConfig,
}

/// State shared by the stream and message handlers.
#[derive(Clone)]
pub struct SseState {
    server: McpServer,
    sessions: Arc<SessionMap>,
    shutdown: CancellationToken,
}

impl SseState {
    pub fn new(server: McpServer, shutdown: CancellationToken) -> Self {
        Self {
            server,
            sessions: Arc::new(DashMap::new()),
            shutdown,
        }
    }

    /// Number of open event streams.
    pub fn session_count(&self) -> usize {
        self.sessions.len()
    }
}

/// Removes the session when its event stream is dropped.
struct SessionGuard {
    id: String,
    sessions: Arc<SessionMap>,
}

impl Drop for SessionGuard {
    fn drop(&mut self) {
        self.sessions.remove(&self.id);
        info!("SSE stream closed for session {}", self.id);
    }
}

#[derive(Debug, Deserialize)]
struct MessageQuery {
    #[serde(alias = "sessionId")]
    session_id: Option<String>,
}

impl SseTransport {
    pub fn new(config: HttpConfig) -> Self {
        Self { config }
    }

    /// Run the SSE transport until `shutdown` is cancelled.
    pub async fn run(self, server: McpServer, shutdown: CancellationToken) -> TransportResult<()> {
        let addr = self.config.address();
        let app = router(SseState::new(server, shutdown.clone()), &self.config);

        let listener = tokio::net::TcpListener::bind(&addr)
            .await
            .map_err(|e| TransportError::bind(&addr, e))?;

        info!("Ready - listening on {} (SSE)", addr);
        info!("  → Events:   GET /sse");
        info!("  → Messages: POST /messages?session_id=<id>");

        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown.cancelled_owned())
            .await
            .map_err(|e| TransportError::http(e.to_string()))?;

        info!("SSE transport stopped");
        Ok(())
    }
}

/// Build the router for the SSE transport.
pub fn router(state: SseState, config: &HttpConfig) -> Router {
    let info = api_info(
        &state.server,
        "sse",
        json!({
            "events": "/sse",
            "messages": "/messages",
            "health": "/health"
        }),
    );
    let app = Router::new()
        .route("/sse", get(handle_stream))
        .route("/messages", post(handle_message))
        .route("/health", get(health_check))
        .route("/", get(move || async move { axum::Json(info) }))
        .with_state(state)
        .layer(TraceLayer::new_for_http());

    if config.enable_cors {
        app.layer(cors_layer())
    } else {
        app
    }
}

async fn handle_stream(
    State(state): State<SseState>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let id = Uuid::new_v4().simple().to_string();
    let (tx, rx) = mpsc::unbounded_channel();
    state.sessions.insert(id.clone(), tx);
    info!("SSE stream opened for session {}", id);

    let endpoint = Event::default()
        .event("endpoint")
        .data(format!("/messages?session_id={id}"));
    let guard = SessionGuard {
        id,
        sessions: state.sessions.clone(),
    };

    let messages = UnboundedReceiverStream::new(rx).map(move |response| {
        let _guard = &guard;
        let payload = serde_json::to_string(&response).unwrap_or_default();
        Ok(Event::default().event("message").data(payload))
    });

    let events = stream::once(async move { Ok::<_, Infallible>(endpoint) })
        .chain(messages)
        .take_until(state.shutdown.cancelled_owned());

    Sse::new(events).keep_alive(KeepAlive::new().interval(Duration::from_secs(15)))
}

async fn handle_message(
    State(state): State<SseState>,
    Query(query): Query<MessageQuery>,
    body: Bytes,
) -> Response {
    let Some(id) = query.session_id else {
        return (StatusCode::BAD_REQUEST, "Missing session_id").into_response();
    };

    let Some(sender) = state.sessions.get(&id).map(|s| s.value().clone()) else {
        warn!("Message for unknown session: {}", id);
        return (StatusCode::NOT_FOUND, "Session not found").into_response();
    };

    let request = match jsonrpc::parse_message(&body) {
        Ok(request) => request,
        Err(response) => {
            warn!("Rejected malformed JSON-RPC message for session {}", id);
            return (StatusCode::BAD_REQUEST, axum::Json(response)).into_response();
        }
    };

    debug!("Session {} → {}", id, request.method);
    let server = state.server.clone();
    tokio::spawn(async move {
        let Some(response) = jsonrpc::dispatch(&server, request).await else {
            return;
        };
        if sender.send(response).is_err() {
            debug!("Session {} closed before its response was sent", id);
        }
    });

    (StatusCode::ACCEPTED, "Accepted").into_response()
}
