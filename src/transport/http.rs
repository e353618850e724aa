//! Streamable HTTP transport
//!
//! The calling agent POSTs one JSON-RPC message per request to the MCP
//! endpoint and receives the response as the body. Only one MCP session
//! exists at a time: `initialize` opens it and returns its id in the
//! `Mcp-Session-Id` header, DELETE closes it.

use crate::config::settings::HttpSettings;
use crate::core::protocol::JsonRpcRequest;
use crate::core::AggregateService;
use crate::transport::traits::{Transport, TransportKind, TransportSession};
use crate::utils::errors::{McpError, McpResult};
use crate::utils::shutdown::shutdown_signal;
use async_trait::async_trait;
use axum::{
    extract::{Json, State},
    http::{HeaderMap, HeaderName, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Router,
};
use parking_lot::Mutex;
use serde_json::json;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{debug, info, warn};
use uuid::Uuid;

pub const SESSION_HEADER: &str = "mcp-session-id";

pub struct HttpTransport {
    settings: HttpSettings,
}

impl HttpTransport {
    pub fn new(settings: HttpSettings) -> Self {
        Self { settings }
    }
}

#[async_trait]
impl Transport for HttpTransport {
    fn kind(&self) -> TransportKind {
        TransportKind::StreamableHttp
    }

    async fn bind(&self, service: Arc<AggregateService>) -> McpResult<Box<dyn TransportSession>> {
        let addr = self.settings.addr.ok_or_else(|| {
            McpError::TransportNotConfigured(
                "no HTTP address configured (set MCP_SERVER_HTTP__ADDR or --http-addr)"
                    .to_string(),
            )
        })?;

        let listener = TcpListener::bind(addr)
            .await
            .map_err(|e| McpError::TransportError(format!("failed to bind {}: {}", addr, e)))?;
        let local_addr = listener.local_addr()?;

        info!(
            "Streamable HTTP transport listening on http://{}{}",
            local_addr, self.settings.path
        );

        Ok(Box::new(HttpSession {
            listener: Some(listener),
            app: router(service, &self.settings.path),
            local_addr,
        }))
    }
}

struct HttpSession {
    listener: Option<TcpListener>,
    app: Router,
    local_addr: SocketAddr,
}

#[async_trait]
impl TransportSession for HttpSession {
    fn kind(&self) -> TransportKind {
        TransportKind::StreamableHttp
    }

    fn local_addr(&self) -> Option<SocketAddr> {
        Some(self.local_addr)
    }

    async fn serve(&mut self) -> McpResult<()> {
        let listener = self
            .listener
            .take()
            .ok_or_else(|| McpError::TransportError("HTTP session already served".to_string()))?;
        axum::serve(listener, self.app.clone())
            .with_graceful_shutdown(shutdown_signal())
            .await?;
        info!("Streamable HTTP transport stopped");
        Ok(())
    }
}

pub struct HttpState {
    service: Arc<AggregateService>,
    session: Mutex<Option<String>>,
}

/// Why a request was refused at the session layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionRejection {
    AlreadyEstablished,
    Missing,
    Unknown,
}

impl IntoResponse for SessionRejection {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            SessionRejection::AlreadyEstablished => (
                StatusCode::CONFLICT,
                "a session is already established with another client",
            ),
            SessionRejection::Missing => (StatusCode::BAD_REQUEST, "missing Mcp-Session-Id header"),
            SessionRejection::Unknown => (StatusCode::NOT_FOUND, "unknown session"),
        };
        (
            status,
            Json(json!({ "error": "SESSION_ERROR", "message": message })),
        )
            .into_response()
    }
}

impl HttpState {
    fn open_session(&self) -> Result<String, SessionRejection> {
        let mut session = self.session.lock();
        if session.is_some() {
            return Err(SessionRejection::AlreadyEstablished);
        }
        let id = Uuid::new_v4().to_string();
        *session = Some(id.clone());
        info!(session = %id, "MCP session established");
        Ok(id)
    }

    /// Drop a session reserved by an `initialize` that did not succeed.
    fn release_session(&self, id: &str) {
        let mut session = self.session.lock();
        if session.as_deref() == Some(id) {
            session.take();
            debug!(session = %id, "Released session after failed initialize");
        }
    }

    fn check_session(&self, presented: Option<&str>) -> Result<(), SessionRejection> {
        match (self.session.lock().as_deref(), presented) {
            (None, None) => Ok(()),
            (None, Some(_)) => Err(SessionRejection::Unknown),
            (Some(_), None) => Err(SessionRejection::Missing),
            (Some(current), Some(presented)) if current == presented => Ok(()),
            (Some(_), Some(_)) => Err(SessionRejection::Unknown),
        }
    }

    fn close_session(&self, presented: Option<&str>) -> Result<(), SessionRejection> {
        self.check_session(presented)?;
        if let Some(id) = self.session.lock().take() {
            info!(session = %id, "MCP session closed");
        }
        Ok(())
    }
}

/// Build the HTTP router for `service`, with the MCP endpoint at `path`.
pub fn router(service: Arc<AggregateService>, path: &str) -> Router {
    let state = Arc::new(HttpState {
        service,
        session: Mutex::new(None),
    });

    Router::new()
        .route("/health", get(health))
        .route(path, post(mcp_handler).delete(close_handler))
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any)
                .expose_headers([HeaderName::from_static(SESSION_HEADER)]),
        )
        .with_state(state)
}

/// Health check endpoint
async fn health(State(state): State<Arc<HttpState>>) -> impl IntoResponse {
    let products: Vec<&str> = state
        .service
        .products()
        .iter()
        .map(|p| p.key())
        .collect();
    Json(json!({
        "status": "healthy",
        "version": env!("CARGO_PKG_VERSION"),
        "products": products,
    }))
}

async fn mcp_handler(
    State(state): State<Arc<HttpState>>,
    headers: HeaderMap,
    body: String,
) -> Response {
    let request = match serde_json::from_str::<JsonRpcRequest>(&body) {
        Ok(request) => request,
        Err(_) => {
            return match state.service.handle_message(&body).await {
                Some(response) => (StatusCode::BAD_REQUEST, Json(response)).into_response(),
                None => StatusCode::BAD_REQUEST.into_response(),
            };
        }
    };

    if request.method == "initialize" && request.id.is_some() {
        let id = match state.open_session() {
            Ok(id) => id,
            Err(rejection) => {
                warn!("Rejected initialize: session already established");
                return rejection.into_response();
            }
        };
        return match state.service.handle_request(request).await {
            Some(response) if response.error.is_none() => {
                ([(SESSION_HEADER, id)], Json(response)).into_response()
            }
            Some(response) => {
                state.release_session(&id);
                Json(response).into_response()
            }
            None => {
                state.release_session(&id);
                StatusCode::ACCEPTED.into_response()
            }
        };
    }

    if let Err(rejection) = state.check_session(session_id(&headers).as_deref()) {
        return rejection.into_response();
    }

    match state.service.handle_request(request).await {
        Some(response) => Json(response).into_response(),
        None => StatusCode::ACCEPTED.into_response(),
    }
}

async fn close_handler(State(state): State<Arc<HttpState>>, headers: HeaderMap) -> Response {
    match state.close_session(session_id(&headers).as_deref()) {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(rejection) => rejection.into_response(),
    }
}

fn session_id(headers: &HeaderMap) -> Option<String> {
    headers
        .get(SESSION_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(|s| s.to_string())
}
