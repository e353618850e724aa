use crate::core::protocol::error_codes;
use crate::core::Product;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

/// Exit status when no product could be activated.
pub const EXIT_NO_INTEGRATIONS: i32 = 1;
/// Exit status for every other fatal startup failure.
pub const EXIT_STARTUP_FAILURE: i32 = 2;

#[derive(Error, Debug)]
pub enum McpError {
    #[error("configuration error: {0}")]
    ConfigError(String),

    #[error(
        "No products were configured. Please provide at least one of the required configuration options."
    )]
    NoIntegrations,

    #[error("{product} initialization failed: {message}")]
    Initialization { product: Product, message: String },

    #[error("tool '{tool}' from {incoming} conflicts with the tool already registered by {existing}")]
    RegistrationConflict {
        tool: String,
        existing: Product,
        incoming: Product,
    },

    #[error("resource '{uri}' from {incoming} conflicts with the resource already registered by {existing}")]
    ResourceConflict {
        uri: String,
        existing: Product,
        incoming: Product,
    },

    #[error("transport error: {0}")]
    TransportError(String),

    #[error("transport not configured: {0}")]
    TransportNotConfigured(String),

    #[error("tool not found: {0}")]
    ToolNotFound(String),

    #[error("resource not found: {0}")]
    ResourceNotFound(String),

    #[error("invalid params: {0}")]
    InvalidParams(String),

    #[error("upstream returned {status}: {message}")]
    Upstream { status: u16, message: String },

    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("internal error: {0}")]
    InternalError(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl From<anyhow::Error> for McpError {
    fn from(e: anyhow::Error) -> Self {
        McpError::InternalError(e.to_string())
    }
}

impl From<figment::Error> for McpError {
    fn from(e: figment::Error) -> Self {
        McpError::ConfigError(e.to_string())
    }
}

impl From<url::ParseError> for McpError {
    fn from(e: url::ParseError) -> Self {
        McpError::ConfigError(format!("invalid URL: {}", e))
    }
}

impl McpError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::ToolNotFound(_) | Self::ResourceNotFound(_) => StatusCode::NOT_FOUND,
            Self::InvalidParams(_) | Self::Serialization(_) => StatusCode::BAD_REQUEST,
            Self::Upstream { .. } | Self::Http(_) | Self::TransportError(_) => {
                StatusCode::BAD_GATEWAY
            }
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn error_code(&self) -> &'static str {
        match self {
            Self::ConfigError(_) => "CONFIG_ERROR",
            Self::NoIntegrations => "NO_INTEGRATIONS",
            Self::Initialization { .. } => "INITIALIZATION_ERROR",
            Self::RegistrationConflict { .. } => "REGISTRATION_CONFLICT",
            Self::ResourceConflict { .. } => "RESOURCE_CONFLICT",
            Self::TransportError(_) => "TRANSPORT_ERROR",
            Self::TransportNotConfigured(_) => "TRANSPORT_NOT_CONFIGURED",
            Self::ToolNotFound(_) => "TOOL_NOT_FOUND",
            Self::ResourceNotFound(_) => "RESOURCE_NOT_FOUND",
            Self::InvalidParams(_) => "INVALID_PARAMS",
            Self::Upstream { .. } => "UPSTREAM_ERROR",
            Self::Http(_) => "HTTP_ERROR",
            Self::InternalError(_) => "INTERNAL_ERROR",
            Self::Io(_) => "IO_ERROR",
            Self::Serialization(_) => "SERIALIZATION_ERROR",
        }
    }

    /// JSON-RPC error code used when this error is returned to the calling agent.
    pub fn jsonrpc_code(&self) -> i32 {
        match self {
            Self::ToolNotFound(_) | Self::ResourceNotFound(_) | Self::InvalidParams(_) => {
                error_codes::INVALID_PARAMS
            }
            Self::Serialization(_) => error_codes::PARSE_ERROR,
            _ => error_codes::INTERNAL_ERROR,
        }
    }

    /// Process exit status for a fatal startup error.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::NoIntegrations => EXIT_NO_INTEGRATIONS,
            _ => EXIT_STARTUP_FAILURE,
        }
    }
}

impl IntoResponse for McpError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let body = Json(json!({
            "error": self.error_code(),
            "message": self.to_string(),
        }));

        (status, body).into_response()
    }
}

pub type McpResult<T> = Result<T, McpError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exit_codes() {
        assert_eq!(McpError::NoIntegrations.exit_code(), 1);
        assert_eq!(
            McpError::Initialization {
                product: Product::Bugsnag,
                message: "401".to_string(),
            }
            .exit_code(),
            2
        );
    }

    #[test]
    fn test_conflict_message_names_both_products() {
        let err = McpError::RegistrationConflict {
            tool: "status".to_string(),
            existing: Product::Reflect,
            incoming: Product::Zephyr,
        };
        let message = err.to_string();
        assert!(message.contains("status"));
        assert!(message.contains("Reflect"));
        assert!(message.contains("Zephyr"));
    }

    #[test]
    fn test_jsonrpc_codes() {
        assert_eq!(
            McpError::ToolNotFound("x".into()).jsonrpc_code(),
            error_codes::INVALID_PARAMS
        );
        assert_eq!(
            McpError::InternalError("x".into()).jsonrpc_code(),
            error_codes::INTERNAL_ERROR
        );
    }
}
