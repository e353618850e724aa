use crate::core::AggregateService;
use crate::utils::errors::McpResult;
use async_trait::async_trait;
use std::fmt;
use std::net::SocketAddr;
use std::sync::Arc;

/// Transport type used to reach the calling agent
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportKind {
    /// Streamable HTTP: one JSON-RPC message per POST
    StreamableHttp,
    /// Newline-delimited JSON over stdin/stdout
    Stdio,
}

impl fmt::Display for TransportKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TransportKind::StreamableHttp => f.write_str("streamable-http"),
            TransportKind::Stdio => f.write_str("stdio"),
        }
    }
}

/// Binds the aggregate to the calling agent.
#[async_trait]
pub trait Transport: Send + Sync {
    fn kind(&self) -> TransportKind;

    /// Acquire the underlying channel. Failure here is what triggers the
    /// connector's fallback.
    async fn bind(&self, service: Arc<AggregateService>) -> McpResult<Box<dyn TransportSession>>;
}

/// A bound transport, ready to serve one calling agent.
#[async_trait]
pub trait TransportSession: Send {
    fn kind(&self) -> TransportKind;

    /// Local socket address, for network transports.
    fn local_addr(&self) -> Option<SocketAddr> {
        None
    }

    /// Serve requests until the channel closes.
    async fn serve(&mut self) -> McpResult<()>;
}
