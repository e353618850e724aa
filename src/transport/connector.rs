//! Primary/fallback transport selection
//!
//! The connector tries the primary transport once, then the fallback once.
//! There is no third attempt: when both fail, the caller gets both errors.

use crate::core::AggregateService;
use crate::transport::traits::{Transport, TransportKind, TransportSession};
use crate::utils::errors::McpError;
use std::fmt;
use std::sync::Arc;
use thiserror::Error;
use tracing::{error, info, warn};

/// One failed attempt to bind a transport.
#[derive(Debug)]
pub struct TransportFailure {
    pub transport: TransportKind,
    pub error: McpError,
}

impl fmt::Display for TransportFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} transport failed: {}", self.transport, self.error)
    }
}

/// Both transports failed.
#[derive(Debug, Error)]
#[error("no transport available ({primary}; {fallback})")]
pub struct ConnectFailure {
    pub primary: TransportFailure,
    pub fallback: TransportFailure,
}

/// Where the connector is in its attempt sequence.
#[derive(Debug)]
pub enum ConnectorState {
    PrimaryAttempt,
    FallbackAttempt { primary: TransportFailure },
}

pub enum ConnectOutcome {
    Connected {
        via: TransportKind,
        session: Box<dyn TransportSession>,
        /// Set when the session came from the fallback.
        primary_failure: Option<TransportFailure>,
    },
    Failed(ConnectFailure),
}

impl ConnectOutcome {
    pub fn is_connected(&self) -> bool {
        matches!(self, ConnectOutcome::Connected { .. })
    }
}

impl fmt::Debug for ConnectOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConnectOutcome::Connected {
                via,
                primary_failure,
                ..
            } => f
                .debug_struct("Connected")
                .field("via", via)
                .field("primary_failure", primary_failure)
                .finish_non_exhaustive(),
            ConnectOutcome::Failed(failure) => f.debug_tuple("Failed").field(failure).finish(),
        }
    }
}

pub struct TransportConnector {
    primary: Box<dyn Transport>,
    fallback: Box<dyn Transport>,
}

impl TransportConnector {
    pub fn new(primary: Box<dyn Transport>, fallback: Box<dyn Transport>) -> Self {
        Self { primary, fallback }
    }

    /// Bind `service` to the first transport that accepts it.
    pub async fn connect(&self, service: Arc<AggregateService>) -> ConnectOutcome {
        let mut state = ConnectorState::PrimaryAttempt;
        loop {
            state = match state {
                ConnectorState::PrimaryAttempt => {
                    match self.primary.bind(service.clone()).await {
                        Ok(session) => {
                            info!(transport = %self.primary.kind(), "Transport connected");
                            return ConnectOutcome::Connected {
                                via: self.primary.kind(),
                                session,
                                primary_failure: None,
                            };
                        }
                        Err(e) => {
                            let failure = TransportFailure {
                                transport: self.primary.kind(),
                                error: e,
                            };
                            warn!(
                                transport = %failure.transport,
                                error = %failure.error,
                                fallback = %self.fallback.kind(),
                                "Primary transport unavailable, falling back"
                            );
                            ConnectorState::FallbackAttempt { primary: failure }
                        }
                    }
                }
                ConnectorState::FallbackAttempt { primary } => {
                    return match self.fallback.bind(service.clone()).await {
                        Ok(session) => {
                            info!(transport = %self.fallback.kind(), "Transport connected");
                            ConnectOutcome::Connected {
                                via: self.fallback.kind(),
                                session,
                                primary_failure: Some(primary),
                            }
                        }
                        Err(e) => {
                            let fallback = TransportFailure {
                                transport: self.fallback.kind(),
                                error: e,
                            };
                            error!(
                                transport = %fallback.transport,
                                error = %fallback.error,
                                "Fallback transport failed"
                            );
                            ConnectOutcome::Failed(ConnectFailure { primary, fallback })
                        }
                    };
                }
            };
        }
    }
}
