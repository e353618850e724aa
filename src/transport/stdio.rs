use crate::core::AggregateService;
use crate::core::protocol::{error_codes, JsonRpcResponse};
use crate::transport::traits::{Transport, TransportKind, TransportSession};
use crate::utils::errors::{McpError, McpResult};
use async_trait::async_trait;
use futures::{SinkExt, StreamExt};
use parking_lot::Mutex;
use std::sync::Arc;
use tokio::io::{AsyncRead, AsyncWrite, Stdin, Stdout};
use tokio::sync::mpsc;
use tokio::task::JoinSet;
use tokio_util::codec::{FramedRead, FramedWrite, LinesCodec, LinesCodecError};
use tracing::{debug, error, info, warn};

/// Longest accepted request line.
pub const MAX_LINE_LENGTH: usize = 16 * 1024 * 1024;

/// Stdio transport: newline-delimited JSON-RPC over a reader/writer pair
pub struct StdioTransport<R = Stdin, W = Stdout> {
    io: Mutex<Option<(R, W)>>,
}

impl StdioTransport {
    pub fn new() -> Self {
        Self::with_io(tokio::io::stdin(), tokio::io::stdout())
    }
}

impl Default for StdioTransport {
    fn default() -> Self {
        Self::new()
    }
}

impl<R, W> StdioTransport<R, W>
where
    R: AsyncRead + Unpin + Send + 'static,
    W: AsyncWrite + Unpin + Send + 'static,
{
    pub fn with_io(reader: R, writer: W) -> Self {
        Self {
            io: Mutex::new(Some((reader, writer))),
        }
    }
}

#[async_trait]
impl<R, W> Transport for StdioTransport<R, W>
where
    R: AsyncRead + Unpin + Send + 'static,
    W: AsyncWrite + Unpin + Send + 'static,
{
    fn kind(&self) -> TransportKind {
        TransportKind::Stdio
    }

    async fn bind(&self, service: Arc<AggregateService>) -> McpResult<Box<dyn TransportSession>> {
        let (reader, writer) = self
            .io
            .lock()
            .take()
            .ok_or_else(|| McpError::TransportError("stdio streams already bound".to_string()))?;

        info!("Stdio transport bound");
        Ok(Box::new(StdioSession {
            service,
            lines: Some(FramedRead::new(
                reader,
                LinesCodec::new_with_max_length(MAX_LINE_LENGTH),
            )),
            sink: Some(FramedWrite::new(writer, LinesCodec::new())),
        }))
    }
}

struct StdioSession<R, W> {
    service: Arc<AggregateService>,
    lines: Option<FramedRead<R, LinesCodec>>,
    sink: Option<FramedWrite<W, LinesCodec>>,
}

#[async_trait]
impl<R, W> TransportSession for StdioSession<R, W>
where
    R: AsyncRead + Unpin + Send + 'static,
    W: AsyncWrite + Unpin + Send + 'static,
{
    fn kind(&self) -> TransportKind {
        TransportKind::Stdio
    }

    async fn serve(&mut self) -> McpResult<()> {
        let (mut lines, mut sink) = match (self.lines.take(), self.sink.take()) {
            (Some(lines), Some(sink)) => (lines, sink),
            _ => {
                return Err(McpError::TransportError(
                    "stdio session already served".to_string(),
                ))
            }
        };

        // Responses are written by a single task so lines never interleave.
        let (tx, mut rx) = mpsc::channel::<String>(64);
        let writer = tokio::spawn(async move {
            while let Some(line) = rx.recv().await {
                debug!("Sending: {}", line);
                sink.send(line).await.map_err(codec_error)?;
            }
            Ok::<_, McpError>(())
        });

        let mut in_flight = JoinSet::new();
        while let Some(line) = lines.next().await {
            let line = match line {
                Ok(line) => line,
                Err(LinesCodecError::MaxLineLengthExceeded) => {
                    warn!("Discarding request line longer than {} bytes", MAX_LINE_LENGTH);
                    let response = JsonRpcResponse::error(
                        None,
                        error_codes::INVALID_REQUEST,
                        "Request line too long",
                    );
                    send_response(&tx, &response).await;
                    continue;
                }
                Err(LinesCodecError::Io(e)) => return Err(McpError::Io(e)),
            };

            if line.trim().is_empty() {
                continue;
            }
            debug!("Received: {}", line);

            let service = self.service.clone();
            let tx = tx.clone();
            spawn_request(&mut in_flight, async move {
                if let Some(response) = service.handle_message(&line).await {
                    send_response(&tx, &response).await;
                }
            });
        }

        while in_flight.join_next().await.is_some() {}
        drop(tx);

        writer
            .await
            .map_err(|e| McpError::InternalError(format!("stdio writer task failed: {}", e)))??;

        info!("Stdin closed, stdio session ended");
        Ok(())
    }
}

/// Spawn a request handler, first dropping handlers that already finished.
fn spawn_request<F>(in_flight: &mut JoinSet<()>, handler: F)
where
    F: std::future::Future<Output = ()> + Send + 'static,
{
    while let Some(finished) = in_flight.try_join_next() {
        if let Err(e) = finished {
            error!(error = %e, "Stdio request handler panicked");
        }
    }
    in_flight.spawn(handler);
}

async fn send_response(tx: &mpsc::Sender<String>, response: &JsonRpcResponse) {
    match serde_json::to_string(response) {
        Ok(json) => {
            if tx.send(json).await.is_err() {
                warn!("Stdio writer closed, dropping response");
            }
        }
        Err(e) => error!(error = %e, "Failed to serialize response"),
    }
}

fn codec_error(error: LinesCodecError) -> McpError {
    match error {
        LinesCodecError::Io(e) => McpError::Io(e),
        LinesCodecError::MaxLineLengthExceeded => {
            McpError::TransportError("response line too long".to_string())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_finished_handlers_are_reaped() {
        let mut in_flight = JoinSet::new();
        for _ in 0..100 {
            spawn_request(&mut in_flight, async {});
            for _ in 0..8 {
                tokio::task::yield_now().await;
            }
        }
        assert!(in_flight.len() <= 2, "{} handlers retained", in_flight.len());
    }
}
