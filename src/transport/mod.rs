//! TCP line transport.
//!
//! Turns one TCP stream into a source of line events and a sink for outbound
//! lines. Each connected [`Transport`] owns a pair of tasks:
//!
//! - `reader`: decodes inbound bytes with [`LineCodec`](codec::LineCodec) and
//!   emits [`TransportEvent`]s.
//! - `writer`: frames outbound lines and writes them to the socket.
//!
//! A transport serves exactly one socket. Reconnecting means calling
//! [`Transport::connect`] again and getting a fresh event channel.

pub mod codec;
pub mod reader;
pub mod writer;

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tokio::net::TcpStream;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info};

use crate::endpoint::Endpoint;
use crate::{AppError, Result};

use self::codec::LineCodec;

/// Events emitted by the transport reader and writer tasks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransportEvent {
    /// One inbound line, terminator removed.
    Line(String),
    /// The stream failed; a [`TransportEvent::Disconnected`] follows.
    Error(String),
    /// The stream is closed. Always the last event.
    Disconnected,
}

/// Outbound line sink.
///
/// The dispatcher writes through this trait so its queueing logic can be
/// exercised without a socket.
pub trait LineSink {
    /// Queue `line` for transmission. The terminator is added by the sink.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::NotConnected`] if the sink can no longer write.
    fn write_line(&mut self, line: String) -> Result<()>;
}

/// Handle to a connected TCP line stream.
///
/// Clones share the same stream. When every clone is dropped the writer task
/// tears the stream down.
#[derive(Debug, Clone)]
pub struct Transport {
    endpoint: Endpoint,
    line_tx: mpsc::UnboundedSender<String>,
    connected: Arc<AtomicBool>,
    cancel: CancellationToken,
    /// Cancelled by the writer task once it has drained and shut down.
    finished: CancellationToken,
}

impl Transport {
    /// Open a TCP stream to `endpoint` and start the reader and writer tasks.
    ///
    /// Resolves once the stream is connected. The returned receiver yields
    /// every [`TransportEvent`] for the lifetime of the stream and ends with
    /// [`TransportEvent::Disconnected`].
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Transport`] if the connection cannot be
    /// established (refused, unreachable, unresolvable host).
    pub async fn connect(
        endpoint: &Endpoint,
        max_line_bytes: usize,
    ) -> Result<(Self, mpsc::UnboundedReceiver<TransportEvent>)> {
        let stream = TcpStream::connect((endpoint.host(), endpoint.port()))
            .await
            .map_err(|err| AppError::Transport(format!("connect to {endpoint} failed: {err}")))?;

        if let Err(err) = stream.set_nodelay(true) {
            debug!(%endpoint, error = %err, "transport: could not disable nagle");
        }

        let (read_half, write_half) = stream.into_split();
        let (event_tx, event_rx) = mpsc::unbounded_channel();
        let (line_tx, line_rx) = mpsc::unbounded_channel();
        let connected = Arc::new(AtomicBool::new(true));
        let cancel = CancellationToken::new();
        let finished = CancellationToken::new();

        tokio::spawn(reader::run_reader(
            endpoint.to_string(),
            read_half,
            LineCodec::with_max_line_bytes(max_line_bytes),
            event_tx.clone(),
            Arc::clone(&connected),
            cancel.clone(),
        ));

        let writer_endpoint = endpoint.to_string();
        let writer_cancel = cancel.clone();
        let writer_finished = finished.clone();
        tokio::spawn(async move {
            if let Err(err) = writer::run_writer(
                writer_endpoint.clone(),
                write_half,
                LineCodec::with_max_line_bytes(max_line_bytes),
                line_rx,
                event_tx,
                writer_cancel,
            )
            .await
            {
                error!(endpoint = writer_endpoint, %err, "transport writer failed");
            }
            writer_finished.cancel();
        });

        info!(%endpoint, "transport connected");

        Ok((
            Self {
                endpoint: endpoint.clone(),
                line_tx,
                connected,
                cancel,
                finished,
            },
            event_rx,
        ))
    }

    /// Whether the stream is still open.
    #[must_use]
    pub fn is_connected(&self) -> bool {
        self.connected.load(Ordering::SeqCst)
    }

    /// Queue `line` for transmission.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::NotConnected`] once the stream has closed.
    pub fn write(&self, line: String) -> Result<()> {
        if !self.is_connected() {
            return Err(AppError::NotConnected);
        }
        self.line_tx.send(line).map_err(|_| AppError::NotConnected)
    }

    /// Tear down the stream.
    ///
    /// Returns `false` without doing anything when the stream is already
    /// closed. Lines already passed to [`Transport::write`] are still flushed
    /// by the writer task. The [`TransportEvent::Disconnected`] event is
    /// delivered asynchronously by the reader task.
    pub fn close(&self) -> bool {
        if !self.connected.swap(false, Ordering::SeqCst) {
            return false;
        }
        info!(endpoint = %self.endpoint, "transport closing");
        self.cancel.cancel();
        true
    }

    /// Wait until the writer task has flushed every accepted line and shut
    /// the socket down.
    ///
    /// Only resolves after the stream has been closed, either by
    /// [`Transport::close`] or by the peer.
    pub async fn closed(&self) {
        self.finished.cancelled().await;
    }

    /// Endpoint this transport is connected to.
    #[must_use]
    pub fn endpoint(&self) -> &Endpoint {
        &self.endpoint
    }
}

impl LineSink for Transport {
    fn write_line(&mut self, line: String) -> Result<()> {
        self.write(line)
    }
}

