//! Collaborator-facing client.
//!
//! [`Client`] ties an [`Endpoint`], a [`Transport`] and a dispatcher task
//! together. It validates commands synchronously and hands them to the
//! dispatcher, which decides when they reach the wire.
//!
//! All methods take `&self`; wrap the client in an [`Arc`](std::sync::Arc) to
//! issue commands from several tasks over the one connection.
//!
//! ```rust,ignore
//! let client = Client::new("127.0.0.1:16834")?;
//! client.connect().await?;
//! let reply = client.send("getcurrenttime")?.await?;
//! client.send_no_response("pause")?;
//! client.shutdown().await;
//! ```

use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use tokio::sync::{broadcast, mpsc, watch};
use tracing::{debug, info};

use crate::commands::Command;
use crate::config::ClientConfig;
use crate::dispatcher::{response_channel, run_dispatcher, DispatchRequest, ResponseFuture};
use crate::endpoint::Endpoint;
use crate::event::Event;
use crate::transport::codec::DEFAULT_MAX_LINE_BYTES;
use crate::transport::Transport;
use crate::{AppError, Result};

/// Response timeout used when none is configured.
pub const DEFAULT_RESPONSE_TIMEOUT: Duration = Duration::from_millis(100);

/// Capacity of the [`Event`] broadcast channel. Slow subscribers lag rather
/// than block the dispatcher.
const EVENT_CAPACITY: usize = 256;

/// Result of [`Client::issue`].
#[derive(Debug)]
#[must_use = "a response-expecting command only resolves through its future"]
pub enum Issued {
    /// The command expects a reply; await the future for it.
    Response(ResponseFuture),
    /// The command was accepted for fire-and-forget delivery.
    FireAndForget,
}

impl Issued {
    /// The reply future, if the command expects one.
    #[must_use]
    pub fn into_response(self) -> Option<ResponseFuture> {
        match self {
            Self::Response(future) => Some(future),
            Self::FireAndForget => None,
        }
    }
}

/// Live connection: transport handle plus the dispatcher's request channel.
#[derive(Debug)]
struct Session {
    transport: Transport,
    requests: mpsc::UnboundedSender<DispatchRequest>,
}

/// Pipelined client for one control server.
#[derive(Debug)]
pub struct Client {
    endpoint: Endpoint,
    max_line_bytes: usize,
    timeout: watch::Sender<Duration>,
    signals: broadcast::Sender<Event>,
    session: Mutex<Option<Session>>,
}

impl Client {
    /// Create a disconnected client for `endpoint` (`host:port`).
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Endpoint`] if `endpoint` is malformed.
    pub fn new(endpoint: &str) -> Result<Self> {
        Ok(Self::with_endpoint(Endpoint::parse(endpoint)?))
    }

    /// Create a disconnected client from an already parsed endpoint.
    #[must_use]
    pub fn with_endpoint(endpoint: Endpoint) -> Self {
        let (timeout, _) = watch::channel(DEFAULT_RESPONSE_TIMEOUT);
        let (signals, _) = broadcast::channel(EVENT_CAPACITY);
        Self {
            endpoint,
            max_line_bytes: DEFAULT_MAX_LINE_BYTES,
            timeout,
            signals,
            session: Mutex::new(None),
        }
    }

    /// Create a disconnected client from loaded configuration.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Endpoint`] if the configured endpoint is malformed.
    pub fn from_config(config: &ClientConfig) -> Result<Self> {
        let mut client = Self::new(&config.endpoint)?;
        client.max_line_bytes = config.max_line_bytes;
        client.set_response_timeout(config.response_timeout());
        Ok(client)
    }

    /// The endpoint this client connects to.
    #[must_use]
    pub fn endpoint(&self) -> &Endpoint {
        &self.endpoint
    }

    /// Current response timeout.
    #[must_use]
    pub fn response_timeout(&self) -> Duration {
        *self.timeout.borrow()
    }

    /// Change the response timeout.
    ///
    /// Applies to commands transmitted from now on; a command already on the
    /// wire keeps the deadline it was given.
    pub fn set_response_timeout(&self, timeout: Duration) {
        self.timeout.send_replace(timeout);
    }

    /// Subscribe to connection [`Event`]s.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<Event> {
        self.signals.subscribe()
    }

    /// Whether a connection is currently established.
    #[must_use]
    pub fn is_connected(&self) -> bool {
        self.lock_session()
            .as_ref()
            .is_some_and(|session| session.transport.is_connected())
    }

    /// Connect to the endpoint and start the dispatcher.
    ///
    /// Does nothing if already connected. A client whose previous connection
    /// closed gets a fresh transport and dispatcher state.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Transport`] if the connection cannot be
    /// established.
    pub async fn connect(&self) -> Result<()> {
        if self.is_connected() {
            debug!(endpoint = %self.endpoint, "client: already connected");
            return Ok(());
        }

        let (transport, events) = Transport::connect(&self.endpoint, self.max_line_bytes).await?;
        let (requests, request_rx) = mpsc::unbounded_channel();

        tokio::spawn(run_dispatcher(
            transport.clone(),
            events,
            request_rx,
            self.timeout.subscribe(),
            self.signals.clone(),
        ));

        let previous = self.lock_session().replace(Session {
            transport,
            requests,
        });
        if let Some(previous) = previous {
            // Lost a connect race; keep the newest connection.
            previous.transport.close();
        }

        let _ = self.signals.send(Event::Connected);
        info!(endpoint = %self.endpoint, "client connected");
        Ok(())
    }

    /// Close the connection.
    ///
    /// Returns `true` if a live connection was closed, `false` if there was
    /// nothing to close. The close is queued behind every command already
    /// accepted, so fire-and-forget lines issued before it still reach the
    /// wire. Commands still waiting for a reply resolve with
    /// [`AppError::Disconnected`] once the dispatcher observes the close.
    pub fn disconnect(&self) -> bool {
        self.close_session().is_some()
    }

    /// Close the connection and wait until every accepted line has been
    /// written and the socket shut down.
    ///
    /// Returns the same value as [`Client::disconnect`].
    pub async fn shutdown(&self) -> bool {
        let Some(transport) = self.close_session() else {
            return false;
        };
        transport.closed().await;
        true
    }

    /// Issue `command`.
    ///
    /// With `expect_response` the command is queued for FIFO correlation and
    /// [`Issued::Response`] carries its reply future. Without it the command
    /// is written as soon as no reply is outstanding, and
    /// [`Issued::FireAndForget`] is returned.
    ///
    /// # Errors
    ///
    /// - [`AppError::NotConnected`] if no connection is established.
    /// - [`AppError::InvalidCommand`] if `command` contains `\r` or `\n`.
    pub fn issue(&self, command: &str, expect_response: bool) -> Result<Issued> {
        if expect_response {
            self.send(command).map(Issued::Response)
        } else {
            self.send_no_response(command).map(|()| Issued::FireAndForget)
        }
    }

    /// Issue a response-expecting command.
    ///
    /// # Errors
    ///
    /// Same as [`Client::issue`].
    pub fn send(&self, command: &str) -> Result<ResponseFuture> {
        let (completion, future) = response_channel();
        self.submit(command, |line| DispatchRequest::Respond { line, completion })?;
        Ok(future)
    }

    /// Issue a fire-and-forget command.
    ///
    /// # Errors
    ///
    /// Same as [`Client::issue`].
    pub fn send_no_response(&self, command: &str) -> Result<()> {
        self.submit(command, |line| DispatchRequest::NoResponse { line })
    }

    /// Issue a typed protocol [`Command`].
    ///
    /// # Errors
    ///
    /// Same as [`Client::issue`].
    pub fn run(&self, command: &Command) -> Result<Issued> {
        self.issue(&command.wire(), command.expects_response())
    }

    fn submit(&self, command: &str, request: impl FnOnce(String) -> DispatchRequest) -> Result<()> {
        let guard = self.lock_session();
        let Some(session) = guard.as_ref().filter(|s| s.transport.is_connected()) else {
            return Err(AppError::NotConnected);
        };

        if command.contains(['\r', '\n']) {
            return Err(AppError::InvalidCommand(format!(
                "line terminator in command {command:?}"
            )));
        }

        session
            .requests
            .send(request(command.to_owned()))
            .map_err(|_| AppError::NotConnected)
    }

    fn close_session(&self) -> Option<Transport> {
        let session = self.lock_session().take()?;
        if !session.transport.is_connected() {
            return None;
        }

        if session.requests.send(DispatchRequest::Close).is_err() {
            // Dispatcher already gone; close the stream directly.
            session.transport.close();
        }
        info!(endpoint = %self.endpoint, "client disconnected");
        Some(session.transport)
    }

    fn lock_session(&self) -> MutexGuard<'_, Option<Session>> {
        self.session.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
