//! Dispatcher task.
//!
//! Owns the [`DispatcherState`] for one connection and is the only code that
//! writes to the transport. Callers reach it through an unbounded [`mpsc`]
//! channel of [`DispatchRequest`]s, so queue mutation and socket writes are
//! serialized on this task without locks.
//!
//! Each loop iteration waits on exactly one of:
//!
//! | Source                   | Effect                                         |
//! |--------------------------|------------------------------------------------|
//! | transport `Line`         | resolve the head, release the next command     |
//! | head deadline            | resolve the head with `NoAnswer`, release next |
//! | caller request           | write now or queue/defer                       |
//! | caller `Close`           | close the transport after earlier requests     |
//! | transport `Error`        | publish `TransportError`                       |
//! | transport `Disconnected` | abandon everything and stop                    |
//!
//! The line and the deadline race inside one `select!`; whichever branch runs
//! first clears the deadline, so the other can no longer fire for that head.

use std::time::Duration;

use tokio::sync::{broadcast, mpsc, watch};
use tokio::time::{sleep_until, Instant};
use tracing::{debug, info, warn};

use crate::dispatcher::response::Completion;
use crate::dispatcher::state::DispatcherState;
use crate::event::Event;
use crate::transport::{Transport, TransportEvent};

/// Work submitted to the dispatcher task.
#[derive(Debug)]
pub enum DispatchRequest {
    /// A command whose reply must be correlated.
    Respond {
        /// Wire text, terminator excluded.
        line: String,
        /// Where the reply goes.
        completion: Completion,
    },
    /// A fire-and-forget command.
    NoResponse {
        /// Wire text, terminator excluded.
        line: String,
    },
    /// Close the connection once every earlier request has been handled.
    Close,
}

/// Dispatcher task: correlates replies for one connection until it closes.
///
/// Runs until the transport reports [`TransportEvent::Disconnected`]. When
/// every request sender has been dropped the transport is closed, which
/// leads to the same exit. On exit all outstanding commands are abandoned,
/// their callers observe [`AppError::Disconnected`](crate::AppError::Disconnected),
/// and [`Event::Disconnected`] is published.
pub async fn run_dispatcher(
    mut transport: Transport,
    mut events: mpsc::UnboundedReceiver<TransportEvent>,
    mut requests: mpsc::UnboundedReceiver<DispatchRequest>,
    timeout: watch::Receiver<Duration>,
    signals: broadcast::Sender<Event>,
) {
    let endpoint = transport.endpoint().to_string();
    let mut state = DispatcherState::new();
    let mut requests_open = true;

    loop {
        let deadline = state.deadline();

        tokio::select! {
            biased;

            event = events.recv() => {
                match event {
                    Some(TransportEvent::Line(line)) => {
                        // No subscribers is fine.
                        let _ = signals.send(Event::Line(line.clone()));
                        let current = *timeout.borrow();
                        match state.on_line(line, current, &mut transport) {
                            Ok(true) => {}
                            Ok(false) => {
                                debug!(endpoint, "dispatcher: orphan line discarded");
                            }
                            Err(err) => {
                                warn!(endpoint, %err, "dispatcher: releasing next command failed");
                            }
                        }
                    }
                    Some(TransportEvent::Error(message)) => {
                        warn!(endpoint, error = message.as_str(), "dispatcher: transport error");
                        let _ = signals.send(Event::TransportError(message));
                    }
                    Some(TransportEvent::Disconnected) | None => {
                        debug!(endpoint, "dispatcher: transport closed, stopping");
                        break;
                    }
                }
            }

            () = sleep_until(deadline.unwrap_or_else(Instant::now)), if deadline.is_some() => {
                let current = *timeout.borrow();
                if let Err(err) = state.on_timeout(current, &mut transport) {
                    warn!(endpoint, %err, "dispatcher: releasing next command failed");
                }
            }

            request = requests.recv(), if requests_open => {
                let Some(request) = request else {
                    debug!(endpoint, "dispatcher: all handles dropped, closing transport");
                    requests_open = false;
                    transport.close();
                    continue;
                };

                let outcome = match request {
                    DispatchRequest::Respond { line, completion } => {
                        let current = *timeout.borrow();
                        state.submit(line, completion, current, &mut transport)
                    }
                    DispatchRequest::NoResponse { line } => {
                        state.submit_no_response(line, &mut transport)
                    }
                    DispatchRequest::Close => {
                        debug!(endpoint, "dispatcher: close requested");
                        transport.close();
                        Ok(())
                    }
                };

                if let Err(err) = outcome {
                    warn!(endpoint, %err, "dispatcher: write failed");
                }
            }
        }
    }

    let abandoned = state.abandon();
    if abandoned > 0 {
        info!(endpoint, abandoned, "dispatcher: pending commands abandoned on disconnect");
    }
    let _ = signals.send(Event::Disconnected);
}
