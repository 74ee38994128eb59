//! Single-resolution reply channel for response-expecting commands.

use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};

use tokio::sync::oneshot;
use tracing::trace;

use crate::{AppError, Result};

/// Outcome of a response-expecting command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reply {
    /// The line the server sent back, terminator removed.
    Line(String),
    /// No line arrived before the response timeout elapsed.
    NoAnswer,
}

impl Reply {
    /// The reply text, or `None` for [`Reply::NoAnswer`].
    #[must_use]
    pub fn as_line(&self) -> Option<&str> {
        match self {
            Self::Line(line) => Some(line),
            Self::NoAnswer => None,
        }
    }

    /// Consume the reply, returning the text if there was one.
    #[must_use]
    pub fn into_line(self) -> Option<String> {
        match self {
            Self::Line(line) => Some(line),
            Self::NoAnswer => None,
        }
    }

    /// Whether the command timed out.
    #[must_use]
    pub fn is_no_answer(&self) -> bool {
        matches!(self, Self::NoAnswer)
    }
}

/// Create a linked completion / future pair.
#[must_use]
pub fn response_channel() -> (Completion, ResponseFuture) {
    let (tx, rx) = oneshot::channel();
    (Completion(tx), ResponseFuture(rx))
}

/// Sending side of a pending command's reply.
///
/// Consumed on resolution, so a command can only ever be resolved once.
/// Dropping it unresolved makes the paired [`ResponseFuture`] yield
/// [`AppError::Disconnected`].
#[derive(Debug)]
pub struct Completion(oneshot::Sender<Reply>);

impl Completion {
    /// Deliver `reply` to the waiting caller.
    ///
    /// A caller that already dropped its future is not an error; the reply
    /// is discarded.
    pub fn resolve(self, reply: Reply) {
        if self.0.send(reply).is_err() {
            trace!("dispatcher: caller dropped its response future, reply discarded");
        }
    }
}

/// Future resolving to the reply of a response-expecting command.
///
/// Resolves to `Ok(Reply::Line(..))` when the server answered,
/// `Ok(Reply::NoAnswer)` when the timeout won, and
/// `Err(AppError::Disconnected)` when the connection went away first.
#[derive(Debug)]
#[must_use = "the reply is only observable by awaiting the future"]
pub struct ResponseFuture(oneshot::Receiver<Reply>);

impl Future for ResponseFuture {
    type Output = Result<Reply>;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        Pin::new(&mut self.0)
            .poll(cx)
            .map(|received| received.map_err(|_| AppError::Disconnected))
    }
}
