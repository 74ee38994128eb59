//! Dispatcher queue state machine.
//!
//! The protocol carries no correlation identifier: a reply belongs to the
//! oldest unanswered command. [`DispatcherState`] enforces that structurally
//! by keeping at most one response-expecting command on the wire. Everything
//! else waits in order:
//!
//! - later response-expecting commands wait in `queue` behind the head;
//! - fire-and-forget lines issued while the head is outstanding wait in
//!   `deferred`. When a response-expecting command is queued it takes
//!   ownership of the lines deferred so far and writes them just before
//!   itself, so issue order is kept on the wire. Lines still deferred when
//!   the queue empties are flushed at once.
//!
//! The state is plain data; it does no I/O itself apart from calling the
//! supplied [`LineSink`] and never sleeps. The caller owns the clock:
//! [`DispatcherState::deadline`] says when [`DispatcherState::on_timeout`]
//! should be called.

use std::collections::VecDeque;
use std::mem;
use std::time::Duration;

use tokio::time::Instant;
use tracing::{debug, trace};

use crate::dispatcher::response::{Completion, Reply};
use crate::transport::LineSink;
use crate::Result;

/// A response-expecting command waiting for its reply.
#[derive(Debug)]
struct PendingCommand {
    line: String,
    completion: Completion,
    /// Fire-and-forget lines issued before this command; written just ahead
    /// of it.
    preceding: Vec<String>,
}

/// Queue of in-flight and waiting commands for one connection.
#[derive(Debug, Default)]
pub struct DispatcherState {
    queue: VecDeque<PendingCommand>,
    deferred: Vec<String>,
    deadline: Option<Instant>,
}

impl DispatcherState {
    /// Create an empty state.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether a response-expecting command is outstanding on the wire.
    #[must_use]
    pub fn is_draining(&self) -> bool {
        !self.queue.is_empty()
    }

    /// Number of response-expecting commands, including the head.
    #[must_use]
    pub fn queued(&self) -> usize {
        self.queue.len()
    }

    /// Number of fire-and-forget lines not yet written.
    #[must_use]
    pub fn deferred(&self) -> usize {
        self.deferred.len() + self.queue.iter().map(|p| p.preceding.len()).sum::<usize>()
    }

    /// When the head command times out, if one is in flight.
    #[must_use]
    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// Issue a fire-and-forget line.
    ///
    /// Written immediately when nothing is outstanding, otherwise deferred.
    ///
    /// # Errors
    ///
    /// Propagates the sink's error when an immediate write fails.
    pub fn submit_no_response(&mut self, line: String, sink: &mut impl LineSink) -> Result<()> {
        if self.is_draining() {
            trace!(line = line.as_str(), "dispatcher: deferring fire-and-forget line");
            self.deferred.push(line);
            return Ok(());
        }
        sink.write_line(line)
    }

    /// Issue a response-expecting line.
    ///
    /// Becomes the head and is written at once when the queue is empty;
    /// otherwise waits its turn. `timeout` is used only if this call puts a
    /// command on the wire.
    ///
    /// # Errors
    ///
    /// Propagates the sink's error when the write fails. The command stays
    /// queued and will resolve through [`DispatcherState::on_timeout`] or
    /// [`DispatcherState::abandon`].
    pub fn submit(
        &mut self,
        line: String,
        completion: Completion,
        timeout: Duration,
        sink: &mut impl LineSink,
    ) -> Result<()> {
        let preceding = mem::take(&mut self.deferred);
        self.queue.push_back(PendingCommand {
            line,
            completion,
            preceding,
        });

        if self.queue.len() == 1 {
            self.transmit_head(timeout, sink)
        } else {
            Ok(())
        }
    }

    /// Correlate an inbound line with the head command.
    ///
    /// Returns `Ok(false)` when nothing is outstanding; the line is an orphan
    /// and the caller should discard it.
    ///
    /// # Errors
    ///
    /// Propagates the sink's error if releasing the next command fails. The
    /// head has already been resolved at that point.
    pub fn on_line(
        &mut self,
        line: String,
        timeout: Duration,
        sink: &mut impl LineSink,
    ) -> Result<bool> {
        let Some(head) = self.queue.pop_front() else {
            return Ok(false);
        };
        self.deadline = None;
        head.completion.resolve(Reply::Line(line));
        self.advance(timeout, sink)?;
        Ok(true)
    }

    /// Resolve the head command with [`Reply::NoAnswer`] and move on.
    ///
    /// A no-op when nothing is outstanding.
    ///
    /// # Errors
    ///
    /// Propagates the sink's error if releasing the next command fails.
    pub fn on_timeout(&mut self, timeout: Duration, sink: &mut impl LineSink) -> Result<()> {
        let Some(head) = self.queue.pop_front() else {
            self.deadline = None;
            return Ok(());
        };
        self.deadline = None;
        debug!(command = head.line.as_str(), "dispatcher: no answer before timeout");
        head.completion.resolve(Reply::NoAnswer);
        self.advance(timeout, sink)
    }

    /// Drop every queued and deferred command.
    ///
    /// Pending callers observe [`AppError::Disconnected`](crate::AppError::Disconnected).
    /// Returns the number of response-expecting commands abandoned.
    pub fn abandon(&mut self) -> usize {
        let abandoned = self.queue.len();
        self.queue.clear();
        self.deferred.clear();
        self.deadline = None;
        abandoned
    }

    fn advance(&mut self, timeout: Duration, sink: &mut impl LineSink) -> Result<()> {
        if self.queue.is_empty() {
            for line in self.deferred.drain(..) {
                sink.write_line(line)?;
            }
            return Ok(());
        }
        self.transmit_head(timeout, sink)
    }

    fn transmit_head(&mut self, timeout: Duration, sink: &mut impl LineSink) -> Result<()> {
        let Some(head) = self.queue.front_mut() else {
            return Ok(());
        };

        for line in head.preceding.drain(..) {
            sink.write_line(line)?;
        }

        self.deadline = Some(Instant::now() + timeout);
        trace!(
            command = head.line.as_str(),
            timeout_ms = timeout.as_millis(),
            "dispatcher: transmitting head"
        );
        sink.write_line(head.line.clone())
    }
}
