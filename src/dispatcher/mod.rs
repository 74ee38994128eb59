//! Pipelined command dispatcher.
//!
//! Serializes commands onto one connection and matches each inbound line to
//! the command that asked for it. The wire protocol has no request IDs, so
//! correlation is purely positional: the first unanswered command owns the
//! next line. See [`state`] for the queueing rules and [`actor`] for the task
//! that drives them.

pub mod actor;
pub mod response;
pub mod state;

pub use actor::{run_dispatcher, DispatchRequest};
pub use response::{response_channel, Completion, Reply, ResponseFuture};
pub use state::DispatcherState;
