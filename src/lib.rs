#![forbid(unsafe_code)]

//! Pipelined client for line-delimited TCP control protocols.
//!
//! One socket, many callers, no request IDs: replies are matched to commands
//! strictly in the order the commands were sent.

pub mod client;
pub mod commands;
pub mod config;
pub mod dispatcher;
pub mod endpoint;
pub mod errors;
pub mod event;
pub mod transport;

pub use client::{Client, Issued, DEFAULT_RESPONSE_TIMEOUT};
pub use commands::Command;
pub use config::ClientConfig;
pub use dispatcher::{Reply, ResponseFuture};
pub use endpoint::Endpoint;
pub use errors::{AppError, Result};
pub use event::Event;
