//! Error types shared across the client.

use std::fmt::{Display, Formatter};

/// Shared client result type.
pub type Result<T> = std::result::Result<T, AppError>;

/// Client error enumeration covering all failure modes.
#[derive(Debug)]
pub enum AppError {
    /// Configuration parsing or validation failure.
    Config(String),
    /// Malformed `host:port` endpoint string.
    Endpoint(String),
    /// Command issued while no connection is established.
    NotConnected,
    /// Command text would smuggle a second line onto the wire.
    InvalidCommand(String),
    /// Underlying stream failure (refused, reset, framing).
    Transport(String),
    /// The connection closed before a pending command was answered.
    Disconnected,
    /// File-system or I/O operation failure.
    Io(String),
}

impl Display for AppError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Config(msg) => write!(f, "config: {msg}"),
            Self::Endpoint(msg) => write!(f, "endpoint: {msg}"),
            Self::NotConnected => write!(f, "not connected"),
            Self::InvalidCommand(msg) => write!(f, "invalid command: {msg}"),
            Self::Transport(msg) => write!(f, "transport: {msg}"),
            Self::Disconnected => write!(f, "disconnected before a reply arrived"),
            Self::Io(msg) => write!(f, "io: {msg}"),
        }
    }
}

impl std::error::Error for AppError {}

impl From<toml::de::Error> for AppError {
    fn from(err: toml::de::Error) -> Self {
        Self::Config(format!("invalid config: {err}"))
    }
}

impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err.to_string())
    }
}
