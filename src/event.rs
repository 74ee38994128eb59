//! Connection signals published to subscribers.

/// Signals observable through [`Client::subscribe`](crate::client::Client::subscribe).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    /// A connection was established.
    Connected,
    /// The connection closed, by request or by the peer.
    Disconnected,
    /// A raw inbound line, published whether or not it answered a command.
    Line(String),
    /// The stream failed after it was connected.
    TransportError(String),
}
