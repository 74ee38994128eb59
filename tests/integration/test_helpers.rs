//! Shared helpers for socket-level integration tests.
//!
//! Provides a fake control server bound to an ephemeral loopback port and a
//! [`Peer`] wrapper around the accepted connection, so individual test
//! modules can script the server side line by line.

use std::time::Duration;

use splitlink::Client;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::net::TcpListener;

/// How long a test waits for a line it expects to arrive.
pub const EXPECT_WAIT: Duration = Duration::from_secs(2);

/// How long a test waits to be confident a line was *not* sent.
pub const QUIET_WAIT: Duration = Duration::from_millis(150);

/// Fake server listening on `127.0.0.1:0`.
pub struct FakeServer {
    listener: TcpListener,
}

impl FakeServer {
    pub async fn bind() -> Self {
        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .expect("bind loopback listener");
        Self { listener }
    }

    /// `host:port` string a client can connect to.
    pub fn endpoint(&self) -> String {
        let addr = self.listener.local_addr().expect("listener address");
        format!("127.0.0.1:{}", addr.port())
    }

    pub async fn accept(&self) -> Peer {
        let (stream, _) = tokio::time::timeout(EXPECT_WAIT, self.listener.accept())
            .await
            .expect("client connected in time")
            .expect("accept connection");
        let (read_half, writer) = stream.into_split();
        Peer {
            reader: BufReader::new(read_half),
            writer,
            pending: Vec::new(),
        }
    }
}

/// Server side of one accepted connection.
pub struct Peer {
    reader: BufReader<OwnedReadHalf>,
    writer: OwnedWriteHalf,
    /// Bytes of a line still being received; survives a timed-out read.
    pending: Vec<u8>,
}

impl Peer {
    /// Next line written by the client, without its `\r\n`.
    pub async fn recv_line(&mut self) -> String {
        self.try_recv_line(EXPECT_WAIT)
            .await
            .expect("client wrote a line in time")
    }

    /// Next line written by the client, or `None` if nothing complete arrives
    /// within `wait`.
    pub async fn try_recv_line(&mut self, wait: Duration) -> Option<String> {
        let read = tokio::time::timeout(wait, self.reader.read_until(b'\n', &mut self.pending))
            .await
            .ok()?
            .expect("read from client");
        if read == 0 && self.pending.is_empty() {
            return None;
        }

        let raw = String::from_utf8(std::mem::take(&mut self.pending)).expect("utf-8 line");
        assert!(
            raw.ends_with("\r\n"),
            "every client line must end in CRLF, got {raw:?}"
        );
        Some(raw.trim_end_matches("\r\n").to_owned())
    }

    /// Assert the client writes nothing for [`QUIET_WAIT`].
    pub async fn expect_quiet(&mut self) {
        if let Some(line) = self.try_recv_line(QUIET_WAIT).await {
            panic!("expected no line on the wire, got {line:?}");
        }
    }

    /// Send one reply line, terminated with `\r\n`.
    pub async fn reply(&mut self, line: &str) {
        self.send_raw(format!("{line}\r\n").as_bytes()).await;
    }

    /// Write raw bytes in a single call.
    pub async fn send_raw(&mut self, bytes: &[u8]) {
        self.writer.write_all(bytes).await.expect("write to client");
        self.writer.flush().await.expect("flush to client");
    }

    /// Whether the client closed its side (EOF within `wait`).
    pub async fn closed_within(&mut self, wait: Duration) -> bool {
        let mut buf = Vec::new();
        matches!(
            tokio::time::timeout(wait, self.reader.read_until(b'\n', &mut buf)).await,
            Ok(Ok(0) | Err(_))
        )
    }
}

/// Connected client plus the server side of its connection.
///
/// The response timeout is raised to `timeout` so tests that check for the
/// absence of writes are not raced by the default 100 ms deadline.
pub async fn connected_pair(timeout: Duration) -> (Client, Peer, FakeServer) {
    let server = FakeServer::bind().await;
    let client = Client::new(&server.endpoint()).expect("valid endpoint");
    client.set_response_timeout(timeout);
    client.connect().await.expect("connect to fake server");
    let peer = server.accept().await;
    (client, peer, server)
}
