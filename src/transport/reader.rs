//! Transport reader task.
//!
//! Reads `\r\n` delimited lines from the socket's read half and forwards each
//! one as a [`TransportEvent::Line`]. The reader is driven by [`FramedRead`]
//! backed by [`LineCodec`], so a single read that carries several replies
//! still yields one event per reply.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use futures_util::StreamExt;
use tokio::io::AsyncRead;
use tokio::sync::mpsc;
use tokio_util::codec::FramedRead;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::transport::codec::LineCodec;
use crate::transport::TransportEvent;

/// Transport reader task. Emits one [`TransportEvent`] per inbound line.
///
/// Overlong lines are dropped inside the codec and never reach this loop.
/// The task always finishes by clearing `connected` and sending
/// [`TransportEvent::Disconnected`], whether it stopped because of EOF, an
/// I/O error (preceded by [`TransportEvent::Error`]) or cancellation.
pub async fn run_reader<R>(
    endpoint: String,
    read_half: R,
    codec: LineCodec,
    event_tx: mpsc::UnboundedSender<TransportEvent>,
    connected: Arc<AtomicBool>,
    cancel: CancellationToken,
) where
    R: AsyncRead + Unpin + Send,
{
    let mut framed = FramedRead::new(read_half, codec);

    loop {
        tokio::select! {
            biased;

            () = cancel.cancelled() => {
                debug!(endpoint, "transport reader: cancellation received, stopping");
                break;
            }

            item = framed.next() => {
                match item {
                    None => {
                        debug!(endpoint, "transport reader: EOF detected");
                        break;
                    }

                    Some(Err(e)) => {
                        warn!(endpoint, error = %e, "transport reader: IO error, stopping");
                        // Receiver gone means nobody is listening any more.
                        let _ = event_tx.send(TransportEvent::Error(e.to_string()));
                        break;
                    }

                    Some(Ok(line)) => {
                        if event_tx.send(TransportEvent::Line(line)).is_err() {
                            debug!(endpoint, "transport reader: event_tx closed, stopping");
                            break;
                        }
                    }
                }
            }
        }
    }

    connected.store(false, Ordering::SeqCst);
    // Stop the writer too; the socket is no longer usable.
    cancel.cancel();
    if event_tx.send(TransportEvent::Disconnected).is_err() {
        debug!(
            endpoint,
            "transport reader: event_tx closed before Disconnected could be delivered"
        );
    }
}
