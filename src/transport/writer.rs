//! Transport writer task.
//!
//! Receives outbound lines from an [`mpsc`] channel, frames each one with
//! [`LineCodec`] (appending `\r\n`) and writes it to the socket's write half
//! using [`tokio::io::AsyncWriteExt`]. Lines are written in channel order,
//! which is the order the dispatcher released them.

use bytes::BytesMut;
use tokio::io::{AsyncWrite, AsyncWriteExt};
use tokio::sync::mpsc;
use tokio_util::codec::Encoder;
use tokio_util::sync::CancellationToken;
use tracing::{debug, trace, warn};

use crate::transport::codec::LineCodec;
use crate::transport::TransportEvent;
use crate::{AppError, Result};

/// Transport writer task. Frames outbound lines and writes them in order.
///
/// The task exits cleanly when:
/// - `cancel` is triggered (explicit close or reader shutdown). Lines already
///   in `line_rx` are written before the socket is shut down.
/// - `line_rx` is closed (every [`Transport`](crate::transport::Transport)
///   handle was dropped); `cancel` is then triggered so the reader stops too.
///
/// # Errors
///
/// Returns [`AppError::Transport`]`("write failed: …")` if the socket write
/// fails. The failure is also reported as [`TransportEvent::Error`] and
/// `cancel` is triggered so the reader winds the connection down.
pub async fn run_writer<W>(
    endpoint: String,
    write_half: W,
    mut codec: LineCodec,
    mut line_rx: mpsc::UnboundedReceiver<String>,
    event_tx: mpsc::UnboundedSender<TransportEvent>,
    cancel: CancellationToken,
) -> Result<()>
where
    W: AsyncWrite + Unpin + Send,
{
    let mut write_half = write_half;
    let mut buf = BytesMut::new();

    loop {
        tokio::select! {
            biased;

            () = cancel.cancelled() => {
                debug!(endpoint, "transport writer: cancellation received, draining");
                break;
            }

            line = line_rx.recv() => {
                let Some(line) = line else {
                    debug!(endpoint, "transport writer: line channel closed, stopping");
                    cancel.cancel();
                    break;
                };

                if let Err(e) = write_line(&mut write_half, &mut codec, &mut buf, line).await {
                    warn!(endpoint, error = %e, "transport writer: write failed");
                    let _ = event_tx.send(TransportEvent::Error(format!("write failed: {e}")));
                    cancel.cancel();
                    return Err(AppError::Transport(format!("write failed: {e}")));
                }
            }
        }
    }

    // Lines queued before the close were already accepted; put them on the
    // wire before shutting down.
    line_rx.close();
    while let Ok(line) = line_rx.try_recv() {
        if let Err(e) = write_line(&mut write_half, &mut codec, &mut buf, line).await {
            debug!(endpoint, error = %e, "transport writer: drain write failed");
            break;
        }
    }

    // Best effort: the peer may already be gone.
    let _ = write_half.shutdown().await;
    Ok(())
}

async fn write_line<W>(
    write_half: &mut W,
    codec: &mut LineCodec,
    buf: &mut BytesMut,
    line: String,
) -> Result<()>
where
    W: AsyncWrite + Unpin + Send,
{
    trace!(line = line.as_str(), "transport writer: sending line");
    codec.encode(line, buf)?;
    let written = match write_half.write_all(buf).await {
        Ok(()) => write_half.flush().await,
        Err(e) => Err(e),
    };
    buf.clear();
    written.map_err(AppError::from)
}
