//! Line codec for the control protocol.
//!
//! Wraps [`tokio_util::codec::AnyDelimiterCodec`] with a configurable maximum
//! line length so an unterminated stream from a misbehaving server cannot grow
//! the read buffer without bound.
//!
//! # Framing
//!
//! - Inbound lines end in `\r\n`; a bare `\n` is also accepted and the
//!   trailing `\r` is stripped. Several lines arriving in one read are yielded
//!   one by one by successive [`LineCodec::decode`] calls.
//! - Inbound bytes are split before any text conversion. Invalid UTF-8 is
//!   replaced with `U+FFFD` so the line still occupies its reply slot.
//! - Outbound lines are written as `item\r\n`.

use bytes::{BufMut, BytesMut};
use tokio_util::codec::{AnyDelimiterCodec, AnyDelimiterCodecError, Decoder, Encoder};
use tracing::warn;

use crate::{AppError, Result};

/// Protocol line terminator.
pub const TERMINATOR: &str = "\r\n";

/// Default maximum inbound line length: 64 KiB.
pub const DEFAULT_MAX_LINE_BYTES: usize = 65_536;

/// `\r\n` line codec for the control stream.
///
/// Inbound lines longer than the configured limit are discarded up to the
/// next terminator and logged; decoding then resumes. They are not surfaced
/// as errors because [`FramedRead`](tokio_util::codec::FramedRead) ends the
/// stream after a decoder error.
///
/// # Examples
///
/// ```rust,ignore
/// use tokio_util::codec::FramedRead;
/// use splitlink::transport::codec::LineCodec;
///
/// let lines = FramedRead::new(read_half, LineCodec::new());
/// ```
#[derive(Debug)]
pub struct LineCodec {
    inner: AnyDelimiterCodec,
    max_line_bytes: usize,
    skipped_lines: u64,
    lossy_lines: u64,
}

impl LineCodec {
    /// Create a codec with the [`DEFAULT_MAX_LINE_BYTES`] limit.
    #[must_use]
    pub fn new() -> Self {
        Self::with_max_line_bytes(DEFAULT_MAX_LINE_BYTES)
    }

    /// Create a codec with a custom inbound line limit.
    #[must_use]
    pub fn with_max_line_bytes(max_line_bytes: usize) -> Self {
        Self {
            inner: AnyDelimiterCodec::new_with_max_length(
                b"\n".to_vec(),
                TERMINATOR.as_bytes().to_vec(),
                max_line_bytes,
            ),
            max_line_bytes,
            skipped_lines: 0,
            lossy_lines: 0,
        }
    }

    /// Lines discarded so far for exceeding the limit.
    #[must_use]
    pub fn skipped_lines(&self) -> u64 {
        self.skipped_lines
    }

    /// Lines decoded so far that contained invalid UTF-8.
    #[must_use]
    pub fn lossy_lines(&self) -> u64 {
        self.lossy_lines
    }

    fn next_line(&mut self, src: &mut BytesMut, eof: bool) -> Result<Option<String>> {
        loop {
            let decoded = if eof {
                self.inner.decode_eof(src)
            } else {
                self.inner.decode(src)
            };

            match decoded {
                Ok(None) => return Ok(None),
                // A lone `\r` left at EOF is a torn terminator, not a line.
                Ok(Some(chunk)) if eof && &chunk[..] == b"\r" => return Ok(None),
                Ok(Some(chunk)) => return Ok(Some(self.decode_text(&chunk))),
                Err(AnyDelimiterCodecError::MaxChunkLengthExceeded) => {
                    self.skipped_lines += 1;
                    warn!(
                        max_line_bytes = self.max_line_bytes,
                        "line codec: line too long, discarding"
                    );
                }
                Err(AnyDelimiterCodecError::Io(io_err)) => {
                    return Err(AppError::Io(io_err.to_string()))
                }
            }
        }
    }

    fn decode_text(&mut self, chunk: &[u8]) -> String {
        let line = chunk.strip_suffix(b"\r").unwrap_or(chunk);
        match std::str::from_utf8(line) {
            Ok(text) => text.to_owned(),
            Err(_) => {
                self.lossy_lines += 1;
                warn!("line codec: invalid utf-8 in line, replacing");
                String::from_utf8_lossy(line).into_owned()
            }
        }
    }
}

impl Default for LineCodec {
    fn default() -> Self {
        Self::new()
    }
}

impl Decoder for LineCodec {
    type Item = String;
    type Error = AppError;

    /// Decode the next terminated line from `src`.
    ///
    /// Returns `Ok(None)` while `src` holds only a partial line.
    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>> {
        self.next_line(src, false)
    }

    fn decode_eof(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>> {
        self.next_line(src, true)
    }
}

impl Encoder<String> for LineCodec {
    type Error = AppError;

    /// Encode `item` followed by [`TERMINATOR`].
    fn encode(&mut self, item: String, dst: &mut BytesMut) -> Result<()> {
        dst.reserve(item.len() + TERMINATOR.len());
        dst.put_slice(item.as_bytes());
        dst.put_slice(TERMINATOR.as_bytes());
        Ok(())
    }
}
