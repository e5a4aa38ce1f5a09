//! Decoder implementation for HTTP chunked transfer encoding.
//!
//! This module decodes response bodies that use chunked transfer encoding
//! as specified in [RFC 9112 Section 7.1](https://www.rfc-editor.org/rfc/rfc9112.html#section-7.1).
//!
//! The chunked encoding allows the sender to transmit message data in a series of chunks,
//! indicating the size of each chunk before its data. The decoder stops right after the
//! `last-chunk` line; the trailer section that follows is a header section and is parsed
//! by the header decoder.

use crate::protocol::{ParseError, PayloadItem};
use bytes::Buf;
use std::task::Poll;
use tracing::trace;
use ChunkedState::*;

/// A decoder for handling HTTP chunked transfer encoding.
///
/// The decoder processes incoming bytes according to the chunked format:
/// - Each chunk starts with its size in hexadecimal
/// - Followed by optional extensions and CRLF
/// - Then the chunk data and CRLF
/// - A zero-sized chunk indicates the end of the data
///
/// Chunk data is handed out as slices of the input, never copied.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChunkedDecoder {
    state: ChunkedState,
    remaining_size: u64,
}

impl ChunkedDecoder {
    /// Creates a new ChunkedDecoder instance.
    ///
    /// The decoder starts in the SizeStart state, ready to read the size of the first chunk.
    pub fn new() -> Self {
        Self { state: SizeStart, remaining_size: 0 }
    }

    /// Decodes chunked transfer encoded data from `src`, advancing it past what was read.
    ///
    /// # Returns
    /// - `Ok(Some(PayloadItem::Chunk(bytes)))` when chunk data is available
    /// - `Ok(Some(PayloadItem::Eof))` once the zero-sized chunk line has been read
    /// - `Ok(None)` when more data is needed
    /// - `Err(ParseError)` if the chunked encoding is invalid
    pub fn decode<'a>(&mut self, src: &mut &'a [u8]) -> Result<Option<PayloadItem<&'a [u8]>>, ParseError> {
        loop {
            if self.state == End {
                trace!("finished reading chunked data");
                return Ok(Some(PayloadItem::Eof));
            }

            if src.is_empty() {
                // need more data
                return Ok(None);
            }

            let mut buf = None;

            self.state = match self.state.step(src, &mut self.remaining_size, &mut buf) {
                Poll::Pending => return Ok(None),
                Poll::Ready(Ok(new_state)) => new_state,
                Poll::Ready(Err(e)) => return Err(e),
            };

            if let Some(bytes) = buf {
                trace!(len = bytes.len(), "read chunked bytes");
                return Ok(Some(PayloadItem::Chunk(bytes)));
            }
        }
    }
}

impl Default for ChunkedDecoder {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ChunkedState {
    /// Read the first hex digit of the chunk size
    SizeStart,
    /// Read the rest of the chunk size in hex
    Size,
    /// Handle whitespace after size
    SizeLws,
    /// Skip chunk extensions
    Extension,
    /// Read LF after chunk size
    SizeLf,
    /// Read chunk data
    Body,
    /// Read CR after chunk data
    BodyCr,
    /// Read LF after chunk data
    BodyLf,
    /// Last chunk line read, trailers follow
    End,
}

macro_rules! try_next_byte {
    ($src:ident) => {{
        if $src.has_remaining() {
            $src.get_u8()
        } else {
            return Poll::Pending;
        }
    }};
}

fn hex_value(b: u8) -> Option<u64> {
    match b {
        b'0'..=b'9' => Some(u64::from(b - b'0')),
        b'a'..=b'f' => Some(u64::from(b + 10 - b'a')),
        b'A'..=b'F' => Some(u64::from(b + 10 - b'A')),
        _ => None,
    }
}

impl ChunkedState {
    /// Processes the next step in the chunked decoding state machine.
    fn step<'a>(
        &self,
        src: &mut &'a [u8],
        remaining_size: &mut u64,
        buf: &mut Option<&'a [u8]>,
    ) -> Poll<Result<ChunkedState, ParseError>> {
        match self {
            SizeStart => ChunkedState::read_size_start(src, remaining_size),
            Size => ChunkedState::read_size(src, remaining_size),
            SizeLws => ChunkedState::read_size_lws(src),
            Extension => ChunkedState::read_extension(src),
            SizeLf => ChunkedState::read_size_lf(src, remaining_size),
            Body => ChunkedState::read_body(src, remaining_size, buf),
            BodyCr => ChunkedState::read_body_cr(src),
            BodyLf => ChunkedState::read_body_lf(src),
            End => Poll::Ready(Ok(End)),
        }
    }

    /// A size line must start with at least one hex digit.
    fn read_size_start(src: &mut &[u8], size_per_chunk: &mut u64) -> Poll<Result<ChunkedState, ParseError>> {
        let b = try_next_byte!(src);
        match hex_value(b) {
            Some(value) => {
                *size_per_chunk = value;
                Poll::Ready(Ok(Size))
            }
            None => Poll::Ready(Err(ParseError::invalid_chunk_size(format!("unexpected byte {b:#04x}")))),
        }
    }

    /// Reads and parses the chunk size in hexadecimal format.
    ///
    /// # State Transitions
    /// - On hex digit: Stay in Size state to read more digits
    /// - On whitespace (tab/space): Transition to SizeLws state
    /// - On semicolon: Transition to Extension state to handle chunk extensions
    /// - On CR: Transition to SizeLf state to finish size line
    /// - On invalid character or overflow: Return error
    fn read_size(src: &mut &[u8], size_per_chunk: &mut u64) -> Poll<Result<ChunkedState, ParseError>> {
        let b = try_next_byte!(src);
        if let Some(value) = hex_value(b) {
            *size_per_chunk = match size_per_chunk.checked_mul(16).and_then(|size| size.checked_add(value)) {
                Some(size) => size,
                None => return Poll::Ready(Err(ParseError::invalid_chunk_size("chunk size overflow"))),
            };
            return Poll::Ready(Ok(Size));
        }

        match b {
            b'\t' | b' ' => Poll::Ready(Ok(SizeLws)),
            b';' => Poll::Ready(Ok(Extension)),
            b'\r' => Poll::Ready(Ok(SizeLf)),
            _ => Poll::Ready(Err(ParseError::invalid_chunk_size(format!("unexpected byte {b:#04x}")))),
        }
    }

    /// Processes linear whitespace (LWS) after the chunk size.
    ///
    /// No more digits may follow; only more whitespace, extensions or the end of the line.
    fn read_size_lws(src: &mut &[u8]) -> Poll<Result<ChunkedState, ParseError>> {
        match try_next_byte!(src) {
            b'\t' | b' ' => Poll::Ready(Ok(SizeLws)),
            b';' => Poll::Ready(Ok(Extension)),
            b'\r' => Poll::Ready(Ok(SizeLf)),
            _ => Poll::Ready(Err(ParseError::invalid_chunk_size("invalid linear white space"))),
        }
    }

    /// Skips chunk extensions up to the end of the size line.
    ///
    /// Extensions are ignored, but a plain LF inside them is rejected: it would end the
    /// line for a peer that does not check for the CR.
    fn read_extension(src: &mut &[u8]) -> Poll<Result<ChunkedState, ParseError>> {
        match try_next_byte!(src) {
            b'\r' => Poll::Ready(Ok(SizeLf)),
            b'\n' => Poll::Ready(Err(ParseError::invalid_chunk_size("chunk extension contains newline"))),
            _ => Poll::Ready(Ok(Extension)),
        }
    }

    /// Validates the LF byte after the chunk size line.
    ///
    /// # State Transitions
    /// - On LF with size 0: Move to End, the trailer section follows
    /// - On LF with size > 0: Move to Body state to read chunk data
    /// - On any other byte: Return error
    fn read_size_lf(src: &mut &[u8], size_per_chunk: &mut u64) -> Poll<Result<ChunkedState, ParseError>> {
        match try_next_byte!(src) {
            b'\n' if *size_per_chunk == 0 => Poll::Ready(Ok(End)),
            b'\n' => {
                trace!(size = *size_per_chunk, "read chunk size");
                Poll::Ready(Ok(Body))
            }
            _ => Poll::Ready(Err(ParseError::invalid_chunk_size("LF expected"))),
        }
    }

    /// Reads up to the remaining size of the current chunk.
    ///
    /// # State Transitions
    /// - After reading data with remaining size > 0: Stay in Body state
    /// - After reading data with remaining size = 0: Move to BodyCr state
    fn read_body<'a>(
        src: &mut &'a [u8],
        size_per_chunk: &mut u64,
        buf: &mut Option<&'a [u8]>,
    ) -> Poll<Result<ChunkedState, ParseError>> {
        if src.is_empty() {
            return Poll::Pending;
        }

        if *size_per_chunk == 0 {
            return Poll::Ready(Ok(BodyCr));
        }

        // cap remaining bytes at the max capacity of usize
        let remaining = usize::try_from(*size_per_chunk).unwrap_or(usize::MAX);
        let read_size = std::cmp::min(remaining, src.len());

        let input: &'a [u8] = *src;
        let (bytes, rest) = input.split_at(read_size);
        *src = rest;
        *size_per_chunk -= read_size as u64;
        *buf = Some(bytes);

        if *size_per_chunk > 0 { Poll::Ready(Ok(Body)) } else { Poll::Ready(Ok(BodyCr)) }
    }

    fn read_body_cr(src: &mut &[u8]) -> Poll<Result<ChunkedState, ParseError>> {
        match try_next_byte!(src) {
            b'\r' => Poll::Ready(Ok(BodyLf)),
            _ => Poll::Ready(Err(ParseError::invalid_chunked_body("CR expected after chunk data"))),
        }
    }

    fn read_body_lf(src: &mut &[u8]) -> Poll<Result<ChunkedState, ParseError>> {
        match try_next_byte!(src) {
            b'\n' => Poll::Ready(Ok(SizeStart)),
            _ => Poll::Ready(Err(ParseError::invalid_chunked_body("LF expected after chunk data"))),
        }
    }
}
