//! Decoder implementation for response payloads.
//!
//! This module provides a unified decoder for the ways a response body can be framed:
//! - Content-Length based payloads
//! - Chunked transfer encoding
//! - Payloads delimited by the connection closing
//!
//! Responses without a body never get a payload decoder at all.

use crate::codec::body::chunked_decoder::ChunkedDecoder;
use crate::codec::body::length_decoder::LengthDecoder;
use crate::protocol::{Framing, ParseError, PayloadItem};

/// A unified decoder for response payloads.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PayloadDecoder {
    /// The specific decoding strategy to use
    kind: Kind,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Kind {
    /// Decode payload with a fixed content length
    Length(LengthDecoder),

    /// Decode payload using chunked transfer encoding
    Chunked(ChunkedDecoder),

    /// Everything is payload, until the transport reports end of stream
    UntilClose,
}

impl PayloadDecoder {
    /// Creates a PayloadDecoder for chunked transfer encoding.
    pub fn chunked() -> Self {
        Self { kind: Kind::Chunked(ChunkedDecoder::new()) }
    }

    /// Creates a PayloadDecoder for a fixed-length payload.
    pub fn fix_length(size: u64) -> Self {
        Self { kind: Kind::Length(LengthDecoder::new(size)) }
    }

    /// Creates a PayloadDecoder for a payload read until the connection closes.
    pub fn until_close() -> Self {
        Self { kind: Kind::UntilClose }
    }

    /// Builds the decoder for `framing`, or `None` when there is no body to decode.
    pub fn from_framing(framing: Framing) -> Option<Self> {
        match framing {
            Framing::None => None,
            Framing::Chunked => Some(Self::chunked()),
            Framing::Length(size) => Some(Self::fix_length(size)),
            Framing::UntilClose => Some(Self::until_close()),
        }
    }

    /// Returns whether this decoder handles chunked transfer encoding.
    pub fn is_chunked(&self) -> bool {
        matches!(self.kind, Kind::Chunked(_))
    }

    /// Returns whether this decoder reads until the connection closes.
    pub fn is_until_close(&self) -> bool {
        matches!(self.kind, Kind::UntilClose)
    }

    /// The framing this decoder reads; for a fixed-length payload the length is what
    /// is still expected.
    pub fn framing(&self) -> Framing {
        match &self.kind {
            Kind::Length(length_decoder) => Framing::Length(length_decoder.remaining()),
            Kind::Chunked(_) => Framing::Chunked,
            Kind::UntilClose => Framing::UntilClose,
        }
    }

    /// Decodes the next payload item from `src` using the appropriate strategy.
    ///
    /// A close-delimited payload never reports [`PayloadItem::Eof`]: only the caller
    /// knows when the transport is done.
    pub fn decode<'a>(&mut self, src: &mut &'a [u8]) -> Result<Option<PayloadItem<&'a [u8]>>, ParseError> {
        match &mut self.kind {
            Kind::Length(length_decoder) => length_decoder.decode(src),
            Kind::Chunked(chunked_decoder) => chunked_decoder.decode(src),
            Kind::UntilClose => {
                if src.is_empty() {
                    return Ok(None);
                }
                Ok(Some(PayloadItem::Chunk(std::mem::take(src))))
            }
        }
    }
}
