use bytes::Buf;

/// Represents an item in the HTTP message payload stream.
///
/// This enum is used by the payload decoders to produce either data chunks
/// or signal the end of the payload stream (EOF).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PayloadItem<Data: Buf> {
    /// A chunk of payload data
    Chunk(Data),
    /// Marks the end of the payload stream
    Eof,
}

impl<D: Buf> PayloadItem<D> {
    /// Returns true if this item represents the end of the payload stream
    #[inline]
    pub fn is_eof(&self) -> bool {
        matches!(self, PayloadItem::Eof)
    }

    /// Returns true if this item contains chunk data
    #[inline]
    pub fn is_chunk(&self) -> bool {
        matches!(self, PayloadItem::Chunk(_))
    }
}

impl<'a> PayloadItem<&'a [u8]> {
    /// Returns the contained bytes if this is a Chunk
    ///
    /// Returns None if this is an EOF marker
    pub fn as_bytes(&self) -> Option<&'a [u8]> {
        match self {
            PayloadItem::Chunk(bytes) => Some(*bytes),
            PayloadItem::Eof => None,
        }
    }
}

/// How the end of a response body is determined.
///
/// The framing is decided once the header section is complete:
/// - Nothing to read: skipped by the observer, or a 1xx/204/304 status
/// - Chunked transfer encoding
/// - Known length from Content-Length
/// - Everything until the transport closes
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Framing {
    /// No body at all
    None,
    /// Payload using chunked transfer encoding
    Chunked,
    /// Payload with known length in bytes
    Length(u64),
    /// Payload delimited by the end of the connection
    UntilClose,
}

impl Framing {
    /// Returns true if the payload uses chunked transfer encoding
    #[inline]
    pub fn is_chunked(&self) -> bool {
        matches!(self, Framing::Chunked)
    }

    /// Returns true if the payload ends only when the connection does
    #[inline]
    pub fn is_until_close(&self) -> bool {
        matches!(self, Framing::UntilClose)
    }
}

/// Outcome of a successful [`feed`](crate::codec::ResponseParser::feed) call.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Feed {
    /// All of the input was processed.
    Consumed(usize),
    /// An observer callback asked to stop. `consumed` bytes were processed, the rest
    /// of the input has not been looked at and should be fed again to continue.
    Aborted { consumed: usize },
}

impl Feed {
    /// Number of input bytes processed by the call.
    #[inline]
    pub fn consumed(&self) -> usize {
        match *self {
            Feed::Consumed(consumed) | Feed::Aborted { consumed } => consumed,
        }
    }

    /// Returns true if an observer callback stopped the parser.
    #[inline]
    pub fn is_aborted(&self) -> bool {
        matches!(self, Feed::Aborted { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn feed_consumed() {
        assert_eq!(Feed::Consumed(12).consumed(), 12);
        assert_eq!(Feed::Aborted { consumed: 3 }.consumed(), 3);
        assert!(Feed::Aborted { consumed: 0 }.is_aborted());
        assert!(!Feed::Consumed(0).is_aborted());
    }

    #[test]
    fn payload_item_bytes() {
        let item = PayloadItem::Chunk(&b"hello"[..]);
        assert!(item.is_chunk());
        assert_eq!(item.as_bytes(), Some(&b"hello"[..]));
        assert_eq!(PayloadItem::<&[u8]>::Eof.as_bytes(), None);
    }
}
