//! Decoder implementation for response bodies with a Content-Length header.
//!
//! See [RFC 9112 Section 6.3](https://www.rfc-editor.org/rfc/rfc9112.html#section-6.3).

use std::cmp;

use crate::protocol::{ParseError, PayloadItem};

/// A decoder for bodies with a known content length.
///
/// The remaining length only ever decreases and the decoder reports
/// [`PayloadItem::Eof`] exactly when it reaches zero.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LengthDecoder {
    /// The number of bytes remaining to be read from the payload
    length: u64,
}

impl LengthDecoder {
    /// Creates a new LengthDecoder expecting `length` body bytes.
    pub fn new(length: u64) -> Self {
        Self { length }
    }

    /// Bytes still expected before the body is complete.
    pub fn remaining(&self) -> u64 {
        self.length
    }

    /// Takes up to the remaining length from `src`, advancing it past the returned bytes.
    ///
    /// # Returns
    /// * `Ok(Some(PayloadItem::Eof))` when all bytes have been read
    /// * `Ok(Some(PayloadItem::Chunk(bytes)))` when some body bytes were available
    /// * `Ok(None)` when more data is needed
    pub fn decode<'a>(&mut self, src: &mut &'a [u8]) -> Result<Option<PayloadItem<&'a [u8]>>, ParseError> {
        if self.length == 0 {
            return Ok(Some(PayloadItem::Eof));
        }

        if src.is_empty() {
            return Ok(None);
        }

        // the min is bounded by src.len(), so it always fits a usize
        let len = cmp::min(self.length, src.len() as u64) as usize;
        let buf: &'a [u8] = *src;
        let (bytes, rest) = buf.split_at(len);
        *src = rest;

        self.length -= len as u64;
        Ok(Some(PayloadItem::Chunk(bytes)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_basic() {
        let mut buffer: &[u8] = b"101234567890abcdef\r\n\r\n";

        let mut length_decoder = LengthDecoder::new(10);
        let item = length_decoder.decode(&mut buffer).unwrap().unwrap();

        assert!(item.is_chunk());
        assert_eq!(item.as_bytes().unwrap(), b"1012345678");
        assert_eq!(buffer, b"90abcdef\r\n\r\n");
        assert_eq!(length_decoder.remaining(), 0);

        assert!(length_decoder.decode(&mut buffer).unwrap().unwrap().is_eof());
        assert_eq!(buffer.len(), 12);
    }

    #[test]
    fn test_partial() {
        let mut length_decoder = LengthDecoder::new(5);

        let mut buffer: &[u8] = b"abc";
        let item = length_decoder.decode(&mut buffer).unwrap().unwrap();
        assert_eq!(item.as_bytes().unwrap(), b"abc");
        assert_eq!(length_decoder.remaining(), 2);

        // no more input, still waiting for the last two bytes
        assert!(length_decoder.decode(&mut buffer).unwrap().is_none());

        let mut buffer: &[u8] = b"de";
        let item = length_decoder.decode(&mut buffer).unwrap().unwrap();
        assert_eq!(item.as_bytes().unwrap(), b"de");
        assert!(length_decoder.decode(&mut buffer).unwrap().unwrap().is_eof());
    }

    #[test]
    fn test_zero_length() {
        let mut buffer: &[u8] = b"";
        let mut length_decoder = LengthDecoder::new(0);
        assert!(length_decoder.decode(&mut buffer).unwrap().unwrap().is_eof());
    }
}
