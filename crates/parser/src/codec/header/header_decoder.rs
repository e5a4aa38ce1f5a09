//! HTTP header decoder implementation for parsing response heads and trailer sections
//!
//! This module turns raw bytes into the status line, the header fields and the facts the
//! parser needs to frame the body.
//!
//! # Features
//!
//! - Zero-copy header parsing using `httparse`
//! - Support for HTTP/1.0 and HTTP/1.1
//! - Built-in protection against oversized header sections
//! - Joining of obsolete folded header lines
//!
//! # Implementation Details
//!
//! The decoder works in multiple stages:
//!
//! 1. Parse raw bytes using `httparse`
//! 2. Record header name/value byte ranges
//! 3. Inspect Content-Length, Transfer-Encoding and Connection
//!
//! The implementation uses an index-based approach to avoid copying header data: it
//! records the byte ranges of header names and values, and the parser reports them to
//! its observer straight out of its own buffer.

use bytes::BytesMut;
use http::Version;
use http::header::{CONNECTION, CONTENT_LENGTH, TRANSFER_ENCODING};
use httparse::{Error, Status};
use tracing::trace;

use crate::ensure;
use crate::protocol::{ParseError, ParserConfig};

/// Decoder for response heads and trailer sections.
#[derive(Debug, Clone, Copy)]
pub struct HeaderDecoder {
    config: ParserConfig,
}

/// Written ahead of a trailer section, so it is parsed by the same configured
/// response parser as a header section.
const TRAILER_STATUS_LINE: &[u8] = b"HTTP/1.1 200 OK\r\n";

/// A complete status line and header section.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParsedHead {
    /// Bytes taken by the status line and header section, including the empty line
    pub len: usize,
    pub code: u16,
    pub version: Version,
    pub framing: FramingHeaders,
}

/// What the header section says about body framing and connection reuse.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FramingHeaders {
    pub content_length: Option<u64>,
    /// a Transfer-Encoding header is present
    pub transfer_encoding: bool,
    /// the last transfer coding, across every Transfer-Encoding line, is chunked
    pub chunked: bool,
    pub connection_close: bool,
    pub connection_keep_alive: bool,
}

impl HeaderDecoder {
    pub fn new(config: ParserConfig) -> Self {
        Self { config }
    }

    /// Attempts to decode a response head from the start of `src`.
    ///
    /// `fields` is cleared and filled with the byte ranges of every header, in wire order.
    ///
    /// # Returns
    ///
    /// - `Ok(Some(head))` if a complete head was parsed
    /// - `Ok(None)` if more data is needed
    /// - `Err(ParseError)` if the status line or a header line is malformed
    pub fn decode_head(&self, src: &[u8], fields: &mut Vec<HeaderIndex>) -> Result<Option<ParsedHead>, ParseError> {
        let max_headers = self.config.get_max_headers();
        let mut headers = vec![httparse::EMPTY_HEADER; max_headers];
        let mut res = httparse::Response::new(&mut headers);

        let parsed_result = self.httparse_config().parse_response(&mut res, src).map_err(|e| match e {
            Error::TooManyHeaders => ParseError::too_many_headers(max_headers),
            Error::Version => ParseError::InvalidVersion,
            Error::Status => ParseError::invalid_status(e),
            e => ParseError::invalid_header(e),
        });

        let len = match parsed_result? {
            Status::Complete(len) => len,
            Status::Partial => return Ok(None),
        };

        let version = match res.version {
            Some(0) => Version::HTTP_10,
            Some(1) => Version::HTTP_11,
            _ => return Err(ParseError::InvalidVersion),
        };

        let code = res.code.ok_or_else(|| ParseError::invalid_status("missing status code"))?;
        ensure!((100..=999).contains(&code), ParseError::invalid_status(format!("status code {code} out of range")));

        let framing = FramingHeaders::inspect(res.headers)?;
        HeaderIndex::record(src, res.headers, fields);

        trace!(head_size = len, header_count = fields.len(), code, "parsed response head");
        Ok(Some(ParsedHead { len, code, version, framing }))
    }

    /// Starts a trailer section in `buf`, returning how many bytes were written ahead
    /// of the input.
    pub fn begin_trailers(&self, buf: &mut BytesMut) -> usize {
        buf.extend_from_slice(TRAILER_STATUS_LINE);
        TRAILER_STATUS_LINE.len()
    }

    /// Attempts to decode the trailer section following the last chunk of a chunked body.
    ///
    /// `src` must start with what [`begin_trailers`](Self::begin_trailers) wrote. Returns
    /// the length of the whole buffer section once complete, with `fields` filled like
    /// [`decode_head`](Self::decode_head) does. Trailer fields never affect framing.
    pub fn decode_trailers(&self, src: &[u8], fields: &mut Vec<HeaderIndex>) -> Result<Option<usize>, ParseError> {
        debug_assert!(src.starts_with(TRAILER_STATUS_LINE));
        let max_headers = self.config.get_max_headers();
        let mut headers = vec![httparse::EMPTY_HEADER; max_headers];
        let mut res = httparse::Response::new(&mut headers);

        let parsed_result = self.httparse_config().parse_response(&mut res, src).map_err(|e| match e {
            Error::TooManyHeaders => ParseError::too_many_headers(max_headers),
            e => ParseError::invalid_header(e),
        });

        match parsed_result? {
            Status::Complete(len) => {
                HeaderIndex::record(src, res.headers, fields);
                trace!(trailer_size = len - TRAILER_STATUS_LINE.len(), trailer_count = fields.len(), "parsed trailer section");
                Ok(Some(len))
            }
            Status::Partial => Ok(None),
        }
    }

    fn httparse_config(&self) -> httparse::ParserConfig {
        let mut config = httparse::ParserConfig::default();
        config.allow_obsolete_multiline_headers_in_responses(self.config.get_allow_obsolete_line_folding());
        config
    }
}

/// Whether a header or trailer section may have been completed by the bytes appended
/// to `buf` after its first `appended_at` bytes.
///
/// A section ends at the first empty line, and no other place in it can hold a line
/// feed followed by an empty line.
pub fn section_may_end(buf: &[u8], appended_at: usize) -> bool {
    let window = &buf[appended_at.saturating_sub(3)..];
    window.windows(2).any(|w| w == b"\n\n") || window.windows(3).any(|w| w == b"\n\r\n")
}

/// Stores the byte range positions of a header's name and value within a buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HeaderIndex {
    /// Start and end byte positions of the header name
    pub name: (usize, usize),
    /// Start and end byte positions of the header value
    pub value: (usize, usize),
}

impl HeaderIndex {
    /// Records the byte positions of header names and values from the parsed headers.
    ///
    /// Values are trimmed of surrounding whitespace. Folded values keep their line
    /// breaks here, see [`HeaderIndex::unfold`].
    fn record(bytes: &[u8], headers: &[httparse::Header<'_>], indices: &mut Vec<HeaderIndex>) {
        indices.clear();
        indices.reserve(headers.len());

        let bytes_ptr = bytes.as_ptr() as usize;
        for header in headers {
            let name_start = header.name.as_ptr() as usize - bytes_ptr;
            let name_end = name_start + header.name.len();

            let value = header.value.trim_ascii();
            // an empty value may not point into `bytes` at all
            let value_start = if value.is_empty() {
                name_end
            } else {
                value.as_ptr() as usize - bytes_ptr
            };
            let value_end = value_start + value.len();

            indices.push(HeaderIndex { name: (name_start, name_end), value: (value_start, value_end) });
        }
    }

    pub fn name<'a>(&self, bytes: &'a [u8]) -> &'a [u8] {
        &bytes[self.name.0..self.name.1]
    }

    pub fn value<'a>(&self, bytes: &'a [u8]) -> &'a [u8] {
        &bytes[self.value.0..self.value.1]
    }

    /// Joins an `obs-fold` value into a single line.
    ///
    /// Every line break together with the whitespace around it becomes one space. The
    /// joined value is appended to `buf` and the index moved to point at it; values
    /// without line breaks are left alone.
    pub fn unfold(&mut self, buf: &mut BytesMut) {
        let value = self.value(buf);
        if !value.iter().any(|b| matches!(b, b'\r' | b'\n')) {
            return;
        }

        let mut joined = Vec::with_capacity(value.len());
        let mut in_fold = false;
        for &b in value {
            match b {
                b'\r' | b'\n' => in_fold = true,
                b' ' | b'\t' if in_fold => {}
                b => {
                    if in_fold {
                        while joined.last().is_some_and(|b: &u8| matches!(b, b' ' | b'\t')) {
                            joined.pop();
                        }
                        joined.push(b' ');
                        in_fold = false;
                    }
                    joined.push(b);
                }
            }
        }

        let start = buf.len();
        buf.extend_from_slice(&joined);
        self.value = (start, buf.len());
    }
}

impl FramingHeaders {
    fn inspect(headers: &[httparse::Header<'_>]) -> Result<Self, ParseError> {
        let mut framing = FramingHeaders::default();

        for header in headers {
            let value = header.value.trim_ascii();

            if header.name.eq_ignore_ascii_case(CONTENT_LENGTH.as_str()) {
                let length = parse_content_length(value)?;
                // repeated Content-Length headers are only fine if they all agree
                if framing.content_length.is_some_and(|current| current != length) {
                    return Err(ParseError::UnexpectedContentLength);
                }
                framing.content_length = Some(length);
            } else if header.name.eq_ignore_ascii_case(TRANSFER_ENCODING.as_str()) {
                framing.transfer_encoding = true;
                // codings of repeated lines form one list
                if let Some(coding) = last_coding(value) {
                    framing.chunked = coding.eq_ignore_ascii_case(b"chunked");
                }
            } else if header.name.eq_ignore_ascii_case(CONNECTION.as_str()) {
                for token in value.split(|b| *b == b',').map(<[u8]>::trim_ascii) {
                    if token.eq_ignore_ascii_case(b"close") {
                        framing.connection_close = true;
                    } else if token.eq_ignore_ascii_case(b"keep-alive") {
                        framing.connection_keep_alive = true;
                    }
                }
            }
        }

        Ok(framing)
    }
}

fn parse_content_length(value: &[u8]) -> Result<u64, ParseError> {
    ensure!(!value.is_empty(), ParseError::invalid_content_length("empty value"));

    let mut length: u64 = 0;
    for &b in value {
        ensure!(b.is_ascii_digit(), ParseError::invalid_content_length(format!("unexpected byte {b:#04x}")));
        length = length
            .checked_mul(10)
            .and_then(|length| length.checked_add(u64::from(b - b'0')))
            .ok_or_else(|| ParseError::invalid_content_length("value overflow"))?;
    }
    Ok(length)
}

/// The last non-empty coding of a Transfer-Encoding value.
///
/// According to RFC 9112, chunked must be the last encoding if present.
fn last_coding(value: &[u8]) -> Option<&[u8]> {
    value.rsplit(|b| *b == b',').map(<[u8]>::trim_ascii).find(|coding| !coding.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use indoc::indoc;

    fn decode(src: &[u8]) -> Result<Option<(ParsedHead, Vec<HeaderIndex>)>, ParseError> {
        let mut fields = Vec::new();
        let head = HeaderDecoder::new(ParserConfig::default()).decode_head(src, &mut fields)?;
        Ok(head.map(|head| (head, fields)))
    }

    #[test]
    fn check_last_coding() {
        assert_eq!(last_coding(b"chunked"), Some(&b"chunked"[..]));
        assert_eq!(last_coding(b"gzip, Chunked "), Some(&b"Chunked"[..]));
        assert_eq!(last_coding(b"chunked, gzip"), Some(&b"gzip"[..]));
        assert_eq!(last_coding(b"gzip, chunked, "), Some(&b"chunked"[..]));
        assert_eq!(last_coding(b""), None);
        assert_eq!(last_coding(b" , "), None);
    }

    #[test]
    fn repeated_transfer_encoding() {
        let (head, _) = decode(b"HTTP/1.1 200 OK\r\nTransfer-Encoding: gzip\r\nTransfer-Encoding: chunked\r\n\r\n")
            .unwrap()
            .unwrap();
        assert!(head.framing.transfer_encoding);
        assert!(head.framing.chunked);

        let (head, _) = decode(b"HTTP/1.1 200 OK\r\nTransfer-Encoding: chunked\r\nTransfer-Encoding: identity\r\n\r\n")
            .unwrap()
            .unwrap();
        assert!(head.framing.transfer_encoding);
        assert!(!head.framing.chunked);

        let (head, _) = decode(b"HTTP/1.1 200 OK\r\nTransfer-Encoding: chunked\r\nTransfer-Encoding:\r\n\r\n").unwrap().unwrap();
        assert!(head.framing.chunked);
    }

    #[test]
    fn section_end_detection() {
        let head = b"HTTP/1.1 200 OK\r\nServer: x\r\n\r\n";
        assert!(section_may_end(head, 0));
        assert!(section_may_end(head, head.len() - 1));
        assert!(!section_may_end(&head[..head.len() - 1], 0));
        assert!(section_may_end(b"HTTP/1.1 200 OK\nA: b\n\n", 20));
        assert!(!section_may_end(b"HTTP/1.1 200 OK\r\nX-Folded: a\r\n b\r\n", 0));
    }

    #[test]
    fn check_content_length() {
        assert_eq!(parse_content_length(b"0"), Ok(0));
        assert_eq!(parse_content_length(b"12345"), Ok(12345));
        assert!(parse_content_length(b"").is_err());
        assert!(parse_content_length(b"+5").is_err());
        assert!(parse_content_length(b"5 5").is_err());
        assert!(parse_content_length(b"99999999999999999999").is_err());
    }

    #[test]
    fn from_nginx() {
        let str = indoc! {r##"
        HTTP/1.1 200 OK
        Server: nginx/1.25.3
        Date: Mon, 15 Jan 2024 08:00:00 GMT
        Content-Type: text/html
        Content-Length: 615
        Connection: keep-alive

        <!DOCTYPE html>"##};

        let (head, fields) = decode(str.as_bytes()).unwrap().unwrap();

        assert_eq!(&str[head.len..], "<!DOCTYPE html>");
        assert_eq!(head.code, 200);
        assert_eq!(head.version, Version::HTTP_11);
        assert_eq!(fields.len(), 5);

        let bytes = str.as_bytes();
        assert_eq!(fields[0].name(bytes), b"Server");
        assert_eq!(fields[0].value(bytes), b"nginx/1.25.3");
        assert_eq!(fields[3].name(bytes), b"Content-Length");
        assert_eq!(fields[3].value(bytes), b"615");

        assert_eq!(head.framing.content_length, Some(615));
        assert!(head.framing.connection_keep_alive);
        assert!(!head.framing.connection_close);
        assert!(!head.framing.chunked);
        assert!(!head.framing.transfer_encoding);
    }

    #[test]
    fn partial_head() {
        assert!(decode(b"HTTP/1.1 200 OK\r\nContent-").unwrap().is_none());
        assert!(decode(b"HTT").unwrap().is_none());
    }

    #[test]
    fn invalid_heads() {
        assert_eq!(decode(b"GARBAGE\r\n\r\n"), Err(ParseError::InvalidVersion));
        assert_eq!(decode(b"HTTP/2.0 200 OK\r\n\r\n"), Err(ParseError::InvalidVersion));
        assert!(matches!(decode(b"HTTP/1.1 2x0 OK\r\n\r\n"), Err(ParseError::InvalidStatus { .. })));
        assert!(matches!(decode(b"HTTP/1.1 099 Low\r\n\r\n"), Err(ParseError::InvalidStatus { .. })));
        assert!(matches!(decode(b"HTTP/1.1 200 OK\r\nNoColon\r\n\r\n"), Err(ParseError::InvalidHeader { .. })));
    }

    #[test]
    fn conflicting_content_length() {
        assert_eq!(
            decode(b"HTTP/1.1 200 OK\r\nContent-Length: 5\r\nContent-Length: 6\r\n\r\n"),
            Err(ParseError::UnexpectedContentLength)
        );

        let (head, _) = decode(b"HTTP/1.1 200 OK\r\nContent-Length: 5\r\nContent-Length: 5\r\n\r\n").unwrap().unwrap();
        assert_eq!(head.framing.content_length, Some(5));
    }

    #[test]
    fn too_many_headers() {
        let mut fields = Vec::new();
        let decoder = HeaderDecoder::new(ParserConfig::default().max_headers(2));
        let result = decoder.decode_head(b"HTTP/1.1 200 OK\r\nA: 1\r\nB: 2\r\nC: 3\r\n\r\n", &mut fields);
        assert_eq!(result, Err(ParseError::too_many_headers(2)));
    }

    #[test]
    fn connection_tokens() {
        let (head, _) = decode(b"HTTP/1.0 200 OK\r\nConnection: Upgrade, Keep-Alive\r\n\r\n").unwrap().unwrap();
        assert_eq!(head.version, Version::HTTP_10);
        assert!(head.framing.connection_keep_alive);

        let (head, _) = decode(b"HTTP/1.1 200 OK\r\nConnection: close\r\n\r\n").unwrap().unwrap();
        assert!(head.framing.connection_close);
    }

    #[test]
    fn folded_value() {
        let src = b"HTTP/1.1 200 OK\r\nX-Folded: first \r\n   second\r\n\tthird\r\n\r\n";
        let (_, mut fields) = decode(src).unwrap().unwrap();

        let mut buf = BytesMut::from(&src[..]);
        fields[0].unfold(&mut buf);
        assert_eq!(fields[0].name(&buf), b"X-Folded");
        assert_eq!(fields[0].value(&buf), b"first second third");
    }

    #[test]
    fn trailers() {
        let decoder = HeaderDecoder::new(ParserConfig::default());
        let mut fields = Vec::new();
        let section = |input: &[u8]| {
            let mut buf = BytesMut::new();
            let start = decoder.begin_trailers(&mut buf);
            buf.extend_from_slice(input);
            (buf, start)
        };

        let (buf, start) = section(b"\r\n");
        assert_eq!(decoder.decode_trailers(&buf, &mut fields), Ok(Some(start + 2)));
        assert!(fields.is_empty());

        let (buf, start) = section(b"Expires: never\r\nX-Sum: 42\r\n\r\nHTTP");
        assert_eq!(decoder.decode_trailers(&buf, &mut fields), Ok(Some(buf.len() - 4)));
        assert_eq!(start, TRAILER_STATUS_LINE.len());
        assert_eq!(fields.len(), 2);
        assert_eq!(fields[1].name(&buf), b"X-Sum");
        assert_eq!(fields[1].value(&buf), b"42");

        let (buf, _) = section(b"Expires: ne");
        assert_eq!(decoder.decode_trailers(&buf, &mut fields), Ok(None));

        // trailers never frame anything, a bogus length is just a field
        let (buf, _) = section(b"Content-Length: nope\r\n\r\n");
        assert!(decoder.decode_trailers(&buf, &mut fields).unwrap().is_some());
    }

    #[test]
    fn folded_trailer() {
        let mut buf = BytesMut::new();
        let decoder = HeaderDecoder::new(ParserConfig::default());
        decoder.begin_trailers(&mut buf);
        buf.extend_from_slice(b"X-T: a\r\n b\r\n\r\n");

        let mut fields = Vec::new();
        assert!(decoder.decode_trailers(&buf, &mut fields).unwrap().is_some());
        fields[0].unfold(&mut buf);
        assert_eq!(fields[0].value(&buf), b"a b");

        let strict = HeaderDecoder::new(ParserConfig::default().allow_obsolete_line_folding(false));
        assert!(matches!(strict.decode_trailers(&buf, &mut fields), Err(ParseError::InvalidHeader { .. })));
    }
}
