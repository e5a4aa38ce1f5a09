//! HTTP header section decoding
//!
//! - [`HeaderDecoder`]: parses the status line and header section of a response, and
//!   the trailer section after a chunked body
//! - [`HeaderIndex`]: byte ranges of a header name and value inside the parsed buffer
//! - [`FramingHeaders`]: what the headers say about body framing and keep-alive

mod header_decoder;

pub use header_decoder::{FramingHeaders, HeaderDecoder, HeaderIndex, ParsedHead, section_may_end};
