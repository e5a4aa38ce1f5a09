//! HTTP/1.x response decoding
//!
//! This module turns the raw bytes of a connection into response events. It uses a
//! state machine to resume parsing at any byte boundary.
//!
//! # Architecture
//!
//! - [`ResponseParser`]: drives the state machine and calls the observer
//! - `header`: status line, header and trailer section parsing on top of `httparse`
//! - `body`: payload decoding for fixed-length, chunked and close-delimited bodies
//!
//! # Example
//!
//! ```
//! use micro_http_parser::codec::{ParserState, ResponseParser};
//!
//! let mut parser = ResponseParser::new();
//! parser.feed(b"HTTP/1.1 304 Not Modified\r\n\r\n", &mut ()).unwrap();
//!
//! assert_eq!(parser.status_code(), 304);
//! assert_eq!(parser.state(), ParserState::Start);
//! ```

mod body;
mod header;
mod response_parser;

pub use response_parser::{ParserState, ResponseParser};
