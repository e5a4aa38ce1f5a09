//! An incremental, event-driven HTTP/1.x response parser
//!
//! This crate parses the byte stream a client reads from one connection. Bytes may arrive
//! split at any point; the parser keeps just enough state to resume, and reports what it
//! recognizes to an [`Observer`](protocol::Observer) as it goes:
//!
//! - the start of each response
//! - every header name and value, whole, in wire order
//! - the end of the header section, where the observer may choose to skip the body
//! - body bytes, with chunked transfer encoding already removed
//! - the end of each response
//!
//! It also answers what the client needs to manage the connection: the status code, the
//! protocol version and whether the connection can be reused.
//!
//! # Example
//!
//! ```
//! use std::ops::ControlFlow;
//! use micro_http_parser::codec::ResponseParser;
//! use micro_http_parser::protocol::Observer;
//!
//! #[derive(Default)]
//! struct Collect {
//!     headers: Vec<(String, String)>,
//!     body: Vec<u8>,
//!     complete: bool,
//! }
//!
//! impl Observer for Collect {
//!     fn on_header_field(&mut self, field: &[u8]) -> ControlFlow<()> {
//!         self.headers.push((String::from_utf8_lossy(field).into_owned(), String::new()));
//!         ControlFlow::Continue(())
//!     }
//!
//!     fn on_header_value(&mut self, value: &[u8]) -> ControlFlow<()> {
//!         if let Some((_, v)) = self.headers.last_mut() {
//!             *v = String::from_utf8_lossy(value).into_owned();
//!         }
//!         ControlFlow::Continue(())
//!     }
//!
//!     fn on_body(&mut self, chunk: &[u8]) -> ControlFlow<()> {
//!         self.body.extend_from_slice(chunk);
//!         ControlFlow::Continue(())
//!     }
//!
//!     fn on_message_complete(&mut self) -> ControlFlow<()> {
//!         self.complete = true;
//!         ControlFlow::Continue(())
//!     }
//! }
//!
//! let mut parser = ResponseParser::new();
//! let mut collect = Collect::default();
//!
//! let response = b"HTTP/1.1 200 OK\r\nTransfer-Encoding: chunked\r\n\r\n4\r\nWiki\r\n5\r\npedia\r\n0\r\n\r\n";
//! for part in response.chunks(7) {
//!     parser.feed(part, &mut collect).unwrap();
//! }
//!
//! assert!(collect.complete);
//! assert_eq!(collect.body, b"Wikipedia");
//! assert_eq!(collect.headers, vec![("Transfer-Encoding".to_string(), "chunked".to_string())]);
//! assert_eq!(parser.status_code(), 200);
//! assert!(parser.should_keep_alive());
//! ```
//!
//! # Architecture
//!
//! - [`codec`]: the [`ResponseParser`](codec::ResponseParser) state machine, with its
//!   header and body decoders
//! - [`protocol`]: the observer interface, framing types, configuration and errors
//!
//! # Logging
//!
//! The parser emits `tracing` events: `trace` for every parsed head, body read and
//! completed message, `debug` when a parse fails. Install any `tracing` subscriber to
//! see them.
//!
//! # Limitations
//!
//! - Responses only, requests are not parsed
//! - No `Upgrade` or `CONNECT` tunnel handling
//! - Maximum header section size: 80KB by default
//! - Maximum number of headers: 100 by default

pub mod codec;
pub mod protocol;

mod utils;
pub(crate) use utils::ensure;
