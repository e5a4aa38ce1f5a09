//! Incremental HTTP/1.x response parser
//!
//! [`ResponseParser`] is fed the bytes of one connection in arrival order, split at
//! arbitrary points, and reports what it recognizes to an [`Observer`]. It keeps just
//! enough state between calls to resume in the middle of any token.
//!
//! # State Machine
//!
//! ```text
//! Start -> StatusLine -> HeaderField <-> HeaderValue -> HeadersDone
//!       -> Body(None | Length | Chunked | UntilClose) -> MessageComplete
//!       -> Start (keep-alive) | Closed
//! ```
//!
//! Any state may fail with a [`ParseError`], after which the parser refuses more input
//! until [`ResponseParser::reset`] is called.
//!
//! # Example
//!
//! ```
//! use std::ops::ControlFlow;
//! use micro_http_parser::codec::ResponseParser;
//! use micro_http_parser::protocol::{Feed, Observer};
//!
//! #[derive(Default)]
//! struct Body(Vec<u8>);
//!
//! impl Observer for Body {
//!     fn on_body(&mut self, chunk: &[u8]) -> ControlFlow<()> {
//!         self.0.extend_from_slice(chunk);
//!         ControlFlow::Continue(())
//!     }
//! }
//!
//! let mut parser = ResponseParser::new();
//! let mut body = Body::default();
//!
//! let feed = parser.feed(b"HTTP/1.1 200 OK\r\nContent-Le", &mut body).unwrap();
//! assert_eq!(feed, Feed::Consumed(27));
//! parser.feed(b"ngth: 5\r\n\r\nhello", &mut body).unwrap();
//!
//! assert_eq!(parser.status_code(), 200);
//! assert!(parser.should_keep_alive());
//! assert_eq!(body.0, b"hello");
//! ```

use std::cmp;
use std::ops::ControlFlow;

use bytes::{Buf, BytesMut};
use http::{StatusCode, Version};
use tracing::{debug, trace};

use crate::codec::body::PayloadDecoder;
use crate::codec::header::{FramingHeaders, HeaderDecoder, HeaderIndex, ParsedHead, section_may_end};
use crate::ensure;
use crate::protocol::{BodyPolicy, Feed, Framing, Observer, ParseError, ParserConfig, PayloadItem};

/// Where the parser is in the response grammar, as seen from outside.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum ParserState {
    /// Waiting for the first byte of a response
    Start,
    /// Reading the status line and header section
    StatusLine,
    /// About to report a header (or trailer) name
    HeaderField,
    /// About to report a header (or trailer) value
    HeaderValue,
    /// About to report that the header section is complete
    HeadersDone,
    /// Reading the body; a fixed length holds the bytes still expected
    Body(Framing),
    /// About to report that the response is complete
    MessageComplete,
    /// The connection can not carry another response
    Closed,
    /// A syntax error was found
    Error,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
enum Section {
    Head,
    Trailer,
}

#[derive(Debug)]
enum State {
    Start,
    Head,
    Field(Section, usize),
    Value(Section, usize),
    HeadersDone,
    Body(PayloadDecoder),
    Trailers,
    MessageDone,
    Closed,
}

/// An HTTP/1.x response parser for a single connection.
///
/// The parser owns a buffer for the status line and header section, so header names and
/// values are always reported whole, however the input was split. Body bytes are never
/// buffered: they are passed to [`Observer::on_body`] as slices of the input.
///
/// A parser is bound to one connection's byte stream. It is reset automatically when a
/// response completes on a connection that stays alive, and never otherwise.
#[derive(Debug)]
pub struct ResponseParser {
    config: ParserConfig,
    header_decoder: HeaderDecoder,
    state: State,
    buf: BytesMut,
    /// bytes at the start of `buf` that were not read from the input
    section_start: usize,
    fields: Vec<HeaderIndex>,
    status_code: u16,
    version: Version,
    framing_headers: FramingHeaders,
    framing: Option<Framing>,
    keep_alive: bool,
    last_error: Option<ParseError>,
}

impl Default for ResponseParser {
    fn default() -> Self {
        Self::new()
    }
}

impl ResponseParser {
    /// Creates a parser with the default [`ParserConfig`].
    pub fn new() -> Self {
        Self::with_config(ParserConfig::default())
    }

    pub fn with_config(config: ParserConfig) -> Self {
        Self {
            config,
            header_decoder: HeaderDecoder::new(config),
            state: State::Start,
            buf: BytesMut::new(),
            section_start: 0,
            fields: Vec::new(),
            status_code: 0,
            version: Version::HTTP_10,
            framing_headers: FramingHeaders::default(),
            framing: None,
            keep_alive: false,
            last_error: None,
        }
    }

    pub fn config(&self) -> &ParserConfig {
        &self.config
    }

    /// Feeds the next bytes of the stream.
    ///
    /// Observer callbacks run synchronously, in wire order, before this returns.
    /// Incomplete tokens at the end of `data` are consumed and buffered; several
    /// pipelined responses are parsed one after the other while the connection stays
    /// alive.
    ///
    /// An empty `data` consumes nothing. It does deliver events left pending by an
    /// earlier call that an observer aborted.
    ///
    /// # Returns
    ///
    /// - `Ok(Feed::Consumed(n))`: all `n` bytes of `data` were processed
    /// - `Ok(Feed::Aborted { consumed })`: an observer callback stopped the parser;
    ///   feed `data[consumed..]` again to continue
    /// - `Err(ParseError)`: the response is malformed. The parser stays failed and
    ///   returns the same error from every later call until [`reset`](Self::reset).
    pub fn feed<O: Observer + ?Sized>(&mut self, data: &[u8], observer: &mut O) -> Result<Feed, ParseError> {
        if let Some(e) = &self.last_error {
            return Err(e.clone());
        }

        let mut src = data;
        match self.run(&mut src, observer) {
            Ok(flow) => {
                let consumed = data.len() - src.len();
                Ok(match flow {
                    ControlFlow::Continue(()) => Feed::Consumed(consumed),
                    ControlFlow::Break(()) => Feed::Aborted { consumed },
                })
            }
            Err(e) => Err(self.fail(e)),
        }
    }

    /// Tells the parser the transport reached end of stream.
    ///
    /// This is how a body delimited by the connection closing completes: the observer
    /// gets [`Observer::on_message_complete`] and the parser moves to
    /// [`ParserState::Closed`]. Between responses this does nothing. Anywhere else the
    /// response was cut short, which fails with [`ParseError::InvalidEofState`].
    pub fn finish<O: Observer + ?Sized>(&mut self, observer: &mut O) -> Result<Feed, ParseError> {
        if let Some(e) = &self.last_error {
            return Err(e.clone());
        }

        // deliver whatever an aborted call left pending first
        let mut src: &[u8] = &[];
        match self.run(&mut src, observer) {
            Ok(ControlFlow::Continue(())) => {}
            Ok(ControlFlow::Break(())) => return Ok(Feed::Aborted { consumed: 0 }),
            Err(e) => return Err(self.fail(e)),
        }

        match self.state {
            State::Start | State::Closed => return Ok(Feed::Consumed(0)),
            State::Body(ref decoder) if decoder.is_until_close() => {}
            _ => return Err(self.fail(ParseError::InvalidEofState)),
        }

        trace!("end of stream, close-delimited body complete");
        self.keep_alive = false;
        self.state = State::MessageDone;
        match self.run(&mut src, observer) {
            Ok(ControlFlow::Continue(())) => Ok(Feed::Consumed(0)),
            Ok(ControlFlow::Break(())) => Ok(Feed::Aborted { consumed: 0 }),
            Err(e) => Err(self.fail(e)),
        }
    }

    /// Returns the parser to its freshly constructed state, forgetting any error.
    pub fn reset(&mut self) {
        *self = Self::with_config(self.config);
    }

    /// Status code of the most recently parsed status line, `0` before the first one.
    pub fn status_code(&self) -> u16 {
        self.status_code
    }

    /// [`status_code`](Self::status_code) as an [`http::StatusCode`].
    pub fn status(&self) -> Option<StatusCode> {
        StatusCode::from_u16(self.status_code).ok()
    }

    /// Protocol version of the most recently parsed status line, HTTP/1.0 before the
    /// first one.
    pub fn http_version(&self) -> Version {
        self.version
    }

    /// Whether the connection may carry another response after the current one.
    ///
    /// Decided when the header section completes: HTTP/1.1 keeps the connection alive
    /// unless `Connection: close` says otherwise, HTTP/1.0 only with
    /// `Connection: keep-alive`, and a body delimited by the connection closing never
    /// allows it. Always false after an error.
    pub fn should_keep_alive(&self) -> bool {
        self.last_error.is_none() && !matches!(self.state, State::Closed) && self.keep_alive
    }

    /// Body framing of the current response, once its header section is complete.
    pub fn framing(&self) -> Option<Framing> {
        self.framing
    }

    /// Whether the current response declared `Transfer-Encoding: chunked`.
    pub fn is_chunked(&self) -> bool {
        self.framing_headers.chunked
    }

    pub fn last_error(&self) -> Option<&ParseError> {
        self.last_error.as_ref()
    }

    pub fn state(&self) -> ParserState {
        if self.last_error.is_some() {
            return ParserState::Error;
        }

        match &self.state {
            State::Start => ParserState::Start,
            State::Head => ParserState::StatusLine,
            State::Field(..) => ParserState::HeaderField,
            State::Value(..) => ParserState::HeaderValue,
            State::HeadersDone => ParserState::HeadersDone,
            State::Body(decoder) => ParserState::Body(decoder.framing()),
            State::Trailers => ParserState::Body(Framing::Chunked),
            State::MessageDone => ParserState::MessageComplete,
            State::Closed => ParserState::Closed,
        }
    }

    fn fail(&mut self, e: ParseError) -> ParseError {
        debug!(cause = %e, "response parse failed");
        self.keep_alive = false;
        self.last_error = Some(e.clone());
        e
    }

    /// Drives the state machine until the input runs out or an observer aborts.
    ///
    /// `src` is advanced past every byte that was processed.
    fn run<O: Observer + ?Sized>(&mut self, src: &mut &[u8], observer: &mut O) -> Result<ControlFlow<()>, ParseError> {
        loop {
            let flow = match self.state {
                State::Start => {
                    let Some(&b) = src.first() else {
                        return Ok(ControlFlow::Continue(()));
                    };
                    // tolerate empty lines between responses
                    if matches!(b, b'\r' | b'\n') {
                        src.advance(1);
                        continue;
                    }
                    ensure!(b == b'H', ParseError::InvalidConstant);

                    self.begin_message();
                    self.state = State::Head;
                    observer.on_message_begin()
                }

                State::Head => {
                    if src.is_empty() {
                        return Ok(ControlFlow::Continue(()));
                    }
                    if let Some(head) = self.read_head(src)? {
                        self.apply_head(head);
                        self.state = self.next_field(Section::Head, 0);
                    }
                    ControlFlow::Continue(())
                }

                State::Field(section, index) => {
                    self.state = State::Value(section, index);
                    observer.on_header_field(self.fields[index].name(&self.buf))
                }

                State::Value(section, index) => {
                    self.state = self.next_field(section, index + 1);
                    observer.on_header_value(self.fields[index].value(&self.buf))
                }

                State::HeadersDone => {
                    let policy = observer.on_headers_complete();
                    let framing = self.select_framing(policy);
                    self.framing = Some(framing);
                    self.keep_alive = self.compute_keep_alive(framing);
                    trace!(?framing, keep_alive = self.keep_alive, status = self.status_code, "headers complete");

                    self.clear_section();
                    self.state = match PayloadDecoder::from_framing(framing) {
                        Some(decoder) => State::Body(decoder),
                        None => State::MessageDone,
                    };
                    ControlFlow::Continue(())
                }

                State::Body(ref mut decoder) => {
                    let chunked = decoder.is_chunked();
                    match decoder.decode(src)? {
                        Some(PayloadItem::Chunk(bytes)) => {
                            trace!(len = bytes.len(), "read body bytes");
                            observer.on_body(bytes)
                        }
                        Some(PayloadItem::Eof) if chunked => {
                            self.clear_section();
                            self.section_start = self.header_decoder.begin_trailers(&mut self.buf);
                            self.state = State::Trailers;
                            ControlFlow::Continue(())
                        }
                        Some(PayloadItem::Eof) => {
                            self.state = State::MessageDone;
                            ControlFlow::Continue(())
                        }
                        None => return Ok(ControlFlow::Continue(())),
                    }
                }

                State::Trailers => {
                    if src.is_empty() {
                        return Ok(ControlFlow::Continue(()));
                    }
                    if self.read_trailers(src)? {
                        self.unfold_fields();
                        self.state = self.next_field(Section::Trailer, 0);
                    }
                    ControlFlow::Continue(())
                }

                State::MessageDone => {
                    trace!(keep_alive = self.keep_alive, "message complete");
                    self.clear_section();
                    self.state = if self.keep_alive { State::Start } else { State::Closed };
                    observer.on_message_complete()
                }

                State::Closed => {
                    let Some(&b) = src.first() else {
                        return Ok(ControlFlow::Continue(()));
                    };
                    ensure!(matches!(b, b'\r' | b'\n'), ParseError::ClosedConnection);
                    src.advance(1);
                    ControlFlow::Continue(())
                }
            };

            if flow.is_break() {
                trace!("observer aborted parsing");
                return Ok(ControlFlow::Break(()));
            }
        }
    }

    fn begin_message(&mut self) {
        self.clear_section();
        self.framing_headers = FramingHeaders::default();
        self.framing = None;
        self.keep_alive = false;
    }

    fn clear_section(&mut self) {
        self.buf.clear();
        self.section_start = 0;
        self.fields.clear();
    }

    /// Moves as much of `src` as the header size limit allows into the head buffer and
    /// tries to parse it, once the buffered bytes can hold the end of the section.
    ///
    /// On success exactly the bytes of the head are consumed from `src`, anything after
    /// them is left for the body.
    fn read_head(&mut self, src: &mut &[u8]) -> Result<Option<ParsedHead>, ParseError> {
        let buffered = self.fill_buf(*src);
        if !section_may_end(&self.buf, buffered) {
            self.consume_partial(src, buffered)?;
            return Ok(None);
        }

        match self.header_decoder.decode_head(&self.buf, &mut self.fields)? {
            Some(head) => {
                self.consume_section(src, buffered, head.len);
                Ok(Some(head))
            }
            None => {
                self.consume_partial(src, buffered)?;
                Ok(None)
            }
        }
    }

    /// Same as [`read_head`](Self::read_head), for the trailer section after a chunked body.
    fn read_trailers(&mut self, src: &mut &[u8]) -> Result<bool, ParseError> {
        let buffered = self.fill_buf(*src);
        if !section_may_end(&self.buf, buffered) {
            self.consume_partial(src, buffered)?;
            return Ok(false);
        }

        match self.header_decoder.decode_trailers(&self.buf, &mut self.fields)? {
            Some(len) => {
                self.consume_section(src, buffered, len);
                Ok(true)
            }
            None => {
                self.consume_partial(src, buffered)?;
                Ok(false)
            }
        }
    }

    /// Appends input to the head buffer, up to the header size limit. Returns the
    /// length of the buffer before.
    fn fill_buf(&mut self, src: &[u8]) -> usize {
        let buffered = self.buf.len();
        let room = (self.config.get_max_header_size() + self.section_start).saturating_sub(buffered);
        self.buf.extend_from_slice(&src[..cmp::min(room, src.len())]);
        buffered
    }

    /// The section ends `len` bytes into the buffer: consumes its input bytes and drops
    /// anything buffered past it.
    fn consume_section(&mut self, src: &mut &[u8], buffered: usize, len: usize) {
        src.advance(len.saturating_sub(buffered));
        self.buf.truncate(len);
    }

    /// The buffered bytes are an incomplete section: they are all consumed, unless the
    /// limit was reached.
    fn consume_partial(&mut self, src: &mut &[u8], buffered: usize) -> Result<(), ParseError> {
        let max_size = self.config.get_max_header_size();
        let section_size = self.buf.len() - self.section_start;
        ensure!(section_size < max_size, ParseError::too_large_header(section_size, max_size));
        src.advance(self.buf.len() - buffered);
        Ok(())
    }

    fn unfold_fields(&mut self) {
        for field in &mut self.fields {
            field.unfold(&mut self.buf);
        }
    }

    fn apply_head(&mut self, head: ParsedHead) {
        self.status_code = head.code;
        self.version = head.version;
        self.framing_headers = head.framing;
        self.unfold_fields();
    }

    fn next_field(&self, section: Section, index: usize) -> State {
        if index < self.fields.len() {
            return State::Field(section, index);
        }
        match section {
            Section::Head => State::HeadersDone,
            Section::Trailer => State::MessageDone,
        }
    }

    /// Decides how the body is delimited, in order of precedence.
    fn select_framing(&self, policy: BodyPolicy) -> Framing {
        // 1xx, 204 and 304 responses never carry a body, whatever their headers say
        let bodyless_status = (100..200).contains(&self.status_code) || self.status_code == 204 || self.status_code == 304;

        if policy == BodyPolicy::Skip || bodyless_status {
            Framing::None
        } else if self.framing_headers.chunked {
            Framing::Chunked
        } else if self.framing_headers.transfer_encoding {
            // a transfer coding without chunked can only end with the connection
            Framing::UntilClose
        } else if let Some(length) = self.framing_headers.content_length {
            Framing::Length(length)
        } else {
            Framing::UntilClose
        }
    }

    fn compute_keep_alive(&self, framing: Framing) -> bool {
        if framing.is_until_close() || self.framing_headers.connection_close {
            return false;
        }
        self.version == Version::HTTP_11 || self.framing_headers.connection_keep_alive
    }
}
