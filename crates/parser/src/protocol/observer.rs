//! The event interface between the parser and whoever consumes the response.
//!
//! The parser never stores headers or body for the caller. It reports every grammar
//! element it recognizes to an [`Observer`] and lets the observer decide what to keep.

use std::ops::ControlFlow;

/// What to do with the body once the header section is complete.
///
/// Only the caller knows which request a response answers, so deciding that a
/// response to `HEAD` carries no body despite its `Content-Length` is up to the
/// observer.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq)]
pub enum BodyPolicy {
    /// Read the body according to the response framing headers
    #[default]
    Read,
    /// Treat the message as complete right after its headers
    Skip,
}

/// Receives parse events from a [`ResponseParser`](crate::codec::ResponseParser).
///
/// Callbacks are invoked synchronously and strictly in wire order. Every method has a
/// default that does nothing and lets parsing continue, so an implementation only
/// overrides the events it cares about.
///
/// Byte slices handed to callbacks are only valid for the duration of the call; copy
/// them if they must outlive it.
///
/// Returning [`ControlFlow::Break`] stops the current `feed` call, which then reports
/// [`Feed::Aborted`](crate::protocol::Feed). This is not an error: feeding the
/// unconsumed rest of the input later continues exactly where parsing stopped.
pub trait Observer {
    /// A new response starts.
    fn on_message_begin(&mut self) -> ControlFlow<()> {
        ControlFlow::Continue(())
    }

    /// A complete header name. Also used for trailer fields after a chunked body.
    fn on_header_field(&mut self, field: &[u8]) -> ControlFlow<()> {
        let _ = field;
        ControlFlow::Continue(())
    }

    /// A complete header value, trimmed and with obsolete line folding joined.
    fn on_header_value(&mut self, value: &[u8]) -> ControlFlow<()> {
        let _ = value;
        ControlFlow::Continue(())
    }

    /// The header section is complete; status code, version and keep-alive are known.
    fn on_headers_complete(&mut self) -> BodyPolicy {
        BodyPolicy::Read
    }

    /// A run of body bytes, already stripped of any chunked framing.
    fn on_body(&mut self, chunk: &[u8]) -> ControlFlow<()> {
        let _ = chunk;
        ControlFlow::Continue(())
    }

    /// The response is complete.
    fn on_message_complete(&mut self) -> ControlFlow<()> {
        ControlFlow::Continue(())
    }
}

/// Ignores every event.
impl Observer for () {}

impl<O: Observer + ?Sized> Observer for &mut O {
    fn on_message_begin(&mut self) -> ControlFlow<()> {
        (**self).on_message_begin()
    }

    fn on_header_field(&mut self, field: &[u8]) -> ControlFlow<()> {
        (**self).on_header_field(field)
    }

    fn on_header_value(&mut self, value: &[u8]) -> ControlFlow<()> {
        (**self).on_header_value(value)
    }

    fn on_headers_complete(&mut self) -> BodyPolicy {
        (**self).on_headers_complete()
    }

    fn on_body(&mut self, chunk: &[u8]) -> ControlFlow<()> {
        (**self).on_body(chunk)
    }

    fn on_message_complete(&mut self) -> ControlFlow<()> {
        (**self).on_message_complete()
    }
}
