//! Core types shared by the parser and its users.
//!
//! - **Events** ([`observer`]): the [`Observer`] trait receiving parse events, and the
//!   [`BodyPolicy`] returned when the header section completes
//! - **Message Framing** ([`message`]): [`Framing`], [`PayloadItem`] and the [`Feed`]
//!   outcome of a feed call
//! - **Configuration** ([`config`]): [`ParserConfig`] limits and leniencies
//! - **Error Handling** ([`error`]): [`ParseError`]

mod message;
pub use message::Feed;
pub use message::Framing;
pub use message::PayloadItem;

mod observer;
pub use observer::BodyPolicy;
pub use observer::Observer;

mod config;
pub use config::DEFAULT_MAX_HEADERS;
pub use config::DEFAULT_MAX_HEADER_SIZE;
pub use config::ParserConfig;

mod error;
pub use error::ParseError;
