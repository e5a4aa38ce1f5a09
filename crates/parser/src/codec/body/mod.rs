//! Response body decoding.
//!
//! Once the header section is complete the parser knows how the body is framed and
//! hands the rest of the stream to a decoder from this module.
//!
//! # Components
//!
//! - [`PayloadDecoder`]: picks the decoding strategy for the framing
//! - `ChunkedDecoder`: chunked transfer encoding, up to the trailer section
//! - `LengthDecoder`: fixed-length payloads
//!
//! Decoders work on `&mut &[u8]` cursors: they advance the cursor past what they read
//! and return body bytes as slices of the caller's input.

mod chunked_decoder;
mod length_decoder;
mod payload_decoder;

pub use payload_decoder::PayloadDecoder;
