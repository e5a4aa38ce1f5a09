use thiserror::Error;

/// A malformed response.
///
/// Every variant is a protocol syntax violation: once the parser returns one of these
/// it is terminally failed and the connection should be closed. Observer aborts are
/// not errors and never show up here, see [`Feed::Aborted`](crate::protocol::Feed).
///
/// The messages follow the diagnostic phrases of the C `http_parser`.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    #[error("invalid constant string")]
    InvalidConstant,

    #[error("invalid HTTP version")]
    InvalidVersion,

    #[error("invalid HTTP status code: {reason}")]
    InvalidStatus { reason: String },

    #[error("invalid header field: {reason}")]
    InvalidHeader { reason: String },

    #[error("header overflow, current: {current_size} exceed the limit {max_size}")]
    TooLargeHeader { current_size: usize, max_size: usize },

    #[error("header number exceed the limit {max_num}")]
    TooManyHeaders { max_num: usize },

    #[error("invalid character in content length: {reason}")]
    InvalidContentLength { reason: String },

    #[error("unexpected content-length header")]
    UnexpectedContentLength,

    #[error("invalid chunk size: {reason}")]
    InvalidChunkSize { reason: String },

    #[error("invalid chunked body: {reason}")]
    InvalidChunkedBody { reason: String },

    #[error("data received after completed connection: close message")]
    ClosedConnection,

    #[error("stream ended at an unexpected time")]
    InvalidEofState,
}

impl ParseError {
    pub fn invalid_status<S: ToString>(str: S) -> Self {
        Self::InvalidStatus { reason: str.to_string() }
    }

    pub fn invalid_header<S: ToString>(str: S) -> Self {
        Self::InvalidHeader { reason: str.to_string() }
    }

    pub fn too_large_header(current_size: usize, max_size: usize) -> Self {
        Self::TooLargeHeader { current_size, max_size }
    }

    pub fn too_many_headers(max_num: usize) -> Self {
        Self::TooManyHeaders { max_num }
    }

    pub fn invalid_content_length<S: ToString>(str: S) -> Self {
        Self::InvalidContentLength { reason: str.to_string() }
    }

    pub fn invalid_chunk_size<S: ToString>(str: S) -> Self {
        Self::InvalidChunkSize { reason: str.to_string() }
    }

    pub fn invalid_chunked_body<S: ToString>(str: S) -> Self {
        Self::InvalidChunkedBody { reason: str.to_string() }
    }
}
