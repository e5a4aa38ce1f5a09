//! Parser limits and leniency switches.

/// Maximum size in bytes of the status line plus header section
pub const DEFAULT_MAX_HEADER_SIZE: usize = 80 * 1024;

/// Maximum number of header lines in one header (or trailer) section
pub const DEFAULT_MAX_HEADERS: usize = 100;

/// Configuration of a [`ResponseParser`](crate::codec::ResponseParser).
///
/// ```
/// use micro_http_parser::protocol::ParserConfig;
///
/// let config = ParserConfig::default().max_header_size(16 * 1024).max_headers(32);
/// assert_eq!(config.get_max_headers(), 32);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParserConfig {
    max_header_size: usize,
    max_headers: usize,
    allow_obsolete_line_folding: bool,
}

impl Default for ParserConfig {
    fn default() -> Self {
        Self {
            max_header_size: DEFAULT_MAX_HEADER_SIZE,
            max_headers: DEFAULT_MAX_HEADERS,
            allow_obsolete_line_folding: true,
        }
    }
}

impl ParserConfig {
    /// Limits the bytes buffered for a status line and header section, and separately
    /// for a trailer section.
    pub fn max_header_size(mut self, size: usize) -> Self {
        self.max_header_size = size;
        self
    }

    /// Limits the number of header lines in a section.
    pub fn max_headers(mut self, num: usize) -> Self {
        self.max_headers = num;
        self
    }

    /// Accept header values continued on the next line by leading whitespace
    /// (`obs-fold`). Folds are joined with a single space.
    pub fn allow_obsolete_line_folding(mut self, allow: bool) -> Self {
        self.allow_obsolete_line_folding = allow;
        self
    }

    pub fn get_max_header_size(&self) -> usize {
        self.max_header_size
    }

    pub fn get_max_headers(&self) -> usize {
        self.max_headers
    }

    pub fn get_allow_obsolete_line_folding(&self) -> bool {
        self.allow_obsolete_line_folding
    }
}
