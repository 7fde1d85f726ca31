//! Size limits for [`HttpEngine`](super::HttpEngine).

/// Default maximum number of header fields in one message
pub const DEFAULT_MAX_HEADERS: usize = 64;

/// Default maximum size of the request line plus header section
pub const DEFAULT_MAX_HEAD_BYTES: usize = 8 * 1024;

/// Limits enforced while recognizing a message.
///
/// # Example
///
/// ```
/// use micro_http_pipeline::engine::{HttpEngine, Limits};
///
/// let limits = Limits::default().with_max_headers(32).with_max_body_bytes(1024 * 1024);
/// let engine = HttpEngine::with_limits(limits);
/// # let _ = engine;
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Limits {
    /// Maximum number of header fields
    pub max_headers: usize,
    /// Maximum size in bytes of the request line plus headers
    pub max_head_bytes: usize,
    /// Maximum size in bytes of one decoded body, unlimited if `None`
    pub max_body_bytes: Option<u64>,
}

impl Default for Limits {
    fn default() -> Self {
        Self { max_headers: DEFAULT_MAX_HEADERS, max_head_bytes: DEFAULT_MAX_HEAD_BYTES, max_body_bytes: None }
    }
}

impl Limits {
    #[must_use]
    pub fn with_max_headers(mut self, max_headers: usize) -> Self {
        self.max_headers = max_headers;
        self
    }

    #[must_use]
    pub fn with_max_head_bytes(mut self, max_head_bytes: usize) -> Self {
        self.max_head_bytes = max_head_bytes;
        self
    }

    #[must_use]
    pub fn with_max_body_bytes(mut self, max_body_bytes: u64) -> Self {
        self.max_body_bytes = Some(max_body_bytes);
        self
    }
}
