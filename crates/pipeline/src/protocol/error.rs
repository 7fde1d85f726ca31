use std::error::Error as StdError;

use thiserror::Error;

/// Failure of one [`MessageParser::execute`](crate::assembler::MessageParser::execute) call.
///
/// Either kind is fatal for the stream: the caller should stop feeding chunks
/// to the parser that returned it.
#[derive(Debug, Error)]
pub enum ExecuteError<E: StdError + 'static> {
    #[error("engine error: {source}")]
    Engine {
        #[source]
        source: E,
    },

    #[error("engine made no progress, consumed {consumed} of {total} bytes")]
    Stalled { consumed: usize, total: usize },
}

impl<E: StdError + 'static> ExecuteError<E> {
    pub fn engine(source: E) -> Self {
        Self::Engine { source }
    }

    pub fn stalled(consumed: usize, total: usize) -> Self {
        Self::Stalled { consumed, total }
    }

    /// Returns the engine error, if this failure came from the engine.
    pub fn as_engine(&self) -> Option<&E> {
        match self {
            Self::Engine { source } => Some(source),
            Self::Stalled { .. } => None,
        }
    }

    #[inline]
    pub fn is_stalled(&self) -> bool {
        matches!(self, Self::Stalled { .. })
    }
}

/// Grammar and framing errors raised by [`HttpEngine`](crate::engine::HttpEngine).
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    #[error("header size too large, current: {current_size} exceed the limit {max_size}")]
    TooLargeHeader { current_size: usize, max_size: usize },

    #[error("header number exceed the limit {max_num}")]
    TooManyHeaders { max_num: usize },

    #[error("invalid header: {reason}")]
    InvalidHeader { reason: String },

    #[error("invalid http version: {0:?}")]
    InvalidVersion(Option<u8>),

    #[error("invalid http method")]
    InvalidMethod,

    #[error("invalid http uri")]
    InvalidUri,

    #[error("invalid content-length header: {reason}")]
    InvalidContentLength { reason: String },

    #[error("invalid body: {reason}")]
    InvalidBody { reason: String },

    #[error("body size too large, current: {current_size} exceed the limit {max_size}")]
    TooLargeBody { current_size: u64, max_size: u64 },

    #[error("engine is unusable after an earlier parse failure")]
    Poisoned,
}

impl ParseError {
    pub fn too_large_header(current_size: usize, max_size: usize) -> Self {
        Self::TooLargeHeader { current_size, max_size }
    }

    pub fn too_many_headers(max_num: usize) -> Self {
        Self::TooManyHeaders { max_num }
    }

    pub fn invalid_header<S: ToString>(str: S) -> Self {
        Self::InvalidHeader { reason: str.to_string() }
    }

    pub fn invalid_body<S: ToString>(str: S) -> Self {
        Self::InvalidBody { reason: str.to_string() }
    }

    pub fn invalid_content_length<S: ToString>(str: S) -> Self {
        Self::InvalidContentLength { reason: str.to_string() }
    }

    pub fn too_large_body(current_size: u64, max_size: u64) -> Self {
        Self::TooLargeBody { current_size, max_size }
    }
}

/// Errors converting a completed [`Message`](crate::protocol::Message) into an `http::Request`.
#[derive(Error, Debug)]
pub enum ConvertError {
    #[error("message has no method")]
    MissingMethod,

    #[error("message has no request target")]
    MissingTarget,

    #[error("http error: {source}")]
    Http {
        #[from]
        source: http::Error,
    },
}
