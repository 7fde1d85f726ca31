//! Request head recognition.
//!
//! The request line and header section are parsed with `httparse`. Parsing
//! happens in two stages so the parsed head can outlive the borrow of the input:
//!
//! 1. [`parse_head`] runs `httparse` and records the byte ranges of every header
//!    name and value ([`HeaderIndex`]) instead of borrowing them
//! 2. [`ParsedHead::into_head`] slices those ranges out of the frozen head bytes,
//!    so all header values share one head-sized buffer, and derives the body
//!    framing and keep-alive state from the headers

use bytes::Bytes;
use http::{HeaderValue, Method};
use httparse::{Error, Status};
use tracing::trace;

use crate::engine::Limits;
use crate::engine::body::PayloadSize;
use crate::ensure;
use crate::protocol::ParseError;

/// A complete head recognized by `httparse`, not yet tied to its bytes.
#[derive(Debug)]
pub struct ParsedHead {
    /// Length of the head, including the empty line ending it
    pub len: usize,
    method: Method,
    target: String,
    minor_version: u8,
    headers: Vec<HeaderIndex>,
}

/// A request head with its framing decided.
#[derive(Debug)]
pub struct Head {
    pub method: Method,
    pub target: String,
    pub minor_version: u8,
    pub headers: Vec<(String, HeaderValue)>,
    pub payload_size: PayloadSize,
    pub keep_alive: bool,
}

/// Byte ranges of a header's name and value within the head.
#[derive(Debug, Clone, Copy)]
struct HeaderIndex {
    name: (usize, usize),
    value: (usize, usize),
}

impl HeaderIndex {
    fn record(bytes: &[u8], headers: &[httparse::Header<'_>]) -> Vec<HeaderIndex> {
        let bytes_ptr = bytes.as_ptr() as usize;
        headers
            .iter()
            .map(|header| {
                let name_start = header.name.as_ptr() as usize - bytes_ptr;
                let value_start = header.value.as_ptr() as usize - bytes_ptr;
                HeaderIndex {
                    name: (name_start, name_start + header.name.len()),
                    value: (value_start, value_start + header.value.len()),
                }
            })
            .collect()
    }
}

/// Tries to parse a request head from the start of `src`.
///
/// # Returns
///
/// - `Ok(Some(head))` if `src` starts with a complete head
/// - `Ok(None)` if more bytes are needed
/// - `Err(ParseError)` if the head is malformed or exceeds `limits`
pub fn parse_head(src: &[u8], limits: &Limits) -> Result<Option<ParsedHead>, ParseError> {
    let mut headers = vec![httparse::EMPTY_HEADER; limits.max_headers];
    let mut req = httparse::Request::new(&mut headers);

    let status = req.parse(src).map_err(|e| match e {
        Error::TooManyHeaders => ParseError::too_many_headers(limits.max_headers),
        Error::Version => ParseError::InvalidVersion(None),
        e => ParseError::invalid_header(e),
    })?;

    match status {
        Status::Complete(len) => {
            trace!(head_size = len, "parsed request head");
            ensure!(len <= limits.max_head_bytes, ParseError::too_large_header(len, limits.max_head_bytes));

            let method = req.method.ok_or(ParseError::InvalidMethod)?;
            let method = Method::from_bytes(method.as_bytes()).ok().ok_or(ParseError::InvalidMethod)?;
            let target = req.path.ok_or(ParseError::InvalidUri)?.to_owned();

            // HTTP/2 and HTTP/3 have no textual request line
            let minor_version = match req.version {
                Some(version @ (0 | 1)) => version,
                version => return Err(ParseError::InvalidVersion(version)),
            };

            let headers = HeaderIndex::record(src, req.headers);

            Ok(Some(ParsedHead { len, method, target, minor_version, headers }))
        }
        Status::Partial => {
            ensure!(src.len() <= limits.max_head_bytes, ParseError::too_large_header(src.len(), limits.max_head_bytes));
            Ok(None)
        }
    }
}

impl ParsedHead {
    /// Resolves the recorded header ranges against `bytes`, the `len` bytes of
    /// the head this was parsed from.
    pub fn into_head(self, bytes: &Bytes) -> Result<Head, ParseError> {
        debug_assert_eq!(bytes.len(), self.len, "head bytes do not match the parsed head");

        let mut headers = Vec::with_capacity(self.headers.len());
        for index in &self.headers {
            // httparse only accepts token characters in names, so this never fails
            let name = std::str::from_utf8(&bytes[index.name.0..index.name.1]).map_err(ParseError::invalid_header)?;
            let value = HeaderValue::from_maybe_shared(bytes.slice(index.value.0..index.value.1))
                .map_err(ParseError::invalid_header)?;
            headers.push((name.to_owned(), value));
        }

        let payload_size = payload_size(&headers)?;
        let keep_alive = keep_alive(self.minor_version, &headers);

        Ok(Head {
            method: self.method,
            target: self.target,
            minor_version: self.minor_version,
            headers,
            payload_size,
            keep_alive,
        })
    }
}

/// Determines the body framing according to
/// [RFC 9112 Section 6.3](https://www.rfc-editor.org/rfc/rfc9112#section-6.3).
///
/// - `Transfer-Encoding` with `chunked` as the final coding: chunked body
/// - `Content-Length`: fixed-length body
/// - neither: no body
///
/// Both headers at once, a `Transfer-Encoding` not ending in `chunked`, and
/// conflicting `Content-Length` values are rejected.
fn payload_size(headers: &[(String, HeaderValue)]) -> Result<PayloadSize, ParseError> {
    let mut te_value = None;
    let mut content_length = None;

    for (name, value) in headers {
        if name.eq_ignore_ascii_case("transfer-encoding") {
            // the final coding is the last one of the last field
            te_value = Some(value);
        } else if name.eq_ignore_ascii_case("content-length") {
            let cl_str = value.to_str().map_err(ParseError::invalid_content_length)?.trim();
            // 1*DIGIT, so no sign and no empty value
            ensure!(
                !cl_str.is_empty() && cl_str.bytes().all(|b| b.is_ascii_digit()),
                ParseError::invalid_content_length(format!("value {cl_str} is not a decimal length"))
            );
            let length = cl_str
                .parse::<u64>()
                .ok()
                .ok_or_else(|| ParseError::invalid_content_length(format!("value {cl_str} is not u64")))?;

            match content_length {
                Some(previous) if previous != length => {
                    return Err(ParseError::invalid_content_length(format!(
                        "conflicting values {previous} and {length}"
                    )));
                }
                _ => content_length = Some(length),
            }
        }
    }

    match (te_value, content_length) {
        (None, None) => Ok(PayloadSize::Empty),
        (Some(te_value), None) => {
            ensure!(is_chunked(te_value), ParseError::invalid_body("transfer-encoding must end with chunked"));
            Ok(PayloadSize::Chunked)
        }
        (None, Some(length)) => Ok(PayloadSize::Length(length)),
        (Some(_), Some(_)) => {
            Err(ParseError::invalid_content_length("transfer_encoding and content_length both present in headers"))
        }
    }
}

/// Checks whether `chunked` is the final coding of a Transfer-Encoding value.
fn is_chunked(header_value: &HeaderValue) -> bool {
    header_value
        .as_bytes()
        .rsplit(|b| *b == b',')
        .next()
        .is_some_and(|coding| coding.trim_ascii().eq_ignore_ascii_case(b"chunked"))
}

/// HTTP/1.1 keeps the connection open unless told `close`; HTTP/1.0 closes it
/// unless told `keep-alive`. `close` wins over `keep-alive`.
fn keep_alive(minor_version: u8, headers: &[(String, HeaderValue)]) -> bool {
    let mut keep_alive = minor_version >= 1;

    let connection_tokens = headers
        .iter()
        .filter(|(name, _)| name.eq_ignore_ascii_case("connection"))
        .flat_map(|(_, value)| value.as_bytes().split(|b| *b == b','))
        .map(<[u8]>::trim_ascii);

    for token in connection_tokens {
        if token.eq_ignore_ascii_case(b"close") {
            return false;
        }
        if token.eq_ignore_ascii_case(b"keep-alive") {
            keep_alive = true;
        }
    }

    keep_alive
}
