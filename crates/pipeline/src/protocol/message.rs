//! The completed message model.
//!
//! A [`Message`] is what the assembler publishes once an engine reports the end
//! of a message. It is immutable and fully owned: the body has been copied out
//! of the input chunks into one contiguous buffer, so holding a message never
//! keeps any chunk alive.

use bytes::buf::Reader;
use bytes::{Buf, Bytes};
use http::{HeaderValue, Method, Request, Version};
use http_body_util::Full;
use mime::Mime;

use crate::protocol::ConvertError;

/// A request converted for hand-off to `http`-ecosystem handlers.
pub type FullRequest = Request<Full<Bytes>>;

/// A fully parsed HTTP message.
///
/// Scalars the engine never announced are `None`. Headers keep the exact
/// order, case and duplicates they arrived with.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    pub(crate) method: Option<Method>,
    pub(crate) request_target: Option<String>,
    pub(crate) path: Option<String>,
    pub(crate) query_string: Option<String>,
    pub(crate) fragment: Option<String>,
    pub(crate) headers: Vec<(String, HeaderValue)>,
    pub(crate) body: Bytes,
    pub(crate) major_version: u8,
    pub(crate) minor_version: u8,
    pub(crate) keep_alive: bool,
}

impl Message {
    /// Returns the request method (GET, POST, ...).
    pub fn method(&self) -> Option<&Method> {
        self.method.as_ref()
    }

    /// Returns the raw request target as written on the request line.
    pub fn request_target(&self) -> Option<&str> {
        self.request_target.as_deref()
    }

    /// Returns the path component of the request target.
    pub fn path(&self) -> Option<&str> {
        self.path.as_deref()
    }

    /// Returns the query string, without the leading `?`.
    pub fn query_string(&self) -> Option<&str> {
        self.query_string.as_deref()
    }

    /// Returns the fragment, without the leading `#`.
    pub fn fragment(&self) -> Option<&str> {
        self.fragment.as_deref()
    }

    /// Returns every header pair in arrival order.
    pub fn headers(&self) -> &[(String, HeaderValue)] {
        &self.headers
    }

    /// Returns the first value of the header `name`, compared case-insensitively.
    pub fn header(&self, name: &str) -> Option<&HeaderValue> {
        self.headers.iter().find(|(n, _)| n.eq_ignore_ascii_case(name)).map(|(_, value)| value)
    }

    /// Returns all values of the header `name` in arrival order.
    pub fn header_values<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a HeaderValue> + 'a {
        self.headers.iter().filter(move |(n, _)| n.eq_ignore_ascii_case(name)).map(|(_, value)| value)
    }

    /// Returns the message body.
    pub fn body(&self) -> &Bytes {
        &self.body
    }

    /// Consumes the message and returns the body.
    pub fn into_body(self) -> Bytes {
        self.body
    }

    /// Returns a reader positioned at the start of the body.
    pub fn body_reader(&self) -> Reader<Bytes> {
        self.body.clone().reader()
    }

    pub fn major_version(&self) -> u8 {
        self.major_version
    }

    pub fn minor_version(&self) -> u8 {
        self.minor_version
    }

    /// Maps the protocol version onto [`http::Version`], if it is a known one.
    pub fn http_version(&self) -> Option<Version> {
        match (self.major_version, self.minor_version) {
            (0, 9) => Some(Version::HTTP_09),
            (1, 0) => Some(Version::HTTP_10),
            (1, 1) => Some(Version::HTTP_11),
            (2, 0) => Some(Version::HTTP_2),
            (3, 0) => Some(Version::HTTP_3),
            _ => None,
        }
    }

    /// Returns whether the connection should stay open after this message.
    pub fn keep_alive(&self) -> bool {
        self.keep_alive
    }

    /// Returns the parsed `Content-Length` header, if present and valid.
    pub fn content_length(&self) -> Option<u64> {
        self.header("content-length")?.to_str().ok()?.trim().parse().ok()
    }

    /// Returns the parsed `Content-Type` header, if present and valid.
    pub fn content_type(&self) -> Option<Mime> {
        self.header("content-type")?.to_str().ok()?.parse().ok()
    }

    /// Converts this message into an `http::Request` carrying the body as `B`.
    ///
    /// Headers are appended in arrival order, so duplicates survive the conversion.
    ///
    /// # Errors
    ///
    /// Returns [`ConvertError`] if the method or request target is missing, or if
    /// `http` rejects the target or a header name.
    pub fn into_request<B>(self) -> Result<Request<B>, ConvertError>
    where
        B: http_body::Body + From<Bytes>,
    {
        let version = self.http_version();
        let method = self.method.ok_or(ConvertError::MissingMethod)?;
        let target = self.request_target.ok_or(ConvertError::MissingTarget)?;

        let mut builder = Request::builder().method(method).uri(target);
        if let Some(version) = version {
            builder = builder.version(version);
        }

        for (name, value) in self.headers {
            builder = builder.header(name, value);
        }

        Ok(builder.body(B::from(self.body))?)
    }

    /// Converts this message into a [`FullRequest`].
    ///
    /// # Errors
    ///
    /// See [`Message::into_request`].
    pub fn into_full_request(self) -> Result<FullRequest, ConvertError> {
        self.into_request()
    }
}

#[cfg(test)]
mod tests {
    use std::io::Read;

    use http_body::Body;

    use super::*;

    fn message(headers: &[(&'static str, &'static str)], body: &'static [u8]) -> Message {
        Message {
            method: Some(Method::POST),
            request_target: Some("/upload?name=a#top".to_string()),
            path: Some("/upload".to_string()),
            query_string: Some("name=a".to_string()),
            fragment: Some("top".to_string()),
            headers: headers.iter().map(|(n, v)| ((*n).to_string(), HeaderValue::from_static(*v))).collect(),
            body: Bytes::from_static(body),
            major_version: 1,
            minor_version: 1,
            keep_alive: true,
        }
    }

    #[test]
    fn header_lookup_is_case_insensitive() {
        let message = message(&[("Host", "x"), ("Accept", "a"), ("accept", "b")], b"");

        assert_eq!(message.header("host"), Some(&HeaderValue::from_static("x")));
        assert_eq!(message.header("ACCEPT"), Some(&HeaderValue::from_static("a")));

        let values: Vec<_> = message.header_values("Accept").collect();
        assert_eq!(values, vec![&HeaderValue::from_static("a"), &HeaderValue::from_static("b")]);

        assert!(message.header("cookie").is_none());
    }

    #[test]
    fn typed_accessors() {
        let message = message(&[("Content-Type", "application/json"), ("Content-Length", " 4 ")], b"{}{}");

        assert_eq!(message.content_length(), Some(4));
        assert_eq!(message.content_type(), Some(mime::APPLICATION_JSON));
        assert_eq!(message.http_version(), Some(Version::HTTP_11));
    }

    #[test]
    fn unknown_version_has_no_http_version() {
        let mut message = message(&[], b"");
        message.major_version = 1;
        message.minor_version = 7;

        assert_eq!(message.http_version(), None);
    }

    #[test]
    fn body_reader_starts_at_zero() {
        let message = message(&[], b"hello world");

        let mut reader = message.body_reader();
        let mut first = [0u8; 5];
        reader.read_exact(&mut first).unwrap();
        assert_eq!(&first, b"hello");

        let mut rest = String::new();
        reader.read_to_string(&mut rest).unwrap();
        assert_eq!(rest, " world");

        // the message itself is untouched by reading
        assert_eq!(&message.body()[..], b"hello world");
    }

    #[test]
    fn into_request_keeps_duplicate_headers() {
        let message = message(&[("Host", "x"), ("X-Tag", "1"), ("X-Tag", "2")], b"data");

        let request = message.into_full_request().unwrap();

        assert_eq!(request.method(), &Method::POST);
        assert_eq!(request.uri().path(), "/upload");
        assert_eq!(request.uri().query(), Some("name=a"));
        assert_eq!(request.version(), Version::HTTP_11);

        let tags: Vec<_> = request.headers().get_all("x-tag").iter().collect();
        assert_eq!(tags, vec![&HeaderValue::from_static("1"), &HeaderValue::from_static("2")]);

        assert_eq!(request.body().size_hint().exact(), Some(4));
    }

    #[test]
    fn into_request_requires_method() {
        let mut message = message(&[], b"");
        message.method = None;

        assert!(matches!(message.into_full_request(), Err(ConvertError::MissingMethod)));
    }
}
