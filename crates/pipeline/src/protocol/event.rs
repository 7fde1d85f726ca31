use bytes::Bytes;
use http::{HeaderValue, Method};

/// One recognition event emitted by an [`Engine`](crate::engine::Engine).
///
/// Events for a single message always arrive in this order:
///
/// ```text
/// MessageBegin
/// Method?  RequestTarget?  Path?  QueryString?  Fragment?
/// (HeaderName HeaderValue)*
/// HeadersEnd
/// Body*
/// MessageEnd
/// ```
///
/// Each variant carries only its own payload. Body fragments share storage with
/// the chunk they were recognized in, so producing them never copies.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    /// A new message starts
    MessageBegin,
    /// The request method
    Method(Method),
    /// The raw request target, as written on the request line
    RequestTarget(String),
    /// The path component of the request target
    Path(String),
    /// The query component, without the leading `?`
    QueryString(String),
    /// The fragment component, without the leading `#`
    Fragment(String),
    /// A header field name, case preserved; always followed by [`Event::HeaderValue`]
    HeaderName(String),
    /// The value belonging to the preceding [`Event::HeaderName`]
    HeaderValue(HeaderValue),
    /// The header section is complete
    HeadersEnd,
    /// A decoded fragment of the message body
    Body(Bytes),
    /// The message is complete
    MessageEnd,
}

impl Event {
    /// Returns true if this event marks the end of a message
    #[inline]
    pub fn is_message_end(&self) -> bool {
        matches!(self, Event::MessageEnd)
    }

    /// Returns the body fragment carried by this event, if any
    pub fn as_body(&self) -> Option<&Bytes> {
        match self {
            Event::Body(bytes) => Some(bytes),
            _ => None,
        }
    }
}
