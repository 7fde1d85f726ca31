//! An HTTP/1.x request engine built on `httparse`.
//!
//! [`HttpEngine`] recognizes one request at a time:
//!
//! 1. Head: the request line and headers are parsed in place from the chunk.
//!    A head split across chunks is carried over in a small buffer until it is
//!    complete.
//! 2. Body: a [`PayloadDecoder`] chosen from the headers splits body fragments
//!    off the chunk without copying them.
//!
//! After a message ends, the current pass ends too, so a driver sees at most
//! one completed message per pass.

use std::collections::VecDeque;

use bytes::{Buf, Bytes, BytesMut};
use tracing::{debug, trace, warn};

use crate::engine::body::{PayloadDecoder, PayloadItem, PayloadSize};
use crate::engine::head::{Head, parse_head};
use crate::engine::target::split_target;
use crate::engine::{Engine, Limits, ProtocolState};
use crate::ensure;
use crate::protocol::{Event, ParseError};

/// HTTP/1.0 and HTTP/1.1 request engine.
///
/// Errors are fatal: once [`Engine::next_event`] has failed, every further
/// call fails with [`ParseError::Poisoned`].
#[derive(Debug)]
pub struct HttpEngine {
    limits: Limits,
    /// unconsumed remainder of the current chunk
    rest: Bytes,
    /// length of the current chunk
    fed: usize,
    /// prefix of a head that started in an earlier chunk
    head_buf: BytesMut,
    state: State,
    pending: VecDeque<Event>,
    current: Option<Progress>,
    body_size: u64,
    major_version: u8,
    minor_version: u8,
    keep_alive: bool,
}

#[derive(Debug)]
enum State {
    Head,
    Body(PayloadDecoder),
    /// a message just ended, the pass stops here
    Boundary,
    Poisoned,
}

/// Version and keep-alive of the message being recognized.
#[derive(Debug, Clone, Copy)]
struct Progress {
    minor_version: u8,
    keep_alive: bool,
}

impl Default for HttpEngine {
    fn default() -> Self {
        Self::with_limits(Limits::default())
    }
}

impl HttpEngine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_limits(limits: Limits) -> Self {
        Self {
            limits,
            rest: Bytes::new(),
            fed: 0,
            head_buf: BytesMut::new(),
            state: State::Head,
            pending: VecDeque::new(),
            current: None,
            body_size: 0,
            major_version: 0,
            minor_version: 0,
            keep_alive: false,
        }
    }

    pub fn limits(&self) -> &Limits {
        &self.limits
    }

    /// Returns true if an earlier error made the engine unusable.
    pub fn is_poisoned(&self) -> bool {
        matches!(self.state, State::Poisoned)
    }

    fn step(&mut self) -> Result<Option<Event>, ParseError> {
        match &mut self.state {
            State::Poisoned => Err(ParseError::Poisoned),
            State::Boundary => {
                self.state = State::Head;
                Ok(None)
            }
            State::Head => self.read_head(),
            State::Body(decoder) => {
                let item = decoder.decode(&mut self.rest)?;
                self.read_body(item)
            }
        }
    }

    fn read_body(&mut self, item: Option<PayloadItem>) -> Result<Option<Event>, ParseError> {
        match item {
            Some(PayloadItem::Chunk(bytes)) => {
                self.count_body(bytes.len() as u64)?;
                Ok(Some(Event::Body(bytes)))
            }
            Some(PayloadItem::Eof) => Ok(Some(self.finish_message())),
            None => Ok(None),
        }
    }

    fn read_head(&mut self) -> Result<Option<Event>, ParseError> {
        if self.rest.is_empty() {
            return Ok(None);
        }

        let head = if self.head_buf.is_empty() {
            match parse_head(&self.rest, &self.limits)? {
                Some(parsed) => {
                    // copied so header values never keep the chunk alive
                    let bytes = Bytes::copy_from_slice(&self.rest[..parsed.len]);
                    self.rest.advance(parsed.len);
                    parsed.into_head(&bytes)?
                }
                None => {
                    trace!(len = self.rest.len(), "head continues in the next chunk");
                    self.head_buf.extend_from_slice(&self.rest);
                    self.rest.clear();
                    return Ok(None);
                }
            }
        } else {
            let carried = self.head_buf.len();
            // one byte past the limit is enough to reject an oversized head
            let take = self.rest.len().min(self.limits.max_head_bytes.saturating_sub(carried) + 1);
            self.head_buf.extend_from_slice(&self.rest[..take]);

            match parse_head(&self.head_buf, &self.limits)? {
                Some(parsed) => {
                    // the carried prefix alone was incomplete, so the head ends in this chunk
                    self.rest.advance(parsed.len - carried);
                    let bytes = self.head_buf.split_to(parsed.len).freeze();
                    self.head_buf.clear();
                    parsed.into_head(&bytes)?
                }
                None => {
                    self.rest.advance(take);
                    return Ok(None);
                }
            }
        };

        if let (PayloadSize::Length(length), Some(max_size)) = (head.payload_size, self.limits.max_body_bytes) {
            ensure!(length <= max_size, ParseError::too_large_body(length, max_size));
        }

        Ok(Some(self.begin_message(head)))
    }

    /// Queues the events announcing `head` and returns the first of them.
    fn begin_message(&mut self, head: Head) -> Event {
        let Head { method, target, minor_version, headers, payload_size, keep_alive } = head;
        debug!(method = %method, target = %target, headers = headers.len(), "request head recognized");

        let parts = split_target(&target);
        let path = parts.path.map(str::to_owned);
        let query = parts.query.map(str::to_owned);
        let fragment = parts.fragment.map(str::to_owned);

        self.pending.push_back(Event::Method(method));
        self.pending.push_back(Event::RequestTarget(target));
        self.pending.extend(path.map(Event::Path));
        self.pending.extend(query.map(Event::QueryString));
        self.pending.extend(fragment.map(Event::Fragment));

        for (name, value) in headers {
            self.pending.push_back(Event::HeaderName(name));
            self.pending.push_back(Event::HeaderValue(value));
        }
        self.pending.push_back(Event::HeadersEnd);

        self.state = State::Body(PayloadDecoder::from(payload_size));
        self.current = Some(Progress { minor_version, keep_alive });
        self.body_size = 0;

        Event::MessageBegin
    }

    fn count_body(&mut self, len: u64) -> Result<(), ParseError> {
        self.body_size += len;
        if let Some(max_size) = self.limits.max_body_bytes {
            ensure!(self.body_size <= max_size, ParseError::too_large_body(self.body_size, max_size));
        }
        Ok(())
    }

    /// Publishes the finished message's version and keep-alive state.
    fn finish_message(&mut self) -> Event {
        if let Some(progress) = self.current.take() {
            self.major_version = 1;
            self.minor_version = progress.minor_version;
            self.keep_alive = progress.keep_alive;
        }

        trace!(body_size = self.body_size, keep_alive = self.keep_alive, "request recognized");
        self.state = State::Boundary;
        Event::MessageEnd
    }
}

impl ProtocolState for HttpEngine {
    fn major_version(&self) -> u8 {
        self.major_version
    }

    fn minor_version(&self) -> u8 {
        self.minor_version
    }

    fn keep_alive(&self) -> bool {
        self.keep_alive
    }
}

impl Engine for HttpEngine {
    type Error = ParseError;

    fn feed(&mut self, chunk: Bytes) {
        self.fed = chunk.len();
        self.rest = chunk;
    }

    fn next_event(&mut self) -> Result<Option<Event>, ParseError> {
        if let Some(event) = self.pending.pop_front() {
            return Ok(Some(event));
        }

        if self.is_poisoned() {
            return Err(ParseError::Poisoned);
        }

        self.step().inspect_err(|e| {
            warn!(cause = %e, "request recognition failed, engine poisoned");
            self.state = State::Poisoned;
            self.pending.clear();
        })
    }

    fn position(&self) -> usize {
        self.fed - self.rest.len()
    }

    fn is_idle(&self) -> bool {
        matches!(self.state, State::Head | State::Boundary) && self.head_buf.is_empty()
    }
}
