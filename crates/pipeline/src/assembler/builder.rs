//! Folds engine events into completed messages.

use std::collections::VecDeque;
use std::mem;

use bytes::{Bytes, BytesMut};
use http::{HeaderValue, Method};
use tracing::debug;

use crate::engine::ProtocolState;
use crate::protocol::{Event, Message};

/// The message currently being assembled.
///
/// Body fragments are kept as shared slices of the input chunks; they are
/// only copied once the message completes.
#[derive(Debug, Default)]
struct InFlight {
    method: Option<Method>,
    request_target: Option<String>,
    path: Option<String>,
    query_string: Option<String>,
    fragment: Option<String>,
    headers: Vec<(String, HeaderValue)>,
    pending_name: Option<String>,
    body: Vec<Bytes>,
    started: bool,
}

impl InFlight {
    /// Concatenates the body fragments into one buffer with a single allocation.
    fn take_body(&mut self) -> Bytes {
        let fragments = mem::take(&mut self.body);
        match fragments.len() {
            0 => Bytes::new(),
            _ => {
                let len = fragments.iter().map(Bytes::len).sum();
                let mut body = BytesMut::with_capacity(len);
                for fragment in &fragments {
                    body.extend_from_slice(fragment);
                }
                body.freeze()
            }
        }
    }
}

/// Sets a scalar that the event contract announces at most once per message.
fn assign_once<T>(slot: &mut Option<T>, value: T, field: &'static str) {
    debug_assert!(slot.is_none(), "{field} announced twice for one message");
    *slot = Some(value);
}

/// Assembles [`Message`]s from an ordered [`Event`] stream.
///
/// The builder owns exactly one in-flight message. On [`Event::MessageEnd`] the
/// in-flight message is moved out, finalized and queued, and a fresh one takes
/// its place, so a following message always starts clean.
///
/// Events must follow the order documented on [`Event`]. A header value
/// without a preceding name, or a scalar announced twice, is a bug in the event
/// source; debug builds assert on it.
#[derive(Debug, Default)]
pub struct MessageBuilder {
    in_flight: InFlight,
    completed: VecDeque<Message>,
}

impl MessageBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Applies one event. `state` is consulted on [`Event::MessageEnd`] for the
    /// finished message's version and keep-alive flag.
    pub fn apply<S: ProtocolState + ?Sized>(&mut self, event: Event, state: &S) {
        let in_flight = &mut self.in_flight;
        match event {
            Event::MessageBegin => in_flight.started = true,
            Event::Method(method) => assign_once(&mut in_flight.method, method, "method"),
            Event::RequestTarget(target) => assign_once(&mut in_flight.request_target, target, "request target"),
            Event::Path(path) => assign_once(&mut in_flight.path, path, "path"),
            Event::QueryString(query) => assign_once(&mut in_flight.query_string, query, "query string"),
            Event::Fragment(fragment) => assign_once(&mut in_flight.fragment, fragment, "fragment"),
            Event::HeaderName(name) => {
                debug_assert!(in_flight.pending_name.is_none(), "header name {name} follows a name without value");
                in_flight.pending_name = Some(name);
            }
            Event::HeaderValue(value) => {
                debug_assert!(in_flight.pending_name.is_some(), "header value without a preceding name");
                let name = in_flight.pending_name.take().unwrap_or_default();
                in_flight.headers.push((name, value));
            }
            Event::HeadersEnd => {}
            Event::Body(fragment) => in_flight.body.push(fragment),
            Event::MessageEnd => self.finish(state),
        }
    }

    fn finish<S: ProtocolState + ?Sized>(&mut self, state: &S) {
        let mut in_flight = mem::take(&mut self.in_flight);
        let body = in_flight.take_body();

        let message = Message {
            method: in_flight.method,
            request_target: in_flight.request_target,
            path: in_flight.path,
            query_string: in_flight.query_string,
            fragment: in_flight.fragment,
            headers: in_flight.headers,
            body,
            major_version: state.major_version(),
            minor_version: state.minor_version(),
            keep_alive: state.keep_alive(),
        };

        debug!(
            path = message.path().unwrap_or_default(),
            headers = message.headers().len(),
            body_size = message.body().len(),
            "message completed"
        );
        self.completed.push_back(message);
    }

    /// Removes every completed message, oldest first.
    pub fn drain(&mut self) -> impl Iterator<Item = Message> + '_ {
        self.completed.drain(..)
    }

    /// Returns the number of completed messages waiting to be drained.
    pub fn completed_len(&self) -> usize {
        self.completed.len()
    }

    /// Returns true if no message is partially assembled.
    pub fn is_idle(&self) -> bool {
        !self.in_flight.started
    }
}
