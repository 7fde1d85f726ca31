//! The pipelining driver.
//!
//! [`MessageParser`] turns chunks of one byte stream into completed messages.
//! A chunk may end anywhere: in the middle of a head, inside a body, or right
//! between two pipelined requests. Whatever is incomplete stays with the engine
//! and is finished by a later chunk.

use bytes::Bytes;
use tracing::{debug, trace, warn};

use crate::assembler::MessageBuilder;
use crate::engine::{Engine, HttpEngine};
use crate::protocol::{ExecuteError, Message};

/// Drives an [`Engine`] over successive chunks of one stream and collects the
/// messages they complete.
///
/// One parser serves one stream and one caller; use a parser per connection.
///
/// # Example
///
/// ```
/// use micro_http_pipeline::assembler::MessageParser;
///
/// let mut parser = MessageParser::new();
///
/// let messages = parser.execute_slice(b"GET /a HTTP/1.1\r\nHost: x\r\n\r\nGET /b HT").unwrap();
/// assert_eq!(messages.len(), 1);
/// assert_eq!(messages[0].path(), Some("/a"));
///
/// let messages = parser.execute_slice(b"TP/1.1\r\nHost: x\r\n\r\n").unwrap();
/// assert_eq!(messages.len(), 1);
/// assert_eq!(messages[0].path(), Some("/b"));
/// ```
#[derive(Debug, Default)]
pub struct MessageParser<E = HttpEngine> {
    engine: E,
    builder: MessageBuilder,
}

impl MessageParser {
    /// Creates a parser over a default [`HttpEngine`].
    pub fn new() -> Self {
        Self::with_engine(HttpEngine::new())
    }
}

impl<E: Engine> MessageParser<E> {
    pub fn with_engine(engine: E) -> Self {
        Self { engine, builder: MessageBuilder::new() }
    }

    /// Consumes `chunk` and returns every message it completed, in arrival order.
    ///
    /// The engine is run pass after pass until the whole chunk is consumed,
    /// and completed messages are drained after every pass, so any number of
    /// pipelined messages in one chunk are returned together.
    ///
    /// # Errors
    ///
    /// - [`ExecuteError::Engine`] if the engine rejects the input
    /// - [`ExecuteError::Stalled`] if a pass consumed nothing although bytes remain
    ///
    /// Both are fatal for the stream. Messages completed earlier in the same
    /// chunk are discarded along with the error.
    pub fn execute(&mut self, chunk: Bytes) -> Result<Vec<Message>, ExecuteError<E::Error>> {
        let total = chunk.len();
        self.engine.feed(chunk);

        let mut consumed = 0;
        let mut messages = Vec::new();

        loop {
            let mut pass = self.engine.execute();
            while let Some(event) = pass.next() {
                let event = event.map_err(ExecuteError::engine)?;
                self.builder.apply(event, pass.engine());
            }

            let pass_consumed = pass.consumed();
            consumed += pass_consumed;
            trace!(consumed = pass_consumed, total_consumed = consumed, total, "engine pass finished");

            messages.extend(self.builder.drain());

            if consumed >= total {
                debug!(messages = messages.len(), chunk_size = total, "chunk consumed");
                return Ok(messages);
            }

            if pass_consumed == 0 {
                warn!(consumed, total, "engine made no progress");
                return Err(ExecuteError::stalled(consumed, total));
            }
        }
    }

    /// Copies `chunk` and consumes it, see [`MessageParser::execute`].
    ///
    /// # Errors
    ///
    /// See [`MessageParser::execute`].
    pub fn execute_slice(&mut self, chunk: &[u8]) -> Result<Vec<Message>, ExecuteError<E::Error>> {
        self.execute(Bytes::copy_from_slice(chunk))
    }

    /// Returns the engine, e.g. to inspect its post-parse state.
    pub fn engine(&self) -> &E {
        &self.engine
    }

    /// Returns true if no message is partially received or assembled.
    ///
    /// A stream that closes while this is false ended in the middle of a message.
    pub fn is_idle(&self) -> bool {
        self.builder.is_idle() && self.engine.is_idle()
    }

    pub fn into_engine(self) -> E {
        self.engine
    }
}
