//! The recognition engine contract and the bundled HTTP/1.x engine.
//!
//! An [`Engine`] turns raw bytes into the ordered [`Event`] stream the
//! assembler consumes. The assembler never looks at bytes itself; it feeds a
//! chunk to the engine and then runs [`Pass`]es over it until the engine has
//! consumed every byte.
//!
//! # Passes
//!
//! A pass is one engine invocation over the current chunk. It starts at the
//! engine's cursor and stops at the next natural boundary: the end of a
//! message, or the end of the chunk. Events are produced lazily as the pass is
//! iterated, and a finished pass never yields again.
//!
//! # Components
//!
//! - [`Engine`] / [`ProtocolState`]: the contract
//! - [`Pass`]: one lazily evaluated engine invocation
//! - [`HttpEngine`]: an `httparse` based request engine
//! - [`Limits`]: size limits applied by [`HttpEngine`]

use std::iter::FusedIterator;

use bytes::Bytes;

use crate::protocol::Event;

mod body;
mod config;
mod head;
mod http_engine;
mod target;

pub use config::Limits;
pub use http_engine::HttpEngine;

/// Post-parse state describing the most recently completed message.
pub trait ProtocolState {
    fn major_version(&self) -> u8;

    fn minor_version(&self) -> u8;

    /// Whether the connection should stay open after the most recent message.
    fn keep_alive(&self) -> bool;
}

/// A byte-grammar recognizer emitting the [`Event`] contract.
pub trait Engine: ProtocolState {
    type Error: std::error::Error + Send + Sync + 'static;

    /// Hands the engine a new chunk. The cursor restarts at the beginning of it.
    ///
    /// Bytes of an unfinished message from earlier chunks stay the engine's
    /// responsibility; the new chunk continues that message.
    fn feed(&mut self, chunk: Bytes);

    /// Recognizes the next event at the cursor.
    ///
    /// `Ok(None)` ends the current pass, either because the chunk is exhausted
    /// or because a message boundary was reached.
    ///
    /// # Errors
    ///
    /// Returns the engine's error for input it cannot recognize.
    fn next_event(&mut self) -> Result<Option<Event>, Self::Error>;

    /// Returns the cursor position inside the current chunk.
    fn position(&self) -> usize;

    /// Returns true if the engine holds no bytes of an unfinished message.
    fn is_idle(&self) -> bool;

    /// Starts a pass over the current chunk.
    fn execute(&mut self) -> Pass<'_, Self>
    where
        Self: Sized,
    {
        Pass::new(self)
    }
}

/// One engine invocation over the current chunk.
///
/// Iterating the pass yields its events in order. After the pass ends, either
/// by reaching a boundary or by an error, it is exhausted for good.
#[derive(Debug)]
pub struct Pass<'e, E> {
    engine: &'e mut E,
    start: usize,
    done: bool,
}

impl<'e, E: Engine> Pass<'e, E> {
    fn new(engine: &'e mut E) -> Self {
        let start = engine.position();
        Self { engine, start, done: false }
    }

    /// Returns the number of bytes this pass has consumed so far.
    pub fn consumed(&self) -> usize {
        self.engine.position().saturating_sub(self.start)
    }

    /// Returns the engine's current state.
    pub fn engine(&self) -> &E {
        self.engine
    }

    /// Returns true once the pass has reached its boundary or failed.
    pub fn is_done(&self) -> bool {
        self.done
    }
}

impl<E: Engine> Iterator for Pass<'_, E> {
    type Item = Result<Event, E::Error>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }

        match self.engine.next_event() {
            Ok(Some(event)) => Some(Ok(event)),
            Ok(None) => {
                self.done = true;
                None
            }
            Err(e) => {
                self.done = true;
                Some(Err(e))
            }
        }
    }
}

impl<E: Engine> FusedIterator for Pass<'_, E> {}
