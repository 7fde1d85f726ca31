//! Message model, event contract and error types.
//!
//! - [`Event`]: the tagged events an engine emits while recognizing bytes
//! - [`Message`]: a completed, immutable message handed to the caller
//! - [`ExecuteError`], [`ParseError`], [`ConvertError`]: error types

mod event;
pub use event::Event;

mod message;
pub use message::FullRequest;
pub use message::Message;

mod error;
pub use error::ConvertError;
pub use error::ExecuteError;
pub use error::ParseError;
