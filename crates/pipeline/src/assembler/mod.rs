//! Message assembly on top of an [`Engine`](crate::engine::Engine).
//!
//! - [`MessageBuilder`]: folds one event stream into completed [`Message`](crate::protocol::Message)s
//! - [`MessageParser`]: feeds chunks to an engine, runs its passes and drains the builder

mod builder;
mod driver;

pub use builder::MessageBuilder;
pub use driver::MessageParser;
