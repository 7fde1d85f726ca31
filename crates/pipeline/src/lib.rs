//! Incremental assembly of pipelined HTTP/1.x requests
//!
//! This crate turns a stream of byte chunks, split at arbitrary points, into a
//! sequence of complete request messages. A single chunk may carry several
//! pipelined requests, and a single request may be spread over many chunks.
//! The result never depends on where the chunks were split.
//!
//! # Example
//!
//! ```
//! use micro_http_pipeline::assembler::MessageParser;
//!
//! let mut parser = MessageParser::new();
//!
//! let stream: &[&[u8]] = &[
//!     b"POST /upload?id=7 HTTP/1.1\r\nHost: localhost\r\nContent-Le",
//!     b"ngth: 5\r\n\r\nhel",
//!     b"loGET /next HTTP/1.1\r\nHost: localhost\r\n\r\n",
//! ];
//!
//! let mut messages = Vec::new();
//! for chunk in stream {
//!     messages.extend(parser.execute_slice(chunk).unwrap());
//! }
//!
//! assert_eq!(messages.len(), 2);
//! assert_eq!(messages[0].path(), Some("/upload"));
//! assert_eq!(messages[0].query_string(), Some("id=7"));
//! assert_eq!(&messages[0].body()[..], b"hello");
//! assert_eq!(messages[1].path(), Some("/next"));
//! assert!(parser.is_idle());
//! ```
//!
//! # Architecture
//!
//! The crate is organized into three modules:
//!
//! - [`engine`]: the recognition contract ([`engine::Engine`]) and an `httparse` based
//!   HTTP/1.x implementation ([`engine::HttpEngine`])
//! - [`assembler`]: the [`assembler::MessageBuilder`] folding events into messages,
//!   and the [`assembler::MessageParser`] driving an engine chunk by chunk
//! - [`protocol`]: the [`protocol::Event`] contract, the [`protocol::Message`] model
//!   and the error types
//!
//! # Core Components
//!
//! ## Engines
//!
//! An engine recognizes bytes and emits tagged events: message begin, method,
//! request target and its components, header name/value pairs, end of headers,
//! body fragments and message end. Each call to [`engine::Engine::execute`] is one
//! pass that stops at a message boundary or at the end of the current chunk.
//! Engines other than [`engine::HttpEngine`] can be plugged into the parser.
//!
//! ## Assembly
//!
//! Body fragments are kept as shared slices of the input chunks while a message
//! is in flight. When the message ends they are concatenated once and the
//! message is published. Version and keep-alive are read from the engine at
//! that moment.
//!
//! ## Error Handling
//!
//! - [`protocol::ExecuteError`]: returned by the parser, wraps the engine's error
//!   or reports an engine that stopped making progress
//! - [`protocol::ParseError`]: errors of [`engine::HttpEngine`]
//! - [`protocol::ConvertError`]: converting a [`protocol::Message`] into an `http::Request`
//!
//! # Limitations
//!
//! - Requests only, responses are not recognized
//! - No I/O, the caller reads the socket and feeds chunks
//! - Maximum header size: 8KB by default, see [`engine::Limits`]
//! - Maximum number of headers: 64 by default

pub mod assembler;
pub mod engine;
pub mod protocol;

mod utils;
pub(crate) use utils::ensure;
