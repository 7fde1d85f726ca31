//! Body framing decoders.
//!
//! All decoders read from the unconsumed remainder of the current chunk and
//! split decoded data off it with [`Bytes::split_to`], so body fragments share
//! storage with the chunk instead of being copied.
//!
//! - [`LengthDecoder`]: bodies framed by `Content-Length`
//! - [`ChunkedDecoder`]: bodies framed by `Transfer-Encoding: chunked`
//! - [`PayloadDecoder`]: picks one of the above, or none for bodiless messages

mod chunked;
mod length;

use bytes::Bytes;

use crate::protocol::ParseError;
use chunked::ChunkedDecoder;
use length::LengthDecoder;

/// An item produced while decoding a body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PayloadItem {
    /// A fragment of decoded body data
    Chunk(Bytes),
    /// The body is complete
    Eof,
}

#[cfg(test)]
impl PayloadItem {
    #[inline]
    pub fn is_eof(&self) -> bool {
        matches!(self, PayloadItem::Eof)
    }

    #[inline]
    pub fn is_chunk(&self) -> bool {
        matches!(self, PayloadItem::Chunk(_))
    }

    /// Returns the contained bytes if this is a Chunk
    pub fn as_bytes(&self) -> Option<&Bytes> {
        match self {
            PayloadItem::Chunk(bytes) => Some(bytes),
            PayloadItem::Eof => None,
        }
    }
}

/// How the body of a message is framed, derived from its headers.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum PayloadSize {
    /// Payload with known length in bytes
    Length(u64),
    /// Payload using chunked transfer encoding
    Chunked,
    /// No body
    Empty,
}

/// Decoder for one message body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PayloadDecoder {
    kind: Kind,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Kind {
    Length(LengthDecoder),
    Chunked(ChunkedDecoder),
    NoBody,
}

impl From<PayloadSize> for PayloadDecoder {
    fn from(size: PayloadSize) -> Self {
        let kind = match size {
            PayloadSize::Length(length) => Kind::Length(LengthDecoder::new(length)),
            PayloadSize::Chunked => Kind::Chunked(ChunkedDecoder::new()),
            PayloadSize::Empty => Kind::NoBody,
        };
        Self { kind }
    }
}

impl PayloadDecoder {
    /// Decodes the next body item from `src`.
    ///
    /// Returns `Ok(None)` when `src` is exhausted before the body is complete.
    pub fn decode(&mut self, src: &mut Bytes) -> Result<Option<PayloadItem>, ParseError> {
        match &mut self.kind {
            Kind::Length(length_decoder) => Ok(length_decoder.decode(src)),
            Kind::Chunked(chunked_decoder) => chunked_decoder.decode(src),
            Kind::NoBody => Ok(Some(PayloadItem::Eof)),
        }
    }
}
