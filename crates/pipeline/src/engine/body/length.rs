//! Decoder for bodies with a `Content-Length` header, as defined in
//! [RFC 9112 Section 6.2](https://www.rfc-editor.org/rfc/rfc9112#section-6.2).

use std::cmp;

use bytes::Bytes;

use super::PayloadItem;

/// Tracks the bytes still owed by a fixed-length body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LengthDecoder {
    /// The number of bytes remaining to be read from the payload
    length: u64,
}

impl LengthDecoder {
    pub fn new(length: u64) -> Self {
        Self { length }
    }

    /// Splits up to the remaining length off `src`.
    ///
    /// # Returns
    /// * `Some(PayloadItem::Eof)` once all bytes have been read
    /// * `Some(PayloadItem::Chunk(bytes))` for the next fragment
    /// * `None` when `src` is empty
    pub fn decode(&mut self, src: &mut Bytes) -> Option<PayloadItem> {
        if self.length == 0 {
            return Some(PayloadItem::Eof);
        }

        if src.is_empty() {
            return None;
        }

        let len = cmp::min(self.length, src.len() as u64);
        #[allow(clippy::cast_possible_truncation, reason = "len is bounded by src.len()")]
        let bytes = src.split_to(len as usize);

        self.length -= bytes.len() as u64;
        Some(PayloadItem::Chunk(bytes))
    }
}
