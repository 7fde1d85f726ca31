//! Decoder for HTTP chunked transfer encoding.
//!
//! Implements the framing of [RFC 9112 Section 7.1](https://www.rfc-editor.org/rfc/rfc9112#section-7.1).
//! The decoder is a byte-level state machine, so it can stop at any byte of
//! the input and resume when the next chunk of input arrives.

use std::task::Poll;

use bytes::{Buf, Bytes};
use tracing::trace;
use ChunkedState::*;

use super::PayloadItem;
use crate::protocol::ParseError;

/// A decoder for chunked transfer encoded bodies.
///
/// - Each chunk starts with its size in hexadecimal
/// - Followed by optional extensions and CRLF
/// - Then the chunk data and CRLF
/// - A zero-sized chunk, optional trailers and a final CRLF end the body
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChunkedDecoder {
    state: ChunkedState,
    remaining_size: u64,
}

impl ChunkedDecoder {
    pub fn new() -> Self {
        Self { state: SizeStart, remaining_size: 0 }
    }

    /// Decodes the next item from `src`.
    ///
    /// # Returns
    /// - `Ok(Some(PayloadItem::Chunk(bytes)))` for the next run of chunk data
    /// - `Ok(Some(PayloadItem::Eof))` once the final CRLF has been read
    /// - `Ok(None)` when `src` is exhausted
    /// - `Err(ParseError)` if the framing is invalid
    pub fn decode(&mut self, src: &mut Bytes) -> Result<Option<PayloadItem>, ParseError> {
        loop {
            if self.state == End {
                trace!("finished reading chunked data");
                return Ok(Some(PayloadItem::Eof));
            }

            if src.is_empty() {
                return Ok(None);
            }

            let mut buf = None;

            self.state = match self.state.step(src, &mut self.remaining_size, &mut buf) {
                Poll::Pending => return Ok(None),
                Poll::Ready(Ok(new_state)) => new_state,
                Poll::Ready(Err(e)) => return Err(e),
            };

            if let Some(bytes) = buf {
                trace!(len = bytes.len(), "read chunked bytes");
                return Ok(Some(PayloadItem::Chunk(bytes)));
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ChunkedState {
    /// First hex digit of the chunk size
    SizeStart,
    /// Read the chunk size in hex
    Size,
    /// Whitespace after the size
    SizeLws,
    /// Chunk extensions, ignored
    Extension,
    /// LF after the size line
    SizeLf,
    /// Chunk data
    Body,
    /// CR after chunk data
    BodyCr,
    /// LF after chunk data
    BodyLf,
    /// Trailer fields, ignored
    Trailer,
    /// LF after a trailer field
    TrailerLf,
    /// Final CR
    EndCr,
    /// Final LF
    EndLf,
    End,
}

macro_rules! try_next_byte {
    ($src:ident) => {{
        if $src.has_remaining() {
            $src.get_u8()
        } else {
            return Poll::Pending;
        }
    }};
}

fn hex_digit(byte: u8) -> Option<u8> {
    match byte {
        b'0'..=b'9' => Some(byte - b'0'),
        b'a'..=b'f' => Some(byte + 10 - b'a'),
        b'A'..=b'F' => Some(byte + 10 - b'A'),
        _ => None,
    }
}

fn invalid(reason: &'static str) -> Poll<Result<ChunkedState, ParseError>> {
    Poll::Ready(Err(ParseError::invalid_body(reason)))
}

impl ChunkedState {
    fn step(
        self,
        src: &mut Bytes,
        remaining_size: &mut u64,
        buf: &mut Option<Bytes>,
    ) -> Poll<Result<ChunkedState, ParseError>> {
        match self {
            SizeStart => ChunkedState::read_size_start(src, remaining_size),
            Size => ChunkedState::read_size(src, remaining_size),
            SizeLws => ChunkedState::read_size_lws(src),
            Extension => ChunkedState::read_extension(src),
            SizeLf => ChunkedState::read_size_lf(src, *remaining_size),
            Body => ChunkedState::read_body(src, remaining_size, buf),
            BodyCr => ChunkedState::read_body_cr(src),
            BodyLf => ChunkedState::read_body_lf(src),
            Trailer => ChunkedState::read_trailer(src),
            TrailerLf => ChunkedState::read_trailer_lf(src),
            EndCr => ChunkedState::read_end_cr(src),
            EndLf => ChunkedState::read_end_lf(src),
            End => Poll::Ready(Ok(End)),
        }
    }

    /// Reads the first hex digit of the chunk size.
    fn read_size_start(src: &mut Bytes, size_per_chunk: &mut u64) -> Poll<Result<ChunkedState, ParseError>> {
        match hex_digit(try_next_byte!(src)) {
            Some(digit) => {
                *size_per_chunk = u64::from(digit);
                Poll::Ready(Ok(Size))
            }
            None => invalid("invalid chunk size line: missing size"),
        }
    }

    /// Accumulates one hex digit of the chunk size, or moves past the size.
    fn read_size(src: &mut Bytes, size_per_chunk: &mut u64) -> Poll<Result<ChunkedState, ParseError>> {
        let byte = try_next_byte!(src);
        let digit = match (hex_digit(byte), byte) {
            (Some(digit), _) => digit,
            (None, b'\t' | b' ') => return Poll::Ready(Ok(SizeLws)),
            (None, b';') => return Poll::Ready(Ok(Extension)),
            (None, b'\r') => return Poll::Ready(Ok(SizeLf)),
            (None, _) => return invalid("invalid chunk size line: Invalid Size"),
        };

        match size_per_chunk.checked_mul(16).and_then(|size| size.checked_add(u64::from(digit))) {
            Some(size) => {
                *size_per_chunk = size;
                Poll::Ready(Ok(Size))
            }
            None => invalid("invalid overflow chunked length"),
        }
    }

    fn read_size_lws(src: &mut Bytes) -> Poll<Result<ChunkedState, ParseError>> {
        match try_next_byte!(src) {
            // no more digits after whitespace
            b'\t' | b' ' => Poll::Ready(Ok(SizeLws)),
            b';' => Poll::Ready(Ok(Extension)),
            b'\r' => Poll::Ready(Ok(SizeLf)),
            _ => invalid("invalid chunk size linear white space"),
        }
    }

    fn read_extension(src: &mut Bytes) -> Poll<Result<ChunkedState, ParseError>> {
        // extensions end at CRLF; a bare LF inside one is rejected
        match try_next_byte!(src) {
            b'\r' => Poll::Ready(Ok(SizeLf)),
            b'\n' => invalid("invalid chunk extension contains newline"),
            _ => Poll::Ready(Ok(Extension)),
        }
    }

    fn read_size_lf(src: &mut Bytes, size_per_chunk: u64) -> Poll<Result<ChunkedState, ParseError>> {
        match try_next_byte!(src) {
            b'\n' if size_per_chunk == 0 => Poll::Ready(Ok(EndCr)),
            b'\n' => Poll::Ready(Ok(Body)),
            _ => invalid("invalid chunk size LF"),
        }
    }

    /// Splits up to the rest of the current chunk's data off `src`.
    fn read_body(
        src: &mut Bytes,
        size_per_chunk: &mut u64,
        buf: &mut Option<Bytes>,
    ) -> Poll<Result<ChunkedState, ParseError>> {
        if src.is_empty() {
            return Poll::Ready(Ok(Body));
        }

        if *size_per_chunk == 0 {
            return Poll::Ready(Ok(BodyCr));
        }

        let remaining = usize::try_from(*size_per_chunk).unwrap_or(usize::MAX);
        let read_size = remaining.min(src.len());

        *size_per_chunk -= read_size as u64;
        *buf = Some(src.split_to(read_size));

        if *size_per_chunk > 0 { Poll::Ready(Ok(Body)) } else { Poll::Ready(Ok(BodyCr)) }
    }

    fn read_body_cr(src: &mut Bytes) -> Poll<Result<ChunkedState, ParseError>> {
        match try_next_byte!(src) {
            b'\r' => Poll::Ready(Ok(BodyLf)),
            _ => invalid("invalid chunk body CR"),
        }
    }

    fn read_body_lf(src: &mut Bytes) -> Poll<Result<ChunkedState, ParseError>> {
        match try_next_byte!(src) {
            b'\n' => Poll::Ready(Ok(SizeStart)),
            _ => invalid("invalid chunk body LF"),
        }
    }

    fn read_trailer(src: &mut Bytes) -> Poll<Result<ChunkedState, ParseError>> {
        match try_next_byte!(src) {
            b'\r' => Poll::Ready(Ok(TrailerLf)),
            _ => Poll::Ready(Ok(Trailer)),
        }
    }

    fn read_trailer_lf(src: &mut Bytes) -> Poll<Result<ChunkedState, ParseError>> {
        match try_next_byte!(src) {
            b'\n' => Poll::Ready(Ok(EndCr)),
            _ => invalid("invalid trailer end LF"),
        }
    }

    /// Either the final CR, or the first byte of a trailer field.
    fn read_end_cr(src: &mut Bytes) -> Poll<Result<ChunkedState, ParseError>> {
        match try_next_byte!(src) {
            b'\r' => Poll::Ready(Ok(EndLf)),
            _ => Poll::Ready(Ok(Trailer)),
        }
    }

    fn read_end_lf(src: &mut Bytes) -> Poll<Result<ChunkedState, ParseError>> {
        match try_next_byte!(src) {
            b'\n' => Poll::Ready(Ok(End)),
            _ => invalid("invalid chunk end LF"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn decode_all(decoder: &mut ChunkedDecoder, src: &mut Bytes) -> (Vec<u8>, bool) {
        let mut data = Vec::new();
        loop {
            match decoder.decode(src).unwrap() {
                Some(PayloadItem::Chunk(bytes)) => data.extend_from_slice(&bytes),
                Some(PayloadItem::Eof) => return (data, true),
                None => return (data, false),
            }
        }
    }

    #[test]
    fn test_basic() {
        let mut buffer = Bytes::from_static(b"10\r\n1234567890abcdef\r\n0\r\n\r\n");
        let mut decoder = ChunkedDecoder::new();

        let item = decoder.decode(&mut buffer).unwrap().unwrap();
        assert!(item.is_chunk());
        assert_eq!(item.as_bytes().unwrap(), &Bytes::from_static(b"1234567890abcdef"));

        assert!(decoder.decode(&mut buffer).unwrap().unwrap().is_eof());
        assert!(buffer.is_empty());
    }

    #[test]
    fn test_multiple_chunks() {
        let mut buffer = Bytes::from_static(b"5\r\nhello\r\n7\r\n, world\r\n0\r\n\r\n");
        let mut decoder = ChunkedDecoder::new();

        let chunk = decoder.decode(&mut buffer).unwrap().unwrap();
        assert_eq!(chunk.as_bytes().unwrap(), &Bytes::from_static(b"hello"));

        let chunk = decoder.decode(&mut buffer).unwrap().unwrap();
        assert_eq!(chunk.as_bytes().unwrap(), &Bytes::from_static(b", world"));

        assert!(decoder.decode(&mut buffer).unwrap().unwrap().is_eof());
    }

    #[test]
    fn test_chunks_with_extensions() {
        let mut buffer = Bytes::from_static(b"5;chunk-ext=value\r\nhello\r\n0\r\n\r\n");
        let mut decoder = ChunkedDecoder::new();

        let (data, finished) = decode_all(&mut decoder, &mut buffer);
        assert_eq!(data, b"hello");
        assert!(finished);
    }

    #[test]
    fn test_chunks_with_trailers() {
        let mut buffer = Bytes::from_static(b"5\r\nhello\r\n0\r\nTrailer: value\r\n\r\nGET");
        let mut decoder = ChunkedDecoder::new();

        let (data, finished) = decode_all(&mut decoder, &mut buffer);
        assert_eq!(data, b"hello");
        assert!(finished);
        // the next message is left untouched
        assert_eq!(&buffer[..], b"GET");
    }

    #[test]
    fn test_resume_at_every_byte() {
        let input: &[u8] = b"5\r\nhello\r\n7;x=y\r\n, world\r\n0\r\nT: v\r\n\r\n";
        let mut decoder = ChunkedDecoder::new();
        let mut data = Vec::new();
        let mut finished = false;

        for byte in input {
            let mut src = Bytes::copy_from_slice(std::slice::from_ref(byte));
            let (part, done) = decode_all(&mut decoder, &mut src);
            data.extend(part);
            finished = done;
            assert!(src.is_empty());
        }

        assert_eq!(data, b"hello, world");
        assert!(finished);
    }

    #[test]
    fn test_invalid_chunk_size() {
        let mut buffer = Bytes::from_static(b"xyz\r\n");
        let mut decoder = ChunkedDecoder::new();

        assert!(matches!(decoder.decode(&mut buffer), Err(ParseError::InvalidBody { .. })));
    }

    #[test]
    fn test_size_line_without_digits() {
        for input in [&b"\r\n\r\n"[..], &b";ext\r\n\r\n"[..], &b" \r\n\r\n"[..]] {
            let mut buffer = Bytes::from_static(input);
            let mut decoder = ChunkedDecoder::new();

            assert!(matches!(decoder.decode(&mut buffer), Err(ParseError::InvalidBody { .. })));
        }

        // also after a complete chunk
        let mut buffer = Bytes::from_static(b"3\r\nabc\r\n\r\n\r\n");
        let mut decoder = ChunkedDecoder::new();

        assert!(decoder.decode(&mut buffer).unwrap().unwrap().is_chunk());
        assert!(matches!(decoder.decode(&mut buffer), Err(ParseError::InvalidBody { .. })));
    }

    #[test]
    fn test_overflowing_chunk_size() {
        let mut buffer = Bytes::from_static(b"fffffffffffffffff\r\n");
        let mut decoder = ChunkedDecoder::new();

        assert!(matches!(decoder.decode(&mut buffer), Err(ParseError::InvalidBody { .. })));
    }

    #[test]
    fn test_missing_crlf() {
        let mut buffer = Bytes::from_static(b"5\r\nhelloBad");
        let mut decoder = ChunkedDecoder::new();

        let chunk = decoder.decode(&mut buffer).unwrap().unwrap();
        assert_eq!(chunk.as_bytes().unwrap(), &Bytes::from_static(b"hello"));

        assert!(decoder.decode(&mut buffer).is_err());
    }

    #[test]
    fn test_zero_size_chunk() {
        let mut buffer = Bytes::from_static(b"0\r\n\r\n");
        let mut decoder = ChunkedDecoder::new();

        assert!(decoder.decode(&mut buffer).unwrap().unwrap().is_eof());
    }
}
