//! Chunked transfer coding, see [RFC 9112 Section 7.1](https://www.rfc-editor.org/rfc/rfc9112.html#name-chunked-transfer-coding).
//!
//! ```text
//! chunked-body = *chunk last-chunk trailer-section CRLF
//! chunk        = chunk-size [ chunk-ext ] CRLF chunk-data CRLF
//! last-chunk   = 1*("0") [ chunk-ext ] CRLF
//! ```
//!
//! Extensions and trailer fields are consumed and dropped.

use bytes::{Buf, BytesMut};
use tokio_util::codec::Decoder;
use tracing::trace;

use crate::protocol::{ParseError, PayloadItem};

use State::{Body, BodyCr, BodyLf, End, EndCr, EndLf, Extension, Size, SizeLf, SizeLws, Trailer, TrailerLf};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChunkedDecoder {
    state: State,
    chunk_remaining: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    Size,
    SizeLws,
    Extension,
    SizeLf,
    Body,
    BodyCr,
    BodyLf,
    Trailer,
    TrailerLf,
    EndCr,
    EndLf,
    End,
}

impl ChunkedDecoder {
    pub fn new() -> Self {
        Self { state: Size, chunk_remaining: 0 }
    }

    /// True once the last chunk and the trailer section have been read.
    #[inline]
    pub fn is_finished(&self) -> bool {
        self.state == End
    }

    fn step(&mut self, src: &mut BytesMut) -> Result<Option<PayloadItem>, ParseError> {
        if self.state == Body {
            return Ok(self.read_data(src));
        }

        let byte = src.get_u8();
        self.state = match (self.state, byte) {
            (Size, b @ (b'0'..=b'9' | b'a'..=b'f' | b'A'..=b'F')) => {
                let digit = u64::from(hex_value(b));
                self.chunk_remaining = self
                    .chunk_remaining
                    .checked_mul(16)
                    .and_then(|size| size.checked_add(digit))
                    .ok_or_else(|| ParseError::invalid_body("chunk size overflow"))?;
                Size
            }
            (Size | SizeLws, b'\t' | b' ') => SizeLws,
            (Size | SizeLws, b';') => Extension,
            (Size | SizeLws | Extension, b'\r') => SizeLf,
            (Size | SizeLws, _) => return Err(ParseError::invalid_body("invalid chunk size line")),

            (Extension, b'\n') => return Err(ParseError::invalid_body("chunk extension contains a bare LF")),
            (Extension, _) => Extension,

            (SizeLf, b'\n') if self.chunk_remaining == 0 => EndCr,
            (SizeLf, b'\n') => Body,
            (SizeLf, _) => return Err(ParseError::invalid_body("missing LF after chunk size")),

            (BodyCr, b'\r') => BodyLf,
            (BodyCr, _) => return Err(ParseError::invalid_body("missing CR after chunk data")),
            (BodyLf, b'\n') => Size,
            (BodyLf, _) => return Err(ParseError::invalid_body("missing LF after chunk data")),

            (Trailer, b'\r') => TrailerLf,
            (Trailer, _) => Trailer,
            (TrailerLf, b'\n') => EndCr,
            (TrailerLf, _) => return Err(ParseError::invalid_body("missing LF after trailer field")),

            (EndCr, b'\r') => EndLf,
            (EndCr, _) => Trailer,
            (EndLf, b'\n') => End,
            (EndLf, _) => return Err(ParseError::invalid_body("missing LF after last chunk")),

            (Body | End, _) => return Err(ParseError::invalid_body("unexpected byte in chunked payload")),
        };
        Ok(None)
    }

    fn read_data(&mut self, src: &mut BytesMut) -> Option<PayloadItem> {
        let len = usize::try_from(self.chunk_remaining).map_or(src.len(), |remaining| remaining.min(src.len()));
        let bytes = src.split_to(len).freeze();

        self.chunk_remaining -= bytes.len() as u64;
        if self.chunk_remaining == 0 {
            self.state = BodyCr;
        }

        trace!(len = bytes.len(), "read chunk data");
        Some(PayloadItem::Chunk(bytes))
    }
}

impl Default for ChunkedDecoder {
    fn default() -> Self {
        Self::new()
    }
}

fn hex_value(b: u8) -> u8 {
    match b {
        b'0'..=b'9' => b - b'0',
        b'a'..=b'f' => b - b'a' + 10,
        _ => b - b'A' + 10,
    }
}

impl Decoder for ChunkedDecoder {
    type Item = PayloadItem;
    type Error = ParseError;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        loop {
            if self.state == End {
                trace!("finished reading chunked payload");
                return Ok(Some(PayloadItem::Eof));
            }

            if src.is_empty() {
                return Ok(None);
            }

            if let Some(item) = self.step(src)? {
                return Ok(Some(item));
            }
        }
    }
}
