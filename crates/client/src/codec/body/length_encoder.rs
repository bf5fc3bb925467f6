use bytes::{Buf, BytesMut};
use tokio_util::codec::Encoder;
use tracing::warn;

use crate::ensure;
use crate::protocol::{PayloadItem, SendError};

/// Writes a payload announced with `Content-Length`, refusing to write more than announced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LengthEncoder {
    remaining: u64,
}

impl LengthEncoder {
    pub fn new(length: u64) -> Self {
        Self { remaining: length }
    }

    #[inline]
    pub fn is_finish(&self) -> bool {
        self.remaining == 0
    }
}

impl<D: Buf> Encoder<PayloadItem<D>> for LengthEncoder {
    type Error = SendError;

    fn encode(&mut self, item: PayloadItem<D>, dst: &mut BytesMut) -> Result<(), Self::Error> {
        match item {
            PayloadItem::Chunk(mut bytes) => {
                let len = bytes.remaining() as u64;
                if len == 0 {
                    return Ok(());
                }
                ensure!(
                    len <= self.remaining,
                    SendError::invalid_body(format!("payload exceeds content-length by {} bytes", len - self.remaining))
                );

                dst.reserve(bytes.remaining());
                while bytes.has_remaining() {
                    let chunk = bytes.chunk();
                    let n = chunk.len();
                    dst.extend_from_slice(chunk);
                    bytes.advance(n);
                }
                self.remaining -= len;
                Ok(())
            }
            PayloadItem::Eof => {
                if self.remaining > 0 {
                    warn!(remaining = self.remaining, "payload ended before content-length was reached");
                    return Err(SendError::invalid_body(format!("payload is {} bytes short of content-length", self.remaining)));
                }
                Ok(())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use bytes::Bytes;

    use super::*;

    #[test]
    fn writes_exact_length() {
        let mut encoder = LengthEncoder::new(11);
        let mut dst = BytesMut::new();

        encoder.encode(PayloadItem::Chunk(Bytes::from_static(b"Hello")), &mut dst).unwrap();
        encoder.encode(PayloadItem::Chunk(Bytes::from_static(b" World")), &mut dst).unwrap();
        encoder.encode(PayloadItem::<Bytes>::Eof, &mut dst).unwrap();

        assert!(encoder.is_finish());
        assert_eq!(&dst[..], b"Hello World");
    }

    #[test]
    fn rejects_overflow() {
        let mut encoder = LengthEncoder::new(3);
        let mut dst = BytesMut::new();

        let error = encoder.encode(PayloadItem::Chunk(Bytes::from_static(b"Hello")), &mut dst).unwrap_err();
        assert!(matches!(error, SendError::InvalidBody { .. }));
        assert!(dst.is_empty());
    }

    #[test]
    fn rejects_short_payload() {
        let mut encoder = LengthEncoder::new(11);
        let mut dst = BytesMut::new();

        encoder.encode(PayloadItem::Chunk(Bytes::from_static(b"Hello")), &mut dst).unwrap();
        let error = encoder.encode(PayloadItem::<Bytes>::Eof, &mut dst).unwrap_err();
        assert!(matches!(error, SendError::InvalidBody { .. }));
    }
}
