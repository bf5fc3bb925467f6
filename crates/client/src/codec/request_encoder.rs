use bytes::{Buf, BytesMut};
use tokio_util::codec::Encoder;
use tracing::error;

use crate::codec::body::PayloadEncoder;
use crate::codec::header::HeaderEncoder;
use crate::protocol::{Message, PayloadItem, PayloadSize, RequestHead, SendError};

/// Encodes a request as a head followed by payload items.
///
/// The head fixes the framing of the payload. Sending payload before a head, or a
/// second head before the payload is finished, is an error.
#[derive(Debug, Default)]
pub struct RequestEncoder {
    payload_encoder: Option<PayloadEncoder>,
}

impl RequestEncoder {
    pub fn new() -> Self {
        Self::default()
    }
}

impl<D: Buf> Encoder<Message<(RequestHead, PayloadSize), D>> for RequestEncoder {
    type Error = SendError;

    fn encode(&mut self, item: Message<(RequestHead, PayloadSize), D>, dst: &mut BytesMut) -> Result<(), Self::Error> {
        match item {
            Message::Header((head, payload_size)) => {
                if self.payload_encoder.is_some() {
                    error!("expect payload item but receive request head");
                    return Err(SendError::invalid_head("previous request payload is not finished"));
                }

                HeaderEncoder.encode((head, payload_size), dst)?;
                let payload_encoder = PayloadEncoder::from(payload_size);
                if !payload_encoder.is_finish() {
                    self.payload_encoder = Some(payload_encoder);
                }
                Ok(())
            }

            Message::Payload(payload_item) => {
                let Some(payload_encoder) = &mut self.payload_encoder else {
                    return match payload_item {
                        PayloadItem::Eof => Ok(()),
                        PayloadItem::Chunk(bytes) if !bytes.has_remaining() => Ok(()),
                        PayloadItem::Chunk(_) => {
                            error!("expect request head but receive payload item");
                            Err(SendError::invalid_body("payload sent without a request head"))
                        }
                    };
                };

                let is_eof = payload_item.is_eof();
                let result = payload_encoder.encode(payload_item, dst);
                if is_eof || payload_encoder.is_finish() {
                    self.payload_encoder.take();
                }
                result
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use bytes::Bytes;
    use http::{HeaderMap, Method, Uri};

    use super::*;

    fn head(method: Method) -> RequestHead {
        RequestHead::new(method, Uri::from_static("http://localhost/echo"), HeaderMap::new())
    }

    #[test]
    fn length_request() {
        let mut encoder = RequestEncoder::new();
        let mut dst = BytesMut::new();

        encoder.encode(Message::<_, Bytes>::Header((head(Method::PUT), PayloadSize::Length(11))), &mut dst).unwrap();
        encoder.encode(Message::<(RequestHead, PayloadSize)>::from(Bytes::from_static(b"Hello World")), &mut dst).unwrap();
        encoder.encode(Message::<(RequestHead, PayloadSize), Bytes>::Payload(PayloadItem::Eof), &mut dst).unwrap();

        assert_eq!(&dst[..], b"PUT /echo HTTP/1.1\r\ncontent-length: 11\r\n\r\nHello World");
    }

    #[test]
    fn chunked_request() {
        let mut encoder = RequestEncoder::new();
        let mut dst = BytesMut::new();

        encoder.encode(Message::<_, Bytes>::Header((head(Method::POST), PayloadSize::Chunked)), &mut dst).unwrap();
        encoder.encode(Message::<(RequestHead, PayloadSize)>::from(Bytes::from_static(b"Hello")), &mut dst).unwrap();
        encoder.encode(Message::<(RequestHead, PayloadSize), Bytes>::Payload(PayloadItem::Eof), &mut dst).unwrap();

        assert_eq!(&dst[..], b"POST /echo HTTP/1.1\r\ntransfer-encoding: chunked\r\n\r\n5\r\nHello\r\n0\r\n\r\n");
    }

    #[test]
    fn head_twice_is_an_error() {
        let mut encoder = RequestEncoder::new();
        let mut dst = BytesMut::new();

        encoder.encode(Message::<_, Bytes>::Header((head(Method::PUT), PayloadSize::Length(3))), &mut dst).unwrap();
        let error = encoder.encode(Message::<_, Bytes>::Header((head(Method::PUT), PayloadSize::Empty)), &mut dst).unwrap_err();
        assert!(matches!(error, SendError::InvalidHead { .. }));
    }

    #[test]
    fn payload_without_head_is_an_error() {
        let mut encoder = RequestEncoder::new();
        let mut dst = BytesMut::new();

        let error = encoder.encode(Message::<(RequestHead, PayloadSize)>::from(Bytes::from_static(b"x")), &mut dst).unwrap_err();
        assert!(matches!(error, SendError::InvalidBody { .. }));
        encoder.encode(Message::<(RequestHead, PayloadSize), Bytes>::Payload(PayloadItem::Eof), &mut dst).unwrap();
    }
}
