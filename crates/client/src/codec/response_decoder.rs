//! Streaming response decoding.
//!
//! A response comes off the wire as one [`Message::Header`] followed by
//! [`Message::Payload`] items, the last of which is always [`PayloadItem::Eof`].
//! Interim `1xx` responses go through the same cycle with an empty payload, so a
//! caller waiting for the final response just keeps reading.

use bytes::BytesMut;
use http::Method;
use tokio_util::codec::Decoder;
use tracing::trace;

use crate::codec::body::PayloadDecoder;
use crate::codec::header::HeaderDecoder;
use crate::protocol::{Message, ParseError, PayloadItem, ResponseHead};

/// Decodes the responses to requests sent with one method.
///
/// The method matters because a response to `HEAD` never has a body, whatever its
/// headers announce.
#[derive(Debug)]
pub struct ResponseDecoder {
    header_decoder: HeaderDecoder,
    payload_decoder: Option<PayloadDecoder>,
}

impl ResponseDecoder {
    pub fn new(method: &Method) -> Self {
        Self { header_decoder: HeaderDecoder::new(method == Method::HEAD), payload_decoder: None }
    }

    fn on_payload(&mut self, item: Option<PayloadItem>) -> Option<Message<ResponseHead>> {
        match item {
            Some(item @ PayloadItem::Chunk(_)) => Some(Message::Payload(item)),
            Some(PayloadItem::Eof) => {
                trace!("finished reading response payload");
                self.payload_decoder.take();
                Some(Message::Payload(PayloadItem::Eof))
            }
            None => None,
        }
    }
}

impl Decoder for ResponseDecoder {
    type Item = Message<ResponseHead>;
    type Error = ParseError;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        if let Some(payload_decoder) = &mut self.payload_decoder {
            let item = payload_decoder.decode(src)?;
            return Ok(self.on_payload(item));
        }

        match self.header_decoder.decode(src)? {
            Some((head, payload_size)) => {
                trace!(status = %head.status(), ?payload_size, "decoded response head");
                self.payload_decoder = Some(payload_size.into());
                Ok(Some(Message::Header(head)))
            }
            None => Ok(None),
        }
    }

    fn decode_eof(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        if let Some(payload_decoder) = &mut self.payload_decoder {
            let item = payload_decoder.decode_eof(src)?;
            return Ok(self.on_payload(item));
        }

        match self.decode(src)? {
            Some(message) => Ok(Some(message)),
            None if src.is_empty() => Ok(None),
            None => Err(ParseError::invalid_header("connection closed before the response head was complete")),
        }
    }
}
