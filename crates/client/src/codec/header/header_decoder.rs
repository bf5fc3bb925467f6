//! Response head decoding.
//!
//! The status line and header fields are parsed with `httparse`, then the body
//! length is worked out following [RFC 9112 Section 6.3](https://www.rfc-editor.org/rfc/rfc9112.html#name-message-body-length):
//!
//! 1. responses to `HEAD`, `1xx`, `204` and `304` never carry a body
//! 2. a chunked `Transfer-Encoding` wins over any `Content-Length`
//! 3. any other `Transfer-Encoding` means the body runs until the connection closes
//! 4. a valid `Content-Length` gives the exact length
//! 5. otherwise the body runs until the connection closes
//!
//! # Limits
//!
//! - Maximum number of header fields: 64
//! - Maximum head size: 8KB

use bytes::{Buf, BytesMut};
use http::{HeaderMap, HeaderName, HeaderValue, Response, StatusCode, Version, header};
use httparse::Status;
use tokio_util::codec::Decoder;
use tracing::{trace, warn};

use crate::ensure;
use crate::protocol::{ParseError, PayloadSize, ResponseHead, is_chunked};

const MAX_HEADER_NUM: usize = 64;

const MAX_HEADER_BYTES: usize = 8 * 1024;

/// Decodes a response head and the [`PayloadSize`] of the body that follows it.
#[derive(Debug, Clone, Copy)]
pub struct HeaderDecoder {
    head_request: bool,
}

impl HeaderDecoder {
    /// `head_request` must be true when the response answers a `HEAD` request.
    pub fn new(head_request: bool) -> Self {
        Self { head_request }
    }
}

impl Decoder for HeaderDecoder {
    type Item = (ResponseHead, PayloadSize);
    type Error = ParseError;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        if src.is_empty() {
            return Ok(None);
        }

        let mut headers = [httparse::EMPTY_HEADER; MAX_HEADER_NUM];
        let mut res = httparse::Response::new(&mut headers);

        let body_offset = match res.parse(&src[..]) {
            Ok(Status::Complete(offset)) => offset,
            Ok(Status::Partial) => {
                ensure!(src.len() <= MAX_HEADER_BYTES, ParseError::too_large_header(src.len(), MAX_HEADER_BYTES));
                return Ok(None);
            }
            Err(httparse::Error::TooManyHeaders) => return Err(ParseError::too_many_headers(MAX_HEADER_NUM)),
            Err(httparse::Error::Version) => return Err(ParseError::InvalidVersion(None)),
            Err(httparse::Error::Status) => return Err(ParseError::InvalidStatus(None)),
            Err(e) => return Err(ParseError::invalid_header(e)),
        };
        trace!(head_size = body_offset, "parsed response head");
        ensure!(body_offset <= MAX_HEADER_BYTES, ParseError::too_large_header(body_offset, MAX_HEADER_BYTES));

        let version = match res.version {
            Some(0) => Version::HTTP_10,
            Some(1) => Version::HTTP_11,
            v => return Err(ParseError::InvalidVersion(v)),
        };
        let code = res.code.ok_or(ParseError::InvalidStatus(None))?;
        let status = StatusCode::from_u16(code).map_err(|_| ParseError::InvalidStatus(Some(code)))?;
        let reason = res.reason.map(str::to_string);

        let mut header_map = HeaderMap::with_capacity(res.headers.len());
        for h in res.headers.iter() {
            let name = HeaderName::from_bytes(h.name.as_bytes()).map_err(ParseError::invalid_header)?;
            let value = HeaderValue::from_bytes(h.value).map_err(ParseError::invalid_header)?;
            header_map.append(name, value);
        }

        let mut response = Response::new(());
        *response.status_mut() = status;
        *response.version_mut() = version;
        *response.headers_mut() = header_map;
        let head = ResponseHead::new(response, reason);

        let payload_size = self.payload_size(&head)?;
        src.advance(body_offset);

        Ok(Some((head, payload_size)))
    }
}

impl HeaderDecoder {
    fn payload_size(&self, head: &ResponseHead) -> Result<PayloadSize, ParseError> {
        let status = head.status();
        if self.head_request
            || status.is_informational()
            || status == StatusCode::NO_CONTENT
            || status == StatusCode::NOT_MODIFIED
        {
            return Ok(PayloadSize::Empty);
        }

        let headers = head.headers();
        if headers.contains_key(header::TRANSFER_ENCODING) {
            if headers.contains_key(header::CONTENT_LENGTH) {
                warn!("response has both transfer-encoding and content-length, ignoring content-length");
            }
            return Ok(if is_chunked(headers) { PayloadSize::Chunked } else { PayloadSize::UntilClose });
        }

        let mut lengths = headers.get_all(header::CONTENT_LENGTH).iter();
        let Some(first) = lengths.next() else {
            return Ok(PayloadSize::UntilClose);
        };
        if lengths.any(|other| other != first) {
            return Err(ParseError::invalid_content_length("conflicting content-length values"));
        }

        let value = first.to_str().map_err(|_| ParseError::invalid_content_length("value is not visible ascii"))?;
        let length =
            value.trim().parse::<u64>().map_err(|_| ParseError::invalid_content_length(format!("value {value} is not u64")))?;

        Ok(if length == 0 { PayloadSize::Empty } else { PayloadSize::Length(length) })
    }
}
