//! Server side of the wire, just enough to answer one request per connection.

use std::io::Write;

use bytes::{Buf, BufMut, Bytes, BytesMut};
use http::{HeaderMap, HeaderName, HeaderValue, Request, Response, Version, header};
use httparse::Status;
use micro_client::codec::PayloadDecoder;
use micro_client::protocol::{Message, ParseError, PayloadItem, PayloadSize, RequestHead, SendError};
use micro_client::status::canonical_reason;
use tokio_util::codec::{Decoder, Encoder};
use tracing::trace;

const MAX_HEADER_NUM: usize = 64;

const MAX_HEADER_BYTES: usize = 8 * 1024;

/// Decodes a request head, then its payload up to [`PayloadItem::Eof`].
#[derive(Debug, Default)]
pub(crate) struct RequestDecoder {
    payload_decoder: Option<PayloadDecoder>,
}

impl Decoder for RequestDecoder {
    type Item = Message<RequestHead>;
    type Error = ParseError;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        if let Some(payload_decoder) = &mut self.payload_decoder {
            let item = payload_decoder.decode(src)?;
            if item.as_ref().is_some_and(PayloadItem::is_eof) {
                self.payload_decoder.take();
            }
            return Ok(item.map(Message::Payload));
        }

        let Some((head, payload_size)) = decode_head(src)? else {
            return Ok(None);
        };
        trace!(method = %head.method(), uri = %head.uri(), ?payload_size, "decoded request head");
        self.payload_decoder = Some(payload_size.into());
        Ok(Some(Message::Header(head)))
    }
}

fn decode_head(src: &mut BytesMut) -> Result<Option<(RequestHead, PayloadSize)>, ParseError> {
    let mut headers = [httparse::EMPTY_HEADER; MAX_HEADER_NUM];
    let mut req = httparse::Request::new(&mut headers);

    let body_offset = match req.parse(&src[..]) {
        Ok(Status::Complete(offset)) => offset,
        Ok(Status::Partial) => {
            if src.len() > MAX_HEADER_BYTES {
                return Err(ParseError::too_large_header(src.len(), MAX_HEADER_BYTES));
            }
            return Ok(None);
        }
        Err(httparse::Error::TooManyHeaders) => return Err(ParseError::too_many_headers(MAX_HEADER_NUM)),
        Err(e) => return Err(ParseError::invalid_header(e)),
    };

    let version = match req.version {
        Some(0) => Version::HTTP_10,
        Some(1) => Version::HTTP_11,
        v => return Err(ParseError::InvalidVersion(v)),
    };

    let mut builder = Request::builder()
        .method(req.method.unwrap_or_default())
        .uri(req.path.unwrap_or_default())
        .version(version);
    for h in req.headers.iter() {
        let name = HeaderName::from_bytes(h.name.as_bytes()).map_err(ParseError::invalid_header)?;
        let value = HeaderValue::from_bytes(h.value).map_err(ParseError::invalid_header)?;
        builder = builder.header(name, value);
    }
    let head = RequestHead::from(builder.body(()).map_err(ParseError::invalid_header)?);

    let payload_size = payload_size(head.headers())?;
    src.advance(body_offset);
    Ok(Some((head, payload_size)))
}

fn payload_size(headers: &HeaderMap) -> Result<PayloadSize, ParseError> {
    let chunked = headers
        .get_all(header::TRANSFER_ENCODING)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(','))
        .any(|coding| coding.trim().eq_ignore_ascii_case("chunked"));
    if chunked {
        return Ok(PayloadSize::Chunked);
    }

    match headers.get(header::CONTENT_LENGTH) {
        Some(value) => {
            let length = value
                .to_str()
                .ok()
                .and_then(|s| s.trim().parse::<u64>().ok())
                .ok_or_else(|| ParseError::invalid_content_length(format!("{value:?} is not a length")))?;
            Ok(PayloadSize::Length(length))
        }
        None => Ok(PayloadSize::Empty),
    }
}

/// Writes a whole response, always closing the connection after it.
#[derive(Debug, Default)]
pub(crate) struct ResponseEncoder;

impl Encoder<Response<Bytes>> for ResponseEncoder {
    type Error = SendError;

    fn encode(&mut self, response: Response<Bytes>, dst: &mut BytesMut) -> Result<(), Self::Error> {
        let (parts, body) = response.into_parts();
        let status = parts.status;

        dst.reserve(256 + body.len());
        let mut writer = (&mut *dst).writer();
        write!(writer, "HTTP/1.1 {} {}\r\n", status.as_str(), canonical_reason(status))?;
        for (name, value) in &parts.headers {
            if name == header::CONTENT_LENGTH || name == header::CONNECTION {
                continue;
            }
            writer.write_all(name.as_str().as_bytes())?;
            writer.write_all(b": ")?;
            writer.write_all(value.as_bytes())?;
            writer.write_all(b"\r\n")?;
        }
        write!(writer, "content-length: {}\r\nconnection: close\r\n\r\n", body.len())?;

        dst.extend_from_slice(&body);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use futures::StreamExt;
    use http::{Method, StatusCode};
    use indoc::indoc;
    use tokio_util::codec::FramedRead;

    use super::*;

    async fn read_request(wire: &'static str) -> Result<(RequestHead, Bytes), ParseError> {
        let mut framed = FramedRead::new(wire.as_bytes(), RequestDecoder::default());
        let Some(Message::Header(head)) = framed.next().await.transpose()? else {
            panic!("expected a request head");
        };

        let mut body = BytesMut::new();
        while let Some(message) = framed.next().await {
            match message? {
                Message::Payload(PayloadItem::Chunk(bytes)) => body.extend_from_slice(&bytes),
                Message::Payload(PayloadItem::Eof) => break,
                Message::Header(_) => panic!("unexpected second head"),
            }
        }
        Ok((head, body.freeze()))
    }

    #[tokio::test]
    async fn request_with_length() {
        let (head, body) = read_request(indoc! {"
            PUT /echo HTTP/1.1
            Host: 127.0.0.1
            MyHeader: value1
            MyHeader: value2
            Content-Length: 11

            Hello World"})
        .await
        .unwrap();

        assert_eq!(head.method(), &Method::PUT);
        assert_eq!(head.uri().path(), "/echo");
        let values: Vec<_> = head.headers().get_all("myheader").iter().collect();
        assert_eq!(values, ["value1", "value2"]);
        assert_eq!(&body[..], b"Hello World");
    }

    #[tokio::test]
    async fn chunked_request() {
        let wire = "POST /methods/post HTTP/1.1\r\nTransfer-Encoding: chunked\r\n\r\n5\r\nHello\r\n6\r\n World\r\n0\r\n\r\n";
        let (head, body) = read_request(wire).await.unwrap();

        assert_eq!(head.method(), &Method::POST);
        assert_eq!(&body[..], b"Hello World");
    }

    #[tokio::test]
    async fn bodyless_request() {
        let (head, body) = read_request(indoc! {"
            GET /status/notfound HTTP/1.1
            Host: 127.0.0.1

            "})
        .await
        .unwrap();

        assert_eq!(head.method(), &Method::GET);
        assert!(body.is_empty());
    }

    #[tokio::test]
    async fn bad_content_length() {
        let error = read_request(indoc! {"
            POST /echo HTTP/1.1
            Content-Length: eleven

            Hello World"})
        .await
        .unwrap_err();

        assert!(matches!(error, ParseError::InvalidContentLength { .. }));
    }

    #[test]
    fn encode_response() {
        let mut response = Response::new(Bytes::from_static(b"Hello World"));
        *response.status_mut() = StatusCode::NOT_FOUND;
        response.headers_mut().append("myheader", HeaderValue::from_static("value1"));
        response.headers_mut().append("myheader", HeaderValue::from_static("value2"));
        response.headers_mut().insert(header::CONTENT_LENGTH, HeaderValue::from_static("3"));

        let mut dst = BytesMut::new();
        ResponseEncoder.encode(response, &mut dst).unwrap();

        assert_eq!(
            &dst[..],
            &b"HTTP/1.1 404 Not Found\r\nmyheader: value1\r\nmyheader: value2\r\ncontent-length: 11\r\nconnection: close\r\n\r\nHello World"[..]
        );
    }
}
