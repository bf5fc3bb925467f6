//! One TCP connection per request.
//!
//! The request is written with [`RequestEncoder`], the response read with
//! [`ResponseDecoder`]. Every request asks the server to close the connection
//! once the response is sent, so the response body can always be delimited.

use std::sync::Arc;

use async_trait::async_trait;
use bytes::Bytes;
use futures::{SinkExt, StreamExt};
use http::uri::Authority;
use http::{HeaderMap, HeaderValue, Method, StatusCode, Uri, header};
use tokio::io::AsyncRead;
use tokio::net::TcpStream;
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::time::timeout;
use tokio_util::codec::{FramedRead, FramedWrite};
use tracing::{debug, info, warn};

use crate::client::{BufferedRequest, ClientConfig, ClientHttpRequestFactory, ClientHttpResponse, RequestExecutor, check_uri};
use crate::codec::{RequestEncoder, ResponseDecoder};
use crate::protocol::{HttpError, HttpHeaders, Message, ParseError, PayloadItem, PayloadSize, RequestHead, ResBody, ResponseHead};
use crate::status::canonical_reason;

const DEFAULT_PORT: u16 = 80;

type RequestMessage = Message<(RequestHead, PayloadSize)>;

/// Creates requests sent over a fresh tokio TCP connection each.
#[derive(Debug, Clone, Default)]
pub struct SimpleClientHttpRequestFactory {
    config: Arc<ClientConfig>,
}

impl SimpleClientHttpRequestFactory {
    pub fn new(config: ClientConfig) -> Self {
        Self { config: Arc::new(config) }
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }
}

impl ClientHttpRequestFactory for SimpleClientHttpRequestFactory {
    type Request = BufferedRequest<SimpleExecutor>;

    fn create_request(&self, uri: Uri, method: Method) -> Result<Self::Request, HttpError> {
        check_uri(&uri)?;
        Ok(BufferedRequest::new(method, uri, SimpleExecutor { config: Arc::clone(&self.config) }))
    }
}

#[derive(Debug)]
pub struct SimpleExecutor {
    config: Arc<ClientConfig>,
}

impl SimpleExecutor {
    async fn connect(&self, authority: &Authority) -> Result<TcpStream, HttpError> {
        let host = authority.host().trim_start_matches('[').trim_end_matches(']');
        let port = authority.port_u16().unwrap_or(DEFAULT_PORT);

        let connecting = TcpStream::connect((host, port));
        let connected = match self.config.connect_timeout() {
            Some(limit) => timeout(limit, connecting).await.map_err(|_elapsed| HttpError::timeout("connect", limit))?,
            None => connecting.await,
        };
        let stream = connected.map_err(|e| HttpError::connect(authority, e))?;

        if let Err(e) = stream.set_nodelay(true) {
            warn!(cause = %e, "can't set TCP_NODELAY");
        }
        debug!(%authority, "connected");
        Ok(stream)
    }

    fn prepare_headers(&self, authority: &Authority, headers: &mut HeaderMap) -> Result<(), HttpError> {
        if !headers.contains_key(header::HOST) {
            let host = HeaderValue::from_str(authority.as_str()).map_err(HttpError::invalid_header)?;
            headers.insert(header::HOST, host);
        }
        if !headers.contains_key(header::CONNECTION) {
            headers.insert(header::CONNECTION, HeaderValue::from_static("close"));
        }
        if let Some(user_agent) = self.config.user_agent()
            && !headers.contains_key(header::USER_AGENT)
        {
            let user_agent = HeaderValue::from_str(user_agent).map_err(HttpError::invalid_header)?;
            headers.insert(header::USER_AGENT, user_agent);
        }
        Ok(())
    }

    async fn read_message<R>(&self, framed: &mut FramedRead<R, ResponseDecoder>) -> Result<Message<ResponseHead>, HttpError>
    where
        R: AsyncRead + Unpin,
    {
        let next = match self.config.read_timeout() {
            Some(limit) => timeout(limit, framed.next()).await.map_err(|_elapsed| HttpError::timeout("read", limit))?,
            None => framed.next().await,
        };

        match next {
            Some(message) => Ok(message?),
            None => Err(ParseError::invalid_header("connection closed before the response head").into()),
        }
    }

    async fn read_head<R>(&self, framed: &mut FramedRead<R, ResponseDecoder>) -> Result<ResponseHead, HttpError>
    where
        R: AsyncRead + Unpin,
    {
        loop {
            match self.read_message(framed).await? {
                Message::Header(head) if head.is_interim() => {
                    debug!(status = %head.status(), "skipping interim response");
                    match self.read_message(framed).await? {
                        Message::Payload(PayloadItem::Eof) => {}
                        _ => return Err(ParseError::invalid_body("interim response carries a payload").into()),
                    }
                }
                Message::Header(head) => return Ok(head),
                Message::Payload(_) => return Err(ParseError::invalid_body("received payload before the response head").into()),
            }
        }
    }
}

#[async_trait]
impl RequestExecutor for SimpleExecutor {
    type Response = SimpleClientHttpResponse;

    async fn execute(&self, mut head: RequestHead, payload_size: PayloadSize, body: Bytes) -> Result<Self::Response, HttpError> {
        let authority = head.uri().authority().cloned().ok_or_else(|| HttpError::invalid_uri("missing authority"))?;
        self.prepare_headers(&authority, head.headers_mut())?;
        let method = head.method().clone();

        let (reader, writer) = self.connect(&authority).await?.into_split();

        let mut framed_write = FramedWrite::new(writer, RequestEncoder::new());
        framed_write.feed(RequestMessage::Header((head, payload_size))).await?;
        if !body.is_empty() {
            framed_write.feed(RequestMessage::Payload(PayloadItem::Chunk(body))).await?;
        }
        framed_write.send(RequestMessage::Payload(PayloadItem::Eof)).await?;
        let writer = framed_write.into_inner();

        let mut framed_read = FramedRead::with_capacity(reader, ResponseDecoder::new(&method), self.config.read_buffer_size());
        let head = self.read_head(&mut framed_read).await?;
        info!(%method, status = %head.status(), "received response");

        Ok(SimpleClientHttpResponse::new(head, ResBody::new(framed_read), writer))
    }
}

/// A response whose body is still on the connection it arrived on.
#[derive(Debug)]
pub struct SimpleClientHttpResponse {
    status: StatusCode,
    reason: Option<String>,
    headers: HttpHeaders,
    body: ResBody<OwnedReadHalf>,
    writer: Option<OwnedWriteHalf>,
}

impl SimpleClientHttpResponse {
    fn new(head: ResponseHead, body: ResBody<OwnedReadHalf>, writer: OwnedWriteHalf) -> Self {
        let (response, reason) = head.into_parts();
        let (parts, ()) = response.into_parts();
        Self { status: parts.status, reason, headers: HttpHeaders::read_only(parts.headers), body, writer: Some(writer) }
    }

    pub fn is_closed(&self) -> bool {
        self.writer.is_none()
    }
}

impl ClientHttpResponse for SimpleClientHttpResponse {
    type Body = ResBody<OwnedReadHalf>;

    fn status_code(&self) -> StatusCode {
        self.status
    }

    fn status_text(&self) -> &str {
        self.reason.as_deref().unwrap_or_else(|| canonical_reason(self.status))
    }

    fn headers(&self) -> &HttpHeaders {
        &self.headers
    }

    fn body(&mut self) -> Result<&mut Self::Body, HttpError> {
        if self.is_closed() {
            return Err(HttpError::illegal_state("response has been closed"));
        }
        Ok(&mut self.body)
    }

    fn close(&mut self) {
        if self.writer.take().is_some() {
            debug!(status = %self.status, "closing response connection");
        }
        self.body.release();
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use bytes::BytesMut;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    use super::*;
    use crate::client::{ClientHttpRequest, read_body};

    /// Accepts one connection, returns what the client sent and answers with `response`.
    async fn serve_once(response: &'static [u8]) -> (Uri, tokio::task::JoinHandle<Vec<u8>>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let uri = format!("http://{}/echo", listener.local_addr().unwrap()).parse().unwrap();

        let handle = tokio::spawn(async move {
            let (mut stream, _) = listener.accept().await.unwrap();
            let mut received = BytesMut::new();
            while !received.windows(4).any(|w| w == b"\r\n\r\n") {
                if stream.read_buf(&mut received).await.unwrap() == 0 {
                    break;
                }
            }
            stream.write_all(response).await.unwrap();
            stream.shutdown().await.unwrap();
            received.to_vec()
        });

        (uri, handle)
    }

    #[tokio::test]
    async fn round_trip() {
        let (uri, server) = serve_once(b"HTTP/1.1 201 Made It\r\nContent-Length: 5\r\nX-Id: 7\r\n\r\nhello").await;
        let factory = SimpleClientHttpRequestFactory::new(ClientConfig::builder().user_agent("micro-client-test").build());

        let mut request = factory.create_request(uri, Method::GET).unwrap();
        let mut response = request.execute().await.unwrap();

        assert_eq!(response.status_code(), StatusCode::CREATED);
        assert_eq!(response.status_text(), "Made It");
        assert_eq!(response.headers().values("x-id"), ["7"]);
        assert_eq!(&read_body(&mut response).await.unwrap()[..], b"hello");
        response.close();
        response.close();
        assert!(response.body().unwrap_err().is_illegal_state());

        let sent = String::from_utf8(server.await.unwrap()).unwrap();
        assert!(sent.starts_with("GET /echo HTTP/1.1\r\n"));
        assert!(sent.contains("host: 127.0.0.1:"));
        assert!(sent.contains("connection: close\r\n"));
        assert!(sent.contains("user-agent: micro-client-test\r\n"));
    }

    #[tokio::test]
    async fn skips_interim_responses() {
        let (uri, _server) = serve_once(b"HTTP/1.1 100 Continue\r\n\r\nHTTP/1.1 200 OK\r\n\r\nuntil close").await;

        let mut request = SimpleClientHttpRequestFactory::default().create_request(uri, Method::POST).unwrap();
        let mut response = request.execute().await.unwrap();

        assert_eq!(response.status_code(), StatusCode::OK);
        assert_eq!(&read_body(&mut response).await.unwrap()[..], b"until close");
        response.close();
    }

    #[tokio::test]
    async fn empty_reason_uses_canonical_text() {
        let (uri, _server) = serve_once(b"HTTP/1.1 404 \r\nContent-Length: 0\r\n\r\n").await;

        let mut request = SimpleClientHttpRequestFactory::default().create_request(uri, Method::GET).unwrap();
        let mut response = request.execute().await.unwrap();

        assert_eq!(response.status_text(), "Not Found");
        assert!(read_body(&mut response).await.unwrap().is_empty());
        response.close();
    }

    #[tokio::test]
    async fn read_timeout() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let uri: Uri = format!("http://{}/slow", listener.local_addr().unwrap()).parse().unwrap();
        let _server = tokio::spawn(async move {
            let (stream, _) = listener.accept().await.unwrap();
            tokio::time::sleep(Duration::from_secs(5)).await;
            drop(stream);
        });

        let factory = SimpleClientHttpRequestFactory::new(ClientConfig::builder().read_timeout(Duration::from_millis(50)).build());
        let mut request = factory.create_request(uri, Method::GET).unwrap();

        let error = request.execute().await.unwrap_err();
        assert!(matches!(error, HttpError::Timeout { operation: "read", .. }));
    }

    #[tokio::test]
    async fn connection_refused() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let uri: Uri = format!("http://{}/", listener.local_addr().unwrap()).parse().unwrap();
        drop(listener);

        let mut request = SimpleClientHttpRequestFactory::default().create_request(uri, Method::GET).unwrap();
        assert!(matches!(request.execute().await.unwrap_err(), HttpError::Connect { .. }));
    }

    #[test]
    fn rejects_non_http_uri() {
        let factory = SimpleClientHttpRequestFactory::default();
        let error = factory.create_request(Uri::from_static("https://localhost/"), Method::GET).unwrap_err();
        assert!(matches!(error, HttpError::InvalidUri { .. }));
    }
}
