use async_trait::async_trait;
use bytes::{Bytes, BytesMut};
use http::{Method, Uri, header};
use tracing::debug;

use crate::client::{ClientHttpRequest, ClientHttpResponse, RequestState};
use crate::ensure;
use crate::protocol::{HttpError, HttpHeaders, PayloadSize, RequestHead, SendError};

/// Puts a fully buffered request on the wire and returns its response.
#[async_trait]
pub trait RequestExecutor: Send + Sync {
    type Response: ClientHttpResponse;

    async fn execute(&self, head: RequestHead, payload_size: PayloadSize, body: Bytes) -> Result<Self::Response, HttpError>;
}

/// A request that keeps its body in memory until it is executed.
///
/// Transports only implement [`RequestExecutor`]; the request lifecycle and the
/// choice of payload framing are handled here.
#[derive(Debug)]
pub struct BufferedRequest<E> {
    method: Method,
    uri: Uri,
    headers: HttpHeaders,
    body: BytesMut,
    state: RequestState,
    executor: E,
}

impl<E: RequestExecutor> BufferedRequest<E> {
    pub fn new(method: Method, uri: Uri, executor: E) -> Self {
        Self { method, uri, headers: HttpHeaders::new(), body: BytesMut::new(), state: RequestState::Open, executor }
    }

    pub fn state(&self) -> RequestState {
        self.state
    }

    fn ensure_open(&self, what: &str) -> Result<(), HttpError> {
        ensure!(self.state == RequestState::Open, HttpError::illegal_state(format!("{what}: request has already been executed")));
        Ok(())
    }
}

#[async_trait]
impl<E: RequestExecutor> ClientHttpRequest for BufferedRequest<E> {
    type Response = E::Response;

    fn method(&self) -> &Method {
        &self.method
    }

    fn uri(&self) -> &Uri {
        &self.uri
    }

    fn headers(&self) -> &HttpHeaders {
        &self.headers
    }

    fn headers_mut(&mut self) -> &mut HttpHeaders {
        &mut self.headers
    }

    fn body(&mut self) -> Result<&mut BytesMut, HttpError> {
        self.ensure_open("can't write body")?;
        Ok(&mut self.body)
    }

    async fn execute(&mut self) -> Result<Self::Response, HttpError> {
        self.ensure_open("can't execute")?;
        self.state = RequestState::Executed;
        self.headers.set_read_only();

        let body = self.body.split().freeze();
        let payload_size = payload_size(&self.method, &self.headers, body.len())?;
        debug!(method = %self.method, uri = %self.uri, ?payload_size, "executing request");

        let head = RequestHead::new(self.method.clone(), self.uri.clone(), self.headers.as_header_map().clone());
        self.executor.execute(head, payload_size, body).await
    }
}

/// Chooses how the buffered body is framed on the wire.
fn payload_size(method: &Method, headers: &HttpHeaders, body_len: usize) -> Result<PayloadSize, SendError> {
    if headers.is_chunked() {
        return Ok(PayloadSize::Chunked);
    }

    let body_len = body_len as u64;
    if headers.contains_key(header::CONTENT_LENGTH.as_str()) {
        let declared = headers.content_length().ok_or_else(|| SendError::invalid_body("content-length is not a number"))?;
        ensure!(
            declared == body_len,
            SendError::invalid_body(format!("content-length is {declared} but the body has {body_len} bytes"))
        );
        return Ok(PayloadSize::Length(declared));
    }

    if body_len > 0 || matches!(*method, Method::POST | Method::PUT | Method::PATCH) {
        Ok(PayloadSize::Length(body_len))
    } else {
        Ok(PayloadSize::Empty)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use http::StatusCode;

    use super::*;
    use crate::protocol::OnceBody;

    type Sent = Arc<Mutex<Vec<(RequestHead, PayloadSize, Bytes)>>>;

    #[derive(Debug, Default)]
    struct RecordingExecutor {
        sent: Sent,
        fail: bool,
    }

    #[derive(Debug)]
    struct NoContent {
        headers: HttpHeaders,
        body: OnceBody,
    }

    impl ClientHttpResponse for NoContent {
        type Body = OnceBody;

        fn status_code(&self) -> StatusCode {
            StatusCode::NO_CONTENT
        }

        fn status_text(&self) -> &str {
            "No Content"
        }

        fn headers(&self) -> &HttpHeaders {
            &self.headers
        }

        fn body(&mut self) -> Result<&mut Self::Body, HttpError> {
            Ok(&mut self.body)
        }

        fn close(&mut self) {}
    }

    #[async_trait]
    impl RequestExecutor for RecordingExecutor {
        type Response = NoContent;

        async fn execute(&self, head: RequestHead, payload_size: PayloadSize, body: Bytes) -> Result<NoContent, HttpError> {
            if self.fail {
                return Err(HttpError::connect("localhost", std::io::ErrorKind::ConnectionRefused.into()));
            }
            self.sent.lock().unwrap().push((head, payload_size, body));
            Ok(NoContent { headers: HttpHeaders::read_only(http::HeaderMap::new()), body: OnceBody::empty() })
        }
    }

    fn request(method: Method) -> (BufferedRequest<RecordingExecutor>, Sent) {
        let executor = RecordingExecutor::default();
        let sent = Arc::clone(&executor.sent);
        (BufferedRequest::new(method, Uri::from_static("http://localhost/echo"), executor), sent)
    }

    #[tokio::test]
    async fn sends_head_and_body() {
        let (mut request, sent) = request(Method::PUT);
        request.headers_mut().add("MyHeader", "value1").unwrap();
        request.headers_mut().add("MyHeader", "value2").unwrap();
        request.body().unwrap().extend_from_slice(b"Hello World");

        let response = request.execute().await.unwrap();
        assert_eq!(response.status_code(), StatusCode::NO_CONTENT);

        let sent = sent.lock().unwrap();
        let (head, payload_size, body) = &sent[0];
        assert_eq!(head.method(), &Method::PUT);
        assert_eq!(head.uri(), "http://localhost/echo");
        let values: Vec<_> = head.headers().get_all("myheader").iter().collect();
        assert_eq!(values, ["value1", "value2"]);
        assert_eq!(*payload_size, PayloadSize::Length(11));
        assert_eq!(&body[..], b"Hello World");
    }

    #[tokio::test]
    async fn executed_request_is_sealed() {
        let (mut request, _) = request(Method::POST);
        request.body().unwrap().extend_from_slice(b"Hello");
        request.execute().await.unwrap();

        assert_eq!(request.state(), RequestState::Executed);
        assert!(request.body().unwrap_err().is_illegal_state());
        assert!(request.execute().await.unwrap_err().is_illegal_state());
        assert!(request.headers_mut().add("MyHeader", "value").unwrap_err().is_unsupported_operation());
    }

    #[tokio::test]
    async fn failed_execute_still_consumes_the_request() {
        let mut request = BufferedRequest::new(
            Method::GET,
            Uri::from_static("http://localhost/echo"),
            RecordingExecutor { fail: true, ..RecordingExecutor::default() },
        );

        assert!(matches!(request.execute().await.unwrap_err(), HttpError::Connect { .. }));
        assert!(request.execute().await.unwrap_err().is_illegal_state());
    }

    #[tokio::test]
    async fn mismatched_content_length() {
        let (mut request, sent) = request(Method::POST);
        request.headers_mut().set_content_length(5).unwrap();
        request.body().unwrap().extend_from_slice(b"Hello World");

        let error = request.execute().await.unwrap_err();
        assert!(matches!(error, HttpError::RequestError { source: SendError::InvalidBody { .. } }));
        assert!(sent.lock().unwrap().is_empty());
    }

    #[test]
    fn framing() {
        let empty = HttpHeaders::new();
        assert_eq!(payload_size(&Method::GET, &empty, 0).unwrap(), PayloadSize::Empty);
        assert_eq!(payload_size(&Method::DELETE, &empty, 0).unwrap(), PayloadSize::Empty);
        assert_eq!(payload_size(&Method::POST, &empty, 0).unwrap(), PayloadSize::Length(0));
        assert_eq!(payload_size(&Method::GET, &empty, 3).unwrap(), PayloadSize::Length(3));

        let mut chunked = HttpHeaders::new();
        chunked.set(header::TRANSFER_ENCODING, "chunked").unwrap();
        assert_eq!(payload_size(&Method::POST, &chunked, 3).unwrap(), PayloadSize::Chunked);

        let mut declared = HttpHeaders::new();
        declared.set_content_length(0).unwrap();
        assert_eq!(payload_size(&Method::POST, &declared, 0).unwrap(), PayloadSize::Length(0));
    }
}
