use async_trait::async_trait;
use bytes::{Bytes, BytesMut};
use http::{Method, StatusCode, Uri};
use tracing::trace;

use crate::client::{ClientHttpRequest, ClientHttpRequestFactory, ClientHttpResponse, read_body};
use crate::protocol::{HttpError, HttpHeaders, OnceBody};

/// Wraps another factory so that response bodies are kept in memory.
///
/// The whole body is read while executing, and the underlying response is closed
/// right away. The body can then be read any number of times.
#[derive(Debug, Clone, Default)]
pub struct BufferingClientHttpRequestFactory<F> {
    inner: F,
}

impl<F> BufferingClientHttpRequestFactory<F> {
    pub fn new(inner: F) -> Self {
        Self { inner }
    }
}

impl<F: ClientHttpRequestFactory> ClientHttpRequestFactory for BufferingClientHttpRequestFactory<F> {
    type Request = BufferingClientHttpRequest<F::Request>;

    fn create_request(&self, uri: Uri, method: Method) -> Result<Self::Request, HttpError> {
        Ok(BufferingClientHttpRequest { inner: self.inner.create_request(uri, method)? })
    }
}

#[derive(Debug)]
pub struct BufferingClientHttpRequest<R> {
    inner: R,
}

#[async_trait]
impl<R: ClientHttpRequest> ClientHttpRequest for BufferingClientHttpRequest<R> {
    type Response = BufferingClientHttpResponse;

    fn method(&self) -> &Method {
        self.inner.method()
    }

    fn uri(&self) -> &Uri {
        self.inner.uri()
    }

    fn headers(&self) -> &HttpHeaders {
        self.inner.headers()
    }

    fn headers_mut(&mut self) -> &mut HttpHeaders {
        self.inner.headers_mut()
    }

    fn body(&mut self) -> Result<&mut BytesMut, HttpError> {
        self.inner.body()
    }

    async fn execute(&mut self) -> Result<Self::Response, HttpError> {
        let mut response = self.inner.execute().await?;
        let read = read_body(&mut response).await;
        response.close();
        let bytes = read?;
        trace!(len = bytes.len(), "buffered response body");

        Ok(BufferingClientHttpResponse {
            status: response.status_code(),
            status_text: response.status_text().to_string(),
            headers: response.headers().clone(),
            bytes,
            body: OnceBody::empty(),
            closed: false,
        })
    }
}

/// A response held entirely in memory.
#[derive(Debug)]
pub struct BufferingClientHttpResponse {
    status: StatusCode,
    status_text: String,
    headers: HttpHeaders,
    bytes: Bytes,
    body: OnceBody,
    closed: bool,
}

impl BufferingClientHttpResponse {
    /// The whole body, whatever has been read through [`body`](ClientHttpResponse::body).
    pub fn body_bytes(&self) -> &Bytes {
        &self.bytes
    }
}

impl ClientHttpResponse for BufferingClientHttpResponse {
    type Body = OnceBody;

    fn status_code(&self) -> StatusCode {
        self.status
    }

    fn status_text(&self) -> &str {
        &self.status_text
    }

    fn headers(&self) -> &HttpHeaders {
        &self.headers
    }

    /// Every call starts again from the first byte.
    fn body(&mut self) -> Result<&mut Self::Body, HttpError> {
        if self.closed {
            return Err(HttpError::illegal_state("response has been closed"));
        }
        self.body = OnceBody::new(self.bytes.clone());
        Ok(&mut self.body)
    }

    fn close(&mut self) {
        self.closed = true;
        self.body = OnceBody::empty();
    }
}
