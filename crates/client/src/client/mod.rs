//! The client request/response contract and the transports implementing it.
//!
//! A request goes through a fixed lifecycle:
//!
//! 1. a [`ClientHttpRequestFactory`] creates it for a URI and a method
//! 2. while [`Open`](RequestState::Open), headers can be changed and the body written
//! 3. [`execute`](ClientHttpRequest::execute) sends it, exactly once
//! 4. once [`Executed`](RequestState::Executed), the body can't be touched
//!    ([`HttpError::IllegalState`]) and the headers are read-only
//!    ([`HttpError::UnsupportedOperation`])
//!
//! The response is then read through [`ClientHttpResponse`] and released with
//! [`close`](ClientHttpResponse::close).

mod buffered;
mod buffering;
mod config;
mod simple;

pub use buffered::{BufferedRequest, RequestExecutor};
pub use buffering::{BufferingClientHttpRequest, BufferingClientHttpRequestFactory, BufferingClientHttpResponse};
pub use config::{ClientConfig, ClientConfigBuilder, DEFAULT_READ_BUFFER_SIZE};
pub use simple::{SimpleClientHttpRequestFactory, SimpleClientHttpResponse, SimpleExecutor};

use async_trait::async_trait;
use bytes::{Bytes, BytesMut};
use http::{Method, StatusCode, Uri};
use http_body::Body;
use http_body_util::BodyExt;

use crate::ensure;
use crate::protocol::{HttpError, HttpHeaders};

/// Where a request is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestState {
    /// Headers and body can still be changed.
    Open,
    /// `execute` has been called, whatever its outcome. There is no way back.
    Executed,
}

/// Creates requests for one kind of transport.
pub trait ClientHttpRequestFactory: Send + Sync {
    type Request: ClientHttpRequest;

    /// Creates an open request. Fails with [`HttpError::InvalidUri`] when `uri` is not
    /// an absolute `http` URI.
    fn create_request(&self, uri: Uri, method: Method) -> Result<Self::Request, HttpError>;
}

/// A request being prepared, then executed once.
#[async_trait]
pub trait ClientHttpRequest: Send {
    type Response: ClientHttpResponse;

    fn method(&self) -> &Method;

    fn uri(&self) -> &Uri;

    fn headers(&self) -> &HttpHeaders;

    /// The headers to send. After execution they are read-only and every
    /// mutation fails with [`HttpError::UnsupportedOperation`].
    fn headers_mut(&mut self) -> &mut HttpHeaders;

    /// The body buffer. Fails with [`HttpError::IllegalState`] after execution.
    fn body(&mut self) -> Result<&mut BytesMut, HttpError>;

    /// Sends the request and waits for the response head.
    ///
    /// A second call fails with [`HttpError::IllegalState`], even when the first
    /// one failed.
    async fn execute(&mut self) -> Result<Self::Response, HttpError>;
}

/// The response to an executed request.
pub trait ClientHttpResponse: Send {
    type Body: Body<Data = Bytes, Error = HttpError> + Send + Unpin;

    fn status_code(&self) -> StatusCode;

    /// The reason phrase, never empty.
    fn status_text(&self) -> &str;

    /// The received headers, read-only.
    fn headers(&self) -> &HttpHeaders;

    /// The response body stream. Fails with [`HttpError::IllegalState`] once closed.
    fn body(&mut self) -> Result<&mut Self::Body, HttpError>;

    /// Releases the resources held by this response. Safe to call more than once.
    fn close(&mut self);
}

/// Reads what is left of the response body into memory.
pub async fn read_body<R>(response: &mut R) -> Result<Bytes, HttpError>
where
    R: ClientHttpResponse + ?Sized,
{
    let body = response.body()?;
    Ok(body.collect().await?.to_bytes())
}

/// Accepts absolute `http` URIs only.
pub(crate) fn check_uri(uri: &Uri) -> Result<(), HttpError> {
    ensure!(uri.scheme_str() == Some("http"), HttpError::invalid_uri(format!("unsupported scheme in {uri}")));
    ensure!(uri.authority().is_some(), HttpError::invalid_uri(format!("missing authority in {uri}")));
    Ok(())
}
