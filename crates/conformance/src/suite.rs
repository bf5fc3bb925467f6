//! The checks every [`ClientHttpRequestFactory`] has to pass.
//!
//! Each check runs one scenario against a [`ReferenceServer`] and fails by
//! panicking, like any other test assertion. Transport errors are returned so the
//! caller sees where the exchange broke. Responses are closed on every path,
//! failed assertions included.

use std::ops::{Deref, DerefMut};

use http::{Method, StatusCode};
use micro_client::client::{ClientHttpRequest, ClientHttpRequestFactory, ClientHttpResponse, read_body};
use micro_client::protocol::HttpError;

use crate::ReferenceServer;

const HELLO_WORLD: &[u8] = b"Hello World";

/// Closes the wrapped response when dropped.
struct Closing<R: ClientHttpResponse>(R);

impl<R: ClientHttpResponse> Deref for Closing<R> {
    type Target = R;

    fn deref(&self) -> &R {
        &self.0
    }
}

impl<R: ClientHttpResponse> DerefMut for Closing<R> {
    fn deref_mut(&mut self) -> &mut R {
        &mut self.0
    }
}

impl<R: ClientHttpResponse> Drop for Closing<R> {
    fn drop(&mut self) {
        self.0.close();
    }
}

async fn execute<Q: ClientHttpRequest>(request: &mut Q) -> Result<Closing<Q::Response>, HttpError> {
    Ok(Closing(request.execute().await?))
}

/// The request keeps its method and URI, and a 404 comes back as a 404.
pub async fn status<F: ClientHttpRequestFactory>(factory: &F, server: &ReferenceServer) -> Result<(), HttpError> {
    let uri = server.url("/status/notfound")?;
    let mut request = factory.create_request(uri.clone(), Method::GET)?;
    assert_eq!(*request.method(), Method::GET, "invalid http method");
    assert_eq!(request.uri(), &uri, "invalid uri");

    let response = execute(&mut request).await?;
    assert_eq!(*request.method(), Method::GET, "http method changed by execute");
    assert_eq!(request.uri(), &uri, "uri changed by execute");
    assert_eq!(response.status_code(), StatusCode::NOT_FOUND, "invalid status code");
    assert!(!response.status_text().is_empty(), "status text is empty");
    drop(response);

    for (path, expected) in [("/status/ok", StatusCode::OK), ("/status/503", StatusCode::SERVICE_UNAVAILABLE)] {
        let mut request = factory.create_request(server.url(path)?, Method::GET)?;
        let response = execute(&mut request).await?;
        assert_eq!(response.status_code(), expected, "invalid status code for {path}");
    }
    Ok(())
}

/// Headers and body travel to the server and back unchanged.
pub async fn echo<F: ClientHttpRequestFactory>(factory: &F, server: &ReferenceServer) -> Result<(), HttpError> {
    let mut request = factory.create_request(server.url("/echo")?, Method::PUT)?;
    assert_eq!(*request.method(), Method::PUT, "invalid http method");

    let headers = request.headers_mut();
    headers.add("MyHeader", "value1")?;
    headers.add("MyHeader", "value2")?;
    headers.set_content_length(HELLO_WORLD.len() as u64)?;
    request.body()?.extend_from_slice(HELLO_WORLD);

    let mut response = execute(&mut request).await?;
    assert!(!response.status_text().is_empty(), "status text is empty");
    assert_eq!(response.status_code(), StatusCode::OK, "invalid status code");
    assert_eq!(response.headers().values("myheader"), ["value1", "value2"], "header values not found");
    assert_eq!(response.headers().values("MYHEADER"), ["value1", "value2"], "header lookup is case sensitive");

    let body = read_body(&mut *response).await?;
    assert_eq!(&body[..], HELLO_WORLD, "invalid body");
    Ok(())
}

/// The body can't be written once the request went out, nor can the request be
/// sent twice.
pub async fn multiple_writes<F: ClientHttpRequestFactory>(factory: &F, server: &ReferenceServer) -> Result<(), HttpError> {
    let mut request = factory.create_request(server.url("/echo")?, Method::POST)?;
    request.body()?.extend_from_slice(HELLO_WORLD);

    let _response = execute(&mut request).await?;

    let error = request.body().err();
    assert!(error.as_ref().is_some_and(HttpError::is_illegal_state), "body writable after execute: {error:?}");
    let error = request.execute().await.err();
    assert!(error.as_ref().is_some_and(HttpError::is_illegal_state), "request executed twice: {error:?}");
    Ok(())
}

/// Headers are read-only once the request went out.
pub async fn headers_after_execute<F: ClientHttpRequestFactory>(factory: &F, server: &ReferenceServer) -> Result<(), HttpError> {
    let mut request = factory.create_request(server.url("/echo")?, Method::POST)?;
    request.headers_mut().add("MyHeader", "value")?;
    request.body()?.extend_from_slice(HELLO_WORLD);

    let _response = execute(&mut request).await?;

    let error = request.headers_mut().add("MyHeader", "value").err();
    assert!(error.as_ref().is_some_and(HttpError::is_unsupported_operation), "headers writable after execute: {error:?}");
    assert_eq!(request.headers().values("myheader"), ["value"], "headers changed after execute");
    Ok(())
}

/// Every common method reaches the server as itself.
pub async fn http_methods<F: ClientHttpRequestFactory>(factory: &F, server: &ReferenceServer) -> Result<(), HttpError> {
    for method in [Method::GET, Method::HEAD, Method::POST, Method::PUT, Method::OPTIONS, Method::DELETE] {
        let verb = method.as_str().to_ascii_lowercase();
        let mut request = factory.create_request(server.url(&format!("/methods/{verb}"))?, method.clone())?;
        if matches!(method, Method::POST | Method::PUT) {
            request.body()?.extend_from_slice(HELLO_WORLD);
        }

        let mut response = execute(&mut request).await?;
        assert_eq!(*request.method(), method, "http method changed by execute");
        assert!(request.method().as_str().eq_ignore_ascii_case(&verb), "request method is not {verb}");
        assert_eq!(response.status_code(), StatusCode::OK, "invalid response status for {method}");
        let body = read_body(&mut *response).await?;
        assert!(body.is_empty(), "{method} response has a body");
    }

    let mut request = factory.create_request(server.url("/methods/get")?, Method::DELETE)?;
    let response = execute(&mut request).await?;
    assert_eq!(response.status_code(), StatusCode::INTERNAL_SERVER_ERROR, "method mismatch accepted");
    Ok(())
}

/// An empty POST body declares, and delivers, zero bytes.
pub async fn empty_post_body<F: ClientHttpRequestFactory>(factory: &F, server: &ReferenceServer) -> Result<(), HttpError> {
    let mut request = factory.create_request(server.url("/methods/post")?, Method::POST)?;
    request.headers_mut().set_content_length(0)?;
    let response = execute(&mut request).await?;
    assert_eq!(response.status_code(), StatusCode::OK, "invalid response status");
    drop(response);

    let mut request = factory.create_request(server.url("/methods/post")?, Method::POST)?;
    let response = execute(&mut request).await?;
    assert_eq!(response.status_code(), StatusCode::OK, "invalid response status");
    drop(response);

    assert_eq!(server.post_lengths(), [0, 0], "server saw a body");
    Ok(())
}

/// A closed response gives its body up, and closing again is harmless.
pub async fn close_releases<F: ClientHttpRequestFactory>(factory: &F, server: &ReferenceServer) -> Result<(), HttpError> {
    let mut request = factory.create_request(server.url("/echo")?, Method::POST)?;
    request.body()?.extend_from_slice(HELLO_WORLD);

    let mut response = execute(&mut request).await?;
    response.close();
    response.close();

    let error = response.body().err();
    assert!(error.as_ref().is_some_and(HttpError::is_illegal_state), "body readable after close: {error:?}");
    assert_eq!(response.status_code(), StatusCode::OK, "status lost on close");
    assert_eq!(server.request_count(), 1);
    Ok(())
}

/// Rejects what can't be sent before any connection is made.
pub async fn invalid_uri<F: ClientHttpRequestFactory>(factory: &F, server: &ReferenceServer) -> Result<(), HttpError> {
    for uri in ["/echo", "https://localhost/echo"] {
        let uri = uri.parse().map_err(HttpError::invalid_uri)?;
        let error = factory.create_request(uri, Method::GET).err();
        assert!(matches!(error, Some(HttpError::InvalidUri { .. })), "request created for a bad uri: {error:?}");
    }
    assert_eq!(server.request_count(), 0);
    Ok(())
}
