//! HTTP request head handling.
//!
//! The head is everything a transport needs to put a request on the wire except
//! its payload. It wraps `http::Request<()>` the same way the body-less halves of
//! `http` messages are usually carried around.

use http::{HeaderMap, Method, Request, Uri, Version};

/// The head of an outgoing HTTP request.
#[derive(Debug)]
pub struct RequestHead {
    inner: Request<()>,
}

impl RequestHead {
    /// Creates an HTTP/1.1 request head.
    pub fn new(method: Method, uri: Uri, headers: HeaderMap) -> Self {
        let mut inner = Request::new(());
        *inner.method_mut() = method;
        *inner.uri_mut() = uri;
        *inner.version_mut() = Version::HTTP_11;
        *inner.headers_mut() = headers;
        Self { inner }
    }

    pub fn method(&self) -> &Method {
        self.inner.method()
    }

    pub fn uri(&self) -> &Uri {
        self.inner.uri()
    }

    pub fn version(&self) -> Version {
        self.inner.version()
    }

    pub fn headers(&self) -> &HeaderMap {
        self.inner.headers()
    }

    pub fn headers_mut(&mut self) -> &mut HeaderMap {
        self.inner.headers_mut()
    }

    /// The request target in origin-form, `/` when the uri has no path.
    pub fn path_and_query(&self) -> &str {
        self.uri().path_and_query().map_or("/", |p| if p.as_str().is_empty() { "/" } else { p.as_str() })
    }
}

impl From<Request<()>> for RequestHead {
    #[inline]
    fn from(inner: Request<()>) -> Self {
        Self { inner }
    }
}
