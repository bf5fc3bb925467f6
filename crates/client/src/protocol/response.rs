//! HTTP response head handling.
//!
//! `http::Response` has no room for the reason phrase the server sent, so the head
//! keeps it next to the `http::Response<()>` it wraps.

use http::{HeaderMap, Response, StatusCode, Version};

use crate::status::canonical_reason;

/// The head of an incoming HTTP response.
#[derive(Debug)]
pub struct ResponseHead {
    inner: Response<()>,
    reason: Option<String>,
}

impl ResponseHead {
    pub fn new(inner: Response<()>, reason: Option<String>) -> Self {
        let reason = reason.filter(|reason| !reason.is_empty());
        Self { inner, reason }
    }

    pub fn status(&self) -> StatusCode {
        self.inner.status()
    }

    pub fn version(&self) -> Version {
        self.inner.version()
    }

    pub fn headers(&self) -> &HeaderMap {
        self.inner.headers()
    }

    /// The reason phrase exactly as received, if the server sent a non-empty one.
    pub fn reason(&self) -> Option<&str> {
        self.reason.as_deref()
    }

    /// The reason phrase as received, falling back to the canonical one.
    pub fn status_text(&self) -> &str {
        self.reason().unwrap_or_else(|| canonical_reason(self.status()))
    }

    /// Interim responses are followed by the final response on the same connection.
    pub fn is_interim(&self) -> bool {
        self.status().is_informational() && self.status() != StatusCode::SWITCHING_PROTOCOLS
    }

    pub fn into_parts(self) -> (Response<()>, Option<String>) {
        (self.inner, self.reason)
    }
}

impl From<Response<()>> for ResponseHead {
    fn from(inner: Response<()>) -> Self {
        Self { inner, reason: None }
    }
}
