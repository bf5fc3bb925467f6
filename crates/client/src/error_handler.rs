//! Turning failing responses into [`StatusCodeError`]s.

use async_trait::async_trait;
use http::StatusCode;
use tracing::{debug, warn};

use crate::client::{ClientHttpResponse, read_body};
use crate::protocol::HttpError;
use crate::status::{Charset, StatusClass, StatusCodeError};

/// Decides which responses are errors and what error they become.
#[async_trait]
pub trait ResponseErrorHandler: Send + Sync {
    fn has_error(&self, status: StatusCode) -> bool;

    /// Inspects `response` and fails with the error it stands for. Responses that
    /// are not errors pass through as `Ok(())`.
    async fn handle_error<R>(&self, response: &mut R) -> Result<(), HttpError>
    where
        R: ClientHttpResponse + ?Sized;
}

/// Treats every 4xx and 5xx response as an error.
///
/// The error carries the response body, and the charset named by `Content-Type`
/// when there is one. A body that can't be read is reported as empty, the status
/// is what matters.
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultResponseErrorHandler;

#[async_trait]
impl ResponseErrorHandler for DefaultResponseErrorHandler {
    fn has_error(&self, status: StatusCode) -> bool {
        StatusClass::of(status).is_error()
    }

    async fn handle_error<R>(&self, response: &mut R) -> Result<(), HttpError>
    where
        R: ClientHttpResponse + ?Sized,
    {
        let status = response.status_code();
        if !self.has_error(status) {
            return Ok(());
        }

        let body = match read_body(response).await {
            Ok(body) => Some(body),
            Err(e) => {
                warn!(cause = %e, %status, "can't read error response body");
                None
            }
        };
        let charset = response.headers().content_type().as_ref().and_then(Charset::from_mime);
        debug!(%status, charset = ?charset, "response is an error");

        Err(StatusCodeError::with_body(status, response.status_text(), body, charset).into())
    }
}

#[cfg(test)]
mod tests {
    use bytes::Bytes;
    use http::HeaderMap;
    use http_body::Body;

    use super::*;
    use crate::protocol::{HttpHeaders, OnceBody};

    #[derive(Debug)]
    struct CannedResponse {
        status: StatusCode,
        headers: HttpHeaders,
        body: Option<OnceBody>,
    }

    impl CannedResponse {
        fn new(status: StatusCode, content_type: Option<&'static str>, body: &'static [u8]) -> Self {
            let mut headers = HeaderMap::new();
            if let Some(content_type) = content_type {
                headers.insert(http::header::CONTENT_TYPE, content_type.parse().unwrap());
            }
            Self { status, headers: HttpHeaders::read_only(headers), body: Some(OnceBody::new(Bytes::from_static(body))) }
        }
    }

    impl ClientHttpResponse for CannedResponse {
        type Body = OnceBody;

        fn status_code(&self) -> StatusCode {
            self.status
        }

        fn status_text(&self) -> &str {
            crate::status::canonical_reason(self.status)
        }

        fn headers(&self) -> &HttpHeaders {
            &self.headers
        }

        fn body(&mut self) -> Result<&mut OnceBody, HttpError> {
            self.body.as_mut().ok_or_else(|| HttpError::illegal_state("closed"))
        }

        fn close(&mut self) {
            self.body = None;
        }
    }

    #[test]
    fn error_classes() {
        let handler = DefaultResponseErrorHandler;
        assert!(handler.has_error(StatusCode::NOT_FOUND));
        assert!(handler.has_error(StatusCode::BAD_GATEWAY));
        assert!(!handler.has_error(StatusCode::OK));
        assert!(!handler.has_error(StatusCode::MOVED_PERMANENTLY));
        assert!(!handler.has_error(StatusCode::CONTINUE));
    }

    #[tokio::test]
    async fn client_error_with_charset() {
        let mut response = CannedResponse::new(StatusCode::NOT_FOUND, Some("text/plain;charset=UTF-8"), "no such thing ✗".as_bytes());

        let error = DefaultResponseErrorHandler.handle_error(&mut response).await.unwrap_err();
        let status = error.as_status().unwrap();

        assert!(status.is_client_error());
        assert_eq!(status.status_code(), StatusCode::NOT_FOUND);
        assert_eq!(status.status_text(), "Not Found");
        assert_eq!(status.response_charset(), Charset::utf_8());
        assert_eq!(status.body_as_string(), "no such thing ✗");
        assert_eq!(error.to_string(), "404 Not Found");
    }

    #[tokio::test]
    async fn server_error_defaults_to_latin1() {
        let mut response = CannedResponse::new(StatusCode::INTERNAL_SERVER_ERROR, None, &[0x62, 0x6f, 0x6f, 0x6d, 0xa1]);

        let error = DefaultResponseErrorHandler.handle_error(&mut response).await.unwrap_err();
        let status = error.as_status().unwrap();

        assert!(status.is_server_error());
        assert_eq!(status.response_charset(), Charset::ISO_8859_1);
        assert_eq!(status.body_as_string(), "boom\u{a1}");
    }

    #[tokio::test]
    async fn unreadable_body_is_empty() {
        let mut response = CannedResponse::new(StatusCode::SERVICE_UNAVAILABLE, None, b"gone");
        response.close();

        let error = DefaultResponseErrorHandler.handle_error(&mut response).await.unwrap_err();
        assert!(error.as_status().unwrap().body_as_bytes().is_empty());
    }

    #[tokio::test]
    async fn success_passes_through() {
        let mut response = CannedResponse::new(StatusCode::OK, None, b"fine");

        DefaultResponseErrorHandler.handle_error(&mut response).await.unwrap();
        assert_eq!(response.body().unwrap().size_hint().exact(), Some(4));
    }
}
