//! Errors keyed on an HTTP status code.
//!
//! A [`StatusCodeError`] is what a caller gets when a response came back with a
//! failing status: the code, its reason phrase and whatever body the server sent,
//! together with the charset needed to read that body as text. Client and server
//! errors are told apart by [`StatusClass`] rather than by separate types.

mod charset;

pub use charset::Charset;

use std::borrow::Cow;

use bytes::Bytes;
use http::StatusCode;
use thiserror::Error;

/// The class of a status code, given by its first digit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StatusClass {
    /// 1xx
    Informational,
    /// 2xx
    Success,
    /// 3xx
    Redirection,
    /// 4xx
    ClientError,
    /// 5xx
    ServerError,
    /// 600 and above, outside of any class HTTP defines
    Unknown,
}

impl StatusClass {
    pub fn of(status: StatusCode) -> Self {
        match status.as_u16() / 100 {
            1 => StatusClass::Informational,
            2 => StatusClass::Success,
            3 => StatusClass::Redirection,
            4 => StatusClass::ClientError,
            5 => StatusClass::ServerError,
            _ => StatusClass::Unknown,
        }
    }

    #[inline]
    pub fn is_error(&self) -> bool {
        matches!(self, StatusClass::ClientError | StatusClass::ServerError)
    }
}

impl From<StatusCode> for StatusClass {
    fn from(status: StatusCode) -> Self {
        Self::of(status)
    }
}

/// The canonical reason phrase of `status`, `"Unknown Status"` when it has none.
pub fn canonical_reason(status: StatusCode) -> &'static str {
    status.canonical_reason().unwrap_or("Unknown Status")
}

/// An HTTP status code observed by the client, with the response body that came with it.
///
/// The body is never absent: a response without one, or one whose body could not
/// be read, carries an empty body. The charset defaults to ISO-8859-1, which can
/// decode any byte sequence.
#[derive(Debug, Clone, Error)]
#[error("{} {}", .status_code.as_u16(), .status_text)]
pub struct StatusCodeError {
    status_code: StatusCode,
    status_text: String,
    response_body: Bytes,
    response_charset: Charset,
}

impl StatusCodeError {
    /// Creates an error with the canonical reason phrase and an empty body.
    pub fn new(status_code: StatusCode) -> Self {
        Self::with_text(status_code, canonical_reason(status_code))
    }

    /// Creates an error with the given reason phrase and an empty body.
    pub fn with_text<S: Into<String>>(status_code: StatusCode, status_text: S) -> Self {
        Self::with_body(status_code, status_text, None::<Bytes>, None)
    }

    /// Creates an error carrying a response body.
    ///
    /// A missing body is stored as an empty one, a missing charset as ISO-8859-1.
    pub fn with_body<S, B>(status_code: StatusCode, status_text: S, response_body: Option<B>, response_charset: Option<Charset>) -> Self
    where
        S: Into<String>,
        B: Into<Bytes>,
    {
        Self {
            status_code,
            status_text: status_text.into(),
            response_body: response_body.map(Into::into).unwrap_or_default(),
            response_charset: response_charset.unwrap_or_default(),
        }
    }

    pub fn status_code(&self) -> StatusCode {
        self.status_code
    }

    pub fn status_text(&self) -> &str {
        &self.status_text
    }

    pub fn status_class(&self) -> StatusClass {
        StatusClass::of(self.status_code)
    }

    #[inline]
    pub fn is_client_error(&self) -> bool {
        self.status_class() == StatusClass::ClientError
    }

    #[inline]
    pub fn is_server_error(&self) -> bool {
        self.status_class() == StatusClass::ServerError
    }

    /// The response body exactly as captured, empty when there was none.
    pub fn body_as_bytes(&self) -> &Bytes {
        &self.response_body
    }

    /// The response body decoded with [`response_charset`](Self::response_charset).
    pub fn body_as_string(&self) -> Cow<'_, str> {
        self.response_charset.decode(&self.response_body)
    }

    pub fn response_charset(&self) -> Charset {
        self.response_charset
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_only() {
        for code in 100..600 {
            let status = StatusCode::from_u16(code).unwrap();
            let error = StatusCodeError::new(status);

            assert_eq!(error.status_code(), status);
            assert_eq!(error.status_text(), canonical_reason(status));
            assert!(error.body_as_bytes().is_empty());
            assert_eq!(error.body_as_string(), "");
            assert_eq!(error.response_charset(), Charset::ISO_8859_1);
        }
    }

    #[test]
    fn status_and_text() {
        let error = StatusCodeError::with_text(StatusCode::BAD_GATEWAY, "Upstream Down");

        assert_eq!(error.status_text(), "Upstream Down");
        assert!(error.body_as_bytes().is_empty());
        assert_eq!(error.to_string(), "502 Upstream Down");
    }

    #[test]
    fn message_format() {
        assert_eq!(StatusCodeError::new(StatusCode::NOT_FOUND).to_string(), "404 Not Found");
        assert_eq!(StatusCodeError::new(StatusCode::from_u16(599).unwrap()).to_string(), "599 Unknown Status");
    }

    #[test]
    fn missing_body_and_charset_are_normalized() {
        let error = StatusCodeError::with_body(StatusCode::BAD_REQUEST, "Bad Request", None::<Vec<u8>>, None);

        assert_eq!(error.body_as_bytes(), &Bytes::new());
        assert_eq!(error.response_charset(), Charset::ISO_8859_1);
    }

    #[test]
    fn body_decodes_like_its_charset() {
        let samples: [&[u8]; 4] = [b"plain ascii", "Grüße".as_bytes(), &[0xe9, 0x80, 0xff], &[]];
        let charsets = [Charset::ISO_8859_1, Charset::utf_8(), Charset::for_label("shift_jis").unwrap()];

        for body in samples {
            for charset in charsets {
                let error = StatusCodeError::with_body(StatusCode::CONFLICT, "Conflict", Some(body.to_vec()), Some(charset));

                assert_eq!(&error.body_as_bytes()[..], body);
                assert_eq!(error.body_as_string(), charset.decode(body));
            }
        }
    }

    #[test]
    fn default_charset_never_fails() {
        let bytes: Vec<u8> = (0..=255).collect();
        let error = StatusCodeError::with_body(StatusCode::INTERNAL_SERVER_ERROR, "boom", Some(bytes), None);

        assert_eq!(error.body_as_string().chars().count(), 256);
    }

    #[test]
    fn classes() {
        assert!(StatusCodeError::new(StatusCode::NOT_FOUND).is_client_error());
        assert!(StatusCodeError::new(StatusCode::SERVICE_UNAVAILABLE).is_server_error());
        assert_eq!(StatusCodeError::new(StatusCode::CONTINUE).status_class(), StatusClass::Informational);
        assert_eq!(StatusClass::of(StatusCode::OK), StatusClass::Success);
        assert_eq!(StatusClass::of(StatusCode::FOUND), StatusClass::Redirection);
        assert_eq!(StatusClass::of(StatusCode::from_u16(799).unwrap()), StatusClass::Unknown);
        assert!(!StatusClass::Redirection.is_error());
        assert!(StatusClass::ServerError.is_error());
    }
}
