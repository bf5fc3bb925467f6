//! Header collection shared by requests and responses.
//!
//! Names are case-insensitive and every name keeps its values in insertion order,
//! both inherited from `http::HeaderMap`. A collection can be frozen: once read-only,
//! every mutation fails with [`HttpError::UnsupportedOperation`].

use http::header::{self, GetAll, Iter};
use http::{HeaderMap, HeaderName, HeaderValue};
use mime::Mime;

use crate::ensure;
use crate::protocol::HttpError;

#[derive(Debug, Clone, Default)]
pub struct HttpHeaders {
    inner: HeaderMap,
    read_only: bool,
}

impl HttpHeaders {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wraps `headers` in a collection that rejects every mutation.
    pub fn read_only(headers: HeaderMap) -> Self {
        Self { inner: headers, read_only: true }
    }

    #[inline]
    pub fn is_read_only(&self) -> bool {
        self.read_only
    }

    /// Freezes this collection. There is no way back.
    pub fn set_read_only(&mut self) {
        self.read_only = true;
    }

    /// Appends a value to `name`, keeping the values already present.
    pub fn add<K, V>(&mut self, name: K, value: V) -> Result<(), HttpError>
    where
        HeaderName: TryFrom<K>,
        <HeaderName as TryFrom<K>>::Error: Into<http::Error>,
        HeaderValue: TryFrom<V>,
        <HeaderValue as TryFrom<V>>::Error: Into<http::Error>,
    {
        self.ensure_writable()?;
        let (name, value) = convert(name, value)?;
        self.inner.append(name, value);
        Ok(())
    }

    /// Replaces every value of `name` with `value`.
    pub fn set<K, V>(&mut self, name: K, value: V) -> Result<(), HttpError>
    where
        HeaderName: TryFrom<K>,
        <HeaderName as TryFrom<K>>::Error: Into<http::Error>,
        HeaderValue: TryFrom<V>,
        <HeaderValue as TryFrom<V>>::Error: Into<http::Error>,
    {
        self.ensure_writable()?;
        let (name, value) = convert(name, value)?;
        self.inner.insert(name, value);
        Ok(())
    }

    /// Removes every value of `name`, returning how many were dropped.
    pub fn remove(&mut self, name: &str) -> Result<usize, HttpError> {
        self.ensure_writable()?;
        let count = self.inner.get_all(name).iter().count();
        self.inner.remove(name);
        Ok(count)
    }

    /// The first value of `name`.
    pub fn get(&self, name: &str) -> Option<&HeaderValue> {
        self.inner.get(name)
    }

    /// Every value of `name`, in insertion order.
    pub fn get_all(&self, name: &str) -> GetAll<'_, HeaderValue> {
        self.inner.get_all(name)
    }

    /// Every value of `name` as text, in insertion order.
    ///
    /// Values that are not visible ASCII (`obs-text` bytes) are skipped. Use
    /// [`get_all`](Self::get_all) to see them.
    pub fn values(&self, name: &str) -> Vec<&str> {
        self.inner.get_all(name).iter().filter_map(|value| value.to_str().ok()).collect()
    }

    pub fn contains_key(&self, name: &str) -> bool {
        self.inner.contains_key(name)
    }

    pub fn iter(&self) -> Iter<'_, HeaderValue> {
        self.inner.iter()
    }

    /// Number of values, counting every value of multi-valued names.
    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    /// The declared `Content-Length`, `None` when absent or unparsable.
    pub fn content_length(&self) -> Option<u64> {
        self.inner.get(header::CONTENT_LENGTH)?.to_str().ok()?.trim().parse().ok()
    }

    pub fn set_content_length(&mut self, length: u64) -> Result<(), HttpError> {
        self.ensure_writable()?;
        self.inner.insert(header::CONTENT_LENGTH, HeaderValue::from(length));
        Ok(())
    }

    pub fn content_type(&self) -> Option<Mime> {
        self.inner.get(header::CONTENT_TYPE)?.to_str().ok()?.parse().ok()
    }

    pub fn set_content_type(&mut self, mime: &Mime) -> Result<(), HttpError> {
        self.set(header::CONTENT_TYPE, mime.as_ref())
    }

    /// True when `Transfer-Encoding` ends with `chunked`.
    pub fn is_chunked(&self) -> bool {
        is_chunked(&self.inner)
    }

    pub fn as_header_map(&self) -> &HeaderMap {
        &self.inner
    }

    pub fn into_header_map(self) -> HeaderMap {
        self.inner
    }

    fn ensure_writable(&self) -> Result<(), HttpError> {
        ensure!(!self.read_only, HttpError::unsupported_operation("headers are read-only"));
        Ok(())
    }
}

impl From<HeaderMap> for HttpHeaders {
    fn from(inner: HeaderMap) -> Self {
        Self { inner, read_only: false }
    }
}

impl<'a> IntoIterator for &'a HttpHeaders {
    type Item = (&'a HeaderName, &'a HeaderValue);
    type IntoIter = Iter<'a, HeaderValue>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// Checks the last transfer coding, see <https://www.rfc-editor.org/rfc/rfc9112.html#name-transfer-encoding>
pub(crate) fn is_chunked(headers: &HeaderMap) -> bool {
    headers
        .get_all(header::TRANSFER_ENCODING)
        .iter()
        .next_back()
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.rsplit(',').next())
        .is_some_and(|coding| coding.trim().eq_ignore_ascii_case("chunked"))
}

fn convert<K, V>(name: K, value: V) -> Result<(HeaderName, HeaderValue), HttpError>
where
    HeaderName: TryFrom<K>,
    <HeaderName as TryFrom<K>>::Error: Into<http::Error>,
    HeaderValue: TryFrom<V>,
    <HeaderValue as TryFrom<V>>::Error: Into<http::Error>,
{
    let name = HeaderName::try_from(name).map_err(|e| HttpError::invalid_header(Into::<http::Error>::into(e)))?;
    let value = HeaderValue::try_from(value).map_err(|e| HttpError::invalid_header(Into::<http::Error>::into(e)))?;
    Ok((name, value))
}
