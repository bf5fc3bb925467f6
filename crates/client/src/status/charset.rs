use std::borrow::Cow;
use std::fmt;

use encoding_rs::Encoding;
use mime::Mime;

/// A character set used to turn response bytes into text.
///
/// Backed by `encoding_rs`, except for ISO-8859-1: the WHATWG registry that
/// `encoding_rs` follows maps that label to windows-1252, which decodes bytes
/// 0x80..=0x9F differently. ISO-8859-1 is kept exact here, every byte maps to the
/// code point of the same value.
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct Charset {
    kind: Kind,
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum Kind {
    Latin1,
    Encoding(&'static Encoding),
}

const LATIN1_LABELS: [&str; 7] = ["iso-8859-1", "iso8859-1", "iso_8859-1", "iso_8859-1:1987", "latin1", "l1", "cp819"];

impl Charset {
    pub const ISO_8859_1: Charset = Charset { kind: Kind::Latin1 };

    pub fn utf_8() -> Self {
        Self::from_encoding(encoding_rs::UTF_8)
    }

    pub fn from_encoding(encoding: &'static Encoding) -> Self {
        Self { kind: Kind::Encoding(encoding) }
    }

    /// Looks up a charset by label, ignoring ASCII case and surrounding whitespace.
    pub fn for_label(label: &str) -> Option<Self> {
        let label = label.trim();
        if LATIN1_LABELS.iter().any(|latin1| latin1.eq_ignore_ascii_case(label)) {
            return Some(Self::ISO_8859_1);
        }
        Encoding::for_label(label.as_bytes()).map(Self::from_encoding)
    }

    /// The charset named by the `charset` parameter of a `Content-Type` value.
    pub fn from_content_type(content_type: &str) -> Option<Self> {
        let media_type: Mime = content_type.parse().ok()?;
        Self::from_mime(&media_type)
    }

    pub fn from_mime(media_type: &Mime) -> Option<Self> {
        media_type.get_param(mime::CHARSET).and_then(|charset| Self::for_label(charset.as_str()))
    }

    pub fn name(&self) -> &'static str {
        match self.kind {
            Kind::Latin1 => "ISO-8859-1",
            Kind::Encoding(encoding) => encoding.name(),
        }
    }

    /// Decodes `bytes`. Malformed sequences become U+FFFD, decoding never fails.
    pub fn decode<'a>(&self, bytes: &'a [u8]) -> Cow<'a, str> {
        match self.kind {
            Kind::Latin1 => encoding_rs::mem::decode_latin1(bytes),
            Kind::Encoding(encoding) => encoding.decode_without_bom_handling(bytes).0,
        }
    }
}

impl Default for Charset {
    fn default() -> Self {
        Self::ISO_8859_1
    }
}

impl fmt::Debug for Charset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Charset").field(&self.name()).finish()
    }
}

impl fmt::Display for Charset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_is_latin1() {
        assert_eq!(Charset::default(), Charset::ISO_8859_1);
        assert_eq!(Charset::default().name(), "ISO-8859-1");
    }

    #[test]
    fn latin1_maps_every_byte() {
        let bytes: Vec<u8> = (0..=255).collect();
        let text = Charset::ISO_8859_1.decode(&bytes);

        let code_points: Vec<u32> = text.chars().map(u32::from).collect();
        let expected: Vec<u32> = (0..=255).collect();
        assert_eq!(code_points, expected);
    }

    #[test]
    fn latin1_labels() {
        for label in ["ISO-8859-1", "latin1", " iso_8859-1 ", "L1"] {
            assert_eq!(Charset::for_label(label), Some(Charset::ISO_8859_1), "label {label}");
        }
        assert_eq!(Charset::for_label("windows-1252").unwrap().name(), "windows-1252");
    }

    #[test]
    fn utf8() {
        let charset = Charset::for_label("utf-8").unwrap();
        assert_eq!(charset, Charset::utf_8());
        assert_eq!(charset.decode("Grüße".as_bytes()), "Grüße");
        assert_eq!(charset.decode(&[0x48, 0xff, 0x49]), "H\u{fffd}I");
    }

    #[test]
    fn unknown_label() {
        assert_eq!(Charset::for_label("no-such-charset"), None);
    }

    #[test]
    fn from_content_type() {
        assert_eq!(Charset::from_content_type("text/plain; charset=UTF-8"), Some(Charset::utf_8()));
        assert_eq!(Charset::from_content_type("text/html;charset=iso-8859-1"), Some(Charset::ISO_8859_1));
        assert_eq!(Charset::from_content_type("application/json"), None);
        assert_eq!(Charset::from_content_type("not a mime"), None);
    }
}
