use bytes::{Buf, Bytes};

/// What flows through the codecs: a message head, then pieces of its payload.
///
/// `T` is the head (a request head going out, a response head coming in) and
/// `Data` the payload chunk type.
pub enum Message<T, Data: Buf = Bytes> {
    Header(T),
    Payload(PayloadItem<Data>),
}

impl<T, Data: Buf> Message<T, Data> {
    #[inline]
    pub fn is_header(&self) -> bool {
        matches!(self, Message::Header(_))
    }

    /// The head, if this message is one.
    pub fn into_header(self) -> Option<T> {
        match self {
            Message::Header(head) => Some(head),
            Message::Payload(_) => None,
        }
    }
}

impl<T> From<Bytes> for Message<T> {
    fn from(bytes: Bytes) -> Self {
        Self::Payload(PayloadItem::Chunk(bytes))
    }
}

/// One step of a payload stream, which always ends with [`PayloadItem::Eof`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PayloadItem<Data: Buf = Bytes> {
    Chunk(Data),
    Eof,
}

impl<Data: Buf> PayloadItem<Data> {
    #[inline]
    pub fn is_eof(&self) -> bool {
        matches!(self, PayloadItem::Eof)
    }

    #[inline]
    pub fn is_chunk(&self) -> bool {
        matches!(self, PayloadItem::Chunk(_))
    }

    pub fn as_bytes(&self) -> Option<&Data> {
        match self {
            PayloadItem::Chunk(data) => Some(data),
            PayloadItem::Eof => None,
        }
    }
}

/// How a payload is delimited on the wire.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum PayloadSize {
    /// `Content-Length` bytes.
    Length(u64),
    /// Chunked transfer coding.
    Chunked,
    /// Everything until the peer closes the connection. Responses only.
    UntilClose,
    /// No payload at all.
    Empty,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bytes_become_a_payload_chunk() {
        let message = Message::<()>::from(Bytes::from_static(b"Hello"));

        assert!(!message.is_header());
        let Message::Payload(item) = message else {
            panic!("expected a payload");
        };
        assert!(item.is_chunk());
        assert_eq!(&item.as_bytes().unwrap()[..], b"Hello");
    }
}
