//! Response body streams.
//!
//! - [`ResBody`]: one-shot, forward-only body read straight off the connection
//! - [`OnceBody`]: body that was already read into memory
//!
//! Both implement `http_body::Body` with `Bytes` frames, so callers can use
//! `http_body_util::BodyExt` to consume them.

use std::pin::Pin;
use std::task::{Context, Poll, ready};

use bytes::Bytes;
use futures::StreamExt;
use http_body::{Body, Frame, SizeHint};
use tokio::io::AsyncRead;
use tokio_util::codec::FramedRead;
use tracing::{error, trace};

use crate::codec::ResponseDecoder;
use crate::protocol::{HttpError, Message, ParseError, PayloadItem};

/// ResBody streams the payload of a response from the underlying connection.
///
/// The body owns the read half of the connection: releasing the body releases the
/// connection. Reading after the end of the payload keeps returning `None`, reading
/// after release fails with an illegal state error.
#[derive(Debug)]
pub struct ResBody<R> {
    framed: Option<FramedRead<R, ResponseDecoder>>,
    eof: bool,
}

impl<R> ResBody<R> {
    pub(crate) fn new(framed: FramedRead<R, ResponseDecoder>) -> Self {
        Self { framed: Some(framed), eof: false }
    }

    /// Drops the underlying reader. Safe to call more than once.
    pub fn release(&mut self) {
        if self.framed.take().is_some() {
            trace!(eof = self.eof, "released response body");
        }
    }

    #[inline]
    pub fn is_released(&self) -> bool {
        self.framed.is_none()
    }
}

impl<R> Body for ResBody<R>
where
    R: AsyncRead + Unpin,
{
    type Data = Bytes;
    type Error = HttpError;

    fn poll_frame(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Result<Frame<Self::Data>, Self::Error>>> {
        let this = self.get_mut();
        if this.eof {
            return Poll::Ready(None);
        }

        let Some(framed) = this.framed.as_mut() else {
            return Poll::Ready(Some(Err(HttpError::illegal_state("response body has been released"))));
        };

        match ready!(framed.poll_next_unpin(cx)) {
            Some(Ok(Message::Payload(PayloadItem::Chunk(bytes)))) => Poll::Ready(Some(Ok(Frame::data(bytes)))),
            Some(Ok(Message::Payload(PayloadItem::Eof))) => {
                this.eof = true;
                Poll::Ready(None)
            }
            Some(Ok(Message::Header(_))) => {
                error!("received response header while reading body");
                this.eof = true;
                Poll::Ready(Some(Err(ParseError::invalid_body("received header while reading body").into())))
            }
            Some(Err(e)) => {
                this.eof = true;
                Poll::Ready(Some(Err(e.into())))
            }
            None => {
                this.eof = true;
                Poll::Ready(Some(Err(ParseError::invalid_body("connection closed before body completed").into())))
            }
        }
    }

    fn is_end_stream(&self) -> bool {
        self.eof
    }
}

/// A body held in memory, readable once per instance.
#[derive(Debug, Clone, Default)]
pub struct OnceBody {
    bytes: Option<Bytes>,
}

impl OnceBody {
    pub fn new(bytes: Bytes) -> Self {
        if bytes.is_empty() { Self::empty() } else { Self { bytes: Some(bytes) } }
    }

    pub fn empty() -> Self {
        Self { bytes: None }
    }
}

impl Body for OnceBody {
    type Data = Bytes;
    type Error = HttpError;

    fn poll_frame(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<Option<Result<Frame<Self::Data>, Self::Error>>> {
        Poll::Ready(self.get_mut().bytes.take().map(|bytes| Ok(Frame::data(bytes))))
    }

    fn is_end_stream(&self) -> bool {
        self.bytes.is_none()
    }

    fn size_hint(&self) -> SizeHint {
        match &self.bytes {
            None => SizeHint::with_exact(0),
            Some(bytes) => SizeHint::with_exact(bytes.len() as u64),
        }
    }
}
