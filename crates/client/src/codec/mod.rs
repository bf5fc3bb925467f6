//! HTTP/1.1 codecs for the client side of a connection.
//!
//! - [`RequestEncoder`]: writes a request head followed by its payload
//! - [`ResponseDecoder`]: reads a response head followed by its payload
//!
//! Both work on [`Message`](crate::protocol::Message)s and plug into
//! `tokio_util::codec::{FramedWrite, FramedRead}`. Payload framing lives in [`body`],
//! head serialization in [`header`].

pub mod body;
pub mod header;
mod request_encoder;
mod response_decoder;

pub use body::{PayloadDecoder, PayloadEncoder};
pub use request_encoder::RequestEncoder;
pub use response_decoder::ResponseDecoder;
