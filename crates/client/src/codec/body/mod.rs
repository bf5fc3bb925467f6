//! Payload framing for HTTP/1.1 messages.
//!
//! Decoders turn the bytes that follow a response head into [`PayloadItem`](crate::protocol::PayloadItem)s,
//! encoders do the opposite for request bodies. Three framings are supported:
//!
//! - `Content-Length` delimited ([`LengthDecoder`], [`LengthEncoder`])
//! - chunked transfer coding ([`ChunkedDecoder`], [`ChunkedEncoder`])
//! - read until the peer closes, responses only
//!
//! [`PayloadDecoder`] and [`PayloadEncoder`] pick the right one from a
//! [`PayloadSize`](crate::protocol::PayloadSize).

mod chunked_decoder;
mod chunked_encoder;
mod length_decoder;
mod length_encoder;
mod payload_decoder;
mod payload_encoder;

pub use chunked_decoder::ChunkedDecoder;
pub use chunked_encoder::ChunkedEncoder;
pub use length_decoder::LengthDecoder;
pub use length_encoder::LengthEncoder;
pub use payload_decoder::PayloadDecoder;
pub use payload_encoder::PayloadEncoder;
