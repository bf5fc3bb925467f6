//! Heads on the wire: request lines going out, status lines coming in.
//!
//! - [`HeaderEncoder`] writes a [`RequestHead`](crate::protocol::RequestHead) and the framing
//!   headers its payload needs
//! - [`HeaderDecoder`] parses a [`ResponseHead`](crate::protocol::ResponseHead) with `httparse`
//!   and works out how the body that follows is delimited

mod header_decoder;
mod header_encoder;

pub use header_decoder::HeaderDecoder;
pub use header_encoder::HeaderEncoder;
