//! Core HTTP protocol types shared by the codecs, the transports and the client contract.
//!
//! - **Message Handling** ([`message`]): [`Message`], [`PayloadItem`] and [`PayloadSize`]
//!   describe what flows through the codecs
//! - **Heads** ([`request`], [`response`]): [`RequestHead`] going out, [`ResponseHead`] coming in
//! - **Headers** ([`headers`]): [`HttpHeaders`], the freezable header collection
//! - **Body Streaming** ([`body`]): [`ResBody`] and [`OnceBody`]
//! - **Error Handling** ([`error`]): [`HttpError`], [`ParseError`] and [`SendError`]

mod message;
pub use message::Message;
pub use message::PayloadItem;
pub use message::PayloadSize;

mod request;
pub use request::RequestHead;

mod response;
pub use response::ResponseHead;

mod headers;
pub use headers::HttpHeaders;
pub(crate) use headers::is_chunked;

mod error;
pub use error::HttpError;
pub use error::ParseError;
pub use error::SendError;

mod body;
pub use body::OnceBody;
pub use body::ResBody;
