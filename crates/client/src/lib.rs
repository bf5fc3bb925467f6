//! An asynchronous micro HTTP client contract
//!
//! The crate separates *what* a client request is from *how* it gets to the server.
//! Callers talk to three traits:
//!
//! - [`ClientHttpRequestFactory`](client::ClientHttpRequestFactory): turns a URI and a method into a request
//! - [`ClientHttpRequest`](client::ClientHttpRequest): collects headers and a body, then executes exactly once
//! - [`ClientHttpResponse`](client::ClientHttpResponse): exposes status, headers and a body stream until closed
//!
//! Any transport can sit behind them. Two ship with the crate:
//!
//! - [`SimpleClientHttpRequestFactory`](client::SimpleClientHttpRequestFactory): one tokio TCP
//!   connection per request, HTTP/1.1 framed by the codecs in [`codec`]
//! - [`BufferingClientHttpRequestFactory`](client::BufferingClientHttpRequestFactory): wraps any
//!   other factory and keeps response bodies in memory so they can be read more than once
//!
//! Failing status codes become [`StatusCodeError`](status::StatusCodeError)s through a
//! [`ResponseErrorHandler`](error_handler::ResponseErrorHandler).
//!
//! # Example
//!
//! ```no_run
//! use http::Method;
//! use micro_client::client::{ClientHttpRequest, ClientHttpRequestFactory, ClientHttpResponse, SimpleClientHttpRequestFactory, read_body};
//! use micro_client::protocol::HttpError;
//!
//! # async fn run() -> Result<(), HttpError> {
//! let factory = SimpleClientHttpRequestFactory::default();
//! let mut request = factory.create_request("http://127.0.0.1:8080/echo".parse().unwrap(), Method::PUT)?;
//! request.headers_mut().add("MyHeader", "value1")?;
//! request.body()?.extend_from_slice(b"Hello World");
//!
//! let mut response = request.execute().await?;
//! println!("{} {}", response.status_code(), response.status_text());
//! let body = read_body(&mut response).await?;
//! response.close();
//! # let _ = body;
//! # Ok(())
//! # }
//! ```
//!
//! # Architecture
//!
//! - [`client`]: the request/response contract and its transports
//! - [`codec`]: HTTP/1.1 request encoding and response decoding
//! - [`protocol`]: heads, headers, bodies and errors
//! - [`status`]: status code errors and charsets
//! - [`error_handler`]: mapping error responses to status code errors

pub mod client;
pub mod codec;
pub mod error_handler;
pub mod protocol;
pub mod status;

mod utils;
pub(crate) use utils::ensure;
