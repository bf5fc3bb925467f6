//! The embedded reference server.

use std::io;
use std::net::{Ipv4Addr, SocketAddr};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use bytes::{Bytes, BytesMut};
use futures::{SinkExt, StreamExt};
use http::{Response, StatusCode, Uri};
use micro_client::client::DEFAULT_READ_BUFFER_SIZE;
use micro_client::protocol::{HttpError, Message, ParseError, PayloadItem};
use tokio::net::{TcpListener, TcpStream};
use tokio::task::JoinHandle;
use tokio_util::codec::{FramedRead, FramedWrite};
use tracing::{error, info, warn};

use crate::codec::{RequestDecoder, ResponseEncoder};
use crate::routes::Routes;

/// What the server has observed, shared with the connection tasks.
#[derive(Debug, Default)]
pub(crate) struct ServerState {
    requests: AtomicUsize,
    post_lengths: Mutex<Vec<usize>>,
}

impl ServerState {
    pub(crate) fn record_post(&self, length: usize) {
        self.post_lengths.lock().unwrap_or_else(PoisonError::into_inner).push(length);
    }

    pub(crate) fn post_lengths(&self) -> Vec<usize> {
        self.post_lengths.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }
}

/// An HTTP/1.1 server on a random loopback port, answering one request per
/// connection.
///
/// Routes:
///
/// - `/echo` answers 200 with the request headers and body
/// - `/status/ok`, `/status/notfound` and `/status/{code}` answer that status
/// - `/methods/{verb}` answers 200 when the request method is `verb`, 500 otherwise
///
/// Anything else is a 404. The server stops when dropped.
#[derive(Debug)]
pub struct ReferenceServer {
    addr: SocketAddr,
    state: Arc<ServerState>,
    task: JoinHandle<()>,
}

impl ReferenceServer {
    /// Binds `127.0.0.1:0` and starts accepting connections.
    pub async fn start() -> io::Result<Self> {
        let routes = Arc::new(Routes::new().map_err(io::Error::other)?);
        let listener = TcpListener::bind((Ipv4Addr::LOCALHOST, 0)).await?;
        let addr = listener.local_addr()?;
        let state = Arc::new(ServerState::default());

        info!(%addr, "reference server listening");
        let task = tokio::spawn(accept_loop(listener, routes, Arc::clone(&state)));
        Ok(Self { addr, state, task })
    }

    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    /// The absolute URI of `path` on this server.
    pub fn url(&self, path: &str) -> Result<Uri, HttpError> {
        format!("http://{}{path}", self.addr).parse::<Uri>().map_err(HttpError::invalid_uri)
    }

    /// How many requests have been answered so far.
    pub fn request_count(&self) -> usize {
        self.state.requests.load(Ordering::SeqCst)
    }

    /// The body sizes received by `/methods/post`, in arrival order.
    pub fn post_lengths(&self) -> Vec<usize> {
        self.state.post_lengths()
    }
}

impl Drop for ReferenceServer {
    fn drop(&mut self) {
        self.task.abort();
    }
}

async fn accept_loop(listener: TcpListener, routes: Arc<Routes>, state: Arc<ServerState>) {
    loop {
        let (stream, remote_addr) = match listener.accept().await {
            Ok(accepted) => accepted,
            Err(e) => {
                warn!(cause = %e, "failed to accept");
                continue;
            }
        };

        let routes = Arc::clone(&routes);
        let state = Arc::clone(&state);
        tokio::spawn(async move {
            if let Err(e) = serve(stream, &routes, &state).await {
                error!(%remote_addr, cause = %e, "failed to serve connection");
            }
        });
    }
}

async fn serve(stream: TcpStream, routes: &Routes, state: &ServerState) -> Result<(), HttpError> {
    let (reader, writer) = stream.into_split();
    let mut framed_read = FramedRead::with_capacity(reader, RequestDecoder::default(), DEFAULT_READ_BUFFER_SIZE);
    let mut framed_write = FramedWrite::new(writer, ResponseEncoder);

    let head = match framed_read.next().await {
        Some(Ok(Message::Header(head))) => head,
        Some(Ok(Message::Payload(_))) => return Err(ParseError::invalid_body("payload before request head").into()),
        Some(Err(e)) => {
            framed_write.send(bad_request()).await?;
            return Err(e.into());
        }
        None => return Ok(()),
    };

    let mut body = BytesMut::new();
    while let Some(message) = framed_read.next().await {
        match message? {
            Message::Payload(PayloadItem::Chunk(bytes)) => body.extend_from_slice(&bytes),
            Message::Payload(PayloadItem::Eof) => break,
            Message::Header(_) => return Err(ParseError::invalid_header("second request head on one connection").into()),
        }
    }

    state.requests.fetch_add(1, Ordering::SeqCst);
    let response = routes.respond(&head, body.freeze(), state);
    info!(method = %head.method(), uri = %head.uri(), status = %response.status(), "answered request");

    framed_write.send(response).await?;
    Ok(())
}

fn bad_request() -> Response<Bytes> {
    let mut response = Response::default();
    *response.status_mut() = StatusCode::BAD_REQUEST;
    response
}
