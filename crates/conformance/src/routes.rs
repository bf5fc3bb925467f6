use bytes::Bytes;
use http::{HeaderMap, Method, Response, StatusCode, header};
use matchit::{InsertError, Router};
use micro_client::protocol::RequestHead;
use tracing::{debug, warn};

use crate::server::ServerState;

#[derive(Debug, Clone, Copy)]
enum Route {
    Echo,
    Fixed(StatusCode),
    Status,
    Methods,
}

/// The fixed route table of the reference server.
#[derive(Debug)]
pub(crate) struct Routes {
    router: Router<Route>,
}

impl Routes {
    pub(crate) fn new() -> Result<Self, InsertError> {
        let mut router = Router::new();
        router.insert("/echo", Route::Echo)?;
        router.insert("/status/ok", Route::Fixed(StatusCode::OK))?;
        router.insert("/status/notfound", Route::Fixed(StatusCode::NOT_FOUND))?;
        router.insert("/status/{code}", Route::Status)?;
        router.insert("/methods/{verb}", Route::Methods)?;
        Ok(Self { router })
    }

    pub(crate) fn respond(&self, head: &RequestHead, body: Bytes, state: &ServerState) -> Response<Bytes> {
        let Ok(matched) = self.router.at(head.uri().path()) else {
            return empty(StatusCode::NOT_FOUND);
        };

        match *matched.value {
            Route::Echo => echo(head.headers(), body),
            Route::Fixed(status) => empty(status),
            Route::Status => matched
                .params
                .get("code")
                .and_then(|code| code.parse::<u16>().ok())
                .and_then(|code| StatusCode::from_u16(code).ok())
                .map_or_else(|| empty(StatusCode::BAD_REQUEST), empty),
            Route::Methods => {
                let verb = matched.params.get("verb").unwrap_or_default();
                methods(head, verb, &body, state)
            }
        }
    }
}

fn empty(status: StatusCode) -> Response<Bytes> {
    let mut response = Response::new(Bytes::new());
    *response.status_mut() = status;
    response
}

fn echo(headers: &HeaderMap, body: Bytes) -> Response<Bytes> {
    let mut response = Response::new(body);
    for (name, value) in headers {
        if name == header::CONTENT_LENGTH || name == header::TRANSFER_ENCODING || name == header::CONNECTION {
            continue;
        }
        response.headers_mut().append(name, value.clone());
    }
    response
}

fn methods(head: &RequestHead, verb: &str, body: &Bytes, state: &ServerState) -> Response<Bytes> {
    if !head.method().as_str().eq_ignore_ascii_case(verb) {
        warn!(method = %head.method(), verb, "method does not match the route");
        return empty(StatusCode::INTERNAL_SERVER_ERROR);
    }

    if head.method() == Method::POST {
        state.record_post(body.len());
        let declared = head.headers().get(header::CONTENT_LENGTH).and_then(|v| v.to_str().ok()?.parse::<usize>().ok());
        if let Some(declared) = declared
            && declared != body.len()
        {
            warn!(declared, received = body.len(), "post body does not match its content-length");
            return empty(StatusCode::INTERNAL_SERVER_ERROR);
        }
        debug!(received = body.len(), "recorded post body");
    }

    empty(StatusCode::OK)
}
