#![deny(missing_docs)]

//! Minimal HTTP/1.x server for the loopback interface.
//!
//! A `Server` owns a listening transport and every connection accepted from it.
//! The host process drives it by calling `Server::tick` for as long as `Server::is_running`
//! returns true, each tick hands complete requests to a `Handler` and sends back its responses.

mod framing;
mod request;
mod response;
mod server;
mod vocab;

pub use olympus_mio::{Socket, SocketError, Transport};

pub use self::{
    framing::{Frame, FramingError, MessageBuffer},
    request::Request,
    response::{Response, ResponseBuilder},
    server::{Server, ServerOptions},
    vocab::{ContentType, Method, Status},
};

/// Produces the response for a request.
///
/// Called synchronously from `Server::tick`, once for every complete request.
/// Requests that failed to parse are handed over too, check `Request::is_valid`.
pub trait Handler {
    /// Build the response sent back for `request`.
    fn handle(&mut self, request: Request) -> Response;
}

impl<F> Handler for F
where
    F: FnMut(Request) -> Response,
{
    fn handle(&mut self, request: Request) -> Response {
        self(request)
    }
}

/// Answers every request with the default greeting page.
#[derive(Debug, Default, Clone, Copy)]
pub struct DefaultHandler;

impl Handler for DefaultHandler {
    fn handle(&mut self, _request: Request) -> Response {
        Response::default()
    }
}
