mod mock;

use std::{cell::RefCell, rc::Rc};

use olympus_http::{ContentType, Handler, Request, Response, Server, ServerOptions, Status};

pub use self::mock::MockTransport;

pub type Requests = Rc<RefCell<Vec<Request>>>;

pub fn given_server<H>(handler: H) -> (Server<H, MockTransport>, MockTransport)
where
    H: Handler,
{
    given_server_with(handler, ServerOptions::default())
}

pub fn given_server_with<H>(
    handler: H,
    options: ServerOptions,
) -> (Server<H, MockTransport>, MockTransport)
where
    H: Handler,
{
    let listener = MockTransport::listener();
    let server = Server::from_listener(listener.clone(), handler, options);

    (server, listener)
}

/// Queue a new connection on the listener, returning the peer's view of it.
pub fn given_connection(listener: &MockTransport) -> MockTransport {
    let connection = MockTransport::connection();
    listener.queue(connection.clone());
    connection
}

/// Handler that records requests, answering 400 to invalid ones and "ok" otherwise.
pub fn given_recording_handler() -> (impl Handler, Requests) {
    let requests = Requests::default();
    let recorded = requests.clone();

    let handler = move |request: Request| {
        let status = if request.is_valid() {
            Status::Ok
        } else {
            Status::BadRequest
        };
        recorded.borrow_mut().push(request);

        Response::new("ok", ContentType::Html, status)
    };

    (handler, requests)
}

pub fn then_sent_statuses(connection: &MockTransport, expected: &[&str]) {
    let lines: Vec<String> = connection
        .sent()
        .iter()
        .map(|data| {
            let text = String::from_utf8_lossy(data);
            text.lines().next().unwrap_or_default().to_string()
        })
        .collect();

    assert_eq!(lines, expected);
}
