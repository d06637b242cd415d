use std::net::SocketAddr;

use anyhow::{Context as _, Error};
use olympus_mio::{Socket, Transport};
use tracing::{event, instrument, span, Level};
use uuid::Uuid;

use crate::{
    framing::{Frame, MessageBuffer},
    ContentType, Handler, Request, Response, Status,
};

/// Server configuration.
#[derive(Debug, Clone)]
pub struct ServerOptions {
    /// Preferred port to listen on, 0 lets the OS pick one.
    pub port: u16,
    /// How many consecutive ports to try, starting at `port`.
    pub port_attempts: u16,
    /// Largest accepted request head, in bytes.
    pub max_head_size: usize,
    /// Largest accepted request body, in bytes.
    pub max_body_size: usize,
}

impl Default for ServerOptions {
    fn default() -> Self {
        Self {
            port: 8800,
            port_attempts: 100,
            max_head_size: 64 * 1024,
            max_body_size: 8 * 1024 * 1024,
        }
    }
}

/// Single-threaded HTTP server, driven by calling `tick`.
///
/// The server is running for as long as its listening transport is open.
/// There is no other stop signal, closing the listener is how the server halts.
pub struct Server<H, T = Socket> {
    listener: T,
    handler: H,
    options: ServerOptions,
    connections: Vec<Connection<T>>,
}

struct Connection<T> {
    id: Uuid,
    transport: T,
    buffer: MessageBuffer,
    /// An interim response was already sent for the message being received.
    continued: bool,
    reap: bool,
}

impl<H> Server<H, Socket>
where
    H: Handler,
{
    /// Listen on the loopback interface.
    ///
    /// If the preferred port is taken, the following ports are tried in order.
    #[instrument("Server::bind", skip_all)]
    pub fn bind(options: ServerOptions, handler: H) -> Result<Self, Error> {
        let mut listener = Socket::default();

        let attempts = options.port_attempts.max(1);
        let last = options.port.saturating_add(attempts - 1);
        let mut port = options.port;

        loop {
            match listener.open(true, port, false) {
                Ok(()) => break,
                Err(error) if error.is_bind() && port < last => {
                    event!(Level::DEBUG, port, "port unavailable, trying next");
                    port += 1;
                }
                Err(error) => {
                    return Err(error).with_context(|| {
                        format!("failed to listen on ports {}..={}", options.port, last)
                    })
                }
            }
        }

        let addr = listener.local_addr()?;
        event!(Level::INFO, %addr, "listening");

        Ok(Self::from_listener(listener, handler, options))
    }

    /// Address the server is listening on.
    pub fn local_addr(&self) -> Result<SocketAddr, Error> {
        let addr = self
            .listener
            .local_addr()
            .context("server is not listening")?;
        Ok(addr)
    }

    /// Port the server ended up listening on.
    pub fn port(&self) -> Result<u16, Error> {
        Ok(self.local_addr()?.port())
    }
}

impl<H, T> Server<H, T>
where
    H: Handler,
    T: Transport,
{
    /// Serve connections accepted from an already listening transport.
    pub fn from_listener(listener: T, handler: H, options: ServerOptions) -> Self {
        Self {
            listener,
            handler,
            options,
            connections: Vec::new(),
        }
    }

    /// Returns true while the listener is open and listening.
    pub fn is_running(&self) -> bool {
        self.listener.is_open() && self.listener.is_listening()
    }

    /// Number of connections currently tracked, including ones not reaped yet.
    pub fn connection_count(&self) -> usize {
        self.connections.len()
    }

    /// Tick until the server stops running.
    pub fn run(&mut self) -> Result<(), Error> {
        while self.is_running() {
            self.tick()?;
        }

        Ok(())
    }

    /// Run one accept and serve pass.
    ///
    /// Accepts at most one new connection, and handles at most one message per connection.
    /// Connections found closed are removed at the end of the pass.
    pub fn tick(&mut self) -> Result<(), Error> {
        if !self.listener.is_open() {
            return Ok(());
        }

        self.accept()?;

        for connection in &mut self.connections {
            if !connection.transport.is_open() {
                connection.reap = true;
                continue;
            }

            let span = span!(Level::INFO, "connection", id = %connection.id);
            let _entered = span.enter();

            connection.serve(&mut self.handler)?;
        }

        self.connections.retain(|connection| !connection.reap);

        Ok(())
    }

    /// Close every connection and the listener, after which the server stops running.
    pub fn close(&mut self) -> Result<(), Error> {
        event!(Level::DEBUG, "closing");

        for connection in &mut self.connections {
            connection
                .transport
                .close()
                .context("failed to close connection")?;
        }
        self.connections.clear();

        self.listener
            .close()
            .context("failed to close listener")?;

        Ok(())
    }

    fn accept(&mut self) -> Result<(), Error> {
        let mut transport = T::default();
        if !self.listener.accept(&mut transport, false)? {
            return Ok(());
        }

        let connection = Connection {
            id: Uuid::new_v4(),
            transport,
            buffer: MessageBuffer::new(self.options.max_head_size, self.options.max_body_size),
            continued: false,
            reap: false,
        };
        event!(Level::DEBUG, id = %connection.id, "connection opened");

        self.connections.push(connection);

        Ok(())
    }
}

impl<T> Connection<T>
where
    T: Transport,
{
    fn serve<H>(&mut self, handler: &mut H) -> Result<(), Error>
    where
        H: Handler,
    {
        // Messages already buffered are served before anything new is received, a peer that
        // stopped sending may still have requests waiting
        let mut frame = self.buffer.next_frame();

        if let Ok(Frame::Pending) = frame {
            let data = self.transport.receive()?;

            // Nothing new, or the peer went away while receiving
            if data.is_empty() || !self.transport.is_open() {
                return Ok(());
            }

            self.buffer.extend(&data);
            frame = self.buffer.next_frame();
        }

        let frame = match frame {
            Ok(frame) => frame,
            Err(error) => {
                event!(Level::WARN, %error, "rejecting message");
                return self.reject();
            }
        };

        match frame {
            Frame::Pending => {}
            Frame::Head(head) => {
                let request = Request::parse(&head);
                if request.expects_continue() {
                    self.send_continue()?;
                }
            }
            Frame::Message(message) => {
                let request = Request::parse(&message);
                if request.expects_continue() && !self.continued {
                    self.send_continue()?;
                }
                self.continued = false;

                self.dispatch(handler, request)?;
            }
        }

        Ok(())
    }

    fn dispatch<H>(&mut self, handler: &mut H, request: Request) -> Result<(), Error>
    where
        H: Handler,
    {
        event!(
            Level::DEBUG,
            method = %request.method(),
            path = request.path(),
            "handling request"
        );

        let response = handler.handle(request);

        // Sending the interim response may have found the peer gone
        if !self.transport.is_open() {
            return Ok(());
        }

        let sent = self.send(response.as_bytes())?;
        if !sent {
            event!(Level::WARN, status = %response.status(), "response not fully sent");
        }

        Ok(())
    }

    fn send_continue(&mut self) -> Result<(), Error> {
        event!(Level::DEBUG, "sending continue");

        let response = Response::from_status(Status::Continue);
        self.send(response.as_bytes())?;
        self.continued = true;

        Ok(())
    }

    /// Answer a message that can't be framed, and drop the connection.
    fn reject(&mut self) -> Result<(), Error> {
        let response = Response::new(
            "<html><heading>Bad Request</heading></html>",
            ContentType::Html,
            Status::BadRequest,
        );
        self.send(response.as_bytes())?;
        self.transport.close()?;

        Ok(())
    }

    fn send(&mut self, data: &[u8]) -> Result<bool, Error> {
        match self.transport.send(data) {
            // Fatal for the socket, but one lost peer must not stop the others being served
            Err(error) if error.is_disconnect() => {
                event!(Level::DEBUG, %error, "peer disconnected before response");
                self.transport.close()?;
                Ok(false)
            }
            result => Ok(result?),
        }
    }
}
