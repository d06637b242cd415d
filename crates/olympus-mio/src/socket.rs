use std::{
    io::{self, ErrorKind, Read, Write},
    net::{Ipv4Addr, Shutdown, SocketAddr},
    time::Duration,
};

use bytes::Bytes;
use mio::{
    event::Source as _,
    net::{TcpListener, TcpStream},
    Events, Interest, Poll, Registry, Token,
};
use tracing::{event, instrument, Level};

use crate::{error::is_disconnect_kind, SocketError};

const RECEIVE_BUFFER_SIZE: usize = 64 * 1024;
const PROBE_TIMEOUT: Duration = Duration::from_millis(100);
const SOCKET: Token = Token(0);

/// TCP socket bound to the loopback interface.
///
/// A socket starts out closed, and becomes open through `open` or `accept`.
/// Open implies the OS handle is valid, closing invalidates it exactly once.
///
/// Receiving never fails because of the peer, errors caused by the remote side close the socket
/// and return no data.
/// Misuse, like accepting on a socket that isn't listening, is reported as a `SocketError`.
#[derive(Default)]
pub struct Socket {
    handle: Option<Handle>,
    blocking: bool,
    listening: bool,
}

impl Socket {
    /// Open the socket on the loopback address at `port`.
    ///
    /// With `listen` the socket binds and listens for incoming connections, otherwise it
    /// connects to a listener on that port.
    /// A `port` of 0 binds to a port picked by the OS.
    #[instrument("Socket::open", skip_all)]
    pub fn open(&mut self, listen: bool, port: u16, blocking: bool) -> Result<(), SocketError> {
        if self.is_open() {
            return Err(SocketError::AlreadyOpen);
        }

        let addr = SocketAddr::from((Ipv4Addr::LOCALHOST, port));

        let source = if listen {
            let listener =
                TcpListener::bind(addr).map_err(|source| SocketError::Bind { addr, source })?;
            Source::Listener(listener)
        } else {
            let stream =
                TcpStream::connect(addr).map_err(|source| SocketError::Connect { addr, source })?;
            Source::Stream(stream)
        };

        let mut handle = Handle::new(source).map_err(SocketError::Create)?;

        // A blocking client doesn't return until the connection is established
        if blocking && !listen {
            handle
                .wait(Interest::WRITABLE, None)
                .map_err(SocketError::Wait)?;

            if let Some(source) = handle.take_error().map_err(SocketError::Wait)? {
                return Err(SocketError::Connect { addr, source });
            }
        }

        event!(Level::DEBUG, %addr, listen, blocking, "socket opened");

        self.handle = Some(handle);
        self.blocking = blocking;
        self.listening = listen;

        Ok(())
    }

    /// Accept a pending connection into `connection`.
    ///
    /// Returns false if no connection is pending.
    /// If `connection` is open, its previous handle is closed before taking the new one.
    pub fn accept(&mut self, connection: &mut Socket, blocking: bool) -> Result<bool, SocketError> {
        if !self.is_listening() {
            return Err(SocketError::NotListening);
        }

        let wait = self.blocking;
        let handle = self.handle.as_mut().ok_or(SocketError::NotOpen)?;

        let (stream, remote_addr) = loop {
            match handle.accept() {
                Ok(value) => break value,
                Err(error) => match error.kind() {
                    ErrorKind::WouldBlock if wait => {
                        handle
                            .wait(Interest::READABLE, None)
                            .map_err(SocketError::Wait)?;
                    }
                    ErrorKind::WouldBlock => return Ok(false),
                    // The peer gave up before we got to it, try the next one
                    ErrorKind::ConnectionReset
                    | ErrorKind::ConnectionAborted
                    | ErrorKind::Interrupted => {}
                    _ => {
                        event!(Level::WARN, %error, "failed to accept connection");
                        return Ok(false);
                    }
                },
            }
        };

        connection.close()?;

        let handle = Handle::new(Source::Stream(stream)).map_err(SocketError::SetBlocking)?;
        connection.handle = Some(handle);
        connection.blocking = blocking;
        connection.listening = false;

        event!(Level::DEBUG, %remote_addr, "connection accepted");

        Ok(true)
    }

    /// Receive the data currently available on the socket.
    ///
    /// Returns empty bytes if nothing is available, or if the peer went away.
    /// In the latter case the socket is closed.
    pub fn receive(&mut self) -> Result<Bytes, SocketError> {
        let wait = self.blocking;
        let handle = self.handle.as_mut().ok_or(SocketError::NotOpen)?;

        let result = loop {
            match handle.read() {
                Err(error) if error.kind() == ErrorKind::WouldBlock && wait => {
                    if let Err(error) = handle.wait(Interest::READABLE, None) {
                        break Err(error);
                    }
                }
                Err(error) if error.kind() == ErrorKind::Interrupted => {}
                result => break result,
            }
        };

        match result {
            Ok(data) if data.is_empty() => {
                event!(Level::DEBUG, "peer closed connection");
                self.close_quietly();
                Ok(Bytes::new())
            }
            Ok(data) => {
                event!(Level::TRACE, count = data.len(), "received data");
                Ok(data)
            }
            Err(error) if error.kind() == ErrorKind::WouldBlock => Ok(Bytes::new()),
            Err(error) if is_disconnect_kind(error.kind()) => {
                event!(Level::DEBUG, %error, "connection lost");
                self.close_quietly();
                Ok(Bytes::new())
            }
            Err(error) => {
                event!(Level::WARN, %error, "ignoring receive error");
                Ok(Bytes::new())
            }
        }
    }

    /// Send `data` to the connected peer.
    ///
    /// Returns false if nothing was sent because `data` is empty, or if the data could only be
    /// partially sent without blocking.
    /// A peer that went away is an error, check `SocketError::is_disconnect`.
    pub fn send(&mut self, data: &[u8]) -> Result<bool, SocketError> {
        if data.is_empty() {
            return Ok(false);
        }
        if !self.is_open() {
            return Err(SocketError::NotOpen);
        }
        if !self.is_connected()? {
            return Err(SocketError::NotConnected);
        }

        let wait = self.blocking;
        let handle = self.handle.as_mut().ok_or(SocketError::NotOpen)?;
        let mut written = 0;

        loop {
            match handle.write(&data[written..]) {
                Ok(0) => return Ok(false),
                Ok(count) => {
                    written += count;
                    if written == data.len() {
                        event!(Level::TRACE, count = written, "sent data");
                        return Ok(true);
                    }
                    if !wait {
                        event!(Level::DEBUG, written, total = data.len(), "short write");
                        return Ok(false);
                    }
                }
                Err(error) if error.kind() == ErrorKind::WouldBlock && wait => {
                    handle
                        .wait(Interest::WRITABLE, None)
                        .map_err(SocketError::Wait)?;
                }
                Err(error) if error.kind() == ErrorKind::WouldBlock => return Ok(false),
                Err(error) if error.kind() == ErrorKind::Interrupted => {}
                Err(error) => return Err(SocketError::Send(error)),
            }
        }
    }

    /// Close the socket, does nothing if it's already closed.
    ///
    /// The handle is invalidated even if shutting down fails.
    pub fn close(&mut self) -> Result<(), SocketError> {
        let Some(handle) = self.handle.take() else {
            return Ok(());
        };
        self.listening = false;

        event!(Level::DEBUG, "closing socket");
        handle.destroy().map_err(SocketError::Close)
    }

    /// Returns true if the socket holds a valid OS handle.
    pub fn is_open(&self) -> bool {
        self.handle.is_some()
    }

    /// Returns true if the socket accepts incoming connections.
    pub fn is_listening(&self) -> bool {
        self.listening
    }

    /// Returns true if operations on this socket wait instead of returning early.
    pub fn is_blocking(&self) -> bool {
        self.blocking
    }

    /// Check if the socket has a connected peer it can send to.
    ///
    /// Waits a short time for the socket to become writable.
    pub fn is_connected(&mut self) -> Result<bool, SocketError> {
        let Some(handle) = self.handle.as_mut() else {
            return Ok(false);
        };

        handle.is_connected().map_err(SocketError::Wait)
    }

    /// Local address the socket is bound to.
    pub fn local_addr(&self) -> Result<SocketAddr, SocketError> {
        let handle = self.handle.as_ref().ok_or(SocketError::NotOpen)?;
        handle.source.local_addr().map_err(SocketError::Address)
    }

    /// Address of the connected peer.
    pub fn peer_addr(&self) -> Result<SocketAddr, SocketError> {
        let handle = self.handle.as_ref().ok_or(SocketError::NotOpen)?;
        handle.source.peer_addr().map_err(SocketError::Address)
    }

    fn close_quietly(&mut self) {
        if let Err(error) = self.close() {
            event!(Level::WARN, ?error, "failed to close socket");
        }
    }
}

impl Drop for Socket {
    fn drop(&mut self) {
        self.close_quietly();
    }
}

/// Valid OS socket, with its own poll for waiting on readiness.
struct Handle {
    source: Source,
    poll: Poll,
    events: Events,
    buffer: Vec<u8>,
}

impl Handle {
    fn new(mut source: Source) -> Result<Self, io::Error> {
        let poll = Poll::new()?;
        poll.registry()
            .register(&mut source, SOCKET, Interest::READABLE | Interest::WRITABLE)?;

        let this = Self {
            source,
            poll,
            events: Events::with_capacity(4),
            buffer: vec![0; RECEIVE_BUFFER_SIZE],
        };
        Ok(this)
    }

    /// Wait until the socket is ready for `interest`, or until `timeout` passes.
    fn wait(&mut self, interest: Interest, timeout: Option<Duration>) -> Result<bool, io::Error> {
        // Registrations are edge triggered, re-arming reports current readiness again
        self.poll
            .registry()
            .reregister(&mut self.source, SOCKET, interest)?;

        loop {
            match self.poll.poll(&mut self.events, timeout) {
                Ok(()) => break,
                Err(error) if error.kind() == ErrorKind::Interrupted => {}
                Err(error) => return Err(error),
            }
        }

        let ready = self.events.iter().any(|event| {
            let readable = event.is_readable() || event.is_read_closed() || event.is_error();
            let writable = event.is_writable() && !event.is_error();

            (interest.is_readable() && readable) || (interest.is_writable() && writable)
        });
        Ok(ready)
    }

    fn is_connected(&mut self) -> Result<bool, io::Error> {
        if let Source::Listener(_) = self.source {
            return Ok(false);
        }

        if !self.wait(Interest::WRITABLE, Some(PROBE_TIMEOUT))? {
            return Ok(false);
        }

        Ok(self.source.peer_addr().is_ok())
    }

    fn accept(&mut self) -> Result<(TcpStream, SocketAddr), io::Error> {
        match &mut self.source {
            Source::Listener(listener) => listener.accept(),
            Source::Stream(_) => Err(ErrorKind::InvalidInput.into()),
        }
    }

    fn read(&mut self) -> Result<Bytes, io::Error> {
        let count = match &mut self.source {
            Source::Stream(stream) => stream.read(&mut self.buffer)?,
            Source::Listener(_) => return Err(ErrorKind::NotConnected.into()),
        };

        Ok(Bytes::copy_from_slice(&self.buffer[..count]))
    }

    fn write(&mut self, data: &[u8]) -> Result<usize, io::Error> {
        match &mut self.source {
            Source::Stream(stream) => stream.write(data),
            Source::Listener(_) => Err(ErrorKind::NotConnected.into()),
        }
    }

    fn take_error(&self) -> Result<Option<io::Error>, io::Error> {
        match &self.source {
            Source::Stream(stream) => stream.take_error(),
            Source::Listener(listener) => listener.take_error(),
        }
    }

    fn destroy(mut self) -> Result<(), io::Error> {
        self.poll.registry().deregister(&mut self.source)?;

        if let Source::Stream(stream) = &self.source {
            match stream.shutdown(Shutdown::Both) {
                // The peer already tore the connection down
                Err(error) if error.kind() == ErrorKind::NotConnected => {}
                result => result?,
            }
        }

        Ok(())
    }
}

enum Source {
    Listener(TcpListener),
    Stream(TcpStream),
}

impl Source {
    fn local_addr(&self) -> Result<SocketAddr, io::Error> {
        match self {
            Source::Listener(listener) => listener.local_addr(),
            Source::Stream(stream) => stream.local_addr(),
        }
    }

    fn peer_addr(&self) -> Result<SocketAddr, io::Error> {
        match self {
            Source::Listener(_) => Err(ErrorKind::NotConnected.into()),
            Source::Stream(stream) => stream.peer_addr(),
        }
    }
}

impl mio::event::Source for Source {
    fn register(
        &mut self,
        registry: &Registry,
        token: Token,
        interests: Interest,
    ) -> Result<(), io::Error> {
        match self {
            Source::Listener(listener) => listener.register(registry, token, interests),
            Source::Stream(stream) => stream.register(registry, token, interests),
        }
    }

    fn reregister(
        &mut self,
        registry: &Registry,
        token: Token,
        interests: Interest,
    ) -> Result<(), io::Error> {
        match self {
            Source::Listener(listener) => listener.reregister(registry, token, interests),
            Source::Stream(stream) => stream.reregister(registry, token, interests),
        }
    }

    fn deregister(&mut self, registry: &Registry) -> Result<(), io::Error> {
        match self {
            Source::Listener(listener) => listener.deregister(registry),
            Source::Stream(stream) => stream.deregister(registry),
        }
    }
}
