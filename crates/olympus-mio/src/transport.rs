use bytes::Bytes;

use crate::{Socket, SocketError};

/// Transport operations the HTTP server core calls through.
///
/// `Default` must produce a closed transport, which `accept` fills in with a new connection.
pub trait Transport: Default {
    /// Returns true if the transport holds a valid handle.
    fn is_open(&self) -> bool;

    /// Returns true if the transport accepts incoming connections.
    fn is_listening(&self) -> bool;

    /// Accept one pending connection into `connection`.
    ///
    /// Returns false if no connection is pending.
    fn accept(&mut self, connection: &mut Self, blocking: bool) -> Result<bool, SocketError>;

    /// Receive available data, empty if there is none.
    fn receive(&mut self) -> Result<Bytes, SocketError>;

    /// Send `data`, returns false if it was not fully sent.
    fn send(&mut self, data: &[u8]) -> Result<bool, SocketError>;

    /// Close the transport, does nothing if already closed.
    fn close(&mut self) -> Result<(), SocketError>;
}

impl Transport for Socket {
    fn is_open(&self) -> bool {
        Socket::is_open(self)
    }

    fn is_listening(&self) -> bool {
        Socket::is_listening(self)
    }

    fn accept(&mut self, connection: &mut Self, blocking: bool) -> Result<bool, SocketError> {
        Socket::accept(self, connection, blocking)
    }

    fn receive(&mut self) -> Result<Bytes, SocketError> {
        Socket::receive(self)
    }

    fn send(&mut self, data: &[u8]) -> Result<bool, SocketError> {
        Socket::send(self, data)
    }

    fn close(&mut self) -> Result<(), SocketError> {
        Socket::close(self)
    }
}
