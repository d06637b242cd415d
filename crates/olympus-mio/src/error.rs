use std::{
    io::{self, ErrorKind},
    net::SocketAddr,
};

use thiserror::Error;

/// Fatal socket misuse or OS-level failure.
///
/// Receiving never surfaces transient network conditions as a `SocketError`, those are reported
/// as empty receives instead.
/// Sending does, a peer that went away is a `NotConnected` or `Send` error, see `is_disconnect`.
#[derive(Error, Debug)]
pub enum SocketError {
    /// Open called on a socket that is already open.
    #[error("socket is already open")]
    AlreadyOpen,
    /// Operation called on a closed socket.
    #[error("socket is closed")]
    NotOpen,
    /// Accept called on a socket that is not in listening mode.
    #[error("socket is not in listening mode")]
    NotListening,
    /// Send called on a socket that has no connected peer.
    #[error("socket is not connected")]
    NotConnected,
    /// Creating the socket or its readiness poll failed.
    #[error("failed to create socket")]
    Create(#[source] io::Error),
    /// Binding or listening on the loopback address failed.
    #[error("failed to bind socket to {addr}")]
    Bind {
        /// Address the socket was bound to.
        addr: SocketAddr,
        /// Underlying OS error.
        #[source]
        source: io::Error,
    },
    /// Connecting to the loopback address failed.
    #[error("failed to connect socket to {addr}")]
    Connect {
        /// Address the socket connected to.
        addr: SocketAddr,
        /// Underlying OS error.
        #[source]
        source: io::Error,
    },
    /// Setting up the blocking mode of a socket failed.
    #[error("failed to set socket blocking mode")]
    SetBlocking(#[source] io::Error),
    /// Waiting for socket readiness failed.
    #[error("failed to wait for socket readiness")]
    Wait(#[source] io::Error),
    /// Sending data failed.
    #[error("failed to send data over socket")]
    Send(#[source] io::Error),
    /// Shutting down the socket failed.
    #[error("failed to shut down socket")]
    Close(#[source] io::Error),
    /// Querying a socket address failed.
    #[error("failed to query socket address")]
    Address(#[source] io::Error),
}

impl SocketError {
    /// Returns true if this error means the requested port could not be bound.
    pub fn is_bind(&self) -> bool {
        matches!(self, SocketError::Bind { .. })
    }

    /// Returns true if this error means the peer went away, rather than that the socket was
    /// misused.
    pub fn is_disconnect(&self) -> bool {
        match self {
            SocketError::NotConnected => true,
            SocketError::Send(error) => is_disconnect_kind(error.kind()),
            _ => false,
        }
    }
}

/// Errors that mean the peer is gone, rather than that we did something wrong.
pub(crate) fn is_disconnect_kind(kind: ErrorKind) -> bool {
    matches!(
        kind,
        ErrorKind::NotConnected
            | ErrorKind::ConnectionReset
            | ErrorKind::ConnectionAborted
            | ErrorKind::TimedOut
            | ErrorKind::BrokenPipe
    )
}
