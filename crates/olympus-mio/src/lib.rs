#![deny(missing_docs)]

//! Loopback TCP transport for the olympus HTTP server.
//!
//! Sockets are built on mio, and are non-blocking unless opened in blocking mode.
//! Blocking mode is emulated by waiting on a private poll for readiness.

mod error;
mod socket;
mod transport;

pub use self::{error::SocketError, socket::Socket, transport::Transport};
