use std::{thread, time::Duration};

use anyhow::{bail, Error};
use bytes::{Bytes, BytesMut};
use olympus_mio::Socket;

const ATTEMPTS: usize = 1000;
const RETRY_DELAY: Duration = Duration::from_millis(2);

pub fn given_listener() -> Result<(Socket, u16), Error> {
    let mut listener = Socket::default();
    listener.open(true, 0, false)?;
    let port = listener.local_addr()?.port();

    Ok((listener, port))
}

pub fn given_client(port: u16) -> Result<Socket, Error> {
    let mut client = Socket::default();
    client.open(false, port, true)?;

    Ok(client)
}

/// Accept on a non-blocking listener, retrying until the connection arrives.
pub fn when_accepted(listener: &mut Socket) -> Result<Socket, Error> {
    let mut connection = Socket::default();

    for _ in 0..ATTEMPTS {
        if listener.accept(&mut connection, false)? {
            return Ok(connection);
        }
        thread::sleep(RETRY_DELAY);
    }

    bail!("no connection accepted")
}

/// Receive on a non-blocking socket until `expected` bytes arrived.
pub fn when_received(socket: &mut Socket, expected: usize) -> Result<Bytes, Error> {
    let mut data = BytesMut::new();

    for _ in 0..ATTEMPTS {
        data.extend_from_slice(&socket.receive()?);
        if data.len() >= expected {
            return Ok(data.freeze());
        }
        thread::sleep(RETRY_DELAY);
    }

    bail!("received {} of {} bytes", data.len(), expected)
}

/// Receive on a non-blocking socket until it reports closed.
pub fn when_closed_by_peer(socket: &mut Socket) -> Result<(), Error> {
    for _ in 0..ATTEMPTS {
        let data = socket.receive()?;
        if !socket.is_open() {
            assert!(data.is_empty(), "closing receive returned data");
            return Ok(());
        }
        thread::sleep(RETRY_DELAY);
    }

    bail!("socket never closed")
}
