use std::{cell::RefCell, collections::VecDeque, rc::Rc};

use bytes::Bytes;
use olympus_http::{SocketError, Transport};

/// In-memory transport, cloned handles share the same state.
#[derive(Default, Clone)]
pub struct MockTransport {
    state: Rc<RefCell<MockState>>,
}

#[derive(Default)]
struct MockState {
    open: bool,
    listening: bool,
    hung_up: bool,
    send_error: Option<fn() -> SocketError>,
    inbound: VecDeque<Bytes>,
    pending: VecDeque<MockTransport>,
    sent: Vec<Bytes>,
    receives: usize,
}

impl MockTransport {
    pub fn listener() -> Self {
        let this = Self::default();
        {
            let mut state = this.state.borrow_mut();
            state.open = true;
            state.listening = true;
        }
        this
    }

    pub fn connection() -> Self {
        let this = Self::default();
        this.state.borrow_mut().open = true;
        this
    }

    /// Make `connection` available to the next accept.
    pub fn queue(&self, connection: MockTransport) {
        self.state.borrow_mut().pending.push_back(connection);
    }

    /// Queue data for one receive call.
    pub fn push(&self, data: &[u8]) {
        let data = Bytes::copy_from_slice(data);
        self.state.borrow_mut().inbound.push_back(data);
    }

    /// Close from the peer side, once all pushed data has been received.
    pub fn hang_up(&self) {
        self.state.borrow_mut().hung_up = true;
    }

    /// Make every following send fail with the error `make` builds.
    pub fn fail_sends(&self, make: fn() -> SocketError) {
        self.state.borrow_mut().send_error = Some(make);
    }

    pub fn sent(&self) -> Vec<Bytes> {
        self.state.borrow().sent.clone()
    }

    pub fn receives(&self) -> usize {
        self.state.borrow().receives
    }
}

impl Transport for MockTransport {
    fn is_open(&self) -> bool {
        self.state.borrow().open
    }

    fn is_listening(&self) -> bool {
        self.state.borrow().listening
    }

    fn accept(&mut self, connection: &mut Self, _blocking: bool) -> Result<bool, SocketError> {
        if !self.is_listening() {
            return Err(SocketError::NotListening);
        }

        let next = self.state.borrow_mut().pending.pop_front();
        let Some(next) = next else {
            return Ok(false);
        };

        connection.close()?;
        *connection = next;

        Ok(true)
    }

    fn receive(&mut self) -> Result<Bytes, SocketError> {
        let mut state = self.state.borrow_mut();
        if !state.open {
            return Err(SocketError::NotOpen);
        }
        state.receives += 1;

        if let Some(data) = state.inbound.pop_front() {
            return Ok(data);
        }

        if state.hung_up {
            state.open = false;
        }

        Ok(Bytes::new())
    }

    fn send(&mut self, data: &[u8]) -> Result<bool, SocketError> {
        if data.is_empty() {
            return Ok(false);
        }

        let mut state = self.state.borrow_mut();
        if !state.open {
            return Err(SocketError::NotOpen);
        }
        if let Some(make) = state.send_error {
            return Err(make());
        }

        state.sent.push(Bytes::copy_from_slice(data));
        Ok(true)
    }

    fn close(&mut self) -> Result<(), SocketError> {
        let mut state = self.state.borrow_mut();
        state.open = false;
        state.listening = false;

        Ok(())
    }
}
