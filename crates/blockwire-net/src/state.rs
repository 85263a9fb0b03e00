//! Client connection state, observable without touching the socket.
//!
//! The reader task is the one that notices a dropped connection; it records
//! that here and every subscriber wakes. Writing the state it already holds
//! wakes nobody, so a local `disconnect` racing the reader's own shutdown
//! produces a single transition.

use tokio::sync::watch;

/// Where a client is in its relay session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    /// Transport opening or `join` sent; no `welcome` yet.
    Connecting,
    /// `welcome` received. Outbound messages are accepted.
    Connected,
    /// Closed locally, by the relay, or by a transport error. Terminal for
    /// this session.
    Disconnected,
}

/// Shared cell holding the current [`ConnectionState`].
pub struct ConnectionStateWatch {
    tx: watch::Sender<ConnectionState>,
}

impl Default for ConnectionStateWatch {
    fn default() -> Self {
        Self::new()
    }
}

impl ConnectionStateWatch {
    /// A fresh watch reads [`ConnectionState::Disconnected`] until
    /// `connect` starts.
    pub fn new() -> Self {
        Self {
            tx: watch::Sender::new(ConnectionState::Disconnected),
        }
    }

    /// Record a transition. Returns `false` if `state` was already current.
    pub fn set(&self, state: ConnectionState) -> bool {
        self.tx.send_if_modified(|current| {
            if *current == state {
                false
            } else {
                *current = state;
                true
            }
        })
    }

    /// Receiver woken on every later transition.
    pub fn subscribe(&self) -> watch::Receiver<ConnectionState> {
        self.tx.subscribe()
    }

    pub fn current(&self) -> ConnectionState {
        *self.tx.borrow()
    }

    pub fn is_connected(&self) -> bool {
        self.current() == ConnectionState::Connected
    }
}
