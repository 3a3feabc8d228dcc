//! Connection state shared between the connection kernel and its observers.
//!
//! The kernel owns the sending side of a `watch` channel; anything that needs
//! to know whether the broker handshake has completed (the watchdog, for one)
//! holds a receiver.

use std::fmt;

/// Current state of the broker connection.
///
/// The lifecycle is `Connecting` -> `Connected`. Once a CONNACK has been
/// received the state stays `Connected`; transient errors after that are
/// reported as events, not as state changes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ConnectionState {
    /// Waiting for the first successful CONNACK.
    #[default]
    Connecting,

    /// The broker has accepted at least one connection.
    Connected,
}

impl ConnectionState {
    /// Returns a short static identifier for the state.
    pub fn as_str(&self) -> &'static str {
        match self {
            ConnectionState::Connecting => "Connecting",
            ConnectionState::Connected => "Connected",
        }
    }

    pub fn is_connected(&self) -> bool {
        matches!(self, ConnectionState::Connected)
    }
}

impl fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
