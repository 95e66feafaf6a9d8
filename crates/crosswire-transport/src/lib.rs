//! Transport layer for the Crosswire game service.
//!
//! Provides the [`Connection`] trait that the framing and session layers
//! are written against, plus the [`TcpTransport`]/[`TcpConnection`]
//! implementation over `tokio::net`. The wire protocol above this layer is
//! a plain byte stream: the transport hands up whatever chunks the kernel
//! delivers and makes no attempt to find message boundaries — that is the
//! frame decoder's job.

#![allow(async_fn_in_trait)]

mod error;
mod tcp;

pub use error::TransportError;
pub use tcp::{TcpConnection, TcpTransport};

use std::fmt;

/// Opaque identifier for a connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ConnectionId(u64);

impl ConnectionId {
    /// Creates a new `ConnectionId` from a raw `u64`.
    pub fn new(id: u64) -> Self {
        Self(id)
    }

    /// Returns the underlying `u64` value.
    pub fn into_inner(self) -> u64 {
        self.0
    }
}

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "conn-{}", self.0)
    }
}

/// A single connection that can send and receive bytes.
///
/// Receiving is chunk-oriented: one `recv` returns one read's worth of
/// bytes, which may be a fragment of a message or several messages run
/// together. `readable` exists so a session can wait on two connections
/// at once without committing to a read on either.
pub trait Connection: Send + 'static {
    /// Receives the next chunk of bytes from the remote peer.
    ///
    /// Returns `Ok(None)` when the peer has cleanly closed the stream.
    async fn recv(&mut self) -> Result<Option<Vec<u8>>, TransportError>;

    /// Sends data to the remote peer.
    async fn send(&mut self, data: &[u8]) -> Result<(), TransportError>;

    /// Waits until the connection has data to read (or has hit EOF).
    async fn readable(&self) -> Result<(), TransportError>;

    /// Returns the unique identifier for this connection.
    fn id(&self) -> ConnectionId;

    /// Returns the peer address as a `host:port` string, for logging.
    fn peer(&self) -> &str;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_connection_id_new_and_into_inner() {
        let id = ConnectionId::new(42);
        assert_eq!(id.into_inner(), 42);
    }

    #[test]
    fn test_connection_id_display() {
        let id = ConnectionId::new(7);
        assert_eq!(id.to_string(), "conn-7");
    }

    #[test]
    fn test_connection_id_hash_works_as_map_key() {
        use std::collections::HashMap;
        let mut map = HashMap::new();
        map.insert(ConnectionId::new(1), "alice");
        map.insert(ConnectionId::new(2), "bob");
        assert_eq!(map[&ConnectionId::new(1)], "alice");
    }
}
