//! Network Module
//!
//! Transport capabilities the engine relies on, and a TCP implementation.
//!
//! ## Architecture
//! - The engine polls; nothing here blocks
//! - `Listener` hands out at most one new connection per call
//! - `Connection` exposes buffered inbound bytes and fire-and-forget writes

mod connection;
mod server;

use std::io;

pub use connection::TcpConnection;
pub use server::TcpServer;

/// One client connection
pub trait Connection {
    /// Number of inbound bytes that can be read without blocking
    fn available(&mut self) -> usize;

    /// Read up to `buf.len()` buffered bytes; never blocks
    fn read(&mut self, buf: &mut [u8]) -> usize;

    /// Queue `bytes` for transmission
    fn write(&mut self, bytes: &[u8]) -> io::Result<()>;

    /// Whether the peer is still connected
    fn connected(&self) -> bool;

    /// Force the connection closed
    fn close(&mut self);

    /// Peer address for logging
    fn peer_addr(&self) -> String {
        "unknown".to_string()
    }
}

/// Source of new connections
pub trait Listener {
    type Conn: Connection;

    /// Next pending connection, if any; never blocks
    fn accept(&mut self) -> io::Result<Option<Self::Conn>>;
}
