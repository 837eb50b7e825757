//! TCP Connection
//!
//! Non-blocking client connection with buffered inbound and outbound bytes.

use std::io::{self, ErrorKind, Read, Write};
use std::net::{Shutdown, TcpStream};

use bytes::{Buf, BytesMut};

use super::Connection;

/// Upper bound on bytes buffered from the socket at any time
const READ_CHUNK_SIZE: usize = 1024;

/// Outbound bytes kept while the socket is not writable; frames beyond this are dropped
const MAX_OUTBOUND_BUFFER: usize = 64 * 1024;

/// A non-blocking TCP client
pub struct TcpConnection {
    stream: TcpStream,
    inbound: BytesMut,
    outbound: BytesMut,
    open: bool,
    peer_addr: String,
}

impl TcpConnection {
    /// Wrap an accepted stream
    ///
    /// Switches the stream to non-blocking mode and disables Nagle's algorithm.
    pub fn new(stream: TcpStream) -> io::Result<Self> {
        let peer_addr = stream
            .peer_addr()
            .map(|a| a.to_string())
            .unwrap_or_else(|_| "unknown".to_string());

        stream.set_nonblocking(true)?;
        stream.set_nodelay(true)?;

        Ok(Self {
            stream,
            inbound: BytesMut::with_capacity(READ_CHUNK_SIZE),
            outbound: BytesMut::new(),
            open: true,
            peer_addr,
        })
    }

    /// Refill `inbound` with at most one chunk, only once it is drained
    ///
    /// Unread bytes stay in the kernel socket buffer, which keeps TCP flow
    /// control in charge of a client that sends faster than it is served.
    fn fill_inbound(&mut self) {
        if !self.inbound.is_empty() {
            return;
        }

        let mut chunk = [0u8; READ_CHUNK_SIZE];
        while self.open {
            match self.stream.read(&mut chunk) {
                Ok(0) => {
                    self.open = false;
                }
                Ok(n) => {
                    self.inbound.extend_from_slice(&chunk[..n]);
                    break;
                }
                Err(e) if e.kind() == ErrorKind::WouldBlock => break,
                Err(e) if e.kind() == ErrorKind::Interrupted => continue,
                Err(e) => {
                    tracing::debug!("Read from {} failed: {}", self.peer_addr, e);
                    self.open = false;
                }
            }
        }
    }

    /// Write as much of `outbound` as the socket accepts
    fn drain_outbound(&mut self) -> io::Result<()> {
        while !self.outbound.is_empty() {
            match self.stream.write(&self.outbound) {
                Ok(0) => {
                    self.open = false;
                    return Err(io::Error::new(ErrorKind::WriteZero, "connection closed"));
                }
                Ok(n) => self.outbound.advance(n),
                Err(e) if e.kind() == ErrorKind::WouldBlock => return Ok(()),
                Err(e) if e.kind() == ErrorKind::Interrupted => continue,
                Err(e) => {
                    self.open = false;
                    return Err(e);
                }
            }
        }
        Ok(())
    }
}

impl Connection for TcpConnection {
    fn available(&mut self) -> usize {
        if let Err(e) = self.drain_outbound() {
            tracing::debug!("Write to {} failed: {}", self.peer_addr, e);
        }
        self.fill_inbound();
        self.inbound.len()
    }

    fn read(&mut self, buf: &mut [u8]) -> usize {
        let n = buf.len().min(self.inbound.len());
        self.inbound.copy_to_slice(&mut buf[..n]);
        n
    }

    fn write(&mut self, bytes: &[u8]) -> io::Result<()> {
        if !self.open {
            return Err(io::Error::new(ErrorKind::NotConnected, "connection closed"));
        }
        if self.outbound.len() + bytes.len() > MAX_OUTBOUND_BUFFER {
            tracing::warn!("Outbound buffer full for {}, dropping {} bytes", self.peer_addr, bytes.len());
            return Ok(());
        }
        self.outbound.extend_from_slice(bytes);
        self.drain_outbound()
    }

    fn connected(&self) -> bool {
        self.open
    }

    fn close(&mut self) {
        if self.open {
            let _ = self.drain_outbound();
        }
        let _ = self.stream.shutdown(Shutdown::Both);
        self.open = false;
    }

    fn peer_addr(&self) -> String {
        self.peer_addr.clone()
    }
}
