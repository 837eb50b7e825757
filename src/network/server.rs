//! TCP Server
//!
//! Non-blocking listening socket feeding the engine's accept step.

use std::io::{self, ErrorKind};
use std::net::{SocketAddr, TcpListener, ToSocketAddrs};

use crate::error::{BlaeckError, Result};

use super::{Listener, TcpConnection};

/// Listening TCP socket
pub struct TcpServer {
    listener: TcpListener,
}

impl TcpServer {
    /// Bind `addr` and switch the socket to non-blocking accepts
    pub fn bind(addr: impl ToSocketAddrs) -> Result<Self> {
        let listener = TcpListener::bind(addr).map_err(|e| BlaeckError::Network(format!("Bind failed: {}", e)))?;
        listener.set_nonblocking(true)?;
        Ok(Self { listener })
    }

    pub fn local_addr(&self) -> Result<SocketAddr> {
        Ok(self.listener.local_addr()?)
    }
}

impl Listener for TcpServer {
    type Conn = TcpConnection;

    fn accept(&mut self) -> io::Result<Option<TcpConnection>> {
        match self.listener.accept() {
            Ok((stream, _)) => TcpConnection::new(stream).map(Some),
            Err(e) if e.kind() == ErrorKind::WouldBlock => Ok(None),
            Err(e) => Err(e),
        }
    }
}
