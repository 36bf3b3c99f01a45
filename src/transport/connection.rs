//! Connection handle
//!
//! A [`Connection`] wraps one live TCP stream plus a [`CancellationToken`].
//! Clones share both, which is how a client's listener and sender are tied
//! together: whichever side disconnects first shuts the socket down and
//! cancels the token, and the other side observes it.
//!
//! There is no idle handle. [`Connection::connect`] and
//! [`Connection::from_stream`] are the idle-to-connected transition, so a
//! `Connection` only ever reports [`ConnectionState::Connected`] or, once
//! cancelled, [`ConnectionState::Disconnected`]. The move is one way.
//!
//! All per-connection I/O failures stop here. A failed read or write is
//! logged and converted into [`Connection::disconnect`]; nothing is
//! propagated to the monitor or to other clients.

use std::io::{Read, Write};
use std::net::{Shutdown, SocketAddr, TcpStream};
use std::sync::Arc;

use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::transport::message::Message;

/// Maximum number of bytes read per receive call. A frame must fit in one
/// read; there is no reassembly of partial frames.
pub const READ_BUFFER_SIZE: usize = 1024;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Connected,
    Disconnected,
}

#[derive(Debug, Clone)]
pub struct Connection {
    stream: Arc<TcpStream>,
    cancel: Arc<CancellationToken>,
    peer: Option<SocketAddr>,
}

impl Connection {
    /// Opens a connection to `host:port`.
    pub fn connect(host: &str, port: u16) -> std::io::Result<Self> {
        let stream = TcpStream::connect((host, port))?;
        debug!("connected to {host}:{port}");
        Ok(Self::from_stream(stream))
    }

    /// Attaches an already established stream, typically one returned by
    /// `accept`.
    pub fn from_stream(stream: TcpStream) -> Self {
        let peer = stream.peer_addr().ok();
        Self {
            stream: Arc::new(stream),
            cancel: Arc::new(CancellationToken::new()),
            peer,
        }
    }

    pub fn peer_addr(&self) -> Option<SocketAddr> {
        self.peer
    }

    pub fn cancel_token(&self) -> &CancellationToken {
        &self.cancel
    }

    /// True if `other` was cloned from the same connection, as opposed to a
    /// second connection that merely wraps a similar socket.
    pub fn shares_cancellation_with(&self, other: &Connection) -> bool {
        Arc::ptr_eq(&self.cancel, &other.cancel)
    }

    pub fn state(&self) -> ConnectionState {
        if self.cancel.is_cancelled() {
            ConnectionState::Disconnected
        } else {
            ConnectionState::Connected
        }
    }

    pub fn is_connected(&self) -> bool {
        self.state() == ConnectionState::Connected
    }

    /// Cancels the shared signal and shuts the socket down. Calls after the
    /// token is cancelled, from any clone, do nothing.
    pub fn disconnect(&self) {
        if self.cancel.is_cancelled() {
            return;
        }
        self.cancel.cancel();
        debug!(peer = ?self.peer, "closing connection");
        // Racing callers may both get here; a repeated shutdown is harmless.
        let _ = self.stream.shutdown(Shutdown::Both);
    }

    /// Blocking, lazy sequence of incoming messages.
    ///
    /// The sequence ends, after disconnecting, on any read failure, on a
    /// closed stream, on an empty or undecodable frame and on the quit
    /// sentinel.
    pub fn receive(&self) -> Incoming<'_> {
        debug!(peer = ?self.peer, "listening");
        Incoming {
            connection: self,
            buf: vec![0; READ_BUFFER_SIZE],
        }
    }

    /// Sends one message if the connection is still up. Failures disconnect.
    pub fn send(&self, message: &Message) {
        if !self.is_connected() {
            return;
        }
        debug!(peer = ?self.peer, "sending: {}", message.body());
        if let Err(e) = (&*self.stream).write_all(&message.encode()) {
            warn!(peer = ?self.peer, error = %e, "write failed while sending {:?}", message.body());
            self.disconnect();
        }
    }
}

pub struct Incoming<'a> {
    connection: &'a Connection,
    buf: Vec<u8>,
}

impl Iterator for Incoming<'_> {
    type Item = Message;

    fn next(&mut self) -> Option<Message> {
        let connection = self.connection;
        if !connection.is_connected() {
            return None;
        }

        let read = (&*connection.stream).read(&mut self.buf);
        let message = match read {
            Ok(n) => Message::decode(&self.buf[..n]),
            Err(e) => {
                debug!(peer = ?connection.peer, error = %e, "read failed while waiting for messages");
                connection.disconnect();
                return None;
            }
        };

        match message {
            Ok(message) if message.is_empty() => {
                debug!(peer = ?connection.peer, "received empty message");
                connection.disconnect();
                None
            }
            Ok(message) if message.is_quit() => {
                debug!(peer = ?connection.peer, "received request to quit");
                connection.disconnect();
                None
            }
            Ok(message) => {
                debug!(peer = ?connection.peer, "received: {}", message.body());
                Some(message)
            }
            Err(e) => {
                warn!(peer = ?connection.peer, error = %e, "dropping connection after bad frame");
                connection.disconnect();
                None
            }
        }
    }
}
