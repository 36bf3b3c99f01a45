//! The `session` module holds the two threads that serve one connected
//! client on the server: a [`Listener`] feeding the shared inbound buffer
//! and a [`Sender`] draining the client's own outbound buffer.
//!
//! Both share one [`Connection`] (and therefore one cancel token), so either
//! side failing ends the whole session.

pub mod listener;
pub mod sender;

use std::net::TcpStream;
use std::sync::Arc;
use std::time::Duration;

use tracing::error;

use crate::broker::buffer::MessageBuffer;
use crate::broker::monitor::MonitorHandle;
use crate::broker::registry::Registration;
use crate::config::RelaySettings;
use crate::transport::connection::Connection;
use crate::transport::message::ClientId;
use crate::utils::error::Result;

pub use listener::Listener;
pub use sender::Sender;

/// Builds the listener/sender pair for `connection`, without starting them.
pub fn pair(
    id: ClientId,
    connection: Connection,
    inbound: Arc<MessageBuffer>,
    settings: &RelaySettings,
) -> (Listener, Sender) {
    let outbound = Arc::new(MessageBuffer::new(settings.buffer_capacity));
    let listener = Listener::new(id, connection.clone(), inbound);
    let sender = Sender::new(
        id,
        connection,
        outbound,
        Duration::from_millis(settings.sender_interval_ms),
    );
    (listener, sender)
}

/// Registers a freshly accepted client with the monitor and starts its
/// sender and listener threads.
pub fn start(
    id: ClientId,
    stream: TcpStream,
    monitor: &MonitorHandle,
    settings: &RelaySettings,
) -> Result<()> {
    let connection = Connection::from_stream(stream);
    let (listener, sender) = pair(id, connection.clone(), monitor.inbound(), settings);
    monitor.register(Registration::new(listener.handle(), sender.handle())?);

    let started = sender.spawn().and_then(|_| listener.spawn());
    if let Err(e) = started {
        error!(id, error = %e, "failed to start client threads");
        connection.disconnect();
        return Err(e.into());
    }
    Ok(())
}
