use std::sync::Arc;
use std::thread::{self, JoinHandle};

use tracing::{debug, info};

use crate::broker::buffer::MessageBuffer;
use crate::broker::registry::ListenerHandle;
use crate::transport::connection::Connection;
use crate::transport::message::ClientId;

/// Reads frames off one client's connection and appends them, stamped with
/// the client's id, to the shared inbound buffer.
///
/// Runs until the connection's receive sequence ends and never restarts.
#[derive(Debug)]
pub struct Listener {
    id: ClientId,
    connection: Connection,
    inbound: Arc<MessageBuffer>,
}

impl Listener {
    pub fn new(id: ClientId, connection: Connection, inbound: Arc<MessageBuffer>) -> Self {
        Self {
            id,
            connection,
            inbound,
        }
    }

    pub fn handle(&self) -> ListenerHandle {
        ListenerHandle {
            id: self.id,
            connection: self.connection.clone(),
        }
    }

    pub fn run(self) {
        info!(id = self.id, "client connected to listener");
        for mut message in self.connection.receive() {
            message.set_id(self.id);
            debug!(id = self.id, "client says: {}", message.body());
            self.inbound.push(message);
        }
        info!(id = self.id, "client disconnected from listener");
        self.connection.disconnect();
    }

    pub fn spawn(self) -> std::io::Result<JoinHandle<()>> {
        thread::Builder::new()
            .name(format!("listener-{}", self.id))
            .spawn(move || self.run())
    }
}
