use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use tracing::{debug, info};

use crate::broker::buffer::MessageBuffer;
use crate::broker::registry::SenderHandle;
use crate::transport::connection::Connection;
use crate::transport::message::ClientId;

/// Drains one client's outbound buffer onto its connection.
///
/// Between drains it waits up to `interval` for the monitor to push more.
/// Empty messages are dropped instead of written.
#[derive(Debug)]
pub struct Sender {
    id: ClientId,
    connection: Connection,
    outbound: Arc<MessageBuffer>,
    interval: Duration,
}

impl Sender {
    pub fn new(
        id: ClientId,
        connection: Connection,
        outbound: Arc<MessageBuffer>,
        interval: Duration,
    ) -> Self {
        Self {
            id,
            connection,
            outbound,
            interval,
        }
    }

    pub fn handle(&self) -> SenderHandle {
        SenderHandle {
            id: self.id,
            connection: self.connection.clone(),
            outbound: Arc::clone(&self.outbound),
        }
    }

    pub fn run(self) {
        info!(id = self.id, "client connected to sender");
        while self.connection.is_connected() {
            while self.connection.is_connected() {
                let Some(message) = self.outbound.pop() else {
                    break;
                };
                debug!(id = self.id, "sending: {}", message.body());
                if !message.is_empty() {
                    self.connection.send(&message);
                }
            }
            self.outbound.wait_timeout(self.interval);
        }
        info!(id = self.id, "client disconnected from sender");
        self.connection.disconnect();
    }

    pub fn spawn(self) -> std::io::Result<JoinHandle<()>> {
        thread::Builder::new()
            .name(format!("sender-{}", self.id))
            .spawn(move || self.run())
    }
}
