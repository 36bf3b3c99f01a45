//! Monitor
//!
//! The central dispatcher. It owns the shared inbound buffer and the client
//! registry and, for as long as the server's cancel token is not set, runs
//! cycles of:
//!
//! 1. absorbing registrations handed over by the acceptor,
//! 2. grooming: dropping every client whose sender is disconnected,
//! 3. dispatching: popping each inbound message and pushing a copy into the
//!    outbound buffer of every registered client, origin included.
//!
//! Between cycles it waits on the inbound buffer for up to the configured
//! interval. When the token is cancelled the monitor disconnects every
//! listener and sender it knows about and returns; nothing still buffered is
//! delivered.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc::{UnboundedReceiver, UnboundedSender, unbounded_channel};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::broker::buffer::MessageBuffer;
use crate::broker::registry::{Registration, Registry};
use crate::config::RelaySettings;
use crate::transport::message::ClientId;

/// Cloneable handle used by the acceptor to reach the monitor.
#[derive(Debug, Clone)]
pub struct MonitorHandle {
    inbound: Arc<MessageBuffer>,
    registrations: UnboundedSender<Registration>,
}

impl MonitorHandle {
    /// The buffer every listener appends to.
    pub fn inbound(&self) -> Arc<MessageBuffer> {
        Arc::clone(&self.inbound)
    }

    /// Hands a new client to the monitor. If the monitor is gone the client
    /// is disconnected instead.
    pub fn register(&self, registration: Registration) {
        if let Err(e) = self.registrations.send(registration) {
            warn!(id = e.0.id(), "monitor is not running, dropping client");
            e.0.disconnect();
        }
    }
}

#[derive(Debug)]
pub struct Monitor {
    inbound: Arc<MessageBuffer>,
    registry: Registry,
    registrations: UnboundedReceiver<Registration>,
    cancel: CancellationToken,
    interval: Duration,
}

impl Monitor {
    pub fn new(cancel: CancellationToken, settings: &RelaySettings) -> (Self, MonitorHandle) {
        let inbound = Arc::new(MessageBuffer::new(settings.buffer_capacity));
        let (tx, rx) = unbounded_channel();
        let monitor = Self {
            inbound: Arc::clone(&inbound),
            registry: Registry::new(),
            registrations: rx,
            cancel,
            interval: Duration::from_millis(settings.monitor_interval_ms),
        };
        let handle = MonitorHandle {
            inbound,
            registrations: tx,
        };
        (monitor, handle)
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    pub fn inbound(&self) -> &Arc<MessageBuffer> {
        &self.inbound
    }

    pub fn is_connected(&self) -> bool {
        !self.cancel.is_cancelled()
    }

    /// Moves every pending registration into the registry.
    pub fn absorb_registrations(&mut self) -> usize {
        let mut added = 0;
        while let Ok(registration) = self.registrations.try_recv() {
            debug!(id = registration.id(), "registering client");
            self.registry.add(registration);
            added += 1;
        }
        added
    }

    /// Removes disconnected clients. This is the only place clients leave
    /// the registry.
    pub fn groom(&mut self) -> Vec<ClientId> {
        debug!("there are {} client(s) connected", self.registry.len());
        let dead: Vec<ClientId> = self
            .registry
            .senders()
            .filter(|sender| !sender.is_connected())
            .map(|sender| sender.id)
            .collect();
        for id in &dead {
            info!(id, "removing disconnected client");
            self.registry.remove(*id);
        }
        dead
    }

    /// Fans every pending inbound message out to all registered clients.
    /// Returns the number of messages taken from the inbound buffer.
    pub fn dispatch(&mut self) -> usize {
        debug!("monitor has {} message(s)", self.inbound.len());
        let mut dispatched = 0;
        while self.is_connected() {
            let Some(message) = self.inbound.pop() else {
                break;
            };
            for sender in self.registry.senders() {
                debug!(
                    from = message.id(),
                    to = sender.id,
                    "assigning: {}",
                    message.body()
                );
                sender.outbound.push(message.clone());
            }
            dispatched += 1;
        }
        dispatched
    }

    /// One full cycle: registrations, groom, dispatch.
    pub fn cycle(&mut self) {
        self.absorb_registrations();
        self.groom();
        self.dispatch();
    }

    /// Runs cycles until the cancel token is set, then shuts down.
    pub fn run(mut self) {
        info!("monitor started");
        while self.is_connected() {
            self.cycle();
            self.inbound.wait_timeout(self.interval);
        }
        info!("server disconnected on the monitor");
        self.shutdown();
    }

    /// Disconnects every known client and the monitor itself.
    pub fn shutdown(&mut self) {
        // Late registrations would otherwise leak live sockets.
        self.absorb_registrations();
        for listener in self.registry.listeners() {
            debug!(id = listener.id, "disconnecting listener");
            listener.connection.disconnect();
        }
        for sender in self.registry.senders() {
            debug!(id = sender.id, "disconnecting sender");
            sender.connection.disconnect();
        }
        self.registrations.close();
        while let Ok(registration) = self.registrations.try_recv() {
            registration.disconnect();
        }
        self.cancel.cancel();
        info!("monitor shut down");
    }
}
