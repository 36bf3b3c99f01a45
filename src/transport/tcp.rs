//! TCP acceptor
//!
//! [`Server`] binds the listening socket, starts the [`Monitor`] thread and
//! then blocks in `accept`. Every accepted socket becomes a client whose id
//! is the peer's port; its listener/sender pair is registered with the
//! monitor and started.
//!
//! A [`ShutdownHandle`] stops the server: it cancels the server token (which
//! the monitor observes and turns into a full shutdown) and wakes the
//! blocking `accept` with a throw-away loopback connection.
//!
//! A failed `accept` is logged and followed by a pause of one monitor
//! interval, so a persistent failure such as running out of file descriptors
//! does not spin the acceptor.

use std::io;
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr, SocketAddr, TcpListener, TcpStream};
use std::thread;
use std::time::Duration;

use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::broker::monitor::{Monitor, MonitorHandle};
use crate::config::{RelaySettings, Settings};
use crate::session;
use crate::transport::message::ClientId;
use crate::utils::error::{RelayError, Result};

#[derive(Debug, Clone)]
pub struct ShutdownHandle {
    cancel: CancellationToken,
    addr: SocketAddr,
}

impl ShutdownHandle {
    pub fn shutdown(&self) {
        if self.cancel.is_cancelled() {
            return;
        }
        self.cancel.cancel();
        info!("disconnecting server");
        // Unblock accept(); an unspecified bind address is reached via loopback.
        let mut addr = self.addr;
        if addr.ip().is_unspecified() {
            let loopback = match addr.ip() {
                IpAddr::V4(_) => IpAddr::V4(Ipv4Addr::LOCALHOST),
                IpAddr::V6(_) => IpAddr::V6(Ipv6Addr::LOCALHOST),
            };
            addr.set_ip(loopback);
        }
        if let Err(e) = TcpStream::connect(addr) {
            debug!(error = %e, "wake-up connection failed");
        }
    }

    pub fn is_shut_down(&self) -> bool {
        self.cancel.is_cancelled()
    }
}

#[derive(Debug)]
pub struct Server {
    listener: TcpListener,
    cancel: CancellationToken,
    relay: RelaySettings,
}

impl Server {
    /// Binds and listens on `settings.server.host:port`.
    pub fn bind(settings: &Settings) -> Result<Self> {
        settings.server.validate()?;
        Self::bind_addr(&settings.server.addr(), &settings.relay)
    }

    /// Binds to an explicit address; port 0 picks an ephemeral port.
    pub fn bind_addr(addr: &str, relay: &RelaySettings) -> Result<Self> {
        relay.validate()?;
        let listener = TcpListener::bind(addr).map_err(RelayError::Io)?;
        info!("server listening on {}", listener.local_addr()?);
        Ok(Self {
            listener,
            cancel: CancellationToken::new(),
            relay: relay.clone(),
        })
    }

    pub fn local_addr(&self) -> Result<SocketAddr> {
        Ok(self.listener.local_addr()?)
    }

    pub fn shutdown_handle(&self) -> Result<ShutdownHandle> {
        Ok(ShutdownHandle {
            cancel: self.cancel.clone(),
            addr: self.local_addr()?,
        })
    }

    /// Runs the accept loop until shut down. Returns once the monitor has
    /// disconnected every client.
    pub fn serve(self) -> Result<()> {
        let (monitor, handle) = Monitor::new(self.cancel.clone(), &self.relay);
        let monitor_thread = thread::Builder::new()
            .name("monitor".into())
            .spawn(move || monitor.run())?;

        while !self.cancel.is_cancelled() {
            debug!("waiting for client connections");
            match self.listener.accept() {
                Ok((stream, peer)) => {
                    if self.cancel.is_cancelled() {
                        break;
                    }
                    self.handle(stream, peer, &handle);
                }
                Err(e) => self.accept_failed(&e),
            }
        }

        if monitor_thread.join().is_err() {
            error!("monitor thread panicked");
        }
        Ok(())
    }

    /// Logs a failed `accept` and waits one monitor interval before the next
    /// attempt. No wait once the server is shutting down.
    pub(super) fn accept_failed(&self, e: &io::Error) {
        warn!(error = %e, "failed to accept connection");
        if !self.cancel.is_cancelled() {
            thread::sleep(Duration::from_millis(self.relay.monitor_interval_ms));
        }
    }

    fn handle(&self, stream: TcpStream, peer: SocketAddr, monitor: &MonitorHandle) {
        info!(%peer, "new client");
        let id = ClientId::from(peer.port());
        if let Err(e) = session::start(id, stream, monitor, &self.relay) {
            warn!(%peer, error = %e, "could not start client session");
        }
    }
}
