use serde::Deserialize;

use crate::utils::error::{RelayError, Result};

/// Top-level configuration settings for the application.
///
/// Includes settings for both the network endpoint and the relay engine.
#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct Settings {
    pub server: ServerSettings,
    pub relay: RelaySettings,
}

/// Where the server listens, or where the client connects to.
#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct ServerSettings {
    pub host: String,
    pub port: u16,
    pub debug: bool,
}

impl ServerSettings {
    /// Rejects settings that can never be bound or connected to.
    pub fn validate(&self) -> Result<()> {
        if self.host.trim().is_empty() {
            return Err(RelayError::InvalidSettings("host must not be empty".into()));
        }
        if self.port == 0 {
            return Err(RelayError::InvalidSettings("port must be positive".into()));
        }
        Ok(())
    }

    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Tuning of the relay engine.
///
/// `buffer_capacity` is advisory: buffers warn past it but never reject.
/// The intervals bound how long the sender and monitor loops wait for new
/// work before checking their connection again.
#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct RelaySettings {
    pub buffer_capacity: usize,
    pub sender_interval_ms: u64,
    pub monitor_interval_ms: u64,
}

impl RelaySettings {
    /// Rejects values that would make the relay loops spin or every push warn.
    pub fn validate(&self) -> Result<()> {
        if self.buffer_capacity == 0 {
            return Err(RelayError::InvalidSettings(
                "buffer_capacity must be positive".into(),
            ));
        }
        if self.sender_interval_ms == 0 {
            return Err(RelayError::InvalidSettings(
                "sender_interval_ms must be positive".into(),
            ));
        }
        if self.monitor_interval_ms == 0 {
            return Err(RelayError::InvalidSettings(
                "monitor_interval_ms must be positive".into(),
            ));
        }
        Ok(())
    }
}

/// Partial configuration settings loaded from files or environment.
///
/// Allows partial specification of settings. Missing values can be filled using defaults.
#[derive(Debug, Deserialize)]
pub struct PartialSettings {
    pub server: Option<PartialServerSettings>,
    pub relay: Option<PartialRelaySettings>,
}

#[derive(Debug, Deserialize)]
pub struct PartialServerSettings {
    pub host: Option<String>,
    pub port: Option<u16>,
    pub debug: Option<bool>,
}

#[derive(Debug, Deserialize)]
pub struct PartialRelaySettings {
    pub buffer_capacity: Option<usize>,
    pub sender_interval_ms: Option<u64>,
    pub monitor_interval_ms: Option<u64>,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 2018,
            debug: false,
        }
    }
}

impl Default for RelaySettings {
    fn default() -> Self {
        Self {
            buffer_capacity: 100,
            sender_interval_ms: 500,
            monitor_interval_ms: 500,
        }
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            server: ServerSettings::default(),
            relay: RelaySettings::default(),
        }
    }
}

impl PartialSettings {
    /// Fills every missing value from `default`.
    pub fn merge(self, default: Settings) -> Settings {
        let server = self.server;
        let relay = self.relay;
        Settings {
            server: ServerSettings {
                host: server
                    .as_ref()
                    .and_then(|s| s.host.clone())
                    .unwrap_or(default.server.host),
                port: server
                    .as_ref()
                    .and_then(|s| s.port)
                    .unwrap_or(default.server.port),
                debug: server
                    .as_ref()
                    .and_then(|s| s.debug)
                    .unwrap_or(default.server.debug),
            },
            relay: RelaySettings {
                buffer_capacity: relay
                    .as_ref()
                    .and_then(|r| r.buffer_capacity)
                    .unwrap_or(default.relay.buffer_capacity),
                sender_interval_ms: relay
                    .as_ref()
                    .and_then(|r| r.sender_interval_ms)
                    .unwrap_or(default.relay.sender_interval_ms),
                monitor_interval_ms: relay
                    .as_ref()
                    .and_then(|r| r.monitor_interval_ms)
                    .unwrap_or(default.relay.monitor_interval_ms),
            },
        }
    }
}
