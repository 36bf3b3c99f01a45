//! Client registry
//!
//! Maps client ids to the handles the monitor keeps for each live client:
//! a [`SenderHandle`] (to reach the client's outbound buffer and to see
//! whether it is still connected) and a [`ListenerHandle`] (to disconnect it
//! on shutdown). Only the monitor owns and mutates a `Registry`.

use std::collections::HashMap;
use std::sync::Arc;

use crate::broker::buffer::MessageBuffer;
use crate::transport::connection::Connection;
use crate::transport::message::ClientId;
use crate::utils::error::{RelayError, Result};

#[derive(Debug, Clone)]
pub struct ListenerHandle {
    pub id: ClientId,
    pub connection: Connection,
}

#[derive(Debug, Clone)]
pub struct SenderHandle {
    pub id: ClientId,
    pub connection: Connection,
    pub outbound: Arc<MessageBuffer>,
}

impl SenderHandle {
    pub fn is_connected(&self) -> bool {
        self.connection.is_connected()
    }
}

/// A listener/sender pair for one client, checked to share the id and the
/// cancellation signal.
#[derive(Debug)]
pub struct Registration {
    listener: ListenerHandle,
    sender: SenderHandle,
}

impl Registration {
    pub fn new(listener: ListenerHandle, sender: SenderHandle) -> Result<Self> {
        let paired = listener.id == sender.id
            && listener
                .connection
                .shares_cancellation_with(&sender.connection);
        if !paired {
            return Err(RelayError::RegistrationMismatch {
                listener: listener.id,
                sender: sender.id,
            });
        }
        Ok(Self { listener, sender })
    }

    pub fn id(&self) -> ClientId {
        self.sender.id
    }

    pub fn disconnect(&self) {
        self.listener.connection.disconnect();
        self.sender.connection.disconnect();
    }
}

#[derive(Debug, Default)]
pub struct Registry {
    senders: HashMap<ClientId, SenderHandle>,
    listeners: HashMap<ClientId, ListenerHandle>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a client. A client with the same id is replaced.
    pub fn add(&mut self, registration: Registration) {
        let Registration { listener, sender } = registration;
        self.listeners.insert(listener.id, listener);
        self.senders.insert(sender.id, sender);
    }

    pub fn remove(&mut self, id: ClientId) {
        self.senders.remove(&id);
        self.listeners.remove(&id);
    }

    pub fn contains(&self, id: ClientId) -> bool {
        self.senders.contains_key(&id)
    }

    pub fn len(&self) -> usize {
        self.senders.len()
    }

    pub fn is_empty(&self) -> bool {
        self.senders.is_empty()
    }

    pub fn senders(&self) -> impl Iterator<Item = &SenderHandle> {
        self.senders.values()
    }

    pub fn listeners(&self) -> impl Iterator<Item = &ListenerHandle> {
        self.listeners.values()
    }

    pub fn sender(&self, id: ClientId) -> Option<&SenderHandle> {
        self.senders.get(&id)
    }
}
