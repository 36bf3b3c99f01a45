//! Message buffer
//!
//! A `MessageBuffer` is the mailbox between two threads: every client's
//! outbound buffer (monitor → sender) and the single inbound buffer
//! (listeners → monitor). Every push and pop holds the buffer's lock, so the
//! inbound buffer's lock is the one lock all listeners share with the
//! monitor.
//!
//! Removal is last-in-first-out. `capacity` is advisory: pushes past it are
//! accepted and only logged.

use std::sync::{Condvar, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use tracing::warn;

use crate::transport::message::Message;

#[derive(Debug)]
pub struct MessageBuffer {
    items: Mutex<Vec<Message>>,
    ready: Condvar,
    capacity: usize,
}

impl MessageBuffer {
    /// Default advisory capacity.
    pub const DEFAULT_CAPACITY: usize = 100;

    pub fn new(capacity: usize) -> Self {
        Self {
            items: Mutex::new(Vec::new()),
            ready: Condvar::new(),
            capacity,
        }
    }

    fn items(&self) -> MutexGuard<'_, Vec<Message>> {
        self.items.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn push(&self, message: Message) {
        let mut items = self.items();
        items.push(message);
        if items.len() > self.capacity {
            warn!(
                len = items.len(),
                capacity = self.capacity,
                "buffer is over its advisory capacity"
            );
        }
        drop(items);
        self.ready.notify_all();
    }

    /// Removes the most recently pushed message.
    pub fn pop(&self) -> Option<Message> {
        self.items().pop()
    }

    pub fn len(&self) -> usize {
        self.items().len()
    }

    pub fn is_empty(&self) -> bool {
        self.items().is_empty()
    }

    /// Blocks until the buffer holds a message or `timeout` elapses.
    /// Returns whether a message is waiting.
    pub fn wait_timeout(&self, timeout: Duration) -> bool {
        let items = self.items();
        let (items, _) = self
            .ready
            .wait_timeout_while(items, timeout, |items| items.is_empty())
            .unwrap_or_else(PoisonError::into_inner);
        !items.is_empty()
    }
}

impl Default for MessageBuffer {
    fn default() -> Self {
        Self::new(Self::DEFAULT_CAPACITY)
    }
}
