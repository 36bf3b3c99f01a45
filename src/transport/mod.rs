//! The `transport` module is responsible for network communication with
//! clients over plain TCP.
//!
//! It defines the frame format of a chat message, the connection handle that
//! contains per-socket failures, and the acceptor that turns incoming
//! sockets into registered client sessions.

pub mod connection;
pub mod message;
pub mod tcp;

pub use connection::{Connection, ConnectionState};
pub use message::{ClientId, Message, Version};
pub use tcp::{Server, ShutdownHandle};

#[cfg(test)]
mod tests;
