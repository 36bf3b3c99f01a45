//! # chatrelay
//!
//! `chatrelay` is a TCP chat relay: every line a connected client sends is
//! fanned out to every connected client. The server runs one listener and one
//! sender thread per client plus a single monitor thread that moves messages
//! between them.
//!
//! ## Core Modules
//!
//! - `transport`: frame codec, connection handle and the TCP acceptor.
//! - `broker`: message buffers, the client registry and the monitor.
//! - `session`: the per-client listener and sender threads.
//! - `client`: the console chat client.
//! - `config`: loading and merging configuration.
//! - `utils`: error type and logging bootstrap.

pub mod broker;
pub mod client;
pub mod config;
pub mod session;
pub mod transport;
pub mod utils;

#[cfg(test)]
pub(crate) mod test_support;
