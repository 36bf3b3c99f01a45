//! The `client` module is the user-facing side of the chat: it connects to a
//! relay server, prints what the server relays and sends what the user types.

pub mod chat_client;
pub use chat_client::ChatClient;
