//! The `error` module defines the error type shared by the whole crate.
//!
//! Per-connection I/O failures never show up here: the connection handle
//! contains them and turns them into a disconnect. What remains are contract
//! violations (caught where a value is assigned), frame decode failures and
//! bootstrap errors (bind, connect, configuration).

use thiserror::Error;

use crate::transport::message::ClientId;

#[derive(Error, Debug)]
pub enum RelayError {
    /// A message body contained the frame separator.
    #[error("message body contains the frame separator: {0:?}")]
    SeparatorInBody(String),

    /// A frame was not valid UTF-8.
    #[error("frame is not valid UTF-8: {0}")]
    InvalidUtf8(#[from] std::str::Utf8Error),

    /// A frame announced a known version but its fields did not parse.
    #[error("malformed frame: {0}")]
    MalformedFrame(String),

    /// Host or port settings that can never be bound or connected to.
    #[error("invalid settings: {0}")]
    InvalidSettings(String),

    /// A listener and a sender that do not belong to the same client.
    #[error("listener #{listener} and sender #{sender} do not form a pair")]
    RegistrationMismatch { listener: ClientId, sender: ClientId },

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration sources that failed to load or deserialize.
    #[error("configuration error: {0}")]
    Config(#[from] config::ConfigError),
}

/// Result type alias
pub type Result<T> = std::result::Result<T, RelayError>;
