//! Chat message and its wire codec
//!
//! A frame is the UTF-8 text
//! `<version>######<created_at>######<id>######<body>`. Only version `v1` is
//! defined; frames with any other leading token decode to an empty message,
//! which the connection handle treats as the end of the session.
//!
//! Notes on fields:
//! - `id`: the client the message came from. Unassigned until a server-side
//!   listener stamps it, and written as `-1` on the wire while unassigned.
//! - `body`: free text that never contains the separator; checked when the
//!   body is assigned, not by the encoder.
//! - `created_at`: seconds since the UNIX epoch.

use std::fmt;

use chrono::Utc;
use tracing::debug;

use crate::utils::error::{RelayError, Result};

/// Separator between the fields of a frame.
pub const SEPARATOR: &str = "######";

/// Body value a client sends to end its own session.
pub const QUIT: &str = "quit";

/// Wire marker for a message whose id has not been assigned yet.
const UNASSIGNED_ID: &str = "-1";

/// Identifier of a connected client.
pub type ClientId = u64;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Version {
    #[default]
    V1,
}

impl Version {
    pub fn as_str(&self) -> &'static str {
        match self {
            Version::V1 => "v1",
        }
    }

    fn parse(tag: &str) -> Option<Self> {
        match tag {
            "v1" => Some(Version::V1),
            _ => None,
        }
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    id: Option<ClientId>,
    body: String,
    version: Version,
    created_at: i64,
}

impl Default for Message {
    fn default() -> Self {
        Self {
            id: None,
            body: String::new(),
            version: Version::V1,
            created_at: Utc::now().timestamp(),
        }
    }
}

impl Message {
    /// Builds a fresh message carrying `body`.
    pub fn with_body(body: impl Into<String>) -> Result<Self> {
        let mut message = Self::default();
        message.set_body(body)?;
        Ok(message)
    }

    pub fn id(&self) -> Option<ClientId> {
        self.id
    }

    pub fn set_id(&mut self, id: ClientId) {
        self.id = Some(id);
    }

    pub fn body(&self) -> &str {
        &self.body
    }

    /// Replaces the body, rejecting text that contains [`SEPARATOR`].
    pub fn set_body(&mut self, body: impl Into<String>) -> Result<()> {
        let body = body.into();
        if body.contains(SEPARATOR) {
            return Err(RelayError::SeparatorInBody(body));
        }
        self.body = body;
        Ok(())
    }

    pub fn version(&self) -> Version {
        self.version
    }

    pub fn created_at(&self) -> i64 {
        self.created_at
    }

    /// True if the message asks the server to close the connection.
    pub fn is_quit(&self) -> bool {
        self.body == QUIT
    }

    pub fn is_empty(&self) -> bool {
        self.body.is_empty()
    }

    pub fn encode(&self) -> Vec<u8> {
        let id = match self.id {
            Some(id) => id.to_string(),
            None => UNASSIGNED_ID.to_string(),
        };
        let created_at = self.created_at.to_string();
        let fields: [&str; 4] = [self.version.as_str(), &created_at, &id, &self.body];
        fields.join(SEPARATOR).into_bytes()
    }

    /// Decodes one frame.
    ///
    /// An unknown version yields an empty message rather than an error. A
    /// `v1` frame whose fields do not parse is an error.
    pub fn decode(frame: &[u8]) -> Result<Self> {
        let text = std::str::from_utf8(frame)?;
        let mut parts = text.split(SEPARATOR);
        let tag = parts.next().unwrap_or_default();

        let Some(version) = Version::parse(tag) else {
            debug!(frame = text, "unrecognized message");
            return Ok(Self::default());
        };
        debug!(frame = text, "message {version}");

        let created_at = parts
            .next()
            .ok_or_else(|| RelayError::MalformedFrame("missing creation date".into()))?;
        let created_at: i64 = created_at.parse().map_err(|_| {
            RelayError::MalformedFrame(format!("creation date is not a number: {created_at:?}"))
        })?;
        if created_at <= 0 {
            return Err(RelayError::MalformedFrame(format!(
                "creation date must be positive: {created_at}"
            )));
        }

        let id = parts
            .next()
            .ok_or_else(|| RelayError::MalformedFrame("missing id".into()))?;
        let id = match id {
            UNASSIGNED_ID => None,
            other => Some(other.parse::<ClientId>().map_err(|_| {
                RelayError::MalformedFrame(format!("id is not a non-negative integer: {other:?}"))
            })?),
        };

        let body = parts
            .next()
            .ok_or_else(|| RelayError::MalformedFrame("missing body".into()))?;

        Ok(Self {
            id,
            body: body.to_string(),
            version,
            created_at,
        })
    }
}
