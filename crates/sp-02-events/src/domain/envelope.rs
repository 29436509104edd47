//! The begin/commit event envelope.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use shared_bus::Message;

/// Which side of a wrapped call an envelope reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventPhase {
    /// Published before the endpoint runs, carrying the request.
    Begin,
    /// Published after the endpoint succeeded, carrying the response.
    Commit,
}

impl EventPhase {
    /// Subject suffix.
    #[must_use]
    pub fn suffix(self) -> &'static str {
        match self {
            Self::Begin => "begin",
            Self::Commit => "commit",
        }
    }

    /// `{subject}.{suffix}`.
    #[must_use]
    pub fn topic(self, subject: &str) -> String {
        format!("{subject}.{}", self.suffix())
    }
}

/// Payload published to `{subject}.begin` and `{subject}.commit`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Envelope {
    /// Owning domain, e.g. `billing`.
    pub domain: String,
    /// Model within the domain, e.g. `invoice`.
    pub model: String,
    /// What happened, e.g. `created`.
    pub event_type: String,
    /// Request (begin) or response (commit) body.
    pub data: Value,
}

impl Envelope {
    /// Decode an envelope from a delivered message.
    pub fn from_message(message: &Message) -> serde_json::Result<Self> {
        message.decode()
    }

    /// Encode for publishing.
    pub fn to_bytes(&self) -> serde_json::Result<Vec<u8>> {
        serde_json::to_vec(self)
    }
}
