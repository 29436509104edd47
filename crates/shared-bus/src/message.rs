//! # Messages and Subscription Options
//!
//! What flows through the broker, and how a subscriber chooses where in a
//! subject's history to start.

use serde::de::DeserializeOwned;
use std::time::SystemTime;

/// A message delivered to a subscriber.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    /// Subject the message was published to.
    pub subject: String,
    /// Per-subject sequence number, starting at 1.
    pub sequence: u64,
    /// Broker time at publish.
    pub timestamp: SystemTime,
    /// Raw payload.
    pub data: Vec<u8>,
    /// True when delivered from retained history rather than live.
    pub redelivered: bool,
}

impl Message {
    /// Decode the payload as JSON.
    pub fn decode<T: DeserializeOwned>(&self) -> serde_json::Result<T> {
        serde_json::from_slice(&self.data)
    }
}

/// Where a new subscription starts reading a subject.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StartPosition {
    /// Only messages published after the subscription opens.
    #[default]
    NewOnly,
    /// Every retained message.
    AllAvailable,
    /// Retained messages published at or after this instant.
    AtTime(SystemTime),
    /// Retained messages with a sequence number at or above this one.
    AtSequence(u64),
}

impl StartPosition {
    /// Whether a retained message is covered by this start position.
    #[must_use]
    pub fn includes(&self, message: &Message) -> bool {
        match self {
            Self::NewOnly => false,
            Self::AllAvailable => true,
            Self::AtTime(at) => message.timestamp >= *at,
            Self::AtSequence(seq) => message.sequence >= *seq,
        }
    }
}

/// Options for opening a subscription.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SubscriptionOptions {
    /// Durable name; the broker remembers the last acknowledged sequence
    /// under it so a reopened subscription resumes where it left off.
    pub durable_name: Option<String>,
    /// Replay starting point for a subscription without a stored cursor.
    pub start: StartPosition,
}

impl SubscriptionOptions {
    /// Durable subscription with the given start position.
    pub fn durable(name: impl Into<String>, start: StartPosition) -> Self {
        Self {
            durable_name: Some(name.into()),
            start,
        }
    }
}
