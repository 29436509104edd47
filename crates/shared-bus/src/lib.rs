//! # Shared Bus - Message Broker Port
//!
//! The narrow interface every starter-pack crate uses to reach a streaming
//! message broker, plus an in-memory broker for single-process use and tests.
//!
//! ## Broker Model
//!
//! ```text
//!  publish(subject, bytes) ──→ ┌────────────────────────────┐
//!                              │ subject log (seq 1, 2, …)  │
//!                              │  retained, bounded         │
//!                              └─────────────┬──────────────┘
//!                                            │ one member per queue group
//!                       ┌────────────────────┼────────────────────┐
//!                       ▼                    ▼                    ▼
//!                 group "workers"      group "audit"         plain subscriber
//!                 (round-robin)        (durable cursor)
//! ```
//!
//! - Every published message gets a per-subject sequence number starting at 1.
//! - A new subscription may replay retained history from a [`StartPosition`].
//! - A durable subscription resumes after the last acknowledged sequence
//!   when it is reopened; its start position is then ignored.
//! - Handlers run on the broker's delivery task, concurrently with publishers.

// Allow in tests
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

pub mod error;
pub mod message;
pub mod publisher;
pub mod subscriber;

// Re-export main types
pub use error::BusError;
pub use message::{Message, StartPosition, SubscriptionOptions};
pub use publisher::{BrokerConfig, InMemoryBroker, MessageBroker};
pub use subscriber::{handler_fn, HandlerFn, MessageHandler, Subscription};

/// Default number of messages retained per subject for replay.
pub const DEFAULT_RETAINED_MESSAGES: usize = 10_000;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_retention() {
        assert_eq!(DEFAULT_RETAINED_MESSAGES, 10_000);
        assert_eq!(
            BrokerConfig::default().max_retained_messages,
            DEFAULT_RETAINED_MESSAGES
        );
    }
}
