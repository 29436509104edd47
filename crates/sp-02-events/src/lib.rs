//! # Events Subsystem
//!
//! Audit-trail eventing around request handlers, and durable subscribers
//! for consuming it.
//!
//! ## Publishing
//!
//! [`EventPublisher::store`] wraps an [`Endpoint`]. Every call publishes a
//! begin envelope before the endpoint runs and, only if it succeeds, a
//! commit envelope after:
//!
//! ```text
//! request ──serialize──→ {subject}.begin ──→ endpoint ──Ok──→ {subject}.commit
//!    │                                          │
//!    └─ not a JSON object: fail, nothing sent   └─ Err: no commit, error returned
//! ```
//!
//! A begin without a matching commit marks an operation that failed (or is
//! still in flight). Publish failures never change the endpoint's result.
//!
//! ## Subscribing
//!
//! [`Subscriber`] opens a durable, queue-grouped subscription whose replay
//! point comes from a start-policy string:
//!
//! | String          | Replay from                    |
//! |-----------------|--------------------------------|
//! | `all`           | all retained history           |
//! | `since:<dur>`   | `<dur>` before now (`since:2h`) |
//! | `time:<secs>`   | absolute Unix time             |
//! | `seqno:<n>`     | sequence number `n`            |
//! | anything else   | new messages only              |
//!
//! A malformed parameter or a broker rejection yields no subscription.

#![cfg_attr(test, allow(clippy::unwrap_used))]

pub mod domain;
pub mod error;
pub mod ports;
pub mod service;

pub use domain::{Envelope, EventPhase, StartPolicy, StartPolicyError, SubscriberConfig};
pub use error::PublishedError;
pub use ports::{endpoint_fn, Endpoint, EndpointFn};
pub use service::{EventPublisher, PublishedEndpoint, PublisherStats, Subscriber};
