//! Domain layer: envelopes, start policies and subscriber configuration.

pub mod config;
pub mod envelope;
pub mod start_policy;

pub use config::SubscriberConfig;
pub use envelope::{Envelope, EventPhase};
pub use start_policy::{StartPolicy, StartPolicyError};
