//! Configuration for a durable subscriber

use serde::{Deserialize, Serialize};

/// What a [`crate::Subscriber`] subscribes to.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SubscriberConfig {
    /// Subject to read, e.g. `billing.invoice.commit`.
    pub subject: String,
    /// Queue group; members share the stream. Empty for a plain subscription.
    pub queue_group: String,
    /// Durable name the broker stores the cursor under. Empty for none.
    pub durable_name: String,
    /// Start-policy string, see [`crate::StartPolicy::parse`].
    pub start_at: String,
}

impl SubscriberConfig {
    /// Config for a durable queue-group subscriber.
    pub fn new(
        subject: impl Into<String>,
        queue_group: impl Into<String>,
        durable_name: impl Into<String>,
        start_at: impl Into<String>,
    ) -> Self {
        Self {
            subject: subject.into(),
            queue_group: queue_group.into(),
            durable_name: durable_name.into(),
            start_at: start_at.into(),
        }
    }
}
