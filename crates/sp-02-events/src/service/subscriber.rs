//! # Event Subscriber
//!
//! Opens one durable, queue-grouped subscription from a
//! [`SubscriberConfig`]. Failure to parse the start policy or to open the
//! subscription is logged and yields `None`; there is no retry.

use crate::domain::{StartPolicy, SubscriberConfig};
use shared_bus::{MessageBroker, MessageHandler, Subscription, SubscriptionOptions};
use shared_types::{SystemTimeSource, TimeSource};
use std::sync::Arc;
use tracing::{error, info};

/// Configured, not-yet-opened subscription.
pub struct Subscriber {
    broker: Arc<dyn MessageBroker>,
    config: SubscriberConfig,
    handler: Arc<dyn MessageHandler>,
    clock: Arc<dyn TimeSource>,
}

impl Subscriber {
    /// Subscriber using the system clock for relative start policies.
    pub fn new(
        broker: Arc<dyn MessageBroker>,
        config: SubscriberConfig,
        handler: Arc<dyn MessageHandler>,
    ) -> Self {
        Self {
            broker,
            config,
            handler,
            clock: Arc::new(SystemTimeSource),
        }
    }

    /// Replace the clock `since:` policies are anchored to.
    #[must_use]
    pub fn with_clock(mut self, clock: Arc<dyn TimeSource>) -> Self {
        self.clock = clock;
        self
    }

    /// The configuration this subscriber opens with.
    pub fn config(&self) -> &SubscriberConfig {
        &self.config
    }

    /// Open the subscription.
    ///
    /// Returns `None` if the start policy is malformed (the broker is not
    /// contacted) or the broker rejects the subscription.
    pub async fn subscribe(&self) -> Option<Subscription> {
        let subject = &self.config.subject;

        let policy = match StartPolicy::parse(&self.config.start_at) {
            Ok(policy) => policy,
            Err(e) => {
                error!(subject = %subject, error = %e, "Error when subscribing topic");
                return None;
            }
        };

        let durable_name = Some(self.config.durable_name.clone()).filter(|name| !name.is_empty());
        let options = SubscriptionOptions {
            durable_name,
            start: policy.resolve(self.clock.now()),
        };

        match self
            .broker
            .queue_subscribe(
                subject,
                &self.config.queue_group,
                options,
                Arc::clone(&self.handler),
            )
            .await
        {
            Ok(subscription) => {
                info!(
                    subject = %subject,
                    queue_group = %self.config.queue_group,
                    durable = %self.config.durable_name,
                    start_at = %self.config.start_at,
                    "Subscribed topic"
                );
                Some(subscription)
            }
            Err(e) => {
                error!(subject = %subject, error = %e, "Error when subscribing topic");
                None
            }
        }
    }
}
