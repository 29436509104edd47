//! # Subscriber Side
//!
//! Message handlers and the subscription handle returned by a broker.

use crate::message::Message;
use async_trait::async_trait;
use std::future::Future;
use std::sync::Weak;
use tokio::task::JoinHandle;
use tracing::debug;

/// Callback invoked for every delivered message.
///
/// A message is acknowledged once `handle` returns.
#[async_trait]
pub trait MessageHandler: Send + Sync {
    /// Process one message.
    async fn handle(&self, message: Message);
}

/// Adapts an async closure into a [`MessageHandler`].
pub struct HandlerFn<F>(F);

/// Wrap an async closure as a handler.
///
/// ```rust,ignore
/// let handler = handler_fn(|msg: Message| async move {
///     tracing::info!(seq = msg.sequence, "received");
/// });
/// ```
pub fn handler_fn<F, Fut>(f: F) -> HandlerFn<F>
where
    F: Fn(Message) -> Fut + Send + Sync,
    Fut: Future<Output = ()> + Send + 'static,
{
    HandlerFn(f)
}

#[async_trait]
impl<F, Fut> MessageHandler for HandlerFn<F>
where
    F: Fn(Message) -> Fut + Send + Sync,
    Fut: Future<Output = ()> + Send + 'static,
{
    async fn handle(&self, message: Message) {
        (self.0)(message).await;
    }
}

/// Broker-side bookkeeping a subscription detaches from when released.
pub(crate) trait SubscriptionRegistry: Send + Sync {
    /// Drop the member. `forget_durable` also discards its stored cursor.
    fn remove(&self, id: u64, forget_durable: bool);
}

/// An open subscription.
///
/// Dropping the handle behaves like [`Subscription::close`]: delivery stops
/// but a durable cursor is kept for the next subscriber under that name.
pub struct Subscription {
    id: u64,
    subject: String,
    queue_group: String,
    durable_name: Option<String>,
    task: Option<JoinHandle<()>>,
    registry: Option<Weak<dyn SubscriptionRegistry>>,
    released: bool,
}

impl Subscription {
    pub(crate) fn new(
        id: u64,
        subject: String,
        queue_group: String,
        durable_name: Option<String>,
        task: JoinHandle<()>,
        registry: Weak<dyn SubscriptionRegistry>,
    ) -> Self {
        Self {
            id,
            subject,
            queue_group,
            durable_name,
            task: Some(task),
            registry: Some(registry),
            released: false,
        }
    }

    /// A handle with no delivery task behind it, for broker fakes.
    pub fn detached(
        id: u64,
        subject: impl Into<String>,
        queue_group: impl Into<String>,
        durable_name: Option<String>,
    ) -> Self {
        Self {
            id,
            subject: subject.into(),
            queue_group: queue_group.into(),
            durable_name,
            task: None,
            registry: None,
            released: false,
        }
    }

    /// Broker-assigned identifier.
    #[must_use]
    pub fn id(&self) -> u64 {
        self.id
    }

    /// Subscribed subject.
    #[must_use]
    pub fn subject(&self) -> &str {
        &self.subject
    }

    /// Queue group, empty for a plain subscription.
    #[must_use]
    pub fn queue_group(&self) -> &str {
        &self.queue_group
    }

    /// Durable name, if any.
    #[must_use]
    pub fn durable_name(&self) -> Option<&str> {
        self.durable_name.as_deref()
    }

    /// Whether the delivery task is still running.
    #[must_use]
    pub fn is_active(&self) -> bool {
        !self.released && self.task.as_ref().is_some_and(|task| !task.is_finished())
    }

    /// Stop delivery and keep the durable cursor.
    pub fn close(mut self) {
        self.release(false);
    }

    /// Stop delivery and discard the durable cursor.
    pub fn unsubscribe(mut self) {
        self.release(true);
    }

    fn release(&mut self, forget_durable: bool) {
        if self.released {
            return;
        }
        self.released = true;

        if let Some(registry) = self.registry.as_ref().and_then(Weak::upgrade) {
            registry.remove(self.id, forget_durable);
        }
        if let Some(task) = self.task.take() {
            task.abort();
        }
        debug!(subject = %self.subject, id = self.id, forget_durable, "Subscription released");
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.release(false);
    }
}

impl std::fmt::Debug for Subscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription")
            .field("id", &self.id)
            .field("subject", &self.subject)
            .field("queue_group", &self.queue_group)
            .field("durable_name", &self.durable_name)
            .finish()
    }
}
