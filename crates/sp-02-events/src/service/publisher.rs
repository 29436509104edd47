//! # Event Publisher
//!
//! Middleware that brackets an endpoint with begin/commit envelopes.
//!
//! Ordering within one call is strict: begin publish, then the endpoint,
//! then (on success) commit publish. Across concurrent calls the broker
//! alone decides delivery order.

use crate::domain::{Envelope, EventPhase};
use crate::error::PublishedError;
use crate::ports::Endpoint;
use async_trait::async_trait;
use serde::Serialize;
use serde_json::Value;
use shared_bus::MessageBroker;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tracing::{debug, error, warn};

/// Publishes begin/commit envelopes around wrapped endpoints.
pub struct EventPublisher {
    broker: Arc<dyn MessageBroker>,
    stats: Arc<PublisherStats>,
}

/// Publish counters shared by every endpoint a publisher wrapped.
#[derive(Debug, Default)]
pub struct PublisherStats {
    begins: AtomicU64,
    commits: AtomicU64,
    failures: AtomicU64,
}

impl PublisherStats {
    /// Begin envelopes published.
    pub fn begins(&self) -> u64 {
        self.begins.load(Ordering::Relaxed)
    }

    /// Commit envelopes published.
    pub fn commits(&self) -> u64 {
        self.commits.load(Ordering::Relaxed)
    }

    /// Envelopes that could not be encoded or published.
    pub fn failures(&self) -> u64 {
        self.failures.load(Ordering::Relaxed)
    }
}

impl EventPublisher {
    /// Publisher over `broker`.
    pub fn new(broker: Arc<dyn MessageBroker>) -> Self {
        Self {
            broker,
            stats: Arc::new(PublisherStats::default()),
        }
    }

    /// Wrap `endpoint` so each call is reported on `{subject}.begin` and,
    /// when it succeeds, `{subject}.commit`.
    pub fn store<E>(
        &self,
        domain: impl Into<String>,
        model: impl Into<String>,
        event_type: impl Into<String>,
        subject: impl Into<String>,
        endpoint: E,
    ) -> PublishedEndpoint<E>
    where
        E: Endpoint,
    {
        PublishedEndpoint {
            broker: Arc::clone(&self.broker),
            stats: Arc::clone(&self.stats),
            domain: domain.into(),
            model: model.into(),
            event_type: event_type.into(),
            subject: subject.into(),
            inner: endpoint,
        }
    }

    /// Publish counters.
    pub fn stats(&self) -> &PublisherStats {
        &self.stats
    }
}

/// An endpoint wrapped by [`EventPublisher::store`].
pub struct PublishedEndpoint<E> {
    broker: Arc<dyn MessageBroker>,
    stats: Arc<PublisherStats>,
    domain: String,
    model: String,
    event_type: String,
    subject: String,
    inner: E,
}

impl<E> PublishedEndpoint<E> {
    /// Base subject; envelopes go to its `.begin` and `.commit` children.
    pub fn subject(&self) -> &str {
        &self.subject
    }

    fn envelope(&self, data: Value) -> Envelope {
        Envelope {
            domain: self.domain.clone(),
            model: self.model.clone(),
            event_type: self.event_type.clone(),
            data,
        }
    }

    async fn send(&self, phase: EventPhase, envelope: &Envelope) {
        let topic = phase.topic(&self.subject);
        let payload = match envelope.to_bytes() {
            Ok(payload) => payload,
            Err(e) => {
                self.stats.failures.fetch_add(1, Ordering::Relaxed);
                error!(topic = %topic, error = %e, "Failed to encode envelope");
                return;
            }
        };

        match self.broker.publish(&topic, payload).await {
            Ok(sequence) => {
                let counter = match phase {
                    EventPhase::Begin => &self.stats.begins,
                    EventPhase::Commit => &self.stats.commits,
                };
                counter.fetch_add(1, Ordering::Relaxed);
                debug!(
                    topic = %topic,
                    sequence,
                    domain = %envelope.domain,
                    model = %envelope.model,
                    event_type = %envelope.event_type,
                    "Published envelope"
                );
            }
            Err(e) => {
                self.stats.failures.fetch_add(1, Ordering::Relaxed);
                warn!(topic = %topic, error = %e, "Failed to publish envelope");
            }
        }
    }
}

#[async_trait]
impl<E> Endpoint for PublishedEndpoint<E>
where
    E: Endpoint,
    E::Request: Serialize,
    E::Response: Serialize,
{
    type Request = E::Request;
    type Response = E::Response;
    type Error = PublishedError<E::Error>;

    async fn call(&self, request: Self::Request) -> Result<Self::Response, Self::Error> {
        let data = serde_json::to_value(&request).map_err(PublishedError::Serialize)?;
        if !data.is_object() {
            return Err(PublishedError::NotAnObject);
        }

        self.send(EventPhase::Begin, &self.envelope(data)).await;

        let response = self
            .inner
            .call(request)
            .await
            .map_err(PublishedError::Endpoint)?;

        match serde_json::to_value(&response) {
            Ok(data) => self.send(EventPhase::Commit, &self.envelope(data)).await,
            Err(e) => {
                self.stats.failures.fetch_add(1, Ordering::Relaxed);
                error!(subject = %self.subject, error = %e, "Failed to serialize response, commit skipped");
            }
        }

        Ok(response)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ports::endpoint_fn;
    use serde::Deserialize;
    use serde_json::json;
    use shared_bus::InMemoryBroker;

    #[derive(Debug, Serialize, Deserialize)]
    struct Create {
        name: String,
    }

    #[derive(Debug, PartialEq, Serialize)]
    struct Created {
        id: u64,
        name: String,
    }

    fn envelopes(broker: &InMemoryBroker, topic: &str) -> Vec<Envelope> {
        broker
            .retained(topic)
            .iter()
            .map(|m| Envelope::from_message(m).unwrap())
            .collect()
    }

    #[tokio::test]
    async fn test_success_publishes_begin_then_commit() {
        let broker = Arc::new(InMemoryBroker::new());
        let publisher = EventPublisher::new(broker.clone());
        let endpoint = publisher.store(
            "crm",
            "user",
            "created",
            "crm.user",
            endpoint_fn(|req: Create| async move {
                Ok::<_, String>(Created { id: 9, name: req.name })
            }),
        );

        let out = endpoint.call(Create { name: "ada".into() }).await.unwrap();
        assert_eq!(out, Created { id: 9, name: "ada".into() });

        let begins = envelopes(&broker, "crm.user.begin");
        let commits = envelopes(&broker, "crm.user.commit");
        assert_eq!(begins.len(), 1);
        assert_eq!(commits.len(), 1);
        assert_eq!(begins[0].data, json!({"name": "ada"}));
        assert_eq!(commits[0].data, json!({"id": 9, "name": "ada"}));
        assert_eq!(commits[0].event_type, "created");
        assert!(
            broker.retained("crm.user.begin")[0].timestamp
                <= broker.retained("crm.user.commit")[0].timestamp
        );
        assert_eq!(publisher.stats().begins(), 1);
        assert_eq!(publisher.stats().commits(), 1);
    }

    #[tokio::test]
    async fn test_error_publishes_begin_only() {
        let broker = Arc::new(InMemoryBroker::new());
        let publisher = EventPublisher::new(broker.clone());
        let endpoint = publisher.store(
            "crm",
            "user",
            "created",
            "crm.user",
            endpoint_fn(|_: Create| async move { Err::<Created, _>("duplicate".to_string()) }),
        );

        let err = endpoint.call(Create { name: "ada".into() }).await.unwrap_err();
        assert_eq!(err.into_endpoint().as_deref(), Some("duplicate"));
        assert_eq!(broker.last_sequence("crm.user.begin"), 1);
        assert_eq!(broker.last_sequence("crm.user.commit"), 0);
    }

    #[tokio::test]
    async fn test_non_object_request_is_rejected_before_anything_runs() {
        let broker = Arc::new(InMemoryBroker::new());
        let publisher = EventPublisher::new(broker.clone());
        let ran = Arc::new(AtomicU64::new(0));
        let calls = ran.clone();
        let endpoint = publisher.store(
            "crm",
            "user",
            "deleted",
            "crm.user",
            endpoint_fn(move |_: u64| {
                let calls = calls.clone();
                async move {
                    calls.fetch_add(1, Ordering::SeqCst);
                    Ok::<_, ()>(())
                }
            }),
        );

        assert!(matches!(endpoint.call(7).await, Err(PublishedError::NotAnObject)));
        assert_eq!(ran.load(Ordering::SeqCst), 0);
        assert_eq!(broker.events_published(), 0);
    }

    #[tokio::test]
    async fn test_publish_failure_does_not_fail_call() {
        let broker = Arc::new(InMemoryBroker::new());
        broker.close();
        let publisher = EventPublisher::new(broker.clone());
        let endpoint = publisher.store(
            "crm",
            "user",
            "created",
            "crm.user",
            endpoint_fn(|req: Create| async move { Ok::<_, ()>(req.name) }),
        );

        let out = endpoint.call(Create { name: "ada".into() }).await.unwrap();
        assert_eq!(out, "ada");
        assert_eq!(publisher.stats().failures(), 2);
        assert_eq!(publisher.stats().begins(), 0);
    }
}
