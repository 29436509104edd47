//! Service layer: the publishing middleware and the subscriber.

pub mod publisher;
pub mod subscriber;

pub use publisher::{EventPublisher, PublishedEndpoint, PublisherStats};
pub use subscriber::Subscriber;
