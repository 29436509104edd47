//! Error types for the events subsystem.

use thiserror::Error;

/// Failure of a call through a [`crate::PublishedEndpoint`].
#[derive(Debug, Error)]
pub enum PublishedError<E> {
    /// The request could not be serialized; the endpoint did not run.
    #[error("Failed to serialize request: {0}")]
    Serialize(#[source] serde_json::Error),

    /// The request serialized to something other than a JSON object; the
    /// endpoint did not run.
    #[error("Request must serialize to a JSON object")]
    NotAnObject,

    /// The wrapped endpoint failed. No commit was published.
    #[error("{0}")]
    Endpoint(E),
}

impl<E> PublishedError<E> {
    /// The endpoint's own error, if that is what failed.
    pub fn into_endpoint(self) -> Option<E> {
        match self {
            Self::Endpoint(e) => Some(e),
            _ => None,
        }
    }
}
