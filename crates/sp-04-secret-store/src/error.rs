//! Error types for the secret store client.

use shared_types::{DomainError, ErrorKind};
use thiserror::Error;

/// Secret store failure.
#[derive(Debug, Error)]
pub enum SecretStoreError {
    #[error("Secret store client has not been initiated: {0}")]
    NotInitialized(String),

    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Vault returned {status} for {path}: {body}")]
    Status { status: u16, path: String, body: String },

    #[error("Failed to parse response: {0}")]
    Parse(String),

    #[error("Missing field in response: {0}")]
    MissingField(String),

    #[error("Config field {0} is not a string")]
    UnsupportedField(String),

    #[error("Invalid base64 plaintext: {0}")]
    Decode(#[from] base64::DecodeError),
}

impl SecretStoreError {
    /// Classification for callers translating failures into responses.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::NotInitialized(_) | Self::UnsupportedField(_) => ErrorKind::InternalServerError,
            Self::Http(e) if e.is_timeout() => ErrorKind::GatewayTimeout,
            Self::Http(_) => ErrorKind::ServiceUnavailable,
            Self::Status { status, .. } => ErrorKind::ALL
                .iter()
                .copied()
                .find(|kind| kind.http_status() == *status)
                .unwrap_or(ErrorKind::BadGateway),
            Self::Parse(_) | Self::MissingField(_) | Self::Decode(_) => ErrorKind::BadGateway,
        }
    }

    /// Machine-readable message.
    pub fn message(&self) -> &'static str {
        match self {
            Self::NotInitialized(_) => "client_has_not_been_initiated",
            Self::Http(_) => "secret_store_unreachable",
            Self::Status { .. } => "secret_store_rejected_request",
            Self::Parse(_) | Self::MissingField(_) | Self::Decode(_) => {
                "secret_store_invalid_response"
            }
            Self::UnsupportedField(_) => "config_field_not_a_string",
        }
    }
}

impl From<SecretStoreError> for DomainError {
    fn from(err: SecretStoreError) -> Self {
        DomainError::new(&err, err.kind(), err.message())
    }
}
