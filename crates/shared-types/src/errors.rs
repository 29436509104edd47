//! # Error Types
//!
//! The status taxonomy and the classified error every crate can return when
//! a failure needs a kind attached.

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Error classification mirroring HTTP status semantics.
///
/// The discriminant is the wire code. It is a tag, not a literal HTTP
/// response; use [`ErrorKind::http_status`] when a status line is needed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "i32", try_from = "i32")]
#[repr(i32)]
pub enum ErrorKind {
    /// Invalid syntax.
    BadRequest = 0,
    /// The client must authenticate itself.
    Unauthorized = 1,
    /// Reserved for digital payment systems.
    PaymentRequired = 2,
    /// Identity is known but lacks access rights.
    Forbidden = 3,
    /// The requested resource does not exist.
    NotFound = 4,
    /// The method is known but disabled for this resource.
    MethodNotAllowed = 5,
    /// No content matches the negotiated criteria.
    NotAcceptable = 6,
    /// Authentication must be done by a proxy.
    ProxyAuthenticationRequired = 7,
    /// The server wants to shut down an idle connection.
    RequestTimeout = 8,
    /// The request conflicts with the current state.
    Conflict = 9,
    /// The resource was permanently deleted.
    Gone = 10,
    /// `Content-Length` is required.
    LengthRequired = 11,
    /// A precondition in the headers was not met.
    PreconditionFailed = 12,
    /// The payload exceeds server limits.
    PayloadTooLarge = 13,
    /// The URI is longer than the server will interpret.
    UriTooLong = 14,
    /// The media format is not supported.
    UnsupportedMediaType = 15,
    /// The requested range cannot be fulfilled.
    RequestedRangeNotSatisfiable = 16,
    /// The `Expect` header cannot be met.
    ExpectationFailed = 17,
    /// Well-formed but semantically invalid.
    UnprocessableEntity = 18,
    /// The resource is locked.
    Locked = 19,
    /// A previous request this one depends on failed.
    FailedDependency = 20,
    /// The request might be replayed.
    TooEarly = 21,
    /// The client should switch protocols.
    UpgradeRequired = 22,
    /// The request must be conditional.
    PreconditionRequired = 23,
    /// Rate limited.
    TooManyRequests = 24,
    /// Header fields are too large.
    RequestHeaderFieldsTooLarge = 25,
    /// Unavailable for legal reasons.
    UnavailableForLegalReasons = 26,
    /// Generic server-side failure.
    InternalServerError = 27,
    /// The method is not supported by the server.
    NotImplemented = 28,
    /// Invalid response from an upstream server.
    BadGateway = 29,
    /// The server is not ready to handle the request.
    ServiceUnavailable = 30,
    /// No timely response from an upstream server.
    GatewayTimeout = 31,
    /// The HTTP version is not supported.
    HttpVersionNotSupported = 32,
    /// Circular content negotiation.
    VariantAlsoNegotiates = 33,
    /// The server cannot store the representation.
    InsufficientStorage = 34,
    /// Infinite loop detected while processing.
    LoopDetected = 35,
    /// Further extensions are required.
    NotExtended = 36,
    /// The client needs to authenticate to gain network access.
    NetworkAuthenticationRequired = 37,
}

impl ErrorKind {
    /// Every kind, ordered by code.
    pub const ALL: [ErrorKind; 38] = [
        ErrorKind::BadRequest,
        ErrorKind::Unauthorized,
        ErrorKind::PaymentRequired,
        ErrorKind::Forbidden,
        ErrorKind::NotFound,
        ErrorKind::MethodNotAllowed,
        ErrorKind::NotAcceptable,
        ErrorKind::ProxyAuthenticationRequired,
        ErrorKind::RequestTimeout,
        ErrorKind::Conflict,
        ErrorKind::Gone,
        ErrorKind::LengthRequired,
        ErrorKind::PreconditionFailed,
        ErrorKind::PayloadTooLarge,
        ErrorKind::UriTooLong,
        ErrorKind::UnsupportedMediaType,
        ErrorKind::RequestedRangeNotSatisfiable,
        ErrorKind::ExpectationFailed,
        ErrorKind::UnprocessableEntity,
        ErrorKind::Locked,
        ErrorKind::FailedDependency,
        ErrorKind::TooEarly,
        ErrorKind::UpgradeRequired,
        ErrorKind::PreconditionRequired,
        ErrorKind::TooManyRequests,
        ErrorKind::RequestHeaderFieldsTooLarge,
        ErrorKind::UnavailableForLegalReasons,
        ErrorKind::InternalServerError,
        ErrorKind::NotImplemented,
        ErrorKind::BadGateway,
        ErrorKind::ServiceUnavailable,
        ErrorKind::GatewayTimeout,
        ErrorKind::HttpVersionNotSupported,
        ErrorKind::VariantAlsoNegotiates,
        ErrorKind::InsufficientStorage,
        ErrorKind::LoopDetected,
        ErrorKind::NotExtended,
        ErrorKind::NetworkAuthenticationRequired,
    ];

    /// The integer wire code.
    #[must_use]
    pub fn code(self) -> i32 {
        self as i32
    }

    /// Look up a kind by its wire code.
    #[must_use]
    pub fn from_code(code: i32) -> Option<Self> {
        usize::try_from(code)
            .ok()
            .and_then(|idx| Self::ALL.get(idx).copied())
    }

    /// The HTTP status this kind corresponds to.
    #[must_use]
    pub fn http_status(self) -> u16 {
        match self {
            Self::BadRequest => 400,
            Self::Unauthorized => 401,
            Self::PaymentRequired => 402,
            Self::Forbidden => 403,
            Self::NotFound => 404,
            Self::MethodNotAllowed => 405,
            Self::NotAcceptable => 406,
            Self::ProxyAuthenticationRequired => 407,
            Self::RequestTimeout => 408,
            Self::Conflict => 409,
            Self::Gone => 410,
            Self::LengthRequired => 411,
            Self::PreconditionFailed => 412,
            Self::PayloadTooLarge => 413,
            Self::UriTooLong => 414,
            Self::UnsupportedMediaType => 415,
            Self::RequestedRangeNotSatisfiable => 416,
            Self::ExpectationFailed => 417,
            Self::UnprocessableEntity => 422,
            Self::Locked => 423,
            Self::FailedDependency => 424,
            Self::TooEarly => 425,
            Self::UpgradeRequired => 426,
            Self::PreconditionRequired => 428,
            Self::TooManyRequests => 429,
            Self::RequestHeaderFieldsTooLarge => 431,
            Self::UnavailableForLegalReasons => 451,
            Self::InternalServerError => 500,
            Self::NotImplemented => 501,
            Self::BadGateway => 502,
            Self::ServiceUnavailable => 503,
            Self::GatewayTimeout => 504,
            Self::HttpVersionNotSupported => 505,
            Self::VariantAlsoNegotiates => 506,
            Self::InsufficientStorage => 507,
            Self::LoopDetected => 508,
            Self::NotExtended => 510,
            Self::NetworkAuthenticationRequired => 511,
        }
    }
}

impl From<ErrorKind> for i32 {
    fn from(kind: ErrorKind) -> Self {
        kind.code()
    }
}

/// Returned when an integer is not a known [`ErrorKind`] code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("Unknown error kind code: {0}")]
pub struct UnknownErrorKind(pub i32);

impl TryFrom<i32> for ErrorKind {
    type Error = UnknownErrorKind;

    fn try_from(code: i32) -> Result<Self, Self::Error> {
        Self::from_code(code).ok_or(UnknownErrorKind(code))
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?} ({})", self, self.code())
    }
}

/// A failure tagged with an [`ErrorKind`] and a machine-readable message.
///
/// `Display` renders only the underlying error text; the kind and message
/// are for callers that translate errors into responses.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{err}")]
pub struct DomainError {
    err: String,
    kind: ErrorKind,
    message: String,
}

impl DomainError {
    /// Wrap `err` with a classification.
    pub fn new(err: impl fmt::Display, kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            err: err.to_string(),
            kind,
            message: message.into(),
        }
    }

    /// The classification tag.
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    /// The machine-readable message, e.g. `client_has_not_been_initiated`.
    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }
}
