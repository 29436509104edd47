//! # Start Policy
//!
//! Parsing of the start-at string that chooses where a new subscription
//! begins reading a subject.

use shared_bus::StartPosition;
use std::num::ParseIntError;
use std::time::{Duration, SystemTime, UNIX_EPOCH};
use thiserror::Error;

/// Replay strategy for a new subscription.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StartPolicy {
    /// Entire retained history.
    All,
    /// Starting this long before now.
    Since(Duration),
    /// Starting at this Unix time (seconds).
    Time(u64),
    /// Starting at this sequence number.
    Sequence(u64),
    /// No replay; new messages only.
    Default,
}

/// A recognised start policy with an unparseable parameter.
#[derive(Debug, Clone, Error)]
pub enum StartPolicyError {
    #[error("Invalid duration in start policy {input:?}: {source}")]
    InvalidDuration {
        input: String,
        #[source]
        source: humantime::DurationError,
    },

    #[error("Invalid unix timestamp in start policy {input:?}: {source}")]
    InvalidTimestamp {
        input: String,
        #[source]
        source: ParseIntError,
    },

    #[error("Invalid sequence number in start policy {input:?}: {source}")]
    InvalidSequence {
        input: String,
        #[source]
        source: ParseIntError,
    },
}

impl StartPolicy {
    /// Parse `all`, `since:<duration>`, `time:<unix-seconds>` or
    /// `seqno:<n>`. Any other string is [`StartPolicy::Default`].
    ///
    /// Durations use humantime syntax (`90s`, `2h`, `1h 30m`).
    pub fn parse(input: &str) -> Result<Self, StartPolicyError> {
        let input = input.trim();
        if input == "all" {
            return Ok(Self::All);
        }

        let Some((kind, param)) = input.split_once(':') else {
            return Ok(Self::Default);
        };
        let param = param.trim();

        match kind {
            "since" => humantime::parse_duration(param)
                .map(Self::Since)
                .map_err(|source| StartPolicyError::InvalidDuration {
                    input: input.to_string(),
                    source,
                }),
            "time" => param
                .parse()
                .map(Self::Time)
                .map_err(|source| StartPolicyError::InvalidTimestamp {
                    input: input.to_string(),
                    source,
                }),
            "seqno" => param
                .parse()
                .map(Self::Sequence)
                .map_err(|source| StartPolicyError::InvalidSequence {
                    input: input.to_string(),
                    source,
                }),
            _ => Ok(Self::Default),
        }
    }

    /// Broker start position, with relative policies anchored at `now`.
    #[must_use]
    pub fn resolve(self, now: SystemTime) -> StartPosition {
        match self {
            Self::All => StartPosition::AllAvailable,
            Self::Since(ago) => StartPosition::AtTime(now.checked_sub(ago).unwrap_or(UNIX_EPOCH)),
            Self::Time(secs) => StartPosition::AtTime(UNIX_EPOCH + Duration::from_secs(secs)),
            Self::Sequence(seq) => StartPosition::AtSequence(seq),
            Self::Default => StartPosition::NewOnly,
        }
    }
}
