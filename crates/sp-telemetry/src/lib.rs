//! # Starter-Pack Telemetry
//!
//! Logging bootstrap shared by every service built on the starter pack.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use sp_telemetry::{init_logging, TelemetryConfig};
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let _guard = init_logging(&TelemetryConfig::from_env())?;
//!     sp_telemetry::log_event!(info, "locker", "service started");
//!     Ok(())
//! }
//! ```
//!
//! ## Environment Variables
//!
//! | Variable | Default | Description |
//! |----------|---------|-------------|
//! | `SP_SERVICE_NAME` | `starter-pack` | Service name attached to the startup event |
//! | `SP_LOG_LEVEL` | `RUST_LOG`, then `info` | Filter directive |
//! | `SP_JSON_LOGS` | true in containers | JSON instead of pretty output |
//! | `SP_CONSOLE_OUTPUT` | `true` | Write events to stdout at all |

mod config;
mod logging;
mod tracing_setup;

pub use config::TelemetryConfig;
pub use tracing_setup::{build_filter, init_logging, LoggingGuard};

use thiserror::Error;

/// Telemetry initialization errors
#[derive(Error, Debug)]
pub enum TelemetryError {
    #[error("Invalid log filter '{directive}': {reason}")]
    Filter { directive: String, reason: String },

    #[error("A global subscriber is already installed: {0}")]
    AlreadyInitialized(String),
}

/// Convenience macro for a span tagged with the owning component.
///
/// ```rust,ignore
/// let _span = component_span!("acquire", "locker", key = %key).entered();
/// ```
#[macro_export]
macro_rules! component_span {
    ($name:expr, $component:expr $(, $($field:tt)*)?) => {
        tracing::info_span!($name, component = $component $(, $($field)*)?)
    };
}
