//! Cross-crate integration flows.

pub mod bootstrap;
pub mod lock_handoff;
pub mod reservation_flow;
