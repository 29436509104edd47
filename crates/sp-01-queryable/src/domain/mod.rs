//! Domain layer: pure SQL fragment building and value types.

pub mod entity;
pub mod errors;
pub mod fragments;
pub mod order;

pub use entity::Entity;
pub use errors::QueryError;
pub use fragments::{add_prefix, assign, equal, extract};
pub use order::{order_by, Direction, Order, OrderError};
