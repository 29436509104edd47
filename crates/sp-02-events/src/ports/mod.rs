//! Ports: the request handler the publisher wraps.

pub mod endpoint;

pub use endpoint::{endpoint_fn, Endpoint, EndpointFn};
