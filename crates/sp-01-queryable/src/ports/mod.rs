//! Ports: the query capability and the rebinding hook used by the runners.

pub mod queryable;

pub use queryable::{FromRow, Queryable, RebindQueryable};
