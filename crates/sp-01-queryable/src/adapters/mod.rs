//! Adapters: the SQLite handles and the contexts bound to them.

pub mod context;
pub mod sqlite;

pub use context::{PreparedStatement, QueryableContext, RequestContext};
pub use sqlite::{Database, Transaction, TxState};
