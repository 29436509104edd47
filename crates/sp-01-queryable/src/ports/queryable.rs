//! # Queryable Port
//!
//! The minimal capability set shared by a database handle, a transaction
//! handle, and a context bound to either.

use crate::adapters::{PreparedStatement, QueryableContext, RequestContext};
use crate::domain::QueryError;
use rusqlite::types::FromSql;
use rusqlite::{Params, Row};

/// Builds a value from one result row.
///
/// Implemented for common scalars and tuples of them; implement it for
/// your own row structs.
pub trait FromRow: Sized {
    /// Map the current row.
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self>;
}

macro_rules! impl_from_row_scalar {
    ($($ty:ty),* $(,)?) => {
        $(
            impl FromRow for $ty {
                fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
                    row.get(0)
                }
            }
        )*
    };
}

impl_from_row_scalar!(i32, i64, u32, u64, f64, bool, String, Vec<u8>);

impl<T: FromSql> FromRow for Option<T> {
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        row.get(0)
    }
}

macro_rules! impl_from_row_tuple {
    ($($name:ident : $idx:tt),+) => {
        impl<$($name: FromSql),+> FromRow for ($($name,)+) {
            fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
                Ok(($(row.get::<_, $name>($idx)?,)+))
            }
        }
    };
}

impl_from_row_tuple!(A: 0, B: 1);
impl_from_row_tuple!(A: 0, B: 1, C: 2);
impl_from_row_tuple!(A: 0, B: 1, C: 2, D: 3);

/// Statement execution against a bound handle.
///
/// The `*_in` variants honour a [`RequestContext`]: its deadline is checked
/// first, then its override queryable (if any) serves the call instead of
/// `self`.
pub trait Queryable {
    /// Run a statement, returning the number of affected rows.
    fn execute<P: Params>(&self, sql: &str, params: P) -> Result<usize, QueryError>;

    /// Run several `;`-separated statements without parameters.
    fn execute_batch(&self, sql: &str) -> Result<(), QueryError>;

    /// Read exactly one row. No rows is an error
    /// ([`QueryError::is_no_rows`]).
    fn query_one<T: FromRow, P: Params>(&self, sql: &str, params: P) -> Result<T, QueryError>;

    /// Read every row.
    fn query_many<T: FromRow, P: Params>(&self, sql: &str, params: P)
        -> Result<Vec<T>, QueryError>;

    /// Validate `sql` and bind it to this handle for repeated use.
    fn prepare(&self, sql: &str) -> Result<PreparedStatement, QueryError>;

    /// [`Queryable::execute`] under a request context.
    fn execute_in<P: Params>(
        &self,
        ctx: &RequestContext,
        sql: &str,
        params: P,
    ) -> Result<usize, QueryError> {
        ctx.check_deadline()?;
        match ctx.queryable() {
            Some(over) => over.execute(sql, params),
            None => self.execute(sql, params),
        }
    }

    /// [`Queryable::query_one`] under a request context.
    fn query_one_in<T: FromRow, P: Params>(
        &self,
        ctx: &RequestContext,
        sql: &str,
        params: P,
    ) -> Result<T, QueryError> {
        ctx.check_deadline()?;
        match ctx.queryable() {
            Some(over) => over.query_one(sql, params),
            None => self.query_one(sql, params),
        }
    }

    /// [`Queryable::query_many`] under a request context.
    fn query_many_in<T: FromRow, P: Params>(
        &self,
        ctx: &RequestContext,
        sql: &str,
        params: P,
    ) -> Result<Vec<T>, QueryError> {
        ctx.check_deadline()?;
        match ctx.queryable() {
            Some(over) => over.query_many(sql, params),
            None => self.query_many(sql, params),
        }
    }

    /// [`Queryable::prepare`] under a request context.
    fn prepare_in(&self, ctx: &RequestContext, sql: &str) -> Result<PreparedStatement, QueryError> {
        ctx.check_deadline()?;
        match ctx.queryable() {
            Some(over) => over.prepare(sql),
            None => self.prepare(sql),
        }
    }
}

/// A value holding a queryable that transaction runners re-point.
///
/// Repositories typically store a [`QueryableContext`] and implement this
/// by replacing it.
pub trait RebindQueryable {
    /// Replace the held queryable.
    fn update_queryable(&mut self, queryable: QueryableContext);
}

impl RebindQueryable for QueryableContext {
    fn update_queryable(&mut self, queryable: QueryableContext) {
        *self = queryable;
    }
}
