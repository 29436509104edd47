//! `ORDER BY` clause construction.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

use super::fragments::push_quoted;

/// Sort direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    /// Ascending.
    #[default]
    Asc,
    /// Descending.
    Desc,
}

impl Direction {
    /// SQL keyword.
    #[must_use]
    pub fn as_sql(self) -> &'static str {
        match self {
            Self::Asc => "ASC",
            Self::Desc => "DESC",
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_sql())
    }
}

/// Invalid ordering input.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum OrderError {
    /// Direction other than `asc`/`desc`.
    #[error("Invalid sort direction: {0}")]
    InvalidDirection(String),

    /// Empty column name.
    #[error("Sort column must not be empty")]
    EmptyColumn,
}

impl FromStr for Direction {
    type Err = OrderError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "asc" => Ok(Self::Asc),
            "desc" => Ok(Self::Desc),
            other => Err(OrderError::InvalidDirection(other.to_string())),
        }
    }
}

/// One sort key, deserializable from request parameters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawOrder")]
pub struct Order {
    /// Column to sort by.
    pub by: String,
    /// Sort direction.
    pub direction: Direction,
}

/// Unvalidated wire shape of [`Order`].
#[derive(Deserialize)]
struct RawOrder {
    by: String,
    #[serde(default)]
    direction: Direction,
}

impl TryFrom<RawOrder> for Order {
    type Error = OrderError;

    fn try_from(raw: RawOrder) -> Result<Self, Self::Error> {
        Self::new(raw.by, raw.direction)
    }
}

impl Order {
    /// Sort key from typed parts.
    pub fn new(by: impl Into<String>, direction: Direction) -> Result<Self, OrderError> {
        let by = by.into();
        if by.trim().is_empty() {
            return Err(OrderError::EmptyColumn);
        }
        Ok(Self { by, direction })
    }

    /// Sort key from request parameters, e.g. `("created_at", "desc")`.
    pub fn parse(by: &str, direction: &str) -> Result<Self, OrderError> {
        Self::new(by, direction.parse()?)
    }

    /// `"by" ASC`.
    #[must_use]
    pub fn to_sql(&self) -> String {
        let mut out = String::with_capacity(self.by.len() + 7);
        push_quoted(&mut out, &self.by);
        out.push(' ');
        out.push_str(self.direction.as_sql());
        out
    }
}

/// `ORDER BY` clause for `orders`, or an empty string when there are none.
///
/// ```
/// use sp_01_queryable::{order_by, Direction, Order};
/// let orders = [Order::new("name", Direction::Asc).unwrap()];
/// assert_eq!(order_by(&orders), r#"ORDER BY "name" ASC"#);
/// ```
pub fn order_by(orders: &[Order]) -> String {
    if orders.is_empty() {
        return String::new();
    }
    let keys: Vec<String> = orders.iter().map(Order::to_sql).collect();
    format!("ORDER BY {}", keys.join(", "))
}
