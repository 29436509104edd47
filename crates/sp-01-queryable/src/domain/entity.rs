//! Basic behaviour shared by persisted models.

/// A persisted model.
pub trait Entity {
    /// True when the value carries no data (e.g. a zero-valued lookup result).
    fn is_empty(&self) -> bool;

    /// Domain equality, which may ignore bookkeeping fields such as timestamps.
    fn is_equal(&self, other: &Self) -> bool;
}
