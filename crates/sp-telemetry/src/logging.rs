//! Structured log helpers.
//!
//! Events carry a `component` field naming the starter-pack part that
//! emitted them (`queryable`, `events`, `locker`, `secret-store`), so JSON
//! output can be filtered per component.

/// Emit an event tagged with a `component` field.
///
/// ```rust,ignore
/// log_event!(warn, "locker", "queue corrupt", key = %key);
/// ```
#[macro_export]
macro_rules! log_event {
    ($level:ident, $component:expr, $msg:expr $(, $($field:tt)*)?) => {
        tracing::$level!(
            component = $component,
            $($($field)*,)?
            $msg
        )
    };
}

#[cfg(test)]
mod tests {
    #[test]
    fn test_log_event_expands_for_each_level() {
        let key = "orders-reserve-42";
        crate::log_event!(info, "locker", "acquired");
        crate::log_event!(warn, "locker", "queue corrupt", key = %key);
        crate::log_event!(error, "events", "publish failed", subject = "orders.begin", attempt = 2);
        crate::log_event!(debug, "queryable", "statement prepared");
        let _span = crate::component_span!("release", "locker", key = %key).entered();
    }
}
