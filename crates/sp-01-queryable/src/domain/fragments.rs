//! # SQL Fragment Builder
//!
//! Pure string builders for assignment/equality clauses and quoted field
//! projections. Values are spliced verbatim; callers pass placeholders or
//! already-quoted literals.

/// `"field"=value`.
///
/// ```
/// use sp_01_queryable::assign;
/// assert_eq!(assign("status", "'active'"), r#""status"='active'"#);
/// ```
pub fn assign(field: &str, value: &str) -> String {
    let mut out = String::with_capacity(field.len() + value.len() + 3);
    out.push('"');
    out.push_str(field);
    out.push_str("\"=");
    out.push_str(value);
    out
}

/// Equality clause; renders exactly like [`assign`].
pub fn equal(field: &str, value: &str) -> String {
    assign(field, value)
}

/// Comma-joined projection of `fields`.
///
/// Each field is wrapped in double quotes unless it already contains one,
/// and prefixed with `prefix.` when `prefix` is non-empty.
///
/// ```
/// use sp_01_queryable::extract;
/// assert_eq!(extract(&["id", "name"], "u"), r#"u."id",u."name""#);
/// ```
pub fn extract<S: AsRef<str>>(fields: &[S], prefix: &str) -> String {
    let mut out = String::new();
    for (idx, field) in fields.iter().enumerate() {
        if idx > 0 {
            out.push(',');
        }
        if !prefix.is_empty() {
            out.push_str(prefix);
            out.push('.');
        }
        push_quoted(&mut out, field.as_ref());
    }
    out
}

/// Prepend `prefix` to every field.
pub fn add_prefix<S: AsRef<str>>(fields: &[S], prefix: &str) -> Vec<String> {
    fields
        .iter()
        .map(|field| format!("{prefix}{}", field.as_ref()))
        .collect()
}

/// Quote an identifier unless the caller already quoted it.
pub(crate) fn push_quoted(out: &mut String, field: &str) {
    if field.contains('"') {
        out.push_str(field);
    } else {
        out.push('"');
        out.push_str(field);
        out.push('"');
    }
}
