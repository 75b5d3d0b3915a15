//! Raw query normalization

/// Strips one pair of surrounding double quotes and keeps the inner text
/// verbatim, otherwise trims surrounding whitespace.
///
/// A lone `"` counts as quoted and yields the empty query.
pub fn normalize_query(raw: &str) -> String {
    if raw.starts_with('"') && raw.ends_with('"') {
        raw.get(1..raw.len() - 1).unwrap_or_default().to_string()
    } else {
        raw.trim().to_string()
    }
}
