//! Denylist for legend and placeholder text embedded in pool spreadsheets.
//!
//! Exported sheets carry colour keys, notes and "closed" markers in the
//! same cells as provider names. Every rule lives in the tables below so a
//! new marker is a one-line change with a matching test.

/// Header cells starting with one of these were generated by the export tool.
pub const PLACEHOLDER_PREFIXES: &[&str] = &["__EMPTY", "Unnamed"];

/// Header cells equal to one of these (case-insensitive) are legend labels.
pub const LEGEND_HEADER_TOKENS: &[&str] = &["key"];

/// Header cells containing one of these (case-insensitive) are legend notes.
pub const LEGEND_HEADER_PHRASES: &[&str] = &["please add", "pending", "provider has"];

/// Data cells equal to one of these (case-insensitive) are not providers.
pub const SENTINEL_NAME_TOKENS: &[&str] = &["closed", "back-up", "key"];

/// Data cells containing one of these (case-insensitive) are not providers.
pub const SENTINEL_NAME_PHRASES: &[&str] = &["please add", "pending", "provider has", "license"];

/// Returns `true` when a header cell must be treated as blank.
pub fn is_rejected_header(cell: &str) -> bool {
    let trimmed = cell.trim();
    if trimmed.is_empty() {
        return true;
    }
    if PLACEHOLDER_PREFIXES
        .iter()
        .any(|prefix| trimmed.starts_with(prefix))
    {
        return true;
    }
    matches_denylist(trimmed, LEGEND_HEADER_TOKENS, LEGEND_HEADER_PHRASES)
}

/// Returns `true` when a normalized data cell is legend text rather than a provider.
pub fn is_sentinel_name(name: &str) -> bool {
    let trimmed = name.trim();
    trimmed.is_empty() || matches_denylist(trimmed, SENTINEL_NAME_TOKENS, SENTINEL_NAME_PHRASES)
}

fn matches_denylist(value: &str, tokens: &[&str], phrases: &[&str]) -> bool {
    let lowered = value.to_lowercase();
    tokens.iter().any(|token| lowered == *token)
        || phrases.iter().any(|phrase| lowered.contains(phrase))
}
