//! Display-name normalization.
//!
//! Index keys are derived from display names by lowercasing and collapsing
//! every run of excluded characters into a single placeholder. The same
//! transform is applied at insertion time and at query time, so derived keys
//! stay comparable.

/// Placeholder substituted for every run of excluded characters.
pub const PLACEHOLDER: char = '_';

/// Returns `true` for characters that never appear in an index key.
///
/// The set covers the space character and the punctuation family found in
/// place-name data, including the typographic apostrophe U+2019. U+2018 is a
/// leading letter in some transliterated names and is deliberately kept.
const fn is_excluded(c: char) -> bool {
    matches!(
        c,
        '[' | ']' | '|' | '?' | '*' | '.' | ',' | '<' | '>' | '"' | ':' | '+' | '\'' | '/' | '’'
            | ' '
    )
}

/// Derive the index key for a raw display string.
///
/// Lowercases the input, then replaces every maximal run of excluded
/// characters with a single [`PLACEHOLDER`]. The transform is total and
/// idempotent: the placeholder itself is not excluded, so re-normalizing a
/// key leaves it unchanged.
///
/// ```
/// use prefix_index::normalize_key;
///
/// assert_eq!(normalize_key("Amster Dam"), "amster_dam");
/// assert_eq!(normalize_key("  Amsterdam"), "_amsterdam");
/// ```
pub fn normalize_key(raw: &str) -> String {
    let mut key = String::with_capacity(raw.len());
    let mut in_run = false;
    for c in raw.to_lowercase().chars() {
        if is_excluded(c) {
            if !in_run {
                key.push(PLACEHOLDER);
                in_run = true;
            }
        } else {
            key.push(c);
            in_run = false;
        }
    }
    key
}
