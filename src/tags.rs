//! Canonical text form of a tag set
//!
//! Tags are rendered as `key=value` pairs, sorted and joined by single spaces.
//! Separators inside keys or values are not escaped, so a value containing a
//! space or `=` is emitted verbatim.

use std::collections::HashMap;

/// Render a tag set as its canonical tag line.
///
/// The same tag set always yields the same line, regardless of the map's
/// iteration order. An empty tag set yields an empty string.
pub fn canonicalize(tags: &HashMap<String, String>) -> String {
    let mut pairs: Vec<String> = tags
        .iter()
        .map(|(key, value)| format!("{key}={value}"))
        .collect();

    // sort by the full pair, not just the key
    pairs.sort();
    pairs.join(" ")
}
