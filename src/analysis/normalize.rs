/// Canonical lookup key for a biomarker name: trimmed, lower-cased, each
/// run of whitespace replaced with a single underscore. Punctuation is
/// kept as-is.
pub fn normalize_name(raw: &str) -> String {
    raw.trim()
        .to_lowercase()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join("_")
}
