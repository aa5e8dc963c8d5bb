//! Parameter name matching

/// Normalise a parameter, argument or environment variable name for lookup.
///
/// Matching ignores ASCII case, `-` and `_`: `--api-key`, `-ApiKey` and
/// `API_KEY` all normalise to `apikey`.
pub fn normalize_name(name: &str) -> String {
    name.trim_start_matches('-')
        .chars()
        .filter(|c| *c != '-' && *c != '_')
        .map(|c| c.to_ascii_lowercase())
        .collect()
}
