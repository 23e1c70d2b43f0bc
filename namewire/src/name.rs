//! Canonicalization of injector and dependency names.
//!
//! All names entering the container - injector names, registered dependency
//! names, lookup names, override keys - pass through [normalize], which makes
//! resolution insensitive to case and punctuation: `"HTTP-Server"`,
//! `"httpServer"` and `"http_server"` all address the same entry.

/// Normalizes a dependency name: strips every character outside
/// `[a-zA-Z0-9]` and lowercases the remainder. Total and deterministic; an
/// empty result is a legal (if useless) key.
pub fn normalize(raw: &str) -> String {
    raw.chars()
        .filter(char::is_ascii_alphanumeric)
        .map(|c| c.to_ascii_lowercase())
        .collect()
}

/// Normalizes an injector name. On top of [normalize], a leading run of
/// digits is dropped so the name-prefixed alias form of a key (see
/// [Injector](crate::Injector)) never starts mid-number. Dependency names
/// keep their leading digits.
pub fn normalize_injector(raw: &str) -> String {
    let name = normalize(raw);
    name.trim_start_matches(|c: char| c.is_ascii_digit())
        .to_string()
}
