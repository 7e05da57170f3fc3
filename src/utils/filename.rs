use regex::Regex;
use std::sync::LazyLock;

static UNSAFE_CHARS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^A-Za-z0-9_.-]").expect("static regex"));

/// Reduces an uploaded file name to a flat, portable name.
///
/// Path separators become whitespace, whitespace runs collapse to `_`, every
/// character outside `[A-Za-z0-9_.-]` is dropped and leading/trailing dots and
/// underscores are stripped, so the result can never address a parent or
/// hidden path. May return an empty string.
pub fn secure_filename(name: &str) -> String {
    let flattened = name.replace(['/', '\\'], " ");
    let joined = flattened.split_whitespace().collect::<Vec<_>>().join("_");
    let cleaned = UNSAFE_CHARS.replace_all(&joined, "");
    cleaned.trim_matches(|c| c == '.' || c == '_').to_string()
}
