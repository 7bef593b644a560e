//! Project-wide constants.

pub const AUTHOR: &str = env!("CARGO_PKG_AUTHORS");
pub const HOMEPAGE: &str = env!("CARGO_PKG_HOMEPAGE");
pub const REPO: &str = env!("CARGO_PKG_REPOSITORY");

/// Language used when a conversion request carries no (or an empty) tag.
/// This is the registered name of the bundled grammar.
pub const DEFAULT_LANGUAGE: &str = "moonbit";

/// Bundled syntect theme closest to a GitHub light palette.
pub const DEFAULT_THEME: &str = "InspiredGitHub";

/// Global symbol the converter is registered under.
pub const CONVERTER_SYMBOL: &str = "moonbit_code_to_html";

/// Global symbol of the host's zero-argument readiness callback.
pub const READY_SYMBOL: &str = "onImportsLoaded";

/// Tags that select the plain text syntax instead of a grammar.
pub const PLAIN_TEXT_TAGS: &[&str] = &["text", "plaintext", "txt", "plain"];

/// Class put on every rendered `<pre>` block, before the theme slug.
pub const PRE_CLASS: &str = "moonlight";

/// Resolve an optional language tag: missing or blank falls back to `default`.
pub fn resolve_language<'a>(lang: Option<&'a str>, default: &'a str) -> &'a str {
    match lang.map(str::trim) {
        Some(tag) if !tag.is_empty() => tag,
        _ => default,
    }
}

/// Lowercase a theme name into something usable as a CSS class
/// (e.g. `Solarized (light)` -> `solarized-light`).
pub fn theme_slug(name: &str) -> String {
    let mut slug = String::with_capacity(name.len());
    for c in name.chars() {
        if c.is_ascii_alphanumeric() {
            slug.push(c.to_ascii_lowercase());
        } else if !slug.is_empty() && !slug.ends_with('-') {
            slug.push('-');
        }
    }
    while slug.ends_with('-') {
        slug.pop();
    }
    slug
}
