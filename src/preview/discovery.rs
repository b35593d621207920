//! Finds the first link-shaped token in free text.

use once_cell::sync::Lazy;
use regex::Regex;

/// `local@domain.tld` tokens. Stripped before the link search so the domain
/// half of an address is never picked up as a link.
static EMAIL_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)[a-z0-9+._-]+@[a-z0-9._-]+\.[a-z0-9_-]+").expect("email regex is valid")
});

/// Optional scheme, a dotted host, then an optional path/query/fragment that
/// never ends on sentence punctuation.
static LINK_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)(?:(https?|ftp)://)?([a-z0-9_-]+(?:(?:\.[a-z0-9_-]+)+))([a-z0-9_.,@?^=%&:/~+#-]*[a-z0-9_@?^=%&/~+#-])?",
    )
    .expect("link regex is valid")
});

/// Return the first link in `text` as an absolute `http`/`https` URL.
///
/// Only the first candidate is considered. A bare domain is prefixed with
/// `https://`, and an `ftp://` match is fetched over `https://` instead.
pub fn find_url(text: &str) -> Option<String> {
    let cleaned = EMAIL_REGEX.replace_all(text, "");
    let cleaned = cleaned.trim();
    if cleaned.is_empty() {
        return None;
    }

    let caps = LINK_REGEX.captures(cleaned)?;
    let host = caps.get(2)?.as_str();
    let rest = caps.get(3).map_or("", |m| m.as_str());

    let url = match caps.get(1) {
        Some(scheme) if !scheme.as_str().eq_ignore_ascii_case("ftp") => {
            format!("{}://{host}{rest}", scheme.as_str())
        }
        _ => format!("https://{host}{rest}"),
    };
    Some(url)
}
