use once_cell::sync::Lazy;
use regex::Regex;

/// `src` of an `<img>` tag. The whitespace before `src` keeps `data-src`
/// (lazy-loading placeholders) from matching.
static IMAGE_TAG_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?i)<img\b[^>]*?\ssrc\s*=\s*["']([^"']*)["']"#).expect("img regex is valid")
});

/// How many `<img>` candidates the body fallback looks at.
pub const DEFAULT_BODY_IMAGE_SCAN_LIMIT: usize = 5;

fn is_data_uri(candidate: &str) -> bool {
    candidate
        .get(..5)
        .is_some_and(|prefix| prefix.eq_ignore_ascii_case("data:"))
}

fn has_http_prefix(candidate: &str) -> bool {
    candidate
        .get(..4)
        .is_some_and(|prefix| prefix.eq_ignore_ascii_case("http"))
}

/// Turn an image reference found on the page at `base_url` into an absolute URL.
///
/// Empty values and `data:` URIs give `None`. Protocol-relative values get
/// `https:`. Anything else not starting with `http` is joined onto
/// `base_url` with exactly one `/` between the two.
pub fn resolve_image_url(base_url: &str, candidate: &str) -> Option<String> {
    let candidate = candidate.trim();
    if candidate.is_empty() || is_data_uri(candidate) {
        return None;
    }

    if let Some(rest) = candidate.strip_prefix("//") {
        return Some(format!("https://{rest}"));
    }

    if has_http_prefix(candidate) {
        return Some(candidate.to_string());
    }

    let resolved = match (base_url.ends_with('/'), candidate.starts_with('/')) {
        (true, true) => format!("{}{candidate}", &base_url[..base_url.len() - 1]),
        (false, false) => format!("{base_url}/{candidate}"),
        _ => format!("{base_url}{candidate}"),
    };
    Some(resolved)
}

/// Fallback image for pages without `og:image`: the first usable `<img src>`
/// anywhere in `html`, looking at no more than `limit` non-`data:` candidates.
pub fn scan_fallback_images(html: &str, base_url: &str, limit: usize) -> Option<String> {
    IMAGE_TAG_REGEX
        .captures_iter(html)
        .filter_map(|caps| caps.get(1).map(|m| m.as_str()))
        .filter(|src| !is_data_uri(src.trim_start()))
        .take(limit)
        .find_map(|src| resolve_image_url(base_url, src))
}
