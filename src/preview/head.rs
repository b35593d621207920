//! Regex-based scanning of the document head.
//!
//! No DOM is built. The head is approximated as everything before the first
//! `<body`, which keeps the scan tolerant of unclosed tags and stray markup.

use once_cell::sync::Lazy;
use regex::Regex;

use super::entities::decoded_text;

static TITLE_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?is)<title\b[^>]*>(.*?)</title>").expect("title regex is valid"));

/// A whole `<meta ...>` tag. Quoted values may contain `>`.
static META_TAG_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?i)<meta\b(?:[^>"']|"[^"]*"|'[^']*')*>"#).expect("meta tag regex is valid")
});

/// One attribute inside a tag: double-quoted, single-quoted or bare value.
static ATTRIBUTE_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"([A-Za-z_:][-A-Za-z0-9_:.]*)\s*=\s*(?:"([^"]*)"|'([^']*)'|([^\s"'=<>`]+))"#)
        .expect("attribute regex is valid")
});

/// Which attribute carried the key of a meta tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MetaAttr {
    Property,
    Name,
}

/// A `<meta>` tag that declared both a key and a content value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MetaTagMatch {
    pub attr_kind: MetaAttr,
    pub attr_name: String,
    pub content: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HeadScan {
    /// Decoded text of the first `<title>` element.
    pub title: Option<String>,
    /// Meta tags in document order.
    pub meta: Vec<MetaTagMatch>,
}

/// Everything before the first case-sensitive `<body`, or the whole
/// document when there is none.
pub fn head_section(html: &str) -> &str {
    html.find("<body").map_or(html, |idx| &html[..idx])
}

pub fn scan_head(html: &str) -> HeadScan {
    let head = head_section(html);

    let title = TITLE_REGEX
        .captures(head)
        .and_then(|caps| decoded_text(caps.get(1).map(|m| m.as_str())));

    let meta = META_TAG_REGEX
        .find_iter(head)
        .filter_map(|tag| parse_meta_tag(tag.as_str()))
        .collect();

    HeadScan { title, meta }
}

/// Pull the key and content out of one `<meta>` tag, in any attribute order.
///
/// Tags without both a non-empty key and a non-empty content are dropped. So
/// are tags that declare `property` and `name` with different values: there
/// is no telling which one the content belongs to.
fn parse_meta_tag(tag: &str) -> Option<MetaTagMatch> {
    let mut property = None;
    let mut name = None;
    let mut content = None;

    for caps in ATTRIBUTE_REGEX.captures_iter(tag) {
        let value = caps
            .get(2)
            .or_else(|| caps.get(3))
            .or_else(|| caps.get(4))
            .map_or("", |m| m.as_str());
        let slot = match caps[1].to_ascii_lowercase().as_str() {
            "property" => &mut property,
            "name" => &mut name,
            "content" => &mut content,
            _ => continue,
        };
        if slot.is_none() {
            *slot = Some(value);
        }
    }

    let content = content.filter(|c| !c.is_empty())?;

    let (attr_kind, attr_name) = match (property, name) {
        (Some(p), Some(n)) if !p.eq_ignore_ascii_case(n) => {
            tracing::trace!(property = p, name = n, "skipping ambiguous meta tag");
            return None;
        }
        (Some(p), _) => (MetaAttr::Property, p),
        (None, Some(n)) => (MetaAttr::Name, n),
        (None, None) => return None,
    };

    let attr_name = attr_name.trim();
    if attr_name.is_empty() {
        return None;
    }

    Some(MetaTagMatch {
        attr_kind,
        attr_name: attr_name.to_string(),
        content: content.to_string(),
    })
}
