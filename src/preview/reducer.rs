use super::entities::decoded_text;
use super::head::MetaTagMatch;

const OG_TITLE: &str = "og:title";
const OG_DESCRIPTION: &str = "og:description";
const OG_IMAGE: &str = "og:image";
const DESCRIPTION: &str = "description";

/// Best title/description/image picked from a page's meta tags.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReducedMeta {
    pub title: Option<String>,
    pub description: Option<String>,
    /// Decoded `og:image` value, not yet resolved against the page URL.
    pub image_url: Option<String>,
}

/// Fold meta tags (in document order) into a single record.
///
/// Per field the first usable occurrence wins:
/// - title: first `og:title`, else `base_title`
/// - description: first `og:description`, else first `description`
/// - image: first `og:image`
///
/// Keys are compared case-insensitively whether they came from `property`
/// or `name`.
pub fn reduce(matches: &[MetaTagMatch], base_title: Option<&str>) -> ReducedMeta {
    let mut og_title = None;
    let mut og_description = None;
    let mut plain_description = None;
    let mut og_image = None;

    for tag in matches {
        let slot = match tag.attr_name.to_ascii_lowercase().as_str() {
            OG_TITLE => &mut og_title,
            OG_DESCRIPTION => &mut og_description,
            DESCRIPTION => &mut plain_description,
            OG_IMAGE => &mut og_image,
            _ => continue,
        };
        if slot.is_none() {
            *slot = decoded_text(Some(tag.content.as_str()));
        }
    }

    ReducedMeta {
        title: og_title.or_else(|| base_title.map(str::to_owned)),
        description: og_description.or(plain_description),
        image_url: og_image,
    }
}
