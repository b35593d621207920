use serde::{Deserialize, Serialize};

/// Preview card data extracted from a piece of user text.
///
/// Every field is optional. An all-empty record means "no preview available"
/// and serialises as `{}`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PreviewData {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    /// Absolute `http`/`https` URL that was fetched.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub link: Option<String>,
}

impl PreviewData {
    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.description.is_none()
            && self.image.is_none()
            && self.link.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_preview_serialises_as_empty_object() {
        let json = serde_json::to_string(&PreviewData::default()).unwrap();
        assert_eq!(json, "{}");
    }

    #[test]
    fn only_set_fields_are_serialised() {
        let preview = PreviewData {
            link: Some("https://example.com".into()),
            image: Some("https://example.com/a.png".into()),
            ..Default::default()
        };
        let value = serde_json::to_value(&preview).unwrap();
        assert_eq!(value["link"], "https://example.com");
        assert_eq!(value["image"], "https://example.com/a.png");
        assert!(value.get("title").is_none());
        assert!(value.get("description").is_none());
    }

    #[test]
    fn is_empty_tracks_every_field() {
        assert!(PreviewData::default().is_empty());
        let preview = PreviewData {
            title: Some("T".into()),
            ..Default::default()
        };
        assert!(!preview.is_empty());
    }
}
