use once_cell::sync::Lazy;
use regex::Regex;

use super::fetcher::FetchResult;

static IMAGE_CONTENT_TYPE_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)image/").expect("image content-type regex is valid"));

/// How a fetched response should be processed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContentRoute {
    /// The URL itself is the preview image; the body is never read.
    Image,
    /// Anything else is scanned as HTML.
    Html,
}

pub fn route_content_type(content_type: Option<&str>) -> ContentRoute {
    match content_type {
        Some(value) if IMAGE_CONTENT_TYPE_REGEX.is_match(value) => ContentRoute::Image,
        _ => ContentRoute::Html,
    }
}

pub fn route(response: &FetchResult) -> ContentRoute {
    route_content_type(response.header("content-type"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn image_types_route_to_image() {
        assert_eq!(route_content_type(Some("image/png")), ContentRoute::Image);
        assert_eq!(route_content_type(Some("image/jpeg")), ContentRoute::Image);
        assert_eq!(route_content_type(Some("Image/WebP")), ContentRoute::Image);
        assert_eq!(
            route_content_type(Some("image/svg+xml; charset=utf-8")),
            ContentRoute::Image
        );
    }

    #[test]
    fn everything_else_routes_to_html() {
        assert_eq!(
            route_content_type(Some("text/html; charset=utf-8")),
            ContentRoute::Html
        );
        assert_eq!(route_content_type(Some("application/json")), ContentRoute::Html);
        assert_eq!(route_content_type(Some("")), ContentRoute::Html);
        assert_eq!(route_content_type(None), ContentRoute::Html);
    }

    #[tokio::test]
    async fn routes_from_response_headers() {
        let response = FetchResult::new([("Content-Type", "image/gif")], async {
            Ok(String::new())
        });
        assert_eq!(route(&response), ContentRoute::Image);
    }
}
