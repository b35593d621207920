//! HTML entity decoding for text pulled out of markup.

/// Decode HTML entities (`&amp;`, `&#39;`, `&#x27;`, ...) in `text`.
pub fn decode_entities(text: &str) -> String {
    html_escape::decode_html_entities(text).into_owned()
}

/// Trim `text` and decode its entities. Missing or whitespace-only input
/// yields `None`.
pub fn decoded_text(text: Option<&str>) -> Option<String> {
    let trimmed = text?.trim();
    if trimmed.is_empty() {
        return None;
    }
    Some(decode_entities(trimmed))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_named_entities() {
        assert_eq!(decode_entities("Tom &amp; Jerry"), "Tom & Jerry");
        assert_eq!(decode_entities("&lt;b&gt;"), "<b>");
        assert_eq!(decode_entities("&quot;hi&quot;"), "\"hi\"");
    }

    #[test]
    fn decodes_numeric_entities() {
        assert_eq!(decode_entities("it&#39;s"), "it's");
        assert_eq!(decode_entities("it&#x27;s"), "it's");
    }

    #[test]
    fn leaves_plain_text_alone() {
        assert_eq!(decode_entities("plain text"), "plain text");
    }

    #[test]
    fn decoded_text_trims_before_decoding() {
        assert_eq!(decoded_text(Some("  A &amp; B \n")).as_deref(), Some("A & B"));
    }

    #[test]
    fn decoded_text_drops_blank_values() {
        assert_eq!(decoded_text(None), None);
        assert_eq!(decoded_text(Some("")), None);
        assert_eq!(decoded_text(Some("   \t")), None);
    }
}
