//! Pattern-based metadata extraction from raw HTML.

use std::sync::LazyLock;

use regex::Regex;

use crate::models::LinkPreview;

static TITLE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?is)<title[^>]*>(.*?)</title>").expect("valid title pattern"));

/// Content of `<meta property|name="{property}" content="...">`, in either
/// attribute order.
pub fn extract_meta(html: &str, property: &str) -> Option<String> {
    let property = regex::escape(property);
    // One alternative per quote style so an apostrophe inside a double-quoted
    // value does not end the capture.
    let value = r#"(?:"([^"]*)"|'([^']*)')"#;
    let forward = format!(
        r#"(?i)<meta\s+(?:property|name)=["']{property}["']\s+content={value}"#
    );
    let reverse = format!(
        r#"(?i)<meta\s+content={value}\s+(?:property|name)=["']{property}["']"#
    );

    [forward, reverse]
        .iter()
        .filter_map(|pattern| Regex::new(pattern).ok())
        .find_map(|re| re.captures(html).and_then(|c| c.get(1).or_else(|| c.get(2))))
        .map(|m| clean(m.as_str()))
        .filter(|s| !s.is_empty())
}

/// Text of the document `<title>`.
pub fn extract_title(html: &str) -> Option<String> {
    TITLE_RE
        .captures(html)
        .and_then(|c| c.get(1))
        .map(|m| clean(m.as_str()))
        .filter(|s| !s.is_empty())
}

fn first_meta(html: &str, properties: &[&str]) -> Option<String> {
    properties.iter().find_map(|p| extract_meta(html, p))
}

/// Full preview including the image; context filtering happens later.
pub fn extract_preview(html: &str) -> LinkPreview {
    LinkPreview {
        title: first_meta(html, &["og:title", "twitter:title"]).or_else(|| extract_title(html)),
        description: first_meta(html, &["og:description", "twitter:description", "description"]),
        site_name: extract_meta(html, "og:site_name"),
        image: first_meta(html, &["og:image", "twitter:image"]),
    }
}

fn clean(raw: &str) -> String {
    html_escape::decode_html_entities(raw.trim()).into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn title_tag_only() {
        let p = extract_preview("<html><head><title>Foo</title></head></html>");
        assert_eq!(
            p,
            LinkPreview {
                title: Some("Foo".into()),
                ..Default::default()
            }
        );
    }

    #[test]
    fn og_beats_twitter_beats_title() {
        let html = r#"
            <title>Plain</title>
            <meta name="twitter:title" content="Tweet">
            <meta property="og:title" content="Graph">
        "#;
        assert_eq!(extract_preview(html).title.as_deref(), Some("Graph"));

        let html = r#"<title>Plain</title><meta name="twitter:title" content="Tweet">"#;
        assert_eq!(extract_preview(html).title.as_deref(), Some("Tweet"));
    }

    #[test]
    fn content_first_attribute_order() {
        let html = r#"<meta content="Reverse order" property="og:description">"#;
        assert_eq!(
            extract_meta(html, "og:description").as_deref(),
            Some("Reverse order")
        );
    }

    #[test]
    fn matching_is_case_insensitive_and_quote_agnostic() {
        let html = r#"<META PROPERTY='og:site_name' CONTENT='Example News'>"#;
        assert_eq!(
            extract_meta(html, "og:site_name").as_deref(),
            Some("Example News")
        );
    }

    #[test]
    fn apostrophes_inside_double_quotes_are_kept() {
        let html = r#"<meta property="og:title" content="Don't panic: markets rally"><title>Full</title>"#;
        assert_eq!(
            extract_preview(html).title.as_deref(),
            Some("Don't panic: markets rally")
        );
        let html = r#"<meta content='Say "hello"' name='description'>"#;
        assert_eq!(
            extract_meta(html, "description").as_deref(),
            Some("Say \"hello\"")
        );
    }

    #[test]
    fn description_falls_back_to_plain_meta() {
        let html = r#"<meta name="description" content="Plain description">"#;
        assert_eq!(
            extract_preview(html).description.as_deref(),
            Some("Plain description")
        );
    }

    #[test]
    fn image_prefers_og() {
        let html = r#"
            <meta name="twitter:image" content="https://x/t.png">
            <meta property="og:image" content="https://x/o.png">
        "#;
        assert_eq!(extract_preview(html).image.as_deref(), Some("https://x/o.png"));
    }

    #[test]
    fn property_names_are_not_treated_as_patterns() {
        // "og.title" must not match "og:title" through regex wildcards.
        let html = r#"<meta property="og:title" content="Graph">"#;
        assert_eq!(extract_meta(html, "og.title"), None);
    }

    #[test]
    fn entities_are_decoded() {
        let html = r#"<meta property="og:title" content="Fish &amp; Chips"><title>A &lt; B</title>"#;
        assert_eq!(extract_meta(html, "og:title").as_deref(), Some("Fish & Chips"));
        assert_eq!(extract_title(html).as_deref(), Some("A < B"));
    }

    #[test]
    fn title_may_span_lines_and_carry_attributes() {
        let html = "<title data-rh=\"true\">\n  Multi line\n</title>";
        assert_eq!(extract_title(html).as_deref(), Some("Multi line"));
    }

    #[test]
    fn empty_document_yields_nothing() {
        assert_eq!(extract_preview(""), LinkPreview::default());
    }
}
