//! Open Graph / Twitter Card extraction over a raw, possibly truncated HTML window.
//!
//! This works on text, not a parsed DOM: tags cut off by the byte cap are
//! simply not seen, and malformed markup around a tag does not hide it.

use once_cell::sync::Lazy;
use regex::Regex;
use url::Url;

use crate::models::LinkPreview;

const TITLE_KEYS: &[&str] = &["og:title", "twitter:title"];
const DESCRIPTION_KEYS: &[&str] = &["og:description", "twitter:description", "description"];
const IMAGE_KEYS: &[&str] = &["og:image", "twitter:image"];
const SITE_NAME_KEYS: &[&str] = &["og:site_name"];

// Quoted values may contain `>`; only an unquoted `>` closes the tag.
static META_TAG: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?is)<meta\b(?:[^>"']|"[^"]*"|'[^']*')*>"#).unwrap()
});

static ATTRIBUTE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?s)([A-Za-z_:][-A-Za-z0-9_:.]*)\s*=\s*(?:"([^"]*)"|'([^']*)')"#).unwrap()
});

static TITLE_TAG: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?is)<title\b[^>]*>(.*?)</title>").unwrap());

/// The `property`/`name` key and `content` value of one `<meta>` tag.
struct MetaTag<'a> {
    keys: Vec<&'a str>,
    content: Option<&'a str>,
}

impl<'a> MetaTag<'a> {
    fn parse(tag: &'a str) -> Self {
        let mut keys = Vec::new();
        let mut content = None;
        for cap in ATTRIBUTE.captures_iter(tag) {
            let name = &cap[1];
            let Some(value) = cap.get(2).or_else(|| cap.get(3)).map(|m| m.as_str()) else {
                continue;
            };
            if name.eq_ignore_ascii_case("property") || name.eq_ignore_ascii_case("name") {
                keys.push(value.trim());
            } else if name.eq_ignore_ascii_case("content") && content.is_none() {
                content = Some(value);
            }
        }
        MetaTag { keys, content }
    }

    fn is(&self, key: &str) -> bool {
        self.keys.iter().any(|k| k.eq_ignore_ascii_case(key))
    }
}

/// Build a preview for `url` from the HTML text fetched from `base`.
///
/// Each field takes the first non-empty value in its candidate order.
/// A relative image is joined against `base`.
pub fn extract_link_preview(html: &str, url: &str, base: &Url) -> LinkPreview {
    let tags: Vec<MetaTag<'_>> = META_TAG
        .find_iter(html)
        .map(|m| MetaTag::parse(m.as_str()))
        .collect();

    let title = meta_content(&tags, TITLE_KEYS).or_else(|| title_tag(html));
    let description = meta_content(&tags, DESCRIPTION_KEYS);
    let image = meta_content(&tags, IMAGE_KEYS).and_then(|raw| absolutize(&raw, base));
    let site_name = meta_content(&tags, SITE_NAME_KEYS);

    LinkPreview {
        url: url.to_string(),
        title,
        description,
        image,
        site_name,
    }
}

fn meta_content(tags: &[MetaTag<'_>], candidates: &[&str]) -> Option<String> {
    candidates.iter().find_map(|key| {
        tags.iter()
            .filter(|tag| tag.is(key))
            .find_map(|tag| tag.content.and_then(clean))
    })
}

fn title_tag(html: &str) -> Option<String> {
    TITLE_TAG
        .captures(html)
        .and_then(|cap| cap.get(1))
        .and_then(|m| clean(m.as_str()))
}

/// Entity-decode and trim; empty results count as missing.
fn clean(raw: &str) -> Option<String> {
    let decoded = decode_entities(raw);
    let trimmed = decoded.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

/// Decodes every recognised entity and leaves stray `&` as text.
fn decode_entities(raw: &str) -> String {
    html_escape::decode_html_entities(raw).into_owned()
}

fn absolutize(image: &str, base: &Url) -> Option<String> {
    match base.join(image) {
        Ok(resolved) => Some(resolved.to_string()),
        Err(e) => {
            tracing::debug!(error = %e, image, "Dropping unresolvable preview image");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn extract(html: &str, url: &str) -> LinkPreview {
        extract_link_preview(html, url, &Url::parse(url).unwrap())
    }

    #[test]
    fn extracts_og_title() {
        let html = r#"<html><head><meta property="og:title" content="My Title"/></head></html>"#;
        let preview = extract(html, "https://example.com");
        assert_eq!(preview.title.as_deref(), Some("My Title"));
        assert_eq!(preview.url, "https://example.com");
    }

    #[test]
    fn decodes_entities_in_title() {
        let html = r#"<meta property="og:title" content="Hello &amp; World">"#;
        let preview = extract(html, "https://example.com");
        assert_eq!(preview.title.as_deref(), Some("Hello & World"));
    }

    #[test]
    fn tolerates_content_before_property_and_single_quotes() {
        let html = r#"<meta content='Reordered' property='og:title'>"#;
        let preview = extract(html, "https://example.com");
        assert_eq!(preview.title.as_deref(), Some("Reordered"));
    }

    #[test]
    fn accepts_name_attribute_for_og_keys() {
        let html = r#"<meta name="og:site_name" content="Example Site">"#;
        let preview = extract(html, "https://example.com");
        assert_eq!(preview.site_name.as_deref(), Some("Example Site"));
    }

    #[test]
    fn falls_back_to_twitter_title() {
        let html = r#"<meta name="twitter:title" content="Tweet Title"><title>Doc</title>"#;
        let preview = extract(html, "https://example.com");
        assert_eq!(preview.title.as_deref(), Some("Tweet Title"));
    }

    #[test]
    fn falls_back_to_title_tag_across_newlines() {
        let html = "<html><head><TITLE>\n  Plain Title\n</TITLE></head></html>";
        let preview = extract(html, "https://example.com");
        assert_eq!(preview.title.as_deref(), Some("Plain Title"));
    }

    #[test]
    fn og_title_takes_precedence_over_title_tag() {
        let html = r#"<html><head>
            <title>Page Title</title>
            <meta property="og:title" content="OG Title"/>
        </head></html>"#;
        let preview = extract(html, "https://example.com");
        assert_eq!(preview.title.as_deref(), Some("OG Title"));
    }

    #[test]
    fn candidate_priority_beats_document_order() {
        let html = r#"
            <meta name="description" content="plain">
            <meta name="twitter:description" content="twitter">
            <meta property="og:description" content="og">
        "#;
        let preview = extract(html, "https://example.com");
        assert_eq!(preview.description.as_deref(), Some("og"));
    }

    #[test]
    fn plain_description_is_last_resort() {
        let html = r#"<meta name="description" content="Just a page">"#;
        let preview = extract(html, "https://example.com");
        assert_eq!(preview.description.as_deref(), Some("Just a page"));
    }

    #[test]
    fn resolves_relative_image_against_page() {
        let html = r#"<meta property="og:image" content="/img/x.png">"#;
        let preview = extract(html, "https://example.com/page");
        assert_eq!(
            preview.image.as_deref(),
            Some("https://example.com/img/x.png")
        );
    }

    #[test]
    fn resolves_protocol_relative_image() {
        let html = r#"<meta property="og:image" content="//cdn.example.net/a.jpg">"#;
        let preview = extract(html, "https://example.com/page");
        assert_eq!(
            preview.image.as_deref(),
            Some("https://cdn.example.net/a.jpg")
        );
    }

    #[test]
    fn resolves_path_relative_image() {
        let html = r#"<meta name="twitter:image" content="thumbs/b.png">"#;
        let preview = extract(html, "https://example.com/posts/one");
        assert_eq!(
            preview.image.as_deref(),
            Some("https://example.com/posts/thumbs/b.png")
        );
    }

    #[test]
    fn keeps_absolute_image() {
        let html = r#"<meta property="og:image" content="https://img.example.org/c.webp">"#;
        let preview = extract(html, "https://example.com");
        assert_eq!(
            preview.image.as_deref(),
            Some("https://img.example.org/c.webp")
        );
    }

    #[test]
    fn empty_and_blank_content_count_as_missing() {
        let html = r#"
            <meta property="og:title" content="">
            <meta property="og:description" content="   ">
            <title>Backup</title>
        "#;
        let preview = extract(html, "https://example.com");
        assert_eq!(preview.title.as_deref(), Some("Backup"));
        assert!(preview.description.is_none());
    }

    #[test]
    fn returns_none_for_missing_fields() {
        let preview = extract("<html><head></head></html>", "https://example.com");
        assert!(preview.title.is_none());
        assert!(preview.description.is_none());
        assert!(preview.image.is_none());
        assert!(preview.site_name.is_none());
    }

    #[test]
    fn survives_truncated_markup() {
        let html = r#"<meta property="og:title" content="Whole"><meta property="og:description" cont"#;
        let preview = extract(html, "https://example.com");
        assert_eq!(preview.title.as_deref(), Some("Whole"));
        assert!(preview.description.is_none());
    }

    #[test]
    fn decodes_entities_next_to_bare_ampersands() {
        let html = r#"<meta property="og:title" content="Q&A &amp; more">"#;
        let preview = extract(html, "https://example.com");
        assert_eq!(preview.title.as_deref(), Some("Q&A & more"));
    }

    #[test]
    fn decodes_named_entities_beside_stray_ampersand() {
        let html = r#"<meta property="og:title" content="AT&T &mdash; News">
            <meta property="og:description" content="caf&eacute; & bar">"#;
        let preview = extract(html, "https://example.com");
        assert_eq!(preview.title.as_deref(), Some("AT&T \u{2014} News"));
        assert_eq!(preview.description.as_deref(), Some("caf\u{e9} & bar"));
    }

    #[test]
    fn decodes_apos_and_numeric_entities() {
        let html = r#"<meta property="og:title" content="It&apos;s">
            <meta property="og:site_name" content="Joe&#39;s &#x41;pps">"#;
        let preview = extract(html, "https://example.com");
        assert_eq!(preview.title.as_deref(), Some("It's"));
        assert_eq!(preview.site_name.as_deref(), Some("Joe's Apps"));
    }

    #[test]
    fn decodes_entities_in_title_tag() {
        let preview = extract("<title>Tips &amp; Tricks</title>", "https://example.com");
        assert_eq!(preview.title.as_deref(), Some("Tips & Tricks"));
    }

    #[test]
    fn angle_bracket_inside_quoted_value_keeps_tag_whole() {
        let html = r#"<meta content="a -> b" property="og:title">
            <meta property='og:description' content='x > y'>"#;
        let preview = extract(html, "https://example.com");
        assert_eq!(preview.title.as_deref(), Some("a -> b"));
        assert_eq!(preview.description.as_deref(), Some("x > y"));
    }
}
