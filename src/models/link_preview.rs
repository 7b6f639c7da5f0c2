use serde::ser::{Serialize, SerializeMap, Serializer};

/// Metadata extracted from an HTML page. Every field except `url` is best-effort.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LinkPreview {
    pub url: String,
    pub title: Option<String>,
    pub description: Option<String>,
    /// Always absolute when present.
    pub image: Option<String>,
    pub site_name: Option<String>,
}

/// Outcome of resolving a URL, returned by `GET /api/link-preview`.
///
/// `url` always echoes the request input. A failed fetch is not an error:
/// it is reported as `Fallback`, which serializes as a bare link.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PreviewResult {
    Image { url: String },
    Link(LinkPreview),
    Fallback { url: String },
}

impl PreviewResult {
    pub fn url(&self) -> &str {
        match self {
            PreviewResult::Image { url } | PreviewResult::Fallback { url } => url,
            PreviewResult::Link(link) => &link.url,
        }
    }
}

impl Serialize for PreviewResult {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            PreviewResult::Image { url } => {
                let mut map = serializer.serialize_map(Some(3))?;
                map.serialize_entry("type", "image")?;
                map.serialize_entry("url", url)?;
                map.serialize_entry("image", url)?;
                map.end()
            }
            PreviewResult::Link(link) => {
                let mut map = serializer.serialize_map(Some(6))?;
                map.serialize_entry("type", "link")?;
                map.serialize_entry("url", &link.url)?;
                map.serialize_entry("title", &link.title)?;
                map.serialize_entry("description", &link.description)?;
                map.serialize_entry("image", &link.image)?;
                map.serialize_entry("siteName", &link.site_name)?;
                map.end()
            }
            PreviewResult::Fallback { url } => {
                let mut map = serializer.serialize_map(Some(2))?;
                map.serialize_entry("type", "link")?;
                map.serialize_entry("url", url)?;
                map.end()
            }
        }
    }
}
