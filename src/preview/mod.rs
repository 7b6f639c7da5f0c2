//! Link preview resolution: validate → classify → bounded fetch → extract.
//!
//! Only input errors escape [`LinkPreviewResolver::resolve`]. Every failure
//! after validation is absorbed into [`PreviewResult::Fallback`].

mod extract;

pub use extract::extract_link_preview;

use std::net::IpAddr;
use std::time::Duration;

use once_cell::sync::Lazy;
use regex::Regex;
use reqwest::{header::CONTENT_TYPE, Client, Response, StatusCode};
use thiserror::Error;
use url::Url;

use crate::models::PreviewResult;

pub const FETCH_TIMEOUT: Duration = Duration::from_secs(6);
pub const MAX_BODY_BYTES: usize = 262_144;
pub const USER_AGENT: &str = "Mozilla/5.0 (compatible; MindmapBot/1.0)";

static IMAGE_PATH: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\.(png|jpe?g|gif|webp|bmp|svg)$").unwrap());

/// Client input errors. Display strings are the exact response messages.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum PreviewError {
    #[error("Missing url")]
    MissingUrl,

    #[error("Invalid scheme")]
    InvalidScheme,
}

/// Why a fetch produced no usable document. Logged, never returned.
#[derive(Error, Debug)]
enum FetchError {
    #[error("timed out after {0:?}")]
    Timeout(Duration),

    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("remote returned {0}")]
    Status(StatusCode),

    #[error("could not resolve host: {0}")]
    Lookup(std::io::Error),

    #[error("host resolves to a private or reserved address")]
    PrivateAddress,
}

enum Fetched {
    Image,
    Html(String),
}

#[derive(Debug, Clone)]
pub struct ResolverOptions {
    /// Deadline for the whole fetch, connect through last body byte.
    pub timeout: Duration,
    pub max_body_bytes: usize,
    pub block_private_networks: bool,
}

impl Default for ResolverOptions {
    fn default() -> Self {
        Self {
            timeout: FETCH_TIMEOUT,
            max_body_bytes: MAX_BODY_BYTES,
            block_private_networks: false,
        }
    }
}

/// Turns an untrusted URL into a [`PreviewResult`].
///
/// Holds no per-request state; clones share one connection pool.
#[derive(Clone)]
pub struct LinkPreviewResolver {
    client: Client,
    options: ResolverOptions,
}

impl LinkPreviewResolver {
    pub fn new(options: ResolverOptions) -> Result<Self, reqwest::Error> {
        let client = Client::builder()
            .timeout(options.timeout)
            .user_agent(USER_AGENT)
            .build()?;
        Ok(Self { client, options })
    }

    /// Resolve `raw` into a preview.
    ///
    /// Returns `Err` only for missing input or a non-http(s) URL.
    pub async fn resolve(&self, raw: Option<&str>) -> Result<PreviewResult, PreviewError> {
        let (url, parsed) = validate_url(raw)?;

        if has_image_extension(&parsed) {
            tracing::debug!(url, "Image extension shortcut");
            return Ok(PreviewResult::Image { url: url.to_string() });
        }

        let fetched = tokio::time::timeout(self.options.timeout, self.fetch(&parsed))
            .await
            .unwrap_or(Err(FetchError::Timeout(self.options.timeout)));

        let result = match fetched {
            Ok(Fetched::Image) => {
                tracing::debug!(url, "Remote content type is an image");
                PreviewResult::Image { url: url.to_string() }
            }
            Ok(Fetched::Html(text)) => {
                PreviewResult::Link(extract_link_preview(&text, url, &parsed))
            }
            Err(e) => {
                tracing::warn!(error = %e, url, "Link preview fetch failed; returning fallback");
                PreviewResult::Fallback { url: url.to_string() }
            }
        };
        Ok(result)
    }

    async fn fetch(&self, url: &Url) -> Result<Fetched, FetchError> {
        if self.options.block_private_networks {
            ensure_public_host(url).await?;
        }

        let response = self.client.get(url.as_str()).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status(status));
        }

        let is_image = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .is_some_and(|v| v.to_ascii_lowercase().contains("image"));
        if is_image {
            return Ok(Fetched::Image);
        }

        let body = read_capped(response, self.options.max_body_bytes).await?;
        Ok(Fetched::Html(String::from_utf8_lossy(&body).into_owned()))
    }
}

/// Trim, require non-empty, and require an `http`/`https` URL.
/// Returns the trimmed input alongside its parsed form.
pub fn validate_url(raw: Option<&str>) -> Result<(&str, Url), PreviewError> {
    let url = raw.map(str::trim).unwrap_or_default();
    if url.is_empty() {
        return Err(PreviewError::MissingUrl);
    }

    let parsed = Url::parse(url).map_err(|_| PreviewError::InvalidScheme)?;
    match parsed.scheme() {
        "http" | "https" => Ok((url, parsed)),
        _ => Err(PreviewError::InvalidScheme),
    }
}

/// Whether the path names an image file. The query string is not part of the path.
pub fn has_image_extension(url: &Url) -> bool {
    IMAGE_PATH.is_match(url.path())
}

/// Read at most `limit` bytes of the body; the rest is never pulled off the wire.
async fn read_capped(mut response: Response, limit: usize) -> Result<Vec<u8>, FetchError> {
    let mut body = Vec::with_capacity(limit.min(16 * 1024));
    while let Some(chunk) = response.chunk().await? {
        let remaining = limit - body.len();
        if chunk.len() >= remaining {
            body.extend_from_slice(&chunk[..remaining]);
            break;
        }
        body.extend_from_slice(&chunk);
    }
    Ok(body)
}

async fn ensure_public_host(url: &Url) -> Result<(), FetchError> {
    let host = url.host_str().unwrap_or_default();
    let host = host.trim_start_matches('[').trim_end_matches(']');
    let port = url.port_or_known_default().unwrap_or(80);

    let addrs = tokio::net::lookup_host((host, port))
        .await
        .map_err(FetchError::Lookup)?;

    for addr in addrs {
        if is_private_ip(addr.ip()) {
            return Err(FetchError::PrivateAddress);
        }
    }
    Ok(())
}

/// Returns `true` if `ip` is a private, loopback, link-local, or unspecified address.
pub fn is_private_ip(ip: IpAddr) -> bool {
    match ip {
        IpAddr::V4(v4) => {
            let o = v4.octets();
            matches!(
                o,
                [127, ..]
                    | [10, ..]
                    | [169, 254, ..]
                    | [192, 168, ..]
                    | [0, ..]
                    | [255, 255, 255, 255]
            ) || (o[0] == 172 && (16..=31).contains(&o[1]))
        }
        IpAddr::V6(v6) => {
            if let Some(v4) = v6.to_ipv4_mapped() {
                return is_private_ip(IpAddr::V4(v4));
            }
            v6.is_loopback()
                || v6.is_unspecified()
                || (v6.segments()[0] & 0xfe00 == 0xfc00)
                || (v6.segments()[0] & 0xffc0 == 0xfe80)
        }
    }
}
