//! Series page scraping. Fetches the page, finds the latest-chapter anchor, and resolves its href.

mod client;
mod error;

pub use client::{PageClient, PageClientBuilder, DEFAULT_TIMEOUT_SECS};
pub use error::{FetchError, PointerError};

use reqwest::Url;
use scraper::{Html, Selector};

pub const DEFAULT_BASE_URL: &str = "https://3asq.org";
pub const DEFAULT_SOURCE_URL: &str = "https://3asq.org/manga/one-piece/";
/// `id` of the "read first" button on the series page; its href is the newest chapter.
pub const DEFAULT_ANCHOR_ID: &str = "btn-read-first";

/// Anything that can report the current latest-chapter pointer.
///
/// The monitor loop only talks to this trait, so cycles can be driven by a fake in tests.
pub trait PointerSource {
    fn fetch_latest_pointer(&mut self) -> Result<String, PointerError>;
}

/// The live series page: one GET per call, then [extract_pointer] on the body.
#[derive(Debug)]
pub struct ChapterPage {
    client: PageClient,
    source_url: String,
    base_url: String,
    anchor_id: String,
}

impl ChapterPage {
    pub fn new(
        client: PageClient,
        source_url: impl Into<String>,
        base_url: impl Into<String>,
        anchor_id: impl Into<String>,
    ) -> Self {
        Self {
            client,
            source_url: source_url.into(),
            base_url: base_url.into(),
            anchor_id: anchor_id.into(),
        }
    }

    pub fn source_url(&self) -> &str {
        &self.source_url
    }
}

impl PointerSource for ChapterPage {
    fn fetch_latest_pointer(&mut self) -> Result<String, PointerError> {
        let html = self.client.get_text(&self.source_url)?;
        extract_pointer(&html, &self.anchor_id, &self.base_url).map_err(|e| match e {
            // extract_pointer has no idea which page it was given
            PointerError::NotFound { anchor_id, .. } => PointerError::NotFound {
                anchor_id,
                url: self.source_url.clone(),
            },
            other => other,
        })
    }
}

/// Parse a CSS selector or return a parse error (avoids panics from Selector::parse).
fn parse_selector(sel: &str) -> Result<Selector, PointerError> {
    Selector::parse(sel).map_err(|e| PointerError::InvalidSelector {
        selector: sel.to_string(),
        reason: e.to_string(),
    })
}

/// Find the first `<a>` whose `id` equals `anchor_id` and return its href resolved against `base_url`.
///
/// An anchor without an href (or with a blank one) counts as missing.
pub fn extract_pointer(html: &str, anchor_id: &str, base_url: &str) -> Result<String, PointerError> {
    let doc = Html::parse_document(html);
    let anchors = parse_selector("a[id]")?;
    let href = doc
        .select(&anchors)
        .find(|a| a.value().id() == Some(anchor_id))
        .and_then(|a| a.value().attr("href"))
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .ok_or_else(|| PointerError::NotFound {
            anchor_id: anchor_id.to_string(),
            url: base_url.to_string(),
        })?;
    resolve_href(href, base_url)
}

/// Absolute http(s) hrefs are returned as-is; anything else is joined onto `base_url`.
pub fn resolve_href(href: &str, base_url: &str) -> Result<String, PointerError> {
    let href = href.trim();
    let lower = href.to_ascii_lowercase();
    if lower.starts_with("http://") || lower.starts_with("https://") {
        return Ok(href.to_string());
    }
    let base = Url::parse(base_url).map_err(|e| PointerError::InvalidHref {
        href: href.to_string(),
        reason: format!("invalid base URL {:?}: {}", base_url, e),
    })?;
    base.join(href)
        .map(|u| u.to_string())
        .map_err(|e| PointerError::InvalidHref {
            href: href.to_string(),
            reason: e.to_string(),
        })
}
