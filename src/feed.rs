//! RSS 2.0 output: a fixed single-channel, single-item document pointing at the newest chapter.

use chrono::{DateTime, Utc};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use thiserror::Error;

pub const DEFAULT_OUTPUT_FILE: &str = "rss.xml";

/// RFC 822 style, always UTC (e.g. `Sat, 15 Jun 2024 14:30:45 GMT`).
const RFC822_GMT: &str = "%a, %d %b %Y %H:%M:%S GMT";

#[derive(Debug, Error)]
pub enum PublishError {
    #[error("Failed to write feed: {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Fixed texts of the feed. Only the link and timestamps change between renders.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case", default)]
pub struct FeedTemplate {
    pub channel_title: String,
    pub channel_description: String,
    pub language: String,
    pub item_title: String,
    pub item_description: String,
}

impl Default for FeedTemplate {
    fn default() -> Self {
        Self {
            channel_title: "ون بيس - العاشق".to_string(),
            channel_description: "أحدث فصول مانجا ون بيس مترجمة من موقع العاشق".to_string(),
            language: "ar".to_string(),
            item_title: "الفصل الأحدث".to_string(),
            item_description: "رابط الفصل الأحدث من ون بيس".to_string(),
        }
    }
}

pub(crate) fn xml_escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

pub fn format_rfc822(ts: DateTime<Utc>) -> String {
    ts.format(RFC822_GMT).to_string()
}

/// Render the feed for `pointer`. `channel_link` is the polled series page.
///
/// Pure: the same inputs always produce the same bytes.
pub fn render_feed(
    template: &FeedTemplate,
    channel_link: &str,
    pointer: &str,
    now: DateTime<Utc>,
) -> String {
    let date = format_rfc822(now);
    let pointer = xml_escape(pointer);
    format!(
        r#"<?xml version="1.0" encoding="UTF-8"?>
<rss version="2.0">
  <channel>
    <title>{channel_title}</title>
    <description>{channel_description}</description>
    <link>{channel_link}</link>
    <lastBuildDate>{date}</lastBuildDate>
    <language>{language}</language>

    <item>
      <title>{item_title}</title>
      <link>{pointer}</link>
      <description>{item_description}</description>
      <pubDate>{date}</pubDate>
      <guid isPermaLink="false">{pointer}</guid>
    </item>
  </channel>
</rss>
"#,
        channel_title = xml_escape(&template.channel_title),
        channel_description = xml_escape(&template.channel_description),
        channel_link = xml_escape(channel_link),
        language = xml_escape(&template.language),
        item_title = xml_escape(&template.item_title),
        item_description = xml_escape(&template.item_description),
        date = date,
        pointer = pointer,
    )
}

/// Write `document` to `path`, replacing whatever was there.
pub fn publish(path: &Path, document: &str) -> Result<(), PublishError> {
    std::fs::write(path, document.as_bytes()).map_err(|e| PublishError::Io {
        path: path.to_path_buf(),
        source: e,
    })
}
