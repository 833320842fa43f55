//! Optional config file loading. Search order: ./chapterfeed.toml, then
//! $XDG_CONFIG_HOME/chapterfeed/config.toml (or ~/.config/chapterfeed/config.toml).

use crate::feed::FeedTemplate;
use serde::Deserialize;
use std::path::PathBuf;

/// Config file contents. All fields optional; only present keys override defaults.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "snake_case", default)]
pub struct Config {
    /// Series page to poll.
    pub source_url: Option<String>,
    /// Base that site-relative hrefs are resolved against. Defaults to the source URL's origin.
    pub base_url: Option<String>,
    /// `id` attribute of the latest-chapter anchor.
    pub anchor_id: Option<String>,
    /// Feed output path. Relative paths are relative to CWD.
    pub output: Option<PathBuf>,
    /// Seconds between polls.
    pub interval_secs: Option<u64>,
    /// Request timeout in seconds.
    pub timeout_secs: Option<u64>,
    /// HTTP User-Agent header.
    pub user_agent: Option<String>,
    /// Commit and push the feed after each change.
    pub sync: Option<bool>,
    pub commit_message: Option<String>,
    /// Remote to push to (default "origin").
    pub remote: Option<String>,
    /// Directory `git` runs in (default CWD).
    pub repo_dir: Option<PathBuf>,
    /// Fixed feed texts; missing keys keep their defaults.
    pub feed: Option<FeedTemplate>,
}

/// Search order: (1) ./chapterfeed.toml, (2) $XDG_CONFIG_HOME/chapterfeed/config.toml.
/// Missing file returns Ok(None). Invalid TOML or I/O error reading a present file returns Err.
pub fn load_config() -> Result<Option<Config>, String> {
    let cwd = std::env::current_dir()
        .map_err(|e| format!("Cannot determine current directory: {}", e))?;
    let mut paths = vec![cwd.join("chapterfeed.toml")];
    if let Some(d) = dirs::config_dir() {
        paths.push(d.join("chapterfeed").join("config.toml"));
    }
    for path in &paths {
        if path.exists() {
            let s = std::fs::read_to_string(path)
                .map_err(|e| format!("Cannot read config {}: {}", path.display(), e))?;
            let config: Config = toml::from_str(&s)
                .map_err(|e| format!("Invalid config {}: {}", path.display(), e))?;
            log::debug!("Loaded config from {}", path.display());
            return Ok(Some(config));
        }
    }
    Ok(None)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_empty_config() {
        let c: Config = toml::from_str("").unwrap();
        assert!(c.source_url.is_none());
        assert!(c.base_url.is_none());
        assert!(c.anchor_id.is_none());
        assert!(c.output.is_none());
        assert!(c.interval_secs.is_none());
        assert!(c.timeout_secs.is_none());
        assert!(c.sync.is_none());
        assert!(c.feed.is_none());
    }

    #[test]
    fn parse_full_config() {
        let s = r#"
            source_url = "https://3asq.org/manga/black-clover/"
            base_url = "https://3asq.org"
            anchor_id = "btn-read-first"
            output = "public/feed.xml"
            interval_secs = 300
            timeout_secs = 10
            user_agent = "Custom/1.0"
            sync = true
            commit_message = "feed: new chapter"
            remote = "upstream"
            repo_dir = "/srv/feeds"

            [feed]
            channel_title = "Black Clover"
            language = "en"
        "#;
        let c: Config = toml::from_str(s).unwrap();
        assert_eq!(
            c.source_url.as_deref(),
            Some("https://3asq.org/manga/black-clover/")
        );
        assert_eq!(c.base_url.as_deref(), Some("https://3asq.org"));
        assert_eq!(c.output.as_deref(), Some(std::path::Path::new("public/feed.xml")));
        assert_eq!(c.interval_secs, Some(300));
        assert_eq!(c.timeout_secs, Some(10));
        assert_eq!(c.user_agent.as_deref(), Some("Custom/1.0"));
        assert_eq!(c.sync, Some(true));
        assert_eq!(c.commit_message.as_deref(), Some("feed: new chapter"));
        assert_eq!(c.remote.as_deref(), Some("upstream"));
        assert_eq!(c.repo_dir.as_deref(), Some(std::path::Path::new("/srv/feeds")));
        let feed = c.feed.unwrap();
        assert_eq!(feed.channel_title, "Black Clover");
        assert_eq!(feed.language, "en");
        assert_eq!(feed.item_title, FeedTemplate::default().item_title);
    }

    #[test]
    fn parse_partial_config() {
        let c: Config = toml::from_str("interval_secs = 60").unwrap();
        assert_eq!(c.interval_secs, Some(60));
        assert!(c.source_url.is_none());
        assert!(c.output.is_none());
    }

    #[test]
    fn invalid_toml_errors() {
        assert!(toml::from_str::<Config>("output = [").is_err());
        assert!(toml::from_str::<Config>("interval_secs = \"soon\"").is_err());
    }
}
