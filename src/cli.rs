//! CLI parsing and orchestration. Resolves settings, builds the page source and publisher,
//! then runs one cycle or the poll loop. Maps errors to exit codes.

use crate::config::{self, Config};
use crate::feed::{FeedTemplate, PublishError, DEFAULT_OUTPUT_FILE};
use crate::monitor::{
    run_loop, run_once, CycleOutcome, LatestChapterState, Publisher, DEFAULT_INTERVAL_SECS,
};
use crate::repo::{GitCli, RepositoryError, DEFAULT_COMMIT_MESSAGE, DEFAULT_REMOTE};
use crate::scraper::{
    ChapterPage, PageClient, PointerError, DEFAULT_ANCHOR_ID, DEFAULT_SOURCE_URL,
    DEFAULT_TIMEOUT_SECS,
};
use clap::Parser;
use reqwest::Url;
use std::path::PathBuf;
use std::sync::mpsc;
use std::time::Duration;
use thiserror::Error;

/// CLI error carrying exit code and message.
#[derive(Debug, Error)]
pub enum CliRunError {
    #[error("{0}")]
    InvalidInput(String),

    #[error("{0}")]
    Pointer(#[from] PointerError),

    #[error("{0}")]
    Publish(#[from] PublishError),

    #[error("{0}")]
    Repository(#[from] RepositoryError),
}

impl CliRunError {
    pub fn exit_code(&self) -> i32 {
        match self {
            CliRunError::InvalidInput(_) => 1,
            CliRunError::Pointer(_) => 2,
            CliRunError::Publish(_) => 3,
            CliRunError::Repository(_) => 4,
        }
    }
}

#[derive(Parser, Debug)]
#[command(name = "chapterfeed")]
#[command(about = "Watch a manga series page and publish its newest chapter as an RSS feed")]
#[command(
    after_help = "Config file keys (source_url, base_url, anchor_id, output, interval_secs, timeout_secs, user_agent, sync, commit_message, remote, repo_dir, [feed]) are read from ./chapterfeed.toml or ~/.config/chapterfeed/config.toml. CLI flags override config."
)]
pub struct Args {
    /// Check once, write the feed, and exit instead of polling.
    #[arg(long)]
    pub once: bool,

    /// Seconds between checks (overrides config; default 120).
    #[arg(short, long)]
    pub interval: Option<u64>,

    /// Feed output path (overrides config; default rss.xml).
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Series page to poll (overrides config).
    #[arg(long)]
    pub source_url: Option<String>,

    /// Commit and push the feed to the checked-out branch after each change.
    #[arg(long, conflicts_with = "no_sync")]
    pub sync: bool,

    /// Never touch git, even if the config enables sync.
    #[arg(long)]
    pub no_sync: bool,

    /// Request timeout in seconds (overrides config; default 30).
    #[arg(long)]
    pub timeout: Option<u64>,

    /// HTTP User-Agent (overrides config).
    #[arg(long)]
    pub user_agent: Option<String>,

    /// Debug logging and full error chain.
    #[arg(short, long)]
    pub verbose: bool,
}

/// Effective settings after merging CLI flags, config file, and defaults.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub source_url: String,
    pub base_url: String,
    pub anchor_id: String,
    pub output: PathBuf,
    pub interval: Duration,
    pub timeout_secs: u64,
    pub user_agent: Option<String>,
    pub sync: bool,
    pub commit_message: String,
    pub remote: String,
    pub repo_dir: PathBuf,
    pub feed: FeedTemplate,
}

fn parse_http_url(what: &str, s: &str) -> Result<Url, CliRunError> {
    let url = Url::parse(s)
        .map_err(|e| CliRunError::InvalidInput(format!("Invalid {}: {}: {}", what, s, e)))?;
    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(CliRunError::InvalidInput(format!(
            "Invalid {}: {}: expected an http or https URL",
            what, s
        )));
    }
    Ok(url)
}

/// Merge CLI over config over defaults and validate the result.
pub fn resolve_settings(args: &Args, config: Option<&Config>) -> Result<Settings, CliRunError> {
    let source_url = args
        .source_url
        .clone()
        .or_else(|| config.and_then(|c| c.source_url.clone()))
        .unwrap_or_else(|| DEFAULT_SOURCE_URL.to_string());
    let source = parse_http_url("source URL", &source_url)?;

    let base_url = match config.and_then(|c| c.base_url.clone()) {
        Some(b) => {
            parse_http_url("base URL", &b)?;
            b
        }
        None => source.origin().ascii_serialization(),
    };

    let anchor_id = config
        .and_then(|c| c.anchor_id.clone())
        .unwrap_or_else(|| DEFAULT_ANCHOR_ID.to_string());
    if anchor_id.trim().is_empty() {
        return Err(CliRunError::InvalidInput(
            "anchor_id must not be empty".to_string(),
        ));
    }

    let interval_secs = args
        .interval
        .or_else(|| config.and_then(|c| c.interval_secs))
        .unwrap_or(DEFAULT_INTERVAL_SECS);
    if interval_secs == 0 {
        return Err(CliRunError::InvalidInput(
            "Invalid interval: must be at least 1 second".to_string(),
        ));
    }

    let timeout_secs = args
        .timeout
        .or_else(|| config.and_then(|c| c.timeout_secs))
        .unwrap_or(DEFAULT_TIMEOUT_SECS);
    if timeout_secs == 0 {
        return Err(CliRunError::InvalidInput(
            "Invalid timeout: must be at least 1 second".to_string(),
        ));
    }

    let sync = if args.no_sync {
        false
    } else {
        args.sync || config.and_then(|c| c.sync).unwrap_or(false)
    };

    Ok(Settings {
        source_url,
        base_url,
        anchor_id,
        output: args
            .output
            .clone()
            .or_else(|| config.and_then(|c| c.output.clone()))
            .unwrap_or_else(|| PathBuf::from(DEFAULT_OUTPUT_FILE)),
        interval: Duration::from_secs(interval_secs),
        timeout_secs,
        user_agent: args
            .user_agent
            .clone()
            .or_else(|| config.and_then(|c| c.user_agent.clone())),
        sync,
        commit_message: config
            .and_then(|c| c.commit_message.clone())
            .unwrap_or_else(|| DEFAULT_COMMIT_MESSAGE.to_string()),
        remote: config
            .and_then(|c| c.remote.clone())
            .unwrap_or_else(|| DEFAULT_REMOTE.to_string()),
        repo_dir: config
            .and_then(|c| c.repo_dir.clone())
            .unwrap_or_else(|| PathBuf::from(".")),
        feed: config.and_then(|c| c.feed.clone()).unwrap_or_default(),
    })
}

/// Entry point for the CLI. Returns Ok(()) on a clean stop; Err with exit code and message on failure.
pub fn run(args: &Args) -> Result<(), CliRunError> {
    let config = config::load_config().map_err(CliRunError::InvalidInput)?;
    let settings = resolve_settings(args, config.as_ref())?;

    let mut builder = PageClient::builder().timeout_secs(settings.timeout_secs);
    if let Some(ua) = settings.user_agent.clone() {
        builder = builder.user_agent(ua);
    }
    let client = builder
        .build()
        .map_err(|e| CliRunError::InvalidInput(format!("Failed to create HTTP client: {}", e)))?;
    let mut page = ChapterPage::new(
        client,
        settings.source_url.clone(),
        settings.base_url.clone(),
        settings.anchor_id.clone(),
    );

    let output = if settings.sync {
        // git runs in repo_dir, so hand it a path that does not depend on CWD
        std::path::absolute(&settings.output).map_err(|e| {
            CliRunError::InvalidInput(format!(
                "Cannot resolve output path {}: {}",
                settings.output.display(),
                e
            ))
        })?
    } else {
        settings.output.clone()
    };
    let publisher = Publisher::new(
        settings.feed.clone(),
        settings.source_url.clone(),
        output,
        settings.commit_message.clone(),
    );
    let mut git = settings
        .sync
        .then(|| GitCli::new(settings.repo_dir.clone(), settings.remote.clone()));

    if args.once {
        return match run_once(&mut page, &publisher, git.as_mut())? {
            CycleOutcome::FetchFailed(e) => Err(e.into()),
            CycleOutcome::PublishFailed { error, .. } => Err(error.into()),
            CycleOutcome::Published { .. } | CycleOutcome::Unchanged { .. } => Ok(()),
        };
    }

    let (tx, rx) = mpsc::channel();
    ctrlc::set_handler(move || {
        let _ = tx.send(());
    })
    .map_err(|e| CliRunError::InvalidInput(format!("Failed to set signal handler: {}", e)))?;

    log::info!(
        "Starting RSS monitor for {} (every {}s). Press Ctrl+C to stop.",
        page.source_url(),
        settings.interval.as_secs()
    );
    run_loop(
        LatestChapterState::default(),
        &mut page,
        &publisher,
        git.as_mut(),
        settings.interval,
        &rx,
    )?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scraper::FetchError;

    fn args(extra: &[&str]) -> Args {
        let mut argv = vec!["chapterfeed"];
        argv.extend_from_slice(extra);
        Args::parse_from(argv)
    }

    #[test]
    fn defaults_match_reference_behavior() -> Result<(), CliRunError> {
        let s = resolve_settings(&args(&[]), None)?;
        assert_eq!(s.source_url, "https://3asq.org/manga/one-piece/");
        assert_eq!(s.base_url, "https://3asq.org");
        assert_eq!(s.anchor_id, "btn-read-first");
        assert_eq!(s.output, PathBuf::from("rss.xml"));
        assert_eq!(s.interval, Duration::from_secs(120));
        assert_eq!(s.timeout_secs, 30);
        assert!(!s.sync);
        assert_eq!(s.commit_message, "Update RSS feed");
        assert_eq!(s.remote, "origin");
        assert_eq!(s.feed, FeedTemplate::default());
        Ok(())
    }

    #[test]
    fn cli_overrides_config() -> Result<(), CliRunError> {
        let config: Config = toml::from_str(
            r#"
            interval_secs = 600
            output = "from-config.xml"
            timeout_secs = 5
            user_agent = "Config/1.0"
            "#,
        )
        .unwrap();
        let s = resolve_settings(
            &args(&["-i", "30", "-o", "cli.xml", "--user-agent", "Cli/1.0"]),
            Some(&config),
        )?;
        assert_eq!(s.interval, Duration::from_secs(30));
        assert_eq!(s.output, PathBuf::from("cli.xml"));
        assert_eq!(s.timeout_secs, 5);
        assert_eq!(s.user_agent.as_deref(), Some("Cli/1.0"));
        Ok(())
    }

    #[test]
    fn base_url_defaults_to_source_origin() -> Result<(), CliRunError> {
        let s = resolve_settings(
            &args(&["--source-url", "http://localhost:8080/manga/x/"]),
            None,
        )?;
        assert_eq!(s.base_url, "http://localhost:8080");
        Ok(())
    }

    #[test]
    fn sync_flags() -> Result<(), CliRunError> {
        let config: Config = toml::from_str("sync = true").unwrap();
        assert!(resolve_settings(&args(&[]), Some(&config))?.sync);
        assert!(!resolve_settings(&args(&["--no-sync"]), Some(&config))?.sync);
        assert!(resolve_settings(&args(&["--sync"]), None)?.sync);
        assert!(Args::try_parse_from(["chapterfeed", "--sync", "--no-sync"]).is_err());
        Ok(())
    }

    #[test]
    fn rejects_zero_interval() {
        let result = resolve_settings(&args(&["--interval", "0"]), None);
        assert!(matches!(result, Err(CliRunError::InvalidInput(_))));
    }

    #[test]
    fn rejects_zero_timeout() {
        let result = resolve_settings(&args(&["--timeout", "0"]), None);
        assert!(matches!(result, Err(CliRunError::InvalidInput(_))));
        let config: Config = toml::from_str("timeout_secs = 0").unwrap();
        let result = resolve_settings(&args(&[]), Some(&config));
        assert!(matches!(result, Err(CliRunError::InvalidInput(_))));
    }

    #[test]
    fn rejects_bad_urls() {
        let result = resolve_settings(&args(&["--source-url", "not-a-url"]), None);
        assert!(matches!(result, Err(CliRunError::InvalidInput(_))));
        let result = resolve_settings(&args(&["--source-url", "ftp://3asq.org/x"]), None);
        assert!(matches!(result, Err(CliRunError::InvalidInput(_))));
        let config: Config = toml::from_str(r#"base_url = "nope""#).unwrap();
        let result = resolve_settings(&args(&[]), Some(&config));
        assert!(matches!(result, Err(CliRunError::InvalidInput(_))));
    }

    #[test]
    fn cli_run_error_exit_codes() {
        assert_eq!(CliRunError::InvalidInput("x".into()).exit_code(), 1);
        let fetch = PointerError::from(FetchError::HttpStatus {
            status: 500,
            url: "https://3asq.org".into(),
        });
        assert_eq!(CliRunError::Pointer(fetch).exit_code(), 2);
        let publish = PublishError::Io {
            path: PathBuf::from("rss.xml"),
            source: std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied"),
        };
        assert_eq!(CliRunError::Publish(publish).exit_code(), 3);
        let repo = RepositoryError::Failed {
            command: "git push origin main".into(),
            status: "exit status: 1".into(),
            stderr: "rejected".into(),
        };
        assert_eq!(CliRunError::Repository(repo).exit_code(), 4);
    }
}
