//! chapterfeed: watch a manga series page and republish its newest chapter as an RSS feed.

pub mod cli;
pub mod config;
pub mod feed;
pub mod monitor;
pub mod repo;
pub mod scraper;

// Re-exports for CLI and consumers.
pub use feed::{publish, render_feed, FeedTemplate, PublishError};
pub use monitor::{run_cycle, run_loop, run_once, CycleOutcome, LatestChapterState, Publisher};
pub use repo::{synchronize_to_repository, GitCli, Repository, RepositoryError};
pub use crate::scraper::{
    extract_pointer, resolve_href, ChapterPage, FetchError, PageClient, PageClientBuilder,
    PointerError, PointerSource,
};
