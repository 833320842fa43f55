//! Poll loop: fetch the pointer, compare with the last one seen, publish on change, sleep.
//!
//! Fetch and publish failures are logged and the loop carries on with the next cycle.
//! Only a failing `git` invocation stops it, and by then the feed file is already on disk.

use crate::feed::{publish, render_feed, FeedTemplate, PublishError};
use crate::repo::{synchronize_to_repository, Repository, RepositoryError};
use crate::scraper::{PointerError, PointerSource};
use chrono::{DateTime, Utc};
use std::path::PathBuf;
use std::sync::mpsc::{Receiver, RecvTimeoutError};
use std::time::Duration;

pub const DEFAULT_INTERVAL_SECS: u64 = 120;

/// What the loop remembers between cycles.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LatestChapterState {
    pub last_seen_pointer: Option<String>,
    /// The last feed document successfully written.
    pub document: Option<String>,
}

/// Result of one cycle.
#[derive(Debug)]
pub enum CycleOutcome {
    /// New pointer written to the feed. `pushed` is `None` when repository sync is off.
    Published {
        pointer: String,
        pushed: Option<bool>,
    },
    Unchanged {
        pointer: String,
    },
    FetchFailed(PointerError),
    PublishFailed {
        pointer: String,
        error: PublishError,
    },
}

/// Everything needed to turn a pointer into a file on disk.
#[derive(Debug, Clone)]
pub struct Publisher {
    pub template: FeedTemplate,
    /// `<channel><link>`: the polled series page.
    pub channel_link: String,
    pub output: PathBuf,
    pub commit_message: String,
    pub clock: fn() -> DateTime<Utc>,
}

impl Publisher {
    pub fn new(
        template: FeedTemplate,
        channel_link: impl Into<String>,
        output: impl Into<PathBuf>,
        commit_message: impl Into<String>,
    ) -> Self {
        Self {
            template,
            channel_link: channel_link.into(),
            output: output.into(),
            commit_message: commit_message.into(),
            clock: Utc::now,
        }
    }
}

/// One fetch → compare → (render, publish, sync) step.
///
/// `state` only changes when a new pointer was written successfully.
pub fn run_cycle<S, R>(
    state: &mut LatestChapterState,
    source: &mut S,
    publisher: &Publisher,
    repo: Option<&mut R>,
) -> Result<CycleOutcome, RepositoryError>
where
    S: PointerSource + ?Sized,
    R: Repository + ?Sized,
{
    log::info!("Checking for new chapter...");
    let pointer = match source.fetch_latest_pointer() {
        Ok(p) => p,
        Err(e) => {
            log::error!("Error fetching chapter: {}", e);
            return Ok(CycleOutcome::FetchFailed(e));
        }
    };

    if state.last_seen_pointer.as_deref() == Some(pointer.as_str()) {
        log::info!("No new URL found. Last URL is still: {}", pointer);
        return Ok(CycleOutcome::Unchanged { pointer });
    }

    log::info!("New URL found: {}", pointer);
    let document = render_feed(
        &publisher.template,
        &publisher.channel_link,
        &pointer,
        (publisher.clock)(),
    );
    if let Err(error) = publish(&publisher.output, &document) {
        log::error!("{}", error);
        return Ok(CycleOutcome::PublishFailed { pointer, error });
    }
    log::info!("RSS feed generated at {}", publisher.output.display());
    state.last_seen_pointer = Some(pointer.clone());
    state.document = Some(document);

    let pushed = match repo {
        Some(repo) => Some(synchronize_to_repository(
            repo,
            &publisher.output,
            &publisher.commit_message,
        )?),
        None => None,
    };
    Ok(CycleOutcome::Published { pointer, pushed })
}

/// Single cycle from an empty state, so a reachable page is always published.
pub fn run_once<S, R>(
    source: &mut S,
    publisher: &Publisher,
    repo: Option<&mut R>,
) -> Result<CycleOutcome, RepositoryError>
where
    S: PointerSource + ?Sized,
    R: Repository + ?Sized,
{
    let mut state = LatestChapterState::default();
    run_cycle(&mut state, source, publisher, repo)
}

/// Run cycles every `interval` until a message arrives on `shutdown` (or its sender is dropped).
///
/// Returns the final state on a clean stop; a repository failure ends the loop with `Err`.
pub fn run_loop<S, R>(
    mut state: LatestChapterState,
    source: &mut S,
    publisher: &Publisher,
    mut repo: Option<&mut R>,
    interval: Duration,
    shutdown: &Receiver<()>,
) -> Result<LatestChapterState, RepositoryError>
where
    S: PointerSource + ?Sized,
    R: Repository + ?Sized,
{
    loop {
        run_cycle(&mut state, source, publisher, repo.as_deref_mut())?;

        log::info!("Waiting {}s before next check...", interval.as_secs());
        match shutdown.recv_timeout(interval) {
            Err(RecvTimeoutError::Timeout) => continue,
            Ok(()) | Err(RecvTimeoutError::Disconnected) => {
                log::info!("Stopped by user.");
                return Ok(state);
            }
        }
    }
}
