//! Errors from fetching the series page and extracting the latest-chapter pointer.

use thiserror::Error;

/// Transport-level failure: the page could not be retrieved.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("Network error: could not reach {url}: {source}")]
    Network {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("HTTP {status} when fetching: {url}")]
    HttpStatus { status: u16, url: String },

    #[error("Failed to read response body from {url}: {source}")]
    BodyRead {
        url: String,
        #[source]
        source: reqwest::Error,
    },
}

/// Outcome of a failed pointer lookup. `Fetch` is a transport failure; the other
/// variants mean the page arrived but did not carry a usable latest-chapter link.
#[derive(Debug, Error)]
pub enum PointerError {
    #[error(transparent)]
    Fetch(#[from] FetchError),

    #[error("Latest chapter link not found: no <a id=\"{anchor_id}\"> with an href on {url}")]
    NotFound { anchor_id: String, url: String },

    #[error("Latest chapter link has an unusable href {href:?}: {reason}")]
    InvalidHref { href: String, reason: String },

    #[error("Invalid selector {selector:?}: {reason}")]
    InvalidSelector { selector: String, reason: String },
}

impl PointerError {
    /// True when the page was fetched but the expected markup was missing or unusable.
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            PointerError::NotFound { .. } | PointerError::InvalidHref { .. }
        )
    }
}
