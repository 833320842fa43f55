//! Blocking HTTP client with an explicit request timeout.

use super::error::FetchError;
use std::time::Duration;

const DEFAULT_USER_AGENT: &str =
    "Mozilla/5.0 (compatible; chapterfeed/0.1; +https://github.com/chapterfeed)";
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;
const MAX_REDIRECTS: usize = 10;

/// Blocking HTTP client used for the one GET per cycle.
#[derive(Debug, Clone)]
pub struct PageClient {
    inner: reqwest::blocking::Client,
}

impl PageClient {
    pub fn builder() -> PageClientBuilder {
        PageClientBuilder::default()
    }

    /// GET `url` and return the body as text. Non-2xx statuses are errors.
    pub fn get_text(&self, url: &str) -> Result<String, FetchError> {
        let response = self
            .inner
            .get(url)
            .send()
            .map_err(|e| FetchError::Network {
                url: url.to_string(),
                source: e,
            })?;
        let status = response.status();
        log::debug!("GET {} -> {}", url, status);
        if !status.is_success() {
            return Err(FetchError::HttpStatus {
                status: status.as_u16(),
                url: url.to_string(),
            });
        }
        response.text().map_err(|e| FetchError::BodyRead {
            url: url.to_string(),
            source: e,
        })
    }
}

/// Builder for PageClient with optional User-Agent and timeout.
#[derive(Debug)]
pub struct PageClientBuilder {
    user_agent: Option<String>,
    timeout_secs: u64,
    no_proxy: bool,
}

impl Default for PageClientBuilder {
    fn default() -> Self {
        Self {
            user_agent: None,
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            no_proxy: false,
        }
    }
}

impl PageClientBuilder {
    /// Set a custom User-Agent. If not set, a browser-like default is used.
    pub fn user_agent(mut self, ua: impl Into<String>) -> Self {
        self.user_agent = Some(ua.into());
        self
    }

    /// Set request timeout in seconds. Default 30. Zero is raised to one second.
    pub fn timeout_secs(mut self, secs: u64) -> Self {
        self.timeout_secs = secs.max(1);
        self
    }

    /// Ignore HTTP(S)_PROXY from the environment.
    pub fn no_proxy(mut self) -> Self {
        self.no_proxy = true;
        self
    }

    pub fn build(self) -> Result<PageClient, reqwest::Error> {
        let user_agent = self
            .user_agent
            .unwrap_or_else(|| DEFAULT_USER_AGENT.to_string());
        let mut builder = reqwest::blocking::Client::builder()
            .user_agent(user_agent)
            .timeout(Duration::from_secs(self.timeout_secs))
            .redirect(reqwest::redirect::Policy::limited(MAX_REDIRECTS));
        if self.no_proxy {
            builder = builder.no_proxy();
        }
        let inner = builder.build()?;
        Ok(PageClient { inner })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builder_clamps_zero_timeout() {
        let b = PageClient::builder().timeout_secs(0);
        assert_eq!(b.timeout_secs, 1);
    }

    #[test]
    fn builder_defaults() {
        let b = PageClientBuilder::default();
        assert!(b.user_agent.is_none());
        assert_eq!(b.timeout_secs, DEFAULT_TIMEOUT_SECS);
    }
}
