use std::path::PathBuf;
use std::time::Duration;

use crate::error::{Error, Result};

/// Caption language requested from the provider.
pub const DEFAULT_LANGUAGE: &str = "en";

/// Browser-like User-Agent; the provider serves a reduced page to unknown clients.
pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 \
     (KHTML, like Gecko) Chrome/115.0 Safari/537.36";

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Options for the outbound HTTP client used to talk to the provider.
///
/// Headers set here apply only to clients built from these options.
#[derive(Debug, Clone)]
pub struct HttpClientOptions {
    pub user_agent: String,
    pub accept_language: String,
    pub timeout: Duration,
}

impl Default for HttpClientOptions {
    fn default() -> Self {
        Self {
            user_agent: DEFAULT_USER_AGENT.to_string(),
            accept_language: "en-US".to_string(),
            timeout: DEFAULT_TIMEOUT,
        }
    }
}

impl HttpClientOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    pub fn accept_language(mut self, value: impl Into<String>) -> Self {
        self.accept_language = value.into();
        self
    }

    /// Set the per-request timeout. Must be non-zero.
    pub fn timeout(mut self, timeout: Duration) -> Result<Self> {
        if timeout.is_zero() {
            return Err(Error::InvalidOption("timeout must be greater than zero".into()));
        }
        self.timeout = timeout;
        Ok(self)
    }

    /// Build a `reqwest::Client` carrying these headers and timeout.
    pub fn build_client(&self) -> Result<reqwest::Client> {
        let mut headers = reqwest::header::HeaderMap::new();
        let accept_language = reqwest::header::HeaderValue::from_str(&self.accept_language)
            .map_err(|e| Error::InvalidOption(format!("invalid Accept-Language: {e}")))?;
        headers.insert(reqwest::header::ACCEPT_LANGUAGE, accept_language);

        Ok(reqwest::Client::builder()
            .user_agent(self.user_agent.clone())
            .default_headers(headers)
            .timeout(self.timeout)
            .build()?)
    }
}

/// Options for [`TranscriptFetcher`](crate::fetcher::TranscriptFetcher).
#[derive(Debug, Clone)]
pub struct FetcherOptions {
    /// Caption language requested upstream.
    pub language: String,
    /// Look up and log the public IP before each upstream call.
    pub ip_lookup: bool,
}

impl Default for FetcherOptions {
    fn default() -> Self {
        Self {
            language: DEFAULT_LANGUAGE.to_string(),
            ip_lookup: false,
        }
    }
}

impl FetcherOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn ip_lookup(mut self, enabled: bool) -> Self {
        self.ip_lookup = enabled;
        self
    }
}

/// Default location of the transcript cache, `~/.local/share/captioner/transcript_cache.json`
/// on Linux.
pub fn default_store_path() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from(".local/share"))
        .join("captioner")
        .join("transcript_cache.json")
}
