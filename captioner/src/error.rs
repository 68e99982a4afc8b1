use std::path::PathBuf;

/// All errors that can occur in captioner.
///
/// Upstream caption failures are not represented here: they are reported as
/// [`ProviderError`](crate::provider::ProviderError) inside a
/// [`FetchOutcome::Unavailable`](crate::fetcher::FetchOutcome) and never
/// surface as an `Err`.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("invalid URL: no video id found in \"{0}\"")]
    InvalidUrl(String),

    #[error("transcript store error: {0}")]
    Store(String),

    #[error("transcript store is corrupt: {path}: {reason}")]
    StoreCorrupt { path: PathBuf, reason: String },

    #[error("transcript store is closed")]
    StoreClosed,

    #[error("invalid option: {0}")]
    InvalidOption(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
