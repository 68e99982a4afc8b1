//! Video caption lookup with a persistent cache — URL in, plain-text transcript out.
//!
//! **captioner** extracts the video id from a URL, serves the transcript from
//! an on-disk cache when it has one, and otherwise fetches the English caption
//! track from the provider, joins its segments into one string and caches it.
//!
//! # Quick start
//!
//! ```rust,no_run
//! # #[tokio::main]
//! # async fn main() -> captioner::Result<()> {
//! use std::sync::Arc;
//! use captioner::{FetcherOptions, FileStore, HttpClientOptions, TranscriptFetcher, YouTubeProvider};
//!
//! let store = Arc::new(FileStore::open(captioner::default_store_path())?);
//! let provider = Arc::new(YouTubeProvider::with_options(&HttpClientOptions::default())?);
//! let fetcher = TranscriptFetcher::new(store.clone(), provider, FetcherOptions::default());
//!
//! let id = captioner::extract_video_id("https://youtu.be/dQw4w9WgXcQ")?;
//! if let Some(text) = fetcher.fetch(&id, false).await?.text() {
//!     println!("{text}");
//! }
//!
//! captioner::TranscriptStore::close(store.as_ref())?;
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod diagnostics;
pub mod error;
pub mod fetcher;
pub mod provider;
pub mod store;
pub mod types;
pub mod video_id;
pub mod youtube;

#[cfg(test)]
mod test_support;

pub use config::{default_store_path, FetcherOptions, HttpClientOptions, DEFAULT_LANGUAGE};
pub use error::{Error, Result};
pub use fetcher::{FetchOutcome, TranscriptFetcher};
pub use provider::{ProviderError, TranscriptProvider};
pub use store::{FileStore, MemoryStore, TranscriptStore};
pub use types::{join_segments, Segment};
pub use video_id::{extract_video_id, VideoId};
pub use youtube::YouTubeProvider;
