//! Fetch through a persistent cache file with a custom HTTP client.
//!
//! Usage: cargo run --example options -- https://youtu.be/dQw4w9WgXcQ /tmp/captions.json

use std::sync::Arc;
use std::time::Duration;

use captioner::{FetcherOptions, FileStore, HttpClientOptions, TranscriptFetcher, TranscriptStore, YouTubeProvider};

#[tokio::main]
async fn main() -> captioner::Result<()> {
    let mut args = std::env::args().skip(1);
    let url = args.next().expect("usage: options <video-url> [cache-file]");
    let cache_path = args
        .next()
        .map(Into::into)
        .unwrap_or_else(captioner::default_store_path);

    let http = HttpClientOptions::new()
        .user_agent("captioner-example/0.1")
        .timeout(Duration::from_secs(10))?;

    let store = Arc::new(FileStore::open(&cache_path)?);
    let provider = Arc::new(YouTubeProvider::with_options(&http)?);
    let fetcher = TranscriptFetcher::new(store.clone(), provider, FetcherOptions::new().ip_lookup(true));

    let id = captioner::extract_video_id(&url)?;
    let outcome = fetcher.fetch(&id, false).await?;
    println!(
        "{id}: {} ({} cached entries in {})",
        if outcome.is_cached() { "cache hit" } else { "fetched" },
        store.len()?,
        store.path().display()
    );
    if let Some(text) = outcome.text() {
        println!("{text}");
    }

    store.close()
}
