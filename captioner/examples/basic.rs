//! Look up the captions of a video and print the text.
//!
//! Usage: cargo run --example basic -- https://www.youtube.com/watch?v=dQw4w9WgXcQ

use std::sync::Arc;

use captioner::{FetchOutcome, FetcherOptions, HttpClientOptions, MemoryStore, TranscriptFetcher, YouTubeProvider};

#[tokio::main]
async fn main() -> captioner::Result<()> {
    let url = std::env::args()
        .nth(1)
        .expect("usage: basic <video-url>");

    let id = captioner::extract_video_id(&url)?;
    let provider = Arc::new(YouTubeProvider::with_options(&HttpClientOptions::default())?);
    let fetcher = TranscriptFetcher::new(Arc::new(MemoryStore::new()), provider, FetcherOptions::default());

    match fetcher.fetch(&id, false).await? {
        FetchOutcome::Cached(text) | FetchOutcome::Fetched(text) => println!("{text}"),
        FetchOutcome::Unavailable(reason) => eprintln!("No captions available: {reason}"),
    }

    Ok(())
}
