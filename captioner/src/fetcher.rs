use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::config::FetcherOptions;
use crate::diagnostics;
use crate::error::Result;
use crate::provider::{ProviderError, TranscriptProvider};
use crate::store::TranscriptStore;
use crate::types::{join_segments, preview};
use crate::video_id::VideoId;

const PREVIEW_CHARS: usize = 100;

/// Result of a [`TranscriptFetcher::fetch`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchOutcome {
    /// Served from the store; the provider was not called.
    Cached(String),
    /// Fetched from the provider and written to the store.
    Fetched(String),
    /// The provider failed. Nothing was written.
    Unavailable(ProviderError),
}

impl FetchOutcome {
    /// The transcript text, if one was produced.
    pub fn text(&self) -> Option<&str> {
        match self {
            FetchOutcome::Cached(text) | FetchOutcome::Fetched(text) => Some(text),
            FetchOutcome::Unavailable(_) => None,
        }
    }

    pub fn into_text(self) -> Option<String> {
        match self {
            FetchOutcome::Cached(text) | FetchOutcome::Fetched(text) => Some(text),
            FetchOutcome::Unavailable(_) => None,
        }
    }

    pub fn is_cached(&self) -> bool {
        matches!(self, FetchOutcome::Cached(_))
    }
}

/// Cache-first transcript lookup.
///
/// Reads and writes are not atomic as a pair: two concurrent misses for the
/// same id may both call the provider, and the last write wins.
pub struct TranscriptFetcher {
    store: Arc<dyn TranscriptStore>,
    provider: Arc<dyn TranscriptProvider>,
    options: FetcherOptions,
    diagnostics_client: Option<reqwest::Client>,
}

impl TranscriptFetcher {
    pub fn new(
        store: Arc<dyn TranscriptStore>,
        provider: Arc<dyn TranscriptProvider>,
        options: FetcherOptions,
    ) -> Self {
        Self {
            store,
            provider,
            options,
            diagnostics_client: None,
        }
    }

    /// Client used for the public-IP lookup when `ip_lookup` is enabled.
    /// Without one, a default client is built on first use.
    pub fn diagnostics_client(mut self, client: reqwest::Client) -> Self {
        self.diagnostics_client = Some(client);
        self
    }

    pub fn store(&self) -> &Arc<dyn TranscriptStore> {
        &self.store
    }

    /// Return the transcript for `id`.
    ///
    /// Unless `force` is set, a cached transcript is returned without calling
    /// the provider. A successful provider call always overwrites the cache
    /// entry, forced or not. Provider failures are returned as
    /// [`FetchOutcome::Unavailable`]; only store failures are `Err`.
    pub async fn fetch(&self, id: &VideoId, force: bool) -> Result<FetchOutcome> {
        if !force {
            if let Some(text) = self.store.get(id)? {
                debug!(video_id = %id, "transcript retrieved from cache");
                return Ok(FetchOutcome::Cached(text));
            }
        }

        if self.options.ip_lookup {
            let client = self.diagnostics_client.clone().unwrap_or_default();
            let ip = diagnostics::public_ip(&client).await;
            debug!(video_id = %id, public_ip = %ip, "attempting to fetch transcript");
        }

        let segments = match self
            .provider
            .fetch_segments(id, &self.options.language)
            .await
        {
            Ok(segments) => segments,
            Err(reason) => {
                warn!(
                    video_id = %id,
                    provider = self.provider.name(),
                    error = %reason,
                    "transcript unavailable"
                );
                return Ok(FetchOutcome::Unavailable(reason));
            }
        };

        let text = join_segments(&segments);
        self.store.put(id, &text)?;

        info!(video_id = %id, force, segments = segments.len(), "transcript fetched and cached");
        debug!(video_id = %id, preview = %preview(&text, PREVIEW_CHARS), "transcript text");

        Ok(FetchOutcome::Fetched(text))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use crate::store::MemoryStore;
    use crate::types::Segment;
    use crate::video_id::extract_video_id;

    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    /// Provider that replays queued responses and counts calls.
    #[derive(Default)]
    struct ScriptedProvider {
        responses: Mutex<Vec<std::result::Result<Vec<Segment>, ProviderError>>>,
        calls: AtomicUsize,
        last_language: Mutex<Option<String>>,
    }

    impl ScriptedProvider {
        fn then(self, response: std::result::Result<Vec<Segment>, ProviderError>) -> Self {
            self.responses.lock().unwrap().insert(0, response);
            self
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl TranscriptProvider for ScriptedProvider {
        fn name(&self) -> &'static str {
            "scripted"
        }

        async fn fetch_segments(
            &self,
            _id: &VideoId,
            language: &str,
        ) -> std::result::Result<Vec<Segment>, ProviderError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            *self.last_language.lock().unwrap() = Some(language.to_string());
            self.responses
                .lock()
                .unwrap()
                .pop()
                .unwrap_or(Err(ProviderError::Network("no scripted response".into())))
        }
    }

    /// Store whose writes always fail.
    struct ReadOnlyStore;

    impl TranscriptStore for ReadOnlyStore {
        fn get(&self, _id: &VideoId) -> Result<Option<String>> {
            Ok(None)
        }
        fn put(&self, _id: &VideoId, _text: &str) -> Result<()> {
            Err(Error::Store("disk full".into()))
        }
        fn close(&self) -> Result<()> {
            Ok(())
        }
        fn len(&self) -> Result<usize> {
            Ok(0)
        }
    }

    fn segments(texts: &[&str]) -> Vec<Segment> {
        texts
            .iter()
            .enumerate()
            .map(|(i, t)| Segment::new(*t, i as f64, 1.0))
            .collect()
    }

    fn setup(provider: ScriptedProvider) -> (TranscriptFetcher, Arc<MemoryStore>, Arc<ScriptedProvider>) {
        let store = Arc::new(MemoryStore::new());
        let provider = Arc::new(provider);
        let fetcher = TranscriptFetcher::new(store.clone(), provider.clone(), FetcherOptions::default());
        (fetcher, store, provider)
    }

    fn vid(url: &str) -> VideoId {
        extract_video_id(url).unwrap()
    }

    #[tokio::test]
    async fn test_miss_fetches_joins_and_caches() {
        let (fetcher, store, provider) =
            setup(ScriptedProvider::default().then(Ok(segments(&["hello", "world"]))));
        let id = vid("https://www.youtube.com/watch?v=abc123");

        let outcome = fetcher.fetch(&id, false).await.unwrap();

        assert_eq!(outcome, FetchOutcome::Fetched("hello world".into()));
        assert_eq!(store.get(&id).unwrap().as_deref(), Some("hello world"));
        assert_eq!(provider.calls(), 1);
        assert_eq!(provider.last_language.lock().unwrap().as_deref(), Some("en"));
    }

    #[tokio::test]
    async fn test_second_fetch_is_served_from_cache() {
        let (fetcher, _store, provider) =
            setup(ScriptedProvider::default().then(Ok(segments(&["hello", "world"]))));
        let id = vid("https://www.youtube.com/watch?v=abc123");

        let first = fetcher.fetch(&id, false).await.unwrap();
        let second = fetcher.fetch(&id, false).await.unwrap();

        assert_eq!(provider.calls(), 1);
        assert!(second.is_cached());
        assert_eq!(first.text(), second.text());
    }

    #[tokio::test]
    async fn test_force_calls_upstream_and_overwrites() {
        let (fetcher, store, provider) = setup(
            ScriptedProvider::default()
                .then(Ok(segments(&["old"])))
                .then(Ok(segments(&["new", "text"]))),
        );
        let id = vid("https://youtu.be/abc123");

        fetcher.fetch(&id, false).await.unwrap();
        let forced = fetcher.fetch(&id, true).await.unwrap();

        assert_eq!(provider.calls(), 2);
        assert_eq!(forced, FetchOutcome::Fetched("new text".into()));
        assert_eq!(store.get(&id).unwrap().as_deref(), Some("new text"));
    }

    #[tokio::test]
    async fn test_force_on_empty_cache_still_writes() {
        let (fetcher, store, _provider) =
            setup(ScriptedProvider::default().then(Ok(segments(&["fresh"]))));
        let id = vid("https://youtu.be/abc123");

        fetcher.fetch(&id, true).await.unwrap();
        assert_eq!(store.get(&id).unwrap().as_deref(), Some("fresh"));
    }

    #[tokio::test]
    async fn test_failure_is_not_cached() {
        let (fetcher, store, _provider) =
            setup(ScriptedProvider::default().then(Err(ProviderError::TranscriptsDisabled)));
        let id = vid("https://youtu.be/xyz789");

        let outcome = fetcher.fetch(&id, false).await.unwrap();

        assert_eq!(outcome, FetchOutcome::Unavailable(ProviderError::TranscriptsDisabled));
        assert_eq!(outcome.text(), None);
        assert_eq!(store.get(&id).unwrap(), None);
    }

    #[tokio::test]
    async fn test_failure_does_not_poison_existing_entry() {
        let (fetcher, store, provider) = setup(
            ScriptedProvider::default()
                .then(Ok(segments(&["kept"])))
                .then(Err(ProviderError::Timeout)),
        );
        let id = vid("https://youtu.be/abc123");

        fetcher.fetch(&id, false).await.unwrap();
        let forced = fetcher.fetch(&id, true).await.unwrap();
        assert_eq!(forced, FetchOutcome::Unavailable(ProviderError::Timeout));
        assert_eq!(store.get(&id).unwrap().as_deref(), Some("kept"));

        let again = fetcher.fetch(&id, false).await.unwrap();
        assert_eq!(again, FetchOutcome::Cached("kept".into()));
        assert_eq!(provider.calls(), 2);
    }

    #[tokio::test]
    async fn test_failure_is_not_retried() {
        let (fetcher, _store, provider) =
            setup(ScriptedProvider::default().then(Err(ProviderError::Network("reset".into()))));
        let id = vid("https://youtu.be/abc123");

        fetcher.fetch(&id, false).await.unwrap();
        assert_eq!(provider.calls(), 1);
    }

    #[tokio::test]
    async fn test_store_write_failure_propagates() {
        let provider = Arc::new(ScriptedProvider::default().then(Ok(segments(&["text"]))));
        let fetcher =
            TranscriptFetcher::new(Arc::new(ReadOnlyStore), provider, FetcherOptions::default());
        let id = vid("https://youtu.be/abc123");

        let err = fetcher.fetch(&id, false).await.unwrap_err();
        assert!(matches!(err, Error::Store(_)));
    }

    #[tokio::test]
    async fn test_empty_track_caches_empty_text() {
        // The library keeps the empty result so the provider is not asked
        // again; deciding how to present it is left to the caller.
        let (fetcher, store, _provider) = setup(ScriptedProvider::default().then(Ok(Vec::new())));
        let id = vid("https://youtu.be/abc123");

        let outcome = fetcher.fetch(&id, false).await.unwrap();
        assert_eq!(outcome.into_text().as_deref(), Some(""));
        assert_eq!(store.get(&id).unwrap().as_deref(), Some(""));

        let again = fetcher.fetch(&id, false).await.unwrap();
        assert!(matches!(again, FetchOutcome::Cached(ref text) if text.is_empty()));
    }
}
