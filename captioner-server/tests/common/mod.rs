use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use captioner::{
    FetcherOptions, ProviderError, Segment, TranscriptFetcher, TranscriptProvider, TranscriptStore,
    VideoId,
};
use captioner_server::AppState;
use reqwest::Client;
use tokio::net::TcpListener;
use tokio::sync::oneshot;

/// Provider answering from a fixed table, counting calls per video id.
#[derive(Default)]
pub struct FakeProvider {
    answers: HashMap<String, Result<Vec<Segment>, ProviderError>>,
    calls: Mutex<HashMap<String, usize>>,
    total: AtomicUsize,
}

impl FakeProvider {
    pub fn with_segments(mut self, id: &str, texts: &[&str]) -> Self {
        let segments = texts
            .iter()
            .enumerate()
            .map(|(i, t)| Segment::new(*t, i as f64 * 2.0, 2.0))
            .collect();
        self.answers.insert(id.to_string(), Ok(segments));
        self
    }

    pub fn with_error(mut self, id: &str, error: ProviderError) -> Self {
        self.answers.insert(id.to_string(), Err(error));
        self
    }

    pub fn calls_for(&self, id: &str) -> usize {
        self.calls.lock().unwrap().get(id).copied().unwrap_or(0)
    }

    pub fn total_calls(&self) -> usize {
        self.total.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl TranscriptProvider for FakeProvider {
    fn name(&self) -> &'static str {
        "fake"
    }

    async fn fetch_segments(
        &self,
        id: &VideoId,
        _language: &str,
    ) -> Result<Vec<Segment>, ProviderError> {
        self.total.fetch_add(1, Ordering::SeqCst);
        *self
            .calls
            .lock()
            .unwrap()
            .entry(id.to_string())
            .or_default() += 1;
        self.answers
            .get(id.as_str())
            .cloned()
            .unwrap_or(Err(ProviderError::NoTranscriptFound {
                language: "en".into(),
            }))
    }
}

pub struct TestServer {
    pub base_url: String,
    pub client: Client,
    shutdown: Option<oneshot::Sender<()>>,
    handle: Option<tokio::task::JoinHandle<std::io::Result<()>>>,
}

impl TestServer {
    pub async fn start(
        store: Arc<dyn TranscriptStore>,
        provider: Arc<FakeProvider>,
    ) -> Result<Self, Box<dyn std::error::Error>> {
        let fetcher = TranscriptFetcher::new(store, provider, FetcherOptions::default());
        let listener = TcpListener::bind("127.0.0.1:0").await?;
        let addr = listener.local_addr()?;
        let (tx, rx) = oneshot::channel::<()>();

        let handle = tokio::spawn(captioner_server::serve(
            listener,
            AppState::new(fetcher),
            async move {
                let _ = rx.await;
            },
        ));

        Ok(Self {
            base_url: format!("http://{addr}"),
            client: Client::new(),
            shutdown: Some(tx),
            handle: Some(handle),
        })
    }

    pub async fn post_captions(
        &self,
        body: serde_json::Value,
    ) -> Result<(reqwest::StatusCode, serde_json::Value), Box<dyn std::error::Error>> {
        let response = self
            .client
            .post(format!("{}/captions", self.base_url))
            .json(&body)
            .send()
            .await?;
        let status = response.status();
        let body: serde_json::Value = response.json().await?;
        Ok((status, body))
    }

    pub async fn stop(mut self) -> Result<(), Box<dyn std::error::Error>> {
        if let Some(tx) = self.shutdown.take() {
            let _ = tx.send(());
        }
        if let Some(handle) = self.handle.take() {
            handle.await??;
        }
        Ok(())
    }
}
