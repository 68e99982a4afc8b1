use std::sync::Arc;

use captioner::TranscriptFetcher;

#[derive(Clone)]
pub struct AppState {
    pub fetcher: Arc<TranscriptFetcher>,
}

impl AppState {
    pub fn new(fetcher: TranscriptFetcher) -> Self {
        Self {
            fetcher: Arc::new(fetcher),
        }
    }
}
