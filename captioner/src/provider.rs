use async_trait::async_trait;

use crate::types::Segment;
use crate::video_id::VideoId;

/// Why the upstream provider could not produce a transcript.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ProviderError {
    #[error("transcripts are disabled for this video")]
    TranscriptsDisabled,

    #[error("no transcript found for language \"{language}\"")]
    NoTranscriptFound { language: String },

    #[error("video unavailable: {0}")]
    VideoUnavailable(String),

    #[error("request timed out")]
    Timeout,

    #[error("network error: {0}")]
    Network(String),

    #[error("malformed provider response: {0}")]
    Malformed(String),
}

impl From<reqwest::Error> for ProviderError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            ProviderError::Timeout
        } else if e.is_decode() {
            ProviderError::Malformed(e.to_string())
        } else {
            ProviderError::Network(e.to_string())
        }
    }
}

/// Source of timed caption segments for a video.
#[async_trait]
pub trait TranscriptProvider: Send + Sync {
    /// Short name for logs.
    fn name(&self) -> &'static str;

    /// Fetch the caption track for `id` in `language`, in playback order.
    async fn fetch_segments(
        &self,
        id: &VideoId,
        language: &str,
    ) -> Result<Vec<Segment>, ProviderError>;
}
