use axum::{extract::rejection::JsonRejection, extract::State, Json};
use captioner::{FetchOutcome, VideoId};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::error::HttpError;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct CaptionRequest {
    pub url: String,
    /// Skip the cache read. The result is still written to the cache.
    #[serde(default)]
    pub force: bool,
}

#[derive(Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct CaptionResponse {
    pub status: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub captions: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl CaptionResponse {
    fn found(captions: String) -> Self {
        Self {
            status: true,
            captions: Some(captions),
            message: None,
        }
    }

    fn unavailable(message: String) -> Self {
        Self {
            status: false,
            captions: None,
            message: Some(message),
        }
    }
}

pub async fn index(State(state): State<AppState>) -> Json<Value> {
    let cached = state.fetcher.store().len().ok();
    Json(json!({
        "service": "captioner",
        "version": env!("CARGO_PKG_VERSION"),
        "cached_transcripts": cached,
        "endpoints": {
            "GET /": "Health check",
            "POST /captions": "Get the English captions of a video as text (body: {url, force})"
        }
    }))
}

pub async fn captions(
    State(state): State<AppState>,
    payload: Result<Json<CaptionRequest>, JsonRejection>,
) -> Result<Json<CaptionResponse>, HttpError> {
    let Json(request) = payload?;

    let Some(id) = VideoId::from_url(&request.url) else {
        tracing::warn!(url = %request.url, "rejected caption request: no video id");
        return Err(HttpError::BadRequest {
            detail: "Invalid URL".to_string(),
        });
    };

    tracing::info!(video_id = %id, force = request.force, "received caption request");

    let outcome = state.fetcher.fetch(&id, request.force).await.map_err(|error| {
        tracing::error!(video_id = %id, error = %error, "caption request failed");
        HttpError::from(error)
    })?;

    let response = match outcome {
        // An empty track is cached like any other result but is not worth returning.
        FetchOutcome::Cached(text) | FetchOutcome::Fetched(text) if text.is_empty() => {
            tracing::info!(video_id = %id, "caption track is empty");
            CaptionResponse::unavailable("No captions available".to_string())
        }
        FetchOutcome::Cached(text) | FetchOutcome::Fetched(text) => CaptionResponse::found(text),
        FetchOutcome::Unavailable(reason) => {
            CaptionResponse::unavailable(format!("No captions available: {reason}"))
        }
    };
    Ok(Json(response))
}
