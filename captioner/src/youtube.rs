//! Caption retrieval from YouTube watch pages.
//!
//! The watch page embeds the player response as a JS assignment
//! (`ytInitialPlayerResponse = {...};`). Its caption tracklist points at a
//! timedtext URL that serves the track as `json3` when asked.

use async_trait::async_trait;
use serde::Deserialize;
use tracing::{debug, info};

use crate::config::HttpClientOptions;
use crate::error::Result;
use crate::provider::{ProviderError, TranscriptProvider};
use crate::types::Segment;
use crate::video_id::VideoId;

const YOUTUBE_BASE: &str = "https://www.youtube.com";
const PLAYER_RESPONSE_MARKER: &str = "ytInitialPlayerResponse";

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PlayerResponse {
    playability_status: Option<PlayabilityStatus>,
    captions: Option<Captions>,
}

#[derive(Debug, Deserialize)]
struct PlayabilityStatus {
    status: String,
    reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Captions {
    #[serde(rename = "playerCaptionsTracklistRenderer")]
    tracklist: Option<Tracklist>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Tracklist {
    #[serde(default)]
    caption_tracks: Vec<CaptionTrack>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CaptionTrack {
    base_url: String,
    language_code: String,
    kind: Option<String>,
}

impl CaptionTrack {
    fn is_generated(&self) -> bool {
        self.kind.as_deref() == Some("asr")
    }
}

#[derive(Debug, Deserialize)]
struct TimedText {
    #[serde(default)]
    events: Vec<TimedEvent>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TimedEvent {
    #[serde(default)]
    t_start_ms: f64,
    #[serde(default)]
    d_duration_ms: f64,
    segs: Option<Vec<TimedSeg>>,
}

#[derive(Debug, Deserialize)]
struct TimedSeg {
    utf8: Option<String>,
}

/// [`TranscriptProvider`] backed by YouTube's public caption tracks.
pub struct YouTubeProvider {
    client: reqwest::Client,
    base_url: String,
}

impl YouTubeProvider {
    /// Use an already configured client.
    pub fn new(client: reqwest::Client) -> Self {
        Self {
            client,
            base_url: YOUTUBE_BASE.to_string(),
        }
    }

    pub fn with_options(options: &HttpClientOptions) -> Result<Self> {
        Ok(Self::new(options.build_client()?))
    }

    /// Point the provider at a different host (e.g. a local fixture server).
    pub fn base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn client(&self) -> &reqwest::Client {
        &self.client
    }

    async fn fetch_watch_page(&self, id: &VideoId) -> std::result::Result<String, ProviderError> {
        let response = self
            .client
            .get(format!("{}/watch", self.base_url))
            .query(&[("v", id.as_str()), ("hl", "en")])
            .send()
            .await?;
        check_status(&response)?;
        Ok(response.text().await?)
    }

    async fn fetch_track(&self, track: &CaptionTrack) -> std::result::Result<String, ProviderError> {
        let url = json3_url(&track.base_url)?;
        let response = self.client.get(url).send().await?;
        check_status(&response)?;
        Ok(response.text().await?)
    }
}

#[async_trait]
impl TranscriptProvider for YouTubeProvider {
    fn name(&self) -> &'static str {
        "youtube"
    }

    async fn fetch_segments(
        &self,
        id: &VideoId,
        language: &str,
    ) -> std::result::Result<Vec<Segment>, ProviderError> {
        info!(video_id = %id, language, "fetching caption tracklist");
        let html = self.fetch_watch_page(id).await?;
        let player = parse_player_response(&html)?;
        let track = select_track(&player, language)?;
        debug!(
            video_id = %id,
            language = %track.language_code,
            generated = track.is_generated(),
            "selected caption track"
        );

        let body = self.fetch_track(track).await?;
        let segments = parse_json3(&body)?;
        info!(video_id = %id, segments = segments.len(), "caption track fetched");
        Ok(segments)
    }
}

fn check_status(response: &reqwest::Response) -> std::result::Result<(), ProviderError> {
    let status = response.status();
    if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
        return Err(ProviderError::Network(
            "too many requests — the provider is rate limiting this IP".into(),
        ));
    }
    if !status.is_success() {
        return Err(ProviderError::Network(format!("HTTP status {status}")));
    }
    Ok(())
}

/// Extract the player response object embedded in a watch page.
fn parse_player_response(html: &str) -> std::result::Result<PlayerResponse, ProviderError> {
    let Some(marker) = html.find(PLAYER_RESPONSE_MARKER) else {
        if html.contains("class=\"g-recaptcha\"") {
            return Err(ProviderError::Network(
                "captcha page served — the provider is blocking this IP".into(),
            ));
        }
        return Err(ProviderError::Malformed(
            "player response not found in watch page".into(),
        ));
    };

    let after = &html[marker + PLAYER_RESPONSE_MARKER.len()..];
    let brace = after
        .find('{')
        .ok_or_else(|| ProviderError::Malformed("player response has no JSON body".into()))?;

    // Only the first JSON value is read; the trailing `;var ...` is ignored.
    serde_json::Deserializer::from_str(&after[brace..])
        .into_iter::<PlayerResponse>()
        .next()
        .ok_or_else(|| ProviderError::Malformed("empty player response".into()))?
        .map_err(|e| ProviderError::Malformed(format!("player response: {e}")))
}

/// Pick the track for `language`, preferring manual captions over generated ones.
fn select_track<'a>(
    player: &'a PlayerResponse,
    language: &str,
) -> std::result::Result<&'a CaptionTrack, ProviderError> {
    if let Some(status) = &player.playability_status {
        if status.status != "OK" {
            return Err(ProviderError::VideoUnavailable(
                status
                    .reason
                    .clone()
                    .unwrap_or_else(|| status.status.clone()),
            ));
        }
    }

    let tracks = player
        .captions
        .as_ref()
        .and_then(|c| c.tracklist.as_ref())
        .map(|t| t.caption_tracks.as_slice())
        .filter(|t| !t.is_empty())
        .ok_or(ProviderError::TranscriptsDisabled)?;

    let matching = || tracks.iter().filter(|t| t.language_code == language);
    matching()
        .find(|t| !t.is_generated())
        .or_else(|| matching().next())
        .ok_or_else(|| ProviderError::NoTranscriptFound {
            language: language.to_string(),
        })
}

/// The track URL with `fmt=json3`, replacing any format it already asks for.
fn json3_url(base_url: &str) -> std::result::Result<reqwest::Url, ProviderError> {
    let mut url = reqwest::Url::parse(base_url)
        .map_err(|e| ProviderError::Malformed(format!("caption track URL: {e}")))?;
    let pairs: Vec<(String, String)> = url
        .query_pairs()
        .filter(|(k, _)| k != "fmt")
        .map(|(k, v)| (k.into_owned(), v.into_owned()))
        .collect();
    url.query_pairs_mut()
        .clear()
        .extend_pairs(pairs)
        .append_pair("fmt", "json3");
    Ok(url)
}

/// Parse a `json3` timedtext body into segments, skipping events with no text.
fn parse_json3(body: &str) -> std::result::Result<Vec<Segment>, ProviderError> {
    let timed: TimedText = serde_json::from_str(body)
        .map_err(|e| ProviderError::Malformed(format!("caption track: {e}")))?;

    let segments = timed
        .events
        .into_iter()
        .filter_map(|event| {
            let text: String = event
                .segs?
                .into_iter()
                .filter_map(|s| s.utf8)
                .collect();
            let text = text.trim();
            if text.is_empty() {
                return None;
            }
            Some(Segment::new(
                text,
                event.t_start_ms / 1000.0,
                event.d_duration_ms / 1000.0,
            ))
        })
        .collect();

    Ok(segments)
}
