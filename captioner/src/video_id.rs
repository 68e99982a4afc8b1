use std::fmt;

use serde::Serialize;
use tracing::debug;

use crate::error::{Error, Result};

/// Markers that precede a video id, in priority order. The first marker that
/// is followed by at least one id character anywhere in the input wins.
const ID_MARKERS: [&str; 3] = [
    "v=",        // watch?v=<id>
    "/v/",       // /v/<id>
    "youtu.be/", // youtu.be/<id>
];

/// A video identifier extracted from a URL.
///
/// Only [`VideoId::from_url`] produces one, so the inner string is always a
/// non-empty run of ASCII alphanumerics, `_` or `-`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct VideoId(String);

impl VideoId {
    /// Extract the video id from a URL, or `None` if no marker matches.
    ///
    /// Matching is purely syntactic; the id is not checked against the
    /// provider.
    pub fn from_url(url: &str) -> Option<Self> {
        for marker in ID_MARKERS {
            for (idx, _) in url.match_indices(marker) {
                let rest = &url[idx + marker.len()..];
                let len = rest
                    .find(|c: char| !is_id_char(c))
                    .unwrap_or(rest.len());
                if len > 0 {
                    let id = VideoId(rest[..len].to_string());
                    debug!(video_id = %id, marker, "extracted video id");
                    return Some(id);
                }
            }
        }
        debug!(%url, "could not extract video id from URL");
        None
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

fn is_id_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_' || c == '-'
}

impl fmt::Display for VideoId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for VideoId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Like [`VideoId::from_url`], but returns [`Error::InvalidUrl`] on a miss.
pub fn extract_video_id(url: &str) -> Result<VideoId> {
    VideoId::from_url(url).ok_or_else(|| Error::InvalidUrl(url.to_string()))
}
