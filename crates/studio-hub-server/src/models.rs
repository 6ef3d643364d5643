//! API models and OpenAPI schemas.
//!
//! Defines request/response structures for the studio hub API.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// A queued request to play one piece of audio.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq, ToSchema)]
pub struct Track {
    /// Display title supplied by the queuer or resolved from search.
    pub title: Option<String>,
    /// Locator handed to the stream launcher (opaque to the hub).
    pub url: String,
    /// Identifier of the requesting user (display only).
    pub user: Option<String>,
    /// Enqueue time in Unix epoch milliseconds.
    pub id: u64,
}

/// Payload for `POST /api/queue`.
#[derive(Clone, Debug, Default, Serialize, Deserialize, ToSchema)]
pub struct QueueRequest {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub user: Option<String>,
}

/// Acknowledgement returned after a track was accepted.
#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
pub struct QueueResponse {
    /// Always `queued`.
    pub status: String,
    /// The constructed track, including its generated id.
    pub track: Track,
}

/// Snapshot of what is playing and what is waiting.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq, ToSchema)]
pub struct StatusResponse {
    /// Track the launcher was last told to play.
    pub now_playing: Option<Track>,
    /// Pending tracks in play order.
    pub queue: Vec<Track>,
    /// Fixed node identifier of this hub.
    pub node: String,
}

/// Query string for `GET /api/search`.
#[derive(Clone, Debug, Deserialize, ToSchema)]
pub struct SearchQuery {
    #[serde(default)]
    pub q: Option<String>,
}

/// A candidate track returned by the search provider.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq, ToSchema)]
pub struct SearchResult {
    pub id: Option<String>,
    pub title: Option<String>,
    pub uploader: Option<String>,
    /// Human readable duration, e.g. `3:45`.
    pub duration: Option<String>,
    /// Watch URL that can be queued as-is.
    pub url: String,
}

/// Payload for `POST /api/volume`.
#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
pub struct VolumeRequest {
    /// Output volume percentage (not range checked).
    pub volume: i64,
}

/// Acknowledgement for a volume change.
#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
pub struct VolumeResponse {
    /// Always `updated`.
    pub status: String,
    pub volume: i64,
}

/// Error body returned by every failing endpoint.
#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
pub struct ErrorResponse {
    pub error: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
}
