//! Video document models.

use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Unique identifier for a video document.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(transparent)]
pub struct VideoId(pub String);

impl VideoId {
    /// Generate a new random video ID.
    pub fn new() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    /// Create from an existing string.
    pub fn from_string(s: impl Into<String>) -> Self {
        Self(s.into())
    }

    /// Get the inner string.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for VideoId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for VideoId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for VideoId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for VideoId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// Kind of video: a regular long-form upload or a short vertical reel.
///
/// Stored on the wire as the `type` field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema, Default)]
#[serde(rename_all = "lowercase")]
pub enum VideoKind {
    /// Long-form video shown in the home feed and watch page
    #[default]
    Standard,
    /// Short vertical video shown in the reels feed
    Reel,
}

impl VideoKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            VideoKind::Standard => "standard",
            VideoKind::Reel => "reel",
        }
    }

    /// Parse from the wire value, defaulting to `Standard` for unknown input.
    pub fn from_str_lossy(s: &str) -> Self {
        match s {
            "reel" => VideoKind::Reel,
            _ => VideoKind::Standard,
        }
    }
}

impl fmt::Display for VideoKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Where the playable media lives.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema, Default)]
#[serde(rename_all = "lowercase")]
pub enum VideoProvider {
    /// File uploaded to the platform's storage bucket
    #[default]
    Upload,
    /// Embedded YouTube video; the embed player exposes no playback samples
    Youtube,
}

impl VideoProvider {
    pub fn as_str(&self) -> &'static str {
        match self {
            VideoProvider::Upload => "upload",
            VideoProvider::Youtube => "youtube",
        }
    }

    pub fn from_str_lossy(s: &str) -> Self {
        match s {
            "youtube" => VideoProvider::Youtube,
            _ => VideoProvider::Upload,
        }
    }
}

impl fmt::Display for VideoProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Aggregate counter fields on a video document.
///
/// Aggregates are mutated through atomic incrementing writes only; nothing
/// in this workspace reads a counter before writing it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub enum EngagementField {
    Views,
    Likes,
    WatchTime,
    Completions,
    Shares,
}

impl EngagementField {
    /// Field path on the video document.
    pub fn field_path(&self) -> &'static str {
        match self {
            EngagementField::Views => "views",
            EngagementField::Likes => "likes",
            EngagementField::WatchTime => "watchTime",
            EngagementField::Completions => "completions",
            EngagementField::Shares => "shares",
        }
    }
}

impl fmt::Display for EngagementField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.field_path())
    }
}

/// Platform-wide engagement counters stored on a video document.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct EngagementTotals {
    /// Number of view activations
    #[serde(default)]
    pub views: u64,

    /// Net like count (likes can be withdrawn)
    #[serde(default)]
    pub likes: i64,

    /// Cumulative watch time across all viewers, in seconds
    #[serde(default)]
    pub watch_time: u64,

    /// Number of sessions that crossed the completion threshold
    #[serde(default)]
    pub completions: u64,

    /// Number of shares
    #[serde(default)]
    pub shares: u64,
}

/// Video document as stored in the `videos` collection.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct Video {
    /// Document ID
    pub video_id: VideoId,

    /// Video title
    pub title: String,

    /// Playback URL (download URL for uploads, embed URL for YouTube)
    pub url: String,

    /// Media provider
    #[serde(default)]
    pub provider: VideoProvider,

    /// Standard video or reel
    #[serde(rename = "type", default)]
    pub kind: VideoKind,

    /// Owning channel document ID
    #[serde(skip_serializing_if = "Option::is_none")]
    pub channel_id: Option<String>,

    /// Denormalized channel name for display
    #[serde(default)]
    pub channel_name: String,

    /// Description shown under the player
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// Thumbnail URL
    #[serde(skip_serializing_if = "Option::is_none")]
    pub thumbnail: Option<String>,

    /// User ID of the uploader
    pub uploader_id: String,

    /// Whether the video is visible in public feeds
    #[serde(default)]
    pub published: bool,

    /// When the video was last published
    #[serde(skip_serializing_if = "Option::is_none")]
    pub published_at: Option<DateTime<Utc>>,

    /// Whether the video is pinned to the featured shelf
    #[serde(default)]
    pub featured: bool,

    /// Creation timestamp
    pub created_at: DateTime<Utc>,

    /// Last time a viewer activated this video
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_viewed_at: Option<DateTime<Utc>>,

    /// Engagement aggregates
    #[serde(flatten)]
    pub totals: EngagementTotals,
}

impl Video {
    /// Create a new unpublished video draft.
    pub fn new_draft(
        video_id: VideoId,
        title: impl Into<String>,
        url: impl Into<String>,
        uploader_id: impl Into<String>,
    ) -> Self {
        Self {
            video_id,
            title: title.into(),
            url: url.into(),
            provider: VideoProvider::Upload,
            kind: VideoKind::Standard,
            channel_id: None,
            channel_name: String::new(),
            description: None,
            thumbnail: None,
            uploader_id: uploader_id.into(),
            published: false,
            published_at: None,
            featured: false,
            created_at: Utc::now(),
            last_viewed_at: None,
            totals: EngagementTotals::default(),
        }
    }

    /// Attach the draft to a channel.
    pub fn with_channel(
        mut self,
        channel_id: impl Into<String>,
        channel_name: impl Into<String>,
    ) -> Self {
        self.channel_id = Some(channel_id.into());
        self.channel_name = channel_name.into();
        self
    }

    /// Mark the draft as a reel.
    pub fn as_reel(mut self) -> Self {
        self.kind = VideoKind::Reel;
        self
    }

    /// True when the video should appear in the reels feed.
    pub fn is_public_reel(&self) -> bool {
        self.published && self.kind == VideoKind::Reel
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_video_id_generation() {
        let id1 = VideoId::new();
        let id2 = VideoId::new();
        assert_ne!(id1, id2);
    }

    #[test]
    fn test_kind_parsing_is_lossy() {
        assert_eq!(VideoKind::from_str_lossy("reel"), VideoKind::Reel);
        assert_eq!(VideoKind::from_str_lossy("standard"), VideoKind::Standard);
        assert_eq!(VideoKind::from_str_lossy("garbage"), VideoKind::Standard);
    }

    #[test]
    fn test_engagement_field_paths() {
        assert_eq!(EngagementField::WatchTime.field_path(), "watchTime");
        assert_eq!(EngagementField::Views.field_path(), "views");
    }

    #[test]
    fn test_new_draft_is_unpublished() {
        let video = Video::new_draft(VideoId::new(), "Title", "https://cdn/video.mp4", "user-1");
        assert!(!video.published);
        assert!(!video.featured);
        assert_eq!(video.totals, EngagementTotals::default());
    }

    #[test]
    fn test_wire_serialization_uses_store_field_names() {
        let video = Video::new_draft(VideoId::new(), "Title", "u", "user-1").as_reel();
        let json = serde_json::to_value(&video).unwrap();
        assert_eq!(json["type"], "reel");
        assert!(json.get("channelName").is_some());
        assert!(json.get("createdAt").is_some());
        // Aggregates flatten onto the document root.
        assert_eq!(json["watchTime"], 0);
        assert!(json.get("totals").is_none());
    }

    #[test]
    fn test_public_reel_requires_published() {
        let mut video = Video::new_draft(VideoId::new(), "t", "u", "user-1").as_reel();
        assert!(!video.is_public_reel());
        video.published = true;
        assert!(video.is_public_reel());
    }
}
