//! Watch history models.
//!
//! Each viewer has one history entry per video (`users/{uid}/history/{videoId}`),
//! overwritten on re-watch. Progress is a fraction in [0, 1]; watch time
//! accumulates in whole seconds.

use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::video::{VideoId, VideoKind};

/// Clamp a raw progress ratio into the [0, 1] range the store accepts.
pub fn clamp_progress(progress: f64) -> f64 {
    if !progress.is_finite() {
        return 0.0;
    }
    progress.clamp(0.0, 1.0)
}

/// A viewer's history record for one video.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct HistoryEntry {
    /// Video this entry tracks (also the document ID)
    pub video_id: VideoId,

    /// Denormalized video title
    #[serde(default)]
    pub title: String,

    /// Denormalized channel name
    #[serde(default)]
    pub channel_name: String,

    /// Denormalized thumbnail URL
    #[serde(skip_serializing_if = "Option::is_none")]
    pub thumbnail: Option<String>,

    /// Last reported playback position as a fraction of duration, in [0, 1]
    #[serde(default)]
    pub progress: f64,

    /// Cumulative watch time for this viewer and video, in seconds
    #[serde(default)]
    pub watch_time: u64,

    /// Timestamp of the last update
    pub watched_at: DateTime<Utc>,

    /// Kind of the watched video
    #[serde(default)]
    pub video_type: VideoKind,
}

impl HistoryEntry {
    /// Progress clamped into [0, 1], regardless of what the store returned.
    pub fn clamped_progress(&self) -> f64 {
        clamp_progress(self.progress)
    }
}

/// Merge-write payload produced by one accepted playback sample.
///
/// `progress` and `watched_at` replace the stored fields; `watch_delta_secs`
/// is applied as an atomic increment on the entry's `watchTime`.
#[derive(Debug, Clone, PartialEq)]
pub struct HistoryPatch {
    /// Video being watched
    pub video_id: VideoId,

    /// Denormalized title for the history list
    pub title: String,

    /// Denormalized channel name
    pub channel_name: String,

    /// Denormalized thumbnail URL
    pub thumbnail: Option<String>,

    /// Playback progress, clamped to [0, 1]
    pub progress: f64,

    /// Seconds of watch time accrued since the last accepted sample
    pub watch_delta_secs: u64,

    /// Refresh timestamp
    pub watched_at: DateTime<Utc>,

    /// Kind of the watched video
    pub video_type: VideoKind,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clamp_progress_bounds() {
        assert_eq!(clamp_progress(-0.5), 0.0);
        assert_eq!(clamp_progress(0.0), 0.0);
        assert_eq!(clamp_progress(0.95), 0.95);
        assert_eq!(clamp_progress(1.7), 1.0);
    }

    #[test]
    fn test_clamp_progress_non_finite() {
        assert_eq!(clamp_progress(f64::NAN), 0.0);
        assert_eq!(clamp_progress(f64::INFINITY), 0.0);
    }

    #[test]
    fn test_entry_clamps_out_of_range_store_values() {
        let entry = HistoryEntry {
            video_id: VideoId::from_string("v1"),
            title: "t".into(),
            channel_name: "c".into(),
            thumbnail: None,
            progress: 1.3,
            watch_time: 10,
            watched_at: Utc::now(),
            video_type: VideoKind::Standard,
        };
        assert_eq!(entry.clamped_progress(), 1.0);
    }
}
