//! Per-activation watch session state.
//!
//! A session covers the interval during which one video is the active,
//! playing item for one viewer. It owns the few pieces of mutable state the
//! recorder needs (debounce clock, reported watch time, completion flag) as
//! an explicit value rather than ambient references, and exposes one pure
//! step: feed it a playback sample, get back what should be persisted.

use tokio::time::Instant;

use aqmt_models::{clamp_progress, VideoId, VideoKind, VideoProvider};

/// Minimum interval between accepted samples. Bounds store writes to at most
/// one per window per session, independent of the player's event frequency.
pub const DEBOUNCE_WINDOW: tokio::time::Duration = tokio::time::Duration::from_secs(5);

/// Progress at or beyond this ratio counts the session as a completion.
pub const COMPLETION_THRESHOLD: f64 = 0.9;

/// Identity and display fields of the video a session plays.
///
/// The display fields are denormalized into the viewer's history entry so
/// the history list renders without joining back to the video.
#[derive(Debug, Clone, PartialEq)]
pub struct ActiveVideo {
    /// Video document ID
    pub video_id: VideoId,
    /// Standard video or reel
    pub kind: VideoKind,
    /// Media provider; embeds expose no playback samples
    pub provider: VideoProvider,
    /// Title, denormalized into history
    pub title: String,
    /// Channel name, denormalized into history
    pub channel_name: String,
    /// Thumbnail URL, denormalized into history
    pub thumbnail: Option<String>,
}

/// What one accepted sample asks the recorder to persist.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SampleReport {
    /// Playback progress in [0, 1]
    pub progress: f64,
    /// Watch time accrued since the last accepted sample, in seconds
    pub watch_delta_secs: u64,
    /// True exactly once per session, when progress first crosses the
    /// completion threshold
    pub completion: bool,
}

/// State for one playback session.
#[derive(Debug)]
pub struct WatchSession {
    viewer_id: String,
    video: ActiveVideo,
    started_at: Instant,
    last_accepted_at: Instant,
    last_reported_elapsed: u64,
    completion_reported: bool,
}

impl WatchSession {
    /// Begin a session at `now`.
    ///
    /// The session start seeds the debounce clock, so nothing can be
    /// persisted in the first window: a sub-window view counts as a view but
    /// accrues no watch time.
    pub fn begin(viewer_id: impl Into<String>, video: ActiveVideo, now: Instant) -> Self {
        Self {
            viewer_id: viewer_id.into(),
            video,
            started_at: now,
            last_accepted_at: now,
            last_reported_elapsed: 0,
            completion_reported: false,
        }
    }

    pub fn viewer_id(&self) -> &str {
        &self.viewer_id
    }

    pub fn video(&self) -> &ActiveVideo {
        &self.video
    }

    /// Whether this session has already reported a completion.
    pub fn completion_reported(&self) -> bool {
        self.completion_reported
    }

    /// Feed one playback sample into the session.
    ///
    /// Returns `None` for samples inside the debounce window and for samples
    /// with nothing to persist (no progress, no accrued time). Progress is
    /// recomputed from the raw ratio each time, so seeking backward lowers
    /// the next reported value; the store holds whatever was written last.
    pub fn accept_sample(
        &mut self,
        now: Instant,
        current_time: f64,
        duration: f64,
    ) -> Option<SampleReport> {
        if now.duration_since(self.last_accepted_at) < DEBOUNCE_WINDOW {
            return None;
        }

        let progress = if duration > 0.0 {
            clamp_progress(current_time / duration)
        } else {
            0.0
        };

        let session_elapsed = now.duration_since(self.started_at).as_secs();
        let watch_delta_secs = session_elapsed.saturating_sub(self.last_reported_elapsed);

        if watch_delta_secs == 0 && progress <= 0.0 {
            return None;
        }

        let completion = progress >= COMPLETION_THRESHOLD && !self.completion_reported;
        if completion {
            self.completion_reported = true;
        }

        self.last_reported_elapsed = session_elapsed;
        self.last_accepted_at = now;

        Some(SampleReport {
            progress,
            watch_delta_secs,
            completion,
        })
    }
}
