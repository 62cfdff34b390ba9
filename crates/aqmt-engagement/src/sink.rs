//! The store collaborator the recorder writes through.
//!
//! Engagement data lands in two places: counter increments on the video
//! aggregate and a merge-write on the viewer's history entry. The recorder
//! only sees this trait; the Firestore-backed implementation lives next to
//! it, and tests substitute a mock.

use async_trait::async_trait;
use thiserror::Error;

use aqmt_firestore::{FirestoreClient, HistoryRepository, VideoRepository};
use aqmt_models::{EngagementField, HistoryPatch, VideoId};

/// Result type for sink operations.
pub type SinkResult<T> = Result<T, SinkError>;

/// The one failure mode engagement writes have: the remote write did not
/// land. Always logged by the caller, never retried, never surfaced to the
/// viewer.
#[derive(Debug, Error)]
pub enum SinkError {
    #[error("Remote write failed: {0}")]
    RemoteWriteFailed(String),
}

impl SinkError {
    pub fn remote(source: impl std::fmt::Display) -> Self {
        Self::RemoteWriteFailed(source.to_string())
    }
}

/// Destination for engagement writes.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait EngagementSink: Send + Sync {
    /// Atomically apply counter deltas to a video aggregate. Must not
    /// require reading the document first.
    async fn increment_counters(
        &self,
        video_id: VideoId,
        deltas: Vec<(EngagementField, i64)>,
    ) -> SinkResult<()>;

    /// Merge a progress patch into the viewer's history entry for the
    /// patched video (upsert-by-id; unspecified fields untouched).
    async fn merge_history(&self, viewer_id: String, patch: HistoryPatch) -> SinkResult<()>;
}

/// Firestore-backed sink.
pub struct FirestoreSink {
    client: FirestoreClient,
}

impl FirestoreSink {
    /// Create a sink over a Firestore client.
    pub fn new(client: FirestoreClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl EngagementSink for FirestoreSink {
    async fn increment_counters(
        &self,
        video_id: VideoId,
        deltas: Vec<(EngagementField, i64)>,
    ) -> SinkResult<()> {
        VideoRepository::new(self.client.clone())
            .increment_counters(&video_id, &deltas)
            .await
            .map_err(SinkError::remote)
    }

    async fn merge_history(&self, viewer_id: String, patch: HistoryPatch) -> SinkResult<()> {
        HistoryRepository::new(self.client.clone(), viewer_id)
            .upsert_progress(&patch)
            .await
            .map_err(SinkError::remote)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sink_error_carries_source_text() {
        let err = SinkError::remote("connection reset");
        assert!(err.to_string().contains("connection reset"));
    }
}
