//! The engagement recorder.
//!
//! Owns at most one active [`WatchSession`] and reconciles its accepted
//! samples into the store: a merge-write on the viewer's history entry and
//! counter increments on the video aggregate. All remote writes are
//! dispatched fire-and-forget; a slow or failed write never blocks the
//! playback callback path, and failures are logged and dropped.

use std::sync::Arc;

use chrono::Utc;
use tokio::time::Instant;
use tracing::{debug, warn};

use aqmt_models::{EngagementField, HistoryPatch, VideoProvider};

use crate::session::{ActiveVideo, SampleReport, WatchSession};
use crate::sink::EngagementSink;

/// Records engagement for whichever video is currently active.
///
/// Requires a Tokio runtime: remote writes are spawned, not awaited, so the
/// caller's event path stays synchronous.
pub struct EngagementRecorder {
    sink: Arc<dyn EngagementSink>,
    session: Option<WatchSession>,
}

impl EngagementRecorder {
    /// Create a recorder writing through the given sink.
    pub fn new(sink: Arc<dyn EngagementSink>) -> Self {
        Self {
            sink,
            session: None,
        }
    }

    /// A video became the active, playing item.
    ///
    /// Replaces any previous session and fires the view increment exactly
    /// once for this activation. Completion tracking re-arms with the fresh
    /// session: completions count once per session, not once per video.
    pub fn activate(&mut self, video: ActiveVideo, viewer_id: impl Into<String>) {
        let session = WatchSession::begin(viewer_id, video, Instant::now());

        let sink = Arc::clone(&self.sink);
        let video_id = session.video().video_id.clone();
        tokio::spawn(async move {
            if let Err(e) = sink
                .increment_counters(video_id.clone(), vec![(EngagementField::Views, 1)])
                .await
            {
                warn!(video_id = %video_id, "View increment failed: {}", e);
            }
        });

        self.session = Some(session);
    }

    /// Playback time-update callback.
    ///
    /// High-frequency and cheap: most calls are debounced no-ops. An
    /// accepted sample dispatches its writes and returns immediately.
    pub fn record_progress(&mut self, current_time: f64, duration: f64) {
        let Some(session) = self.session.as_mut() else {
            return;
        };
        // Embeds report no real playback position; they get the view count
        // on activation and nothing else.
        if session.video().provider == VideoProvider::Youtube {
            return;
        }

        let Some(report) = session.accept_sample(Instant::now(), current_time, duration) else {
            return;
        };

        debug!(
            video_id = %session.video().video_id,
            progress = report.progress,
            delta_secs = report.watch_delta_secs,
            completion = report.completion,
            "Accepted playback sample"
        );

        let sink = Arc::clone(&self.sink);
        let viewer_id = session.viewer_id().to_string();
        let video = session.video().clone();
        tokio::spawn(flush_report(sink, viewer_id, video, report));
    }

    /// The active video was replaced, closed, or unmounted.
    ///
    /// The last accepted sample already persisted the latest state, so no
    /// final flush is needed; in-flight writes complete on their own.
    pub fn deactivate(&mut self) {
        self.session = None;
    }

    /// Whether a session is currently active.
    pub fn is_active(&self) -> bool {
        self.session.is_some()
    }
}

/// Persist one accepted sample.
///
/// The history merge and the aggregate increment are issued together and
/// complete independently; neither write waits for, nor is ordered against,
/// the other.
async fn flush_report(
    sink: Arc<dyn EngagementSink>,
    viewer_id: String,
    video: ActiveVideo,
    report: SampleReport,
) {
    let video_id = video.video_id.clone();
    let patch = HistoryPatch {
        video_id: video.video_id,
        title: video.title,
        channel_name: video.channel_name,
        thumbnail: video.thumbnail,
        progress: report.progress,
        watch_delta_secs: report.watch_delta_secs,
        watched_at: Utc::now(),
        video_type: video.kind,
    };

    let mut deltas = Vec::new();
    if report.watch_delta_secs > 0 {
        deltas.push((EngagementField::WatchTime, report.watch_delta_secs as i64));
    }
    if report.completion {
        deltas.push((EngagementField::Completions, 1));
    }

    let history = sink.merge_history(viewer_id, patch);
    let aggregate = async {
        if deltas.is_empty() {
            return Ok(());
        }
        sink.increment_counters(video_id.clone(), deltas).await
    };

    let (history_result, aggregate_result) = tokio::join!(history, aggregate);
    if let Err(e) = history_result {
        warn!(video_id = %video_id, "History merge failed: {}", e);
    }
    if let Err(e) = aggregate_result {
        warn!(video_id = %video_id, "Aggregate increment failed: {}", e);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sink::{MockEngagementSink, SinkError, SinkResult};
    use aqmt_models::{VideoId, VideoKind};
    use tokio::sync::mpsc;
    use tokio::time::{advance, Duration};

    #[derive(Debug)]
    enum SinkCall {
        Increment(VideoId, Vec<(EngagementField, i64)>),
        Merge(String, HistoryPatch),
    }

    /// Mock sink that reports every call on a channel, so tests can await
    /// the spawned write tasks instead of guessing at scheduling.
    fn recording_sink(
        result: fn() -> SinkResult<()>,
    ) -> (MockEngagementSink, mpsc::UnboundedReceiver<SinkCall>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let mut sink = MockEngagementSink::new();

        let tx_inc = tx.clone();
        sink.expect_increment_counters()
            .returning(move |video_id, deltas| {
                tx_inc.send(SinkCall::Increment(video_id, deltas)).ok();
                result()
            });
        let tx_merge = tx;
        sink.expect_merge_history().returning(move |viewer, patch| {
            tx_merge.send(SinkCall::Merge(viewer, patch)).ok();
            result()
        });

        (sink, rx)
    }

    fn upload_video(id: &str) -> ActiveVideo {
        ActiveVideo {
            video_id: VideoId::from_string(id),
            kind: VideoKind::Standard,
            provider: VideoProvider::Upload,
            title: "A Video".to_string(),
            channel_name: "My Channel".to_string(),
            thumbnail: None,
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_activation_fires_one_view_increment() {
        let (sink, mut calls) = recording_sink(|| Ok(()));
        let mut recorder = EngagementRecorder::new(Arc::new(sink));

        recorder.activate(upload_video("v1"), "viewer-1");

        match calls.recv().await.unwrap() {
            SinkCall::Increment(video_id, deltas) => {
                assert_eq!(video_id.as_str(), "v1");
                assert_eq!(deltas, vec![(EngagementField::Views, 1)]);
            }
            other => panic!("expected view increment, got {:?}", other),
        }
        assert!(calls.try_recv().is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn test_short_session_persists_only_the_view() {
        let (sink, mut calls) = recording_sink(|| Ok(()));
        let mut recorder = EngagementRecorder::new(Arc::new(sink));

        recorder.activate(upload_video("v1"), "viewer-1");
        // 3 seconds of continuous 200ms samples: inside the debounce window.
        for i in 1..=15 {
            advance(Duration::from_millis(200)).await;
            recorder.record_progress(i as f64 * 0.2, 60.0);
        }
        recorder.deactivate();

        // The activation's view increment is the only write.
        assert!(matches!(
            calls.recv().await.unwrap(),
            SinkCall::Increment(_, _)
        ));
        assert!(calls.try_recv().is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn test_two_sample_session_with_completion() {
        let (sink, mut calls) = recording_sink(|| Ok(()));
        let mut recorder = EngagementRecorder::new(Arc::new(sink));

        recorder.activate(upload_video("v1"), "viewer-1");
        let view = calls.recv().await.unwrap();
        assert!(matches!(view, SinkCall::Increment(_, _)));

        advance(Duration::from_secs(6)).await;
        recorder.record_progress(4.0, 10.0);

        match calls.recv().await.unwrap() {
            SinkCall::Merge(viewer, patch) => {
                assert_eq!(viewer, "viewer-1");
                assert_eq!(patch.progress, 0.4);
                assert_eq!(patch.watch_delta_secs, 6);
            }
            other => panic!("expected history merge, got {:?}", other),
        }
        match calls.recv().await.unwrap() {
            SinkCall::Increment(_, deltas) => {
                assert_eq!(deltas, vec![(EngagementField::WatchTime, 6)]);
            }
            other => panic!("expected aggregate increment, got {:?}", other),
        }

        advance(Duration::from_secs(6)).await;
        recorder.record_progress(9.5, 10.0);

        match calls.recv().await.unwrap() {
            SinkCall::Merge(_, patch) => {
                assert_eq!(patch.progress, 0.95);
                assert_eq!(patch.watch_delta_secs, 6);
            }
            other => panic!("expected history merge, got {:?}", other),
        }
        match calls.recv().await.unwrap() {
            SinkCall::Increment(_, deltas) => {
                assert_eq!(
                    deltas,
                    vec![
                        (EngagementField::WatchTime, 6),
                        (EngagementField::Completions, 1)
                    ]
                );
            }
            other => panic!("expected aggregate increment, got {:?}", other),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_completions_rearm_per_session() {
        let (sink, mut calls) = recording_sink(|| Ok(()));
        let mut recorder = EngagementRecorder::new(Arc::new(sink));

        let mut completion_increments = 0;
        for _ in 0..2 {
            recorder.activate(upload_video("v1"), "viewer-1");
            advance(Duration::from_secs(6)).await;
            recorder.record_progress(9.5, 10.0);
            // Repeated post-threshold samples inside the same session.
            advance(Duration::from_secs(6)).await;
            recorder.record_progress(9.9, 10.0);
            recorder.deactivate();

            // view + (merge, increment) x2
            for _ in 0..5 {
                if let SinkCall::Increment(_, deltas) = calls.recv().await.unwrap() {
                    completion_increments += deltas
                        .iter()
                        .filter(|(field, _)| *field == EngagementField::Completions)
                        .count();
                }
            }
        }

        // Once per session: two sessions, two completion increments.
        assert_eq!(completion_increments, 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_youtube_embeds_get_no_samples() {
        let (sink, mut calls) = recording_sink(|| Ok(()));
        let mut recorder = EngagementRecorder::new(Arc::new(sink));

        let mut video = upload_video("v1");
        video.provider = VideoProvider::Youtube;
        recorder.activate(video, "viewer-1");

        advance(Duration::from_secs(30)).await;
        recorder.record_progress(20.0, 60.0);
        recorder.deactivate();

        assert!(matches!(
            calls.recv().await.unwrap(),
            SinkCall::Increment(_, _)
        ));
        assert!(calls.try_recv().is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn test_failed_writes_are_swallowed() {
        let (sink, mut calls) =
            recording_sink(|| Err(SinkError::RemoteWriteFailed("backend down".to_string())));
        let mut recorder = EngagementRecorder::new(Arc::new(sink));

        recorder.activate(upload_video("v1"), "viewer-1");
        advance(Duration::from_secs(6)).await;
        recorder.record_progress(3.0, 10.0);
        advance(Duration::from_secs(6)).await;
        recorder.record_progress(6.0, 10.0);

        // Every write fails, and the recorder keeps sampling regardless:
        // view, then two (merge + increment) rounds all reach the sink.
        let mut merges = 0;
        let mut increments = 0;
        for _ in 0..5 {
            match calls.recv().await.unwrap() {
                SinkCall::Merge(_, _) => merges += 1,
                SinkCall::Increment(_, _) => increments += 1,
            }
        }
        assert_eq!(merges, 2);
        assert_eq!(increments, 3);
        assert!(recorder.is_active());
    }

    #[tokio::test(start_paused = true)]
    async fn test_deactivate_stops_sampling() {
        let (sink, mut calls) = recording_sink(|| Ok(()));
        let mut recorder = EngagementRecorder::new(Arc::new(sink));

        recorder.activate(upload_video("v1"), "viewer-1");
        recorder.deactivate();
        assert!(!recorder.is_active());

        advance(Duration::from_secs(10)).await;
        recorder.record_progress(5.0, 10.0);

        assert!(matches!(
            calls.recv().await.unwrap(),
            SinkCall::Increment(_, _)
        ));
        assert!(calls.try_recv().is_err());
    }
}
