//! View-session engagement recorder.
//!
//! While a video plays, the hosting player feeds time-update samples into an
//! [`EngagementRecorder`]. The recorder debounces them to at most one
//! accepted sample per five-second window, converts each accepted sample
//! into a history merge-write and aggregate counter increments, and
//! dispatches those writes fire-and-forget so playback never waits on the
//! store. Completions are counted at most once per session.

pub mod recorder;
pub mod session;
pub mod sink;

pub use recorder::EngagementRecorder;
pub use session::{
    ActiveVideo, SampleReport, WatchSession, COMPLETION_THRESHOLD, DEBOUNCE_WINDOW,
};
pub use sink::{EngagementSink, FirestoreSink, SinkError, SinkResult};
