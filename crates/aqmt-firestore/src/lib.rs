//! Firestore REST API client for the AiQMateTube collections.
//!
//! This crate provides:
//! - A REST client with token caching, retries, and atomic commits
//! - Typed repositories for videos, history, likes, channels, users,
//!   comments, and platform settings
//! - A poll-based document watcher for live views
//! - Service account authentication via gcp_auth, with emulator support

pub mod channel_repo;
pub mod client;
pub mod comment_repo;
pub mod error;
pub mod history_repo;
pub mod like_repo;
pub mod metrics;
pub mod retry;
pub mod settings_repo;
pub mod token_cache;
pub mod types;
pub mod user_repo;
pub mod video_repo;
pub mod watch;

#[cfg(test)]
mod client_tests;

pub use channel_repo::ChannelRepository;
pub use client::{FirestoreClient, FirestoreConfig};
pub use comment_repo::CommentRepository;
pub use error::{FirestoreError, FirestoreResult};
pub use history_repo::HistoryRepository;
pub use like_repo::LikeRepository;
pub use retry::RetryConfig;
pub use settings_repo::SettingsRepository;
pub use types::{Document, FieldTransform, FromFirestoreValue, ToFirestoreValue, Value, Write};
pub use user_repo::UserProfileRepository;
pub use video_repo::VideoRepository;
pub use watch::{watch_document, DocumentWatch, DEFAULT_POLL_INTERVAL};
