//! Firebase Storage client for AiQMateTube media objects.
//!
//! This crate provides:
//! - File upload returning tokened metadata
//! - Playback (download) URL construction
//! - Object metadata and deletion
//! - Object naming for the platform's media layout

pub mod client;
pub mod error;
pub mod paths;

pub use client::{MediaObject, MediaStorageClient, StorageConfig, STORAGE_SCOPE};
pub use error::{StorageError, StorageResult};
pub use paths::{thumbnail_object_name, video_object_name};
