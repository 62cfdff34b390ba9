//! Typed repository for per-viewer watch history.
//!
//! History lives under `users/{uid}/history` with the video ID as the
//! document ID, so re-watching overwrites the single entry instead of
//! appending a new one.

use std::collections::HashMap;

use chrono::Utc;
use tracing::debug;

use aqmt_models::{clamp_progress, HistoryEntry, HistoryPatch, VideoId, VideoKind};

use crate::client::FirestoreClient;
use crate::error::{FirestoreError, FirestoreResult};
use crate::types::{Document, FieldTransform, StructuredQuery, ToFirestoreValue, Write};

/// Repository for one viewer's history collection.
pub struct HistoryRepository {
    client: FirestoreClient,
    user_id: String,
}

impl HistoryRepository {
    /// Create a new history repository scoped to a viewer.
    pub fn new(client: FirestoreClient, user_id: impl Into<String>) -> Self {
        Self {
            client,
            user_id: user_id.into(),
        }
    }

    /// Collection path for this viewer's history.
    fn collection(&self) -> String {
        format!("users/{}/history", self.user_id)
    }

    /// Merge a progress sample into the entry for the patched video.
    ///
    /// Progress, timestamp, and denormalized display fields replace the
    /// stored values; the watch-time delta rides along as an atomic
    /// increment. One commit, no prior read.
    pub async fn upsert_progress(&self, patch: &HistoryPatch) -> FirestoreResult<()> {
        let name = self
            .client
            .full_document_name(&self.collection(), patch.video_id.as_str());

        let mut fields = HashMap::new();
        fields.insert("videoId".to_string(), patch.video_id.as_str().to_firestore_value());
        fields.insert("title".to_string(), patch.title.to_firestore_value());
        fields.insert(
            "channelName".to_string(),
            patch.channel_name.to_firestore_value(),
        );
        fields.insert(
            "progress".to_string(),
            clamp_progress(patch.progress).to_firestore_value(),
        );
        fields.insert("watchedAt".to_string(), patch.watched_at.to_firestore_value());
        fields.insert(
            "videoType".to_string(),
            patch.video_type.as_str().to_firestore_value(),
        );
        if let Some(thumbnail) = &patch.thumbnail {
            fields.insert("thumbnail".to_string(), thumbnail.to_firestore_value());
        }

        let mut write = Write::merge(name, fields);
        if patch.watch_delta_secs > 0 {
            write = write.with_transforms(vec![FieldTransform::increment(
                "watchTime",
                patch.watch_delta_secs as i64,
            )]);
        }

        self.client.commit(vec![write]).await?;
        debug!(
            user_id = %self.user_id,
            video_id = %patch.video_id,
            progress = patch.progress,
            delta_secs = patch.watch_delta_secs,
            "Merged history entry"
        );
        Ok(())
    }

    /// Get the entry for one video.
    pub async fn get(&self, video_id: &VideoId) -> FirestoreResult<Option<HistoryEntry>> {
        let doc = self
            .client
            .get_document(&self.collection(), video_id.as_str())
            .await?;

        match doc {
            Some(d) => Ok(Some(document_to_history_entry(&d)?)),
            None => Ok(None),
        }
    }

    /// Most recently watched entries, newest first.
    pub async fn list_recent(&self, limit: i32) -> FirestoreResult<Vec<HistoryEntry>> {
        let query = StructuredQuery::collection("history")
            .order_by_desc("watchedAt")
            .with_limit(limit);
        let docs = self
            .client
            .run_query(&format!("users/{}", self.user_id), query)
            .await?;
        docs.iter().map(document_to_history_entry).collect()
    }

    /// Delete the viewer's entire history.
    pub async fn clear(&self) -> FirestoreResult<u32> {
        let mut deleted = 0u32;
        let mut page_token: Option<String> = None;

        loop {
            let page = self
                .client
                .list_documents(&self.collection(), Some(300), page_token.as_deref())
                .await?;

            let writes: Vec<Write> = page
                .documents
                .unwrap_or_default()
                .into_iter()
                .filter_map(|d| d.name)
                .map(Write::delete_document)
                .collect();

            if !writes.is_empty() {
                deleted += writes.len() as u32;
                self.client.commit(writes).await?;
            }

            match page.next_page_token {
                Some(token) if !token.is_empty() => page_token = Some(token),
                _ => break,
            }
        }

        Ok(deleted)
    }
}

fn document_to_history_entry(doc: &Document) -> FirestoreResult<HistoryEntry> {
    if doc.fields.is_none() {
        return Err(FirestoreError::invalid_response(
            "History document has no fields",
        ));
    }

    let video_id = doc
        .get::<String>("videoId")
        .map(VideoId::from)
        .or_else(|| doc.id().map(VideoId::from))
        .ok_or_else(|| FirestoreError::invalid_response("History document has no video id"))?;

    Ok(HistoryEntry {
        video_id,
        title: doc.get::<String>("title").unwrap_or_default(),
        channel_name: doc.get::<String>("channelName").unwrap_or_default(),
        thumbnail: doc.get::<String>("thumbnail"),
        progress: clamp_progress(doc.get::<f64>("progress").unwrap_or(0.0)),
        watch_time: doc.get::<u64>("watchTime").unwrap_or(0),
        watched_at: doc.get("watchedAt").unwrap_or_else(Utc::now),
        video_type: doc
            .get::<String>("videoType")
            .map(|s| VideoKind::from_str_lossy(&s))
            .unwrap_or_default(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_patch() -> HistoryPatch {
        HistoryPatch {
            video_id: VideoId::from_string("video-1"),
            title: "A Video".to_string(),
            channel_name: "My Channel".to_string(),
            thumbnail: None,
            progress: 0.95,
            watch_delta_secs: 6,
            watched_at: Utc::now(),
            video_type: VideoKind::Standard,
        }
    }

    #[test]
    fn test_progress_clamped_on_read() {
        let mut fields = HashMap::new();
        fields.insert("progress".to_string(), 1.4f64.to_firestore_value());
        fields.insert("videoId".to_string(), "v1".to_firestore_value());
        let doc = Document {
            name: Some("projects/p/databases/d/documents/users/u/history/v1".to_string()),
            fields: Some(fields),
            create_time: None,
            update_time: None,
        };
        let entry = document_to_history_entry(&doc).unwrap();
        assert_eq!(entry.progress, 1.0);
    }

    #[test]
    fn test_entry_falls_back_to_document_id() {
        let mut fields = HashMap::new();
        fields.insert("progress".to_string(), 0.2f64.to_firestore_value());
        let doc = Document {
            name: Some("projects/p/databases/d/documents/users/u/history/v9".to_string()),
            fields: Some(fields),
            create_time: None,
            update_time: None,
        };
        let entry = document_to_history_entry(&doc).unwrap();
        assert_eq!(entry.video_id.as_str(), "v9");
    }

    #[test]
    fn test_missing_fields_are_defaults() {
        let mut fields = HashMap::new();
        fields.insert("videoId".to_string(), "v1".to_firestore_value());
        let doc = Document {
            name: None,
            fields: Some(fields),
            create_time: None,
            update_time: None,
        };
        let entry = document_to_history_entry(&doc).unwrap();
        assert_eq!(entry.watch_time, 0);
        assert_eq!(entry.video_type, VideoKind::Standard);
    }

    #[test]
    fn test_patch_keeps_unsigned_delta() {
        // The patch type cannot express a negative delta at all.
        let patch = sample_patch();
        assert!(patch.watch_delta_secs > 0);
    }
}
