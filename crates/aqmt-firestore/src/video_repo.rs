//! Typed repository for the `videos` collection.

use std::collections::HashMap;

use chrono::Utc;
use tracing::info;

use aqmt_models::{
    EngagementField, EngagementTotals, Video, VideoId, VideoKind, VideoProvider,
};

use crate::client::FirestoreClient;
use crate::error::{FirestoreError, FirestoreResult};
use crate::types::{
    Document, FieldTransform, StructuredQuery, ToFirestoreValue, Value, Write,
};

/// Collection path for video documents.
const VIDEOS_COLLECTION: &str = "videos";

/// Repository for video documents.
pub struct VideoRepository {
    client: FirestoreClient,
}

impl VideoRepository {
    /// Create a new video repository.
    pub fn new(client: FirestoreClient) -> Self {
        Self { client }
    }

    /// Get a video by ID.
    pub async fn get(&self, video_id: &VideoId) -> FirestoreResult<Option<Video>> {
        let doc = self
            .client
            .get_document(VIDEOS_COLLECTION, video_id.as_str())
            .await?;

        match doc {
            Some(d) => Ok(Some(document_to_video(&d)?)),
            None => Ok(None),
        }
    }

    /// Create a new video record (an unpublished draft).
    pub async fn create(&self, video: &Video) -> FirestoreResult<()> {
        let fields = video_to_fields(video);
        self.client
            .create_document(VIDEOS_COLLECTION, video.video_id.as_str(), fields)
            .await?;
        info!("Created video record: {}", video.video_id);
        Ok(())
    }

    /// Most recently created videos, newest first.
    pub async fn list_recent(&self, limit: i32) -> FirestoreResult<Vec<Video>> {
        let query = StructuredQuery::collection(VIDEOS_COLLECTION)
            .order_by_desc("createdAt")
            .with_limit(limit);
        let docs = self.client.run_query("", query).await?;
        docs.iter().map(document_to_video).collect()
    }

    /// Videos belonging to one channel, newest first.
    pub async fn list_by_channel(
        &self,
        channel_id: &str,
        limit: i32,
    ) -> FirestoreResult<Vec<Video>> {
        let query = StructuredQuery::collection(VIDEOS_COLLECTION)
            .where_eq("channelId", channel_id.to_firestore_value())
            .order_by_desc("createdAt")
            .with_limit(limit);
        let docs = self.client.run_query("", query).await?;
        docs.iter().map(document_to_video).collect()
    }

    /// Publish or unpublish a video. Publishing stamps `publishedAt`;
    /// unpublishing clears it.
    pub async fn set_published(&self, video_id: &VideoId, published: bool) -> FirestoreResult<()> {
        let mut fields = HashMap::new();
        fields.insert("published".to_string(), published.to_firestore_value());
        fields.insert(
            "publishedAt".to_string(),
            if published {
                Utc::now().to_firestore_value()
            } else {
                Value::NullValue(())
            },
        );

        self.client
            .update_document(
                VIDEOS_COLLECTION,
                video_id.as_str(),
                fields,
                Some(vec!["published".to_string(), "publishedAt".to_string()]),
            )
            .await?;
        Ok(())
    }

    /// Pin or unpin a video on the featured shelf.
    pub async fn set_featured(&self, video_id: &VideoId, featured: bool) -> FirestoreResult<()> {
        let mut fields = HashMap::new();
        fields.insert("featured".to_string(), featured.to_firestore_value());

        self.client
            .update_document(
                VIDEOS_COLLECTION,
                video_id.as_str(),
                fields,
                Some(vec!["featured".to_string()]),
            )
            .await?;
        Ok(())
    }

    /// Edit title and/or description from the media manager.
    pub async fn update_details(
        &self,
        video_id: &VideoId,
        title: Option<&str>,
        description: Option<&str>,
    ) -> FirestoreResult<()> {
        let mut fields = HashMap::new();
        let mut mask = Vec::new();

        if let Some(title) = title {
            fields.insert("title".to_string(), title.to_firestore_value());
            mask.push("title".to_string());
        }
        if let Some(description) = description {
            fields.insert("description".to_string(), description.to_firestore_value());
            mask.push("description".to_string());
        }
        if fields.is_empty() {
            return Ok(());
        }

        self.client
            .update_document(VIDEOS_COLLECTION, video_id.as_str(), fields, Some(mask))
            .await?;
        Ok(())
    }

    /// Delete a video document.
    pub async fn delete(&self, video_id: &VideoId) -> FirestoreResult<()> {
        self.client
            .delete_document(VIDEOS_COLLECTION, video_id.as_str())
            .await?;
        info!("Deleted video record: {}", video_id);
        Ok(())
    }

    /// Record a view activation: `views += 1` and a refreshed `lastViewedAt`,
    /// in one atomic commit. No prior read.
    pub async fn record_view(&self, video_id: &VideoId) -> FirestoreResult<()> {
        let name = self
            .client
            .full_document_name(VIDEOS_COLLECTION, video_id.as_str());

        let mut fields = HashMap::new();
        fields.insert("lastViewedAt".to_string(), Utc::now().to_firestore_value());

        let write = Write::merge(name, fields)
            .with_transforms(vec![FieldTransform::increment("views", 1)]);
        self.client.commit(vec![write]).await?;
        Ok(())
    }

    /// Atomically apply a batch of counter deltas to one video.
    pub async fn increment_counters(
        &self,
        video_id: &VideoId,
        deltas: &[(EngagementField, i64)],
    ) -> FirestoreResult<()> {
        let transforms: Vec<FieldTransform> = deltas
            .iter()
            .filter(|(_, delta)| *delta != 0)
            .map(|(field, delta)| FieldTransform::increment(field.field_path(), *delta))
            .collect();

        if transforms.is_empty() {
            return Ok(());
        }

        let name = self
            .client
            .full_document_name(VIDEOS_COLLECTION, video_id.as_str());
        self.client
            .commit(vec![Write::transform_only(name, transforms)])
            .await?;
        Ok(())
    }
}

// =============================================================================
// Conversions
// =============================================================================

fn video_to_fields(video: &Video) -> HashMap<String, Value> {
    let mut fields = HashMap::new();
    fields.insert("title".to_string(), video.title.to_firestore_value());
    fields.insert("url".to_string(), video.url.to_firestore_value());
    fields.insert(
        "provider".to_string(),
        video.provider.as_str().to_firestore_value(),
    );
    fields.insert("type".to_string(), video.kind.as_str().to_firestore_value());
    fields.insert(
        "channelName".to_string(),
        video.channel_name.to_firestore_value(),
    );
    fields.insert(
        "uploaderId".to_string(),
        video.uploader_id.to_firestore_value(),
    );
    fields.insert("published".to_string(), video.published.to_firestore_value());
    fields.insert("featured".to_string(), video.featured.to_firestore_value());
    fields.insert("createdAt".to_string(), video.created_at.to_firestore_value());

    fields.insert("views".to_string(), video.totals.views.to_firestore_value());
    fields.insert("likes".to_string(), video.totals.likes.to_firestore_value());
    fields.insert(
        "watchTime".to_string(),
        video.totals.watch_time.to_firestore_value(),
    );
    fields.insert(
        "completions".to_string(),
        video.totals.completions.to_firestore_value(),
    );
    fields.insert("shares".to_string(), video.totals.shares.to_firestore_value());

    if let Some(channel_id) = &video.channel_id {
        fields.insert("channelId".to_string(), channel_id.to_firestore_value());
    }
    if let Some(description) = &video.description {
        fields.insert("description".to_string(), description.to_firestore_value());
    }
    if let Some(thumbnail) = &video.thumbnail {
        fields.insert("thumbnail".to_string(), thumbnail.to_firestore_value());
    }
    if let Some(published_at) = &video.published_at {
        fields.insert("publishedAt".to_string(), published_at.to_firestore_value());
    }
    if let Some(last_viewed_at) = &video.last_viewed_at {
        fields.insert(
            "lastViewedAt".to_string(),
            last_viewed_at.to_firestore_value(),
        );
    }

    fields
}

fn document_to_video(doc: &Document) -> FirestoreResult<Video> {
    let video_id = doc
        .id()
        .map(VideoId::from)
        .ok_or_else(|| FirestoreError::invalid_response("Video document has no name"))?;

    if doc.fields.is_none() {
        return Err(FirestoreError::invalid_response("Video document has no fields"));
    }

    Ok(Video {
        video_id,
        title: doc.get::<String>("title").unwrap_or_default(),
        url: doc.get::<String>("url").unwrap_or_default(),
        provider: doc
            .get::<String>("provider")
            .map(|s| VideoProvider::from_str_lossy(&s))
            .unwrap_or_default(),
        kind: doc
            .get::<String>("type")
            .map(|s| VideoKind::from_str_lossy(&s))
            .unwrap_or_default(),
        channel_id: doc.get::<String>("channelId"),
        channel_name: doc.get::<String>("channelName").unwrap_or_default(),
        description: doc.get::<String>("description"),
        thumbnail: doc.get::<String>("thumbnail"),
        uploader_id: doc.get::<String>("uploaderId").unwrap_or_default(),
        published: doc.get::<bool>("published").unwrap_or(false),
        published_at: doc.get("publishedAt"),
        featured: doc.get::<bool>("featured").unwrap_or(false),
        created_at: doc.get("createdAt").unwrap_or_else(Utc::now),
        last_viewed_at: doc.get("lastViewedAt"),
        totals: EngagementTotals {
            views: doc.get::<u64>("views").unwrap_or(0),
            likes: doc.get::<i64>("likes").unwrap_or(0),
            watch_time: doc.get::<u64>("watchTime").unwrap_or(0),
            completions: doc.get::<u64>("completions").unwrap_or(0),
            shares: doc.get::<u64>("shares").unwrap_or(0),
        },
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_video() -> Video {
        Video::new_draft(
            VideoId::from_string("video-1"),
            "A Video",
            "https://cdn/video-1.mp4",
            "user-1",
        )
        .with_channel("ch-1", "My Channel")
    }

    #[test]
    fn test_fields_use_wire_names() {
        let fields = video_to_fields(&sample_video());
        assert!(fields.contains_key("channelName"));
        assert!(fields.contains_key("createdAt"));
        assert!(fields.contains_key("watchTime"));
        assert!(!fields.contains_key("channel_name"));
    }

    #[test]
    fn test_draft_serializes_counters_at_zero() {
        let fields = video_to_fields(&sample_video());
        assert!(matches!(
            fields.get("views"),
            Some(Value::IntegerValue(s)) if s == "0"
        ));
    }

    #[test]
    fn test_optional_fields_omitted_when_absent() {
        let video = Video::new_draft(VideoId::new(), "t", "u", "user-1");
        let fields = video_to_fields(&video);
        assert!(!fields.contains_key("channelId"));
        assert!(!fields.contains_key("publishedAt"));
        assert!(!fields.contains_key("thumbnail"));
    }

    #[test]
    fn test_document_roundtrip() {
        let video = sample_video();
        let doc = Document {
            name: Some(format!(
                "projects/p/databases/d/documents/videos/{}",
                video.video_id
            )),
            fields: Some(video_to_fields(&video)),
            create_time: None,
            update_time: None,
        };
        let parsed = document_to_video(&doc).unwrap();
        assert_eq!(parsed.video_id, video.video_id);
        assert_eq!(parsed.title, video.title);
        assert_eq!(parsed.kind, VideoKind::Standard);
        assert_eq!(parsed.channel_id.as_deref(), Some("ch-1"));
    }

    #[test]
    fn test_document_without_fields_is_invalid() {
        let doc = Document {
            name: Some("projects/p/databases/d/documents/videos/x".to_string()),
            fields: None,
            create_time: None,
            update_time: None,
        };
        assert!(document_to_video(&doc).is_err());
    }
}
