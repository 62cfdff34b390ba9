//! Typed repository for per-viewer likes.
//!
//! A like is two pieces of state: a membership document at
//! `users/{uid}/likedVideos/{videoId}` and the `likes` aggregate on the
//! video. Both halves land in one atomic commit so the counter can never
//! drift from the membership set by a partial failure.

use std::collections::HashMap;

use chrono::Utc;

use aqmt_models::VideoId;

use crate::client::FirestoreClient;
use crate::error::FirestoreResult;
use crate::types::{FieldTransform, ToFirestoreValue, Write};

/// Repository for one viewer's liked videos.
pub struct LikeRepository {
    client: FirestoreClient,
    user_id: String,
}

impl LikeRepository {
    /// Create a new like repository scoped to a viewer.
    pub fn new(client: FirestoreClient, user_id: impl Into<String>) -> Self {
        Self {
            client,
            user_id: user_id.into(),
        }
    }

    fn collection(&self) -> String {
        format!("users/{}/likedVideos", self.user_id)
    }

    /// Like a video: membership doc + `likes += 1`, atomically.
    pub async fn like(&self, video_id: &VideoId) -> FirestoreResult<()> {
        let like_name = self
            .client
            .full_document_name(&self.collection(), video_id.as_str());
        let video_name = self.client.full_document_name("videos", video_id.as_str());

        let mut fields = HashMap::new();
        fields.insert("likedAt".to_string(), Utc::now().to_firestore_value());

        self.client
            .commit(vec![
                Write::merge(like_name, fields),
                Write::transform_only(video_name, vec![FieldTransform::increment("likes", 1)]),
            ])
            .await?;
        Ok(())
    }

    /// Withdraw a like: delete the membership doc and decrement the counter.
    pub async fn unlike(&self, video_id: &VideoId) -> FirestoreResult<()> {
        let like_name = self
            .client
            .full_document_name(&self.collection(), video_id.as_str());
        let video_name = self.client.full_document_name("videos", video_id.as_str());

        self.client
            .commit(vec![
                Write::delete_document(like_name),
                Write::transform_only(video_name, vec![FieldTransform::increment("likes", -1)]),
            ])
            .await?;
        Ok(())
    }

    /// Whether the viewer has liked the video.
    pub async fn is_liked(&self, video_id: &VideoId) -> FirestoreResult<bool> {
        let doc = self
            .client
            .get_document(&self.collection(), video_id.as_str())
            .await?;
        Ok(doc.is_some())
    }

    /// IDs of all videos the viewer has liked.
    pub async fn list_liked(&self) -> FirestoreResult<Vec<VideoId>> {
        let mut liked = Vec::new();
        let mut page_token: Option<String> = None;

        loop {
            let page = self
                .client
                .list_documents(&self.collection(), Some(300), page_token.as_deref())
                .await?;

            liked.extend(
                page.documents
                    .unwrap_or_default()
                    .iter()
                    .filter_map(|d| d.id())
                    .map(VideoId::from),
            );

            match page.next_page_token {
                Some(token) if !token.is_empty() => page_token = Some(token),
                _ => break,
            }
        }

        Ok(liked)
    }
}
