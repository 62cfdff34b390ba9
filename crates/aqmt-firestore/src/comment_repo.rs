//! Typed repository for video comments.
//!
//! Comments live under `videos/{videoId}/comments`.

use std::collections::HashMap;

use chrono::Utc;

use aqmt_models::{Comment, VideoId};

use crate::client::FirestoreClient;
use crate::error::{FirestoreError, FirestoreResult};
use crate::types::{Document, StructuredQuery, ToFirestoreValue, Value};

/// Default page size for the comment thread under a player.
const DEFAULT_THREAD_LIMIT: i32 = 50;

/// Repository for comment documents.
pub struct CommentRepository {
    client: FirestoreClient,
}

impl CommentRepository {
    /// Create a new comment repository.
    pub fn new(client: FirestoreClient) -> Self {
        Self { client }
    }

    fn collection(video_id: &VideoId) -> String {
        format!("videos/{}/comments", video_id)
    }

    /// Post a comment on a video.
    pub async fn add(&self, video_id: &VideoId, comment: &Comment) -> FirestoreResult<()> {
        let fields = comment_to_fields(comment);
        self.client
            .create_document(&Self::collection(video_id), &comment.comment_id, fields)
            .await?;
        Ok(())
    }

    /// Newest comments on a video, up to `limit` (defaults to the thread
    /// page size when `None`).
    pub async fn list_recent(
        &self,
        video_id: &VideoId,
        limit: Option<i32>,
    ) -> FirestoreResult<Vec<Comment>> {
        let query = StructuredQuery::collection("comments")
            .order_by_desc("createdAt")
            .with_limit(limit.unwrap_or(DEFAULT_THREAD_LIMIT));
        let docs = self
            .client
            .run_query(&format!("videos/{}", video_id), query)
            .await?;
        docs.iter().map(document_to_comment).collect()
    }

    /// Remove a comment.
    pub async fn delete(&self, video_id: &VideoId, comment_id: &str) -> FirestoreResult<()> {
        self.client
            .delete_document(&Self::collection(video_id), comment_id)
            .await
    }
}

fn comment_to_fields(comment: &Comment) -> HashMap<String, Value> {
    let mut fields = HashMap::new();
    fields.insert("text".to_string(), comment.text.to_firestore_value());
    fields.insert("userId".to_string(), comment.user_id.to_firestore_value());
    fields.insert(
        "displayName".to_string(),
        comment.display_name.to_firestore_value(),
    );
    fields.insert(
        "createdAt".to_string(),
        comment.created_at.to_firestore_value(),
    );
    fields.insert("likes".to_string(), comment.likes.to_firestore_value());
    if let Some(photo_url) = &comment.photo_url {
        fields.insert("photoURL".to_string(), photo_url.to_firestore_value());
    }
    fields
}

fn document_to_comment(doc: &Document) -> FirestoreResult<Comment> {
    let comment_id = doc
        .id()
        .map(str::to_string)
        .ok_or_else(|| FirestoreError::invalid_response("Comment document has no name"))?;

    if doc.fields.is_none() {
        return Err(FirestoreError::invalid_response(
            "Comment document has no fields",
        ));
    }

    Ok(Comment {
        comment_id,
        text: doc.get::<String>("text").unwrap_or_default(),
        user_id: doc.get::<String>("userId").unwrap_or_default(),
        display_name: doc.get::<String>("displayName").unwrap_or_default(),
        photo_url: doc.get::<String>("photoURL"),
        created_at: doc.get("createdAt").unwrap_or_else(Utc::now),
        likes: doc.get::<i64>("likes").unwrap_or(0),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use aqmt_models::NewComment;

    #[test]
    fn test_comment_roundtrip() {
        let comment = NewComment {
            text: "great video".to_string(),
        }
        .into_comment("uid-1", "Casey", None);

        let doc = Document {
            name: Some(format!(
                "projects/p/databases/d/documents/videos/v1/comments/{}",
                comment.comment_id
            )),
            fields: Some(comment_to_fields(&comment)),
            create_time: None,
            update_time: None,
        };

        let parsed = document_to_comment(&doc).unwrap();
        assert_eq!(parsed.comment_id, comment.comment_id);
        assert_eq!(parsed.text, "great video");
        assert_eq!(parsed.likes, 0);
    }
}
