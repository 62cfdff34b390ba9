//! Typed repository for the `channels` collection.

use std::collections::HashMap;

use chrono::Utc;
use tracing::info;

use aqmt_models::{Channel, ChannelId};

use crate::client::FirestoreClient;
use crate::error::{FirestoreError, FirestoreResult};
use crate::types::{Document, FieldTransform, ToFirestoreValue, Value, Write};

/// Collection path for channel documents.
const CHANNELS_COLLECTION: &str = "channels";

/// Repository for channel documents.
pub struct ChannelRepository {
    client: FirestoreClient,
}

impl ChannelRepository {
    /// Create a new channel repository.
    pub fn new(client: FirestoreClient) -> Self {
        Self { client }
    }

    /// Get a channel by ID.
    pub async fn get(&self, channel_id: &ChannelId) -> FirestoreResult<Option<Channel>> {
        let doc = self
            .client
            .get_document(CHANNELS_COLLECTION, channel_id.as_str())
            .await?;

        match doc {
            Some(d) => Ok(Some(document_to_channel(&d)?)),
            None => Ok(None),
        }
    }

    /// Create a new channel record.
    pub async fn create(&self, channel: &Channel) -> FirestoreResult<()> {
        let fields = channel_to_fields(channel);
        self.client
            .create_document(CHANNELS_COLLECTION, channel.channel_id.as_str(), fields)
            .await?;
        info!("Created channel record: {}", channel.channel_id);
        Ok(())
    }

    /// All channels on the platform.
    pub async fn list(&self) -> FirestoreResult<Vec<Channel>> {
        let mut channels = Vec::new();
        let mut page_token: Option<String> = None;

        loop {
            let page = self
                .client
                .list_documents(CHANNELS_COLLECTION, Some(300), page_token.as_deref())
                .await?;

            for doc in page.documents.unwrap_or_default() {
                channels.push(document_to_channel(&doc)?);
            }

            match page.next_page_token {
                Some(token) if !token.is_empty() => page_token = Some(token),
                _ => break,
            }
        }

        Ok(channels)
    }

    /// Edit the channel's display name and/or description.
    pub async fn update_profile(
        &self,
        channel_id: &ChannelId,
        name: Option<&str>,
        description: Option<&str>,
    ) -> FirestoreResult<()> {
        let mut fields = HashMap::new();
        let mut mask = Vec::new();

        if let Some(name) = name {
            fields.insert("name".to_string(), name.to_firestore_value());
            mask.push("name".to_string());
        }
        if let Some(description) = description {
            fields.insert("description".to_string(), description.to_firestore_value());
            mask.push("description".to_string());
        }
        if fields.is_empty() {
            return Ok(());
        }

        self.client
            .update_document(CHANNELS_COLLECTION, channel_id.as_str(), fields, Some(mask))
            .await?;
        Ok(())
    }

    /// Delete a channel document.
    pub async fn delete(&self, channel_id: &ChannelId) -> FirestoreResult<()> {
        self.client
            .delete_document(CHANNELS_COLLECTION, channel_id.as_str())
            .await?;
        info!("Deleted channel record: {}", channel_id);
        Ok(())
    }

    /// Atomically bump `videoCount` when a video is published to or removed
    /// from the channel.
    pub async fn increment_video_count(
        &self,
        channel_id: &ChannelId,
        delta: i64,
    ) -> FirestoreResult<()> {
        if delta == 0 {
            return Ok(());
        }

        let name = self
            .client
            .full_document_name(CHANNELS_COLLECTION, channel_id.as_str());
        self.client
            .commit(vec![Write::transform_only(
                name,
                vec![FieldTransform::increment("videoCount", delta)],
            )])
            .await?;
        Ok(())
    }
}

fn channel_to_fields(channel: &Channel) -> HashMap<String, Value> {
    let mut fields = HashMap::new();
    fields.insert("name".to_string(), channel.name.to_firestore_value());
    fields.insert("ownerId".to_string(), channel.owner_id.to_firestore_value());
    fields.insert(
        "videoCount".to_string(),
        channel.video_count.to_firestore_value(),
    );
    fields.insert(
        "createdAt".to_string(),
        channel.created_at.to_firestore_value(),
    );
    if let Some(description) = &channel.description {
        fields.insert("description".to_string(), description.to_firestore_value());
    }
    fields
}

fn document_to_channel(doc: &Document) -> FirestoreResult<Channel> {
    let channel_id = doc
        .id()
        .map(ChannelId::from)
        .ok_or_else(|| FirestoreError::invalid_response("Channel document has no name"))?;

    if doc.fields.is_none() {
        return Err(FirestoreError::invalid_response(
            "Channel document has no fields",
        ));
    }

    Ok(Channel {
        channel_id,
        name: doc.get::<String>("name").unwrap_or_default(),
        owner_id: doc.get::<String>("ownerId").unwrap_or_default(),
        description: doc.get::<String>("description"),
        video_count: doc.get::<u64>("videoCount").unwrap_or(0),
        created_at: doc.get("createdAt").unwrap_or_else(Utc::now),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use aqmt_models::NewChannel;

    #[test]
    fn test_channel_roundtrip() {
        let channel = NewChannel {
            name: "My Channel".to_string(),
            description: Some("All about channels".to_string()),
        }
        .into_channel("user-1");

        let doc = Document {
            name: Some(format!(
                "projects/p/databases/d/documents/channels/{}",
                channel.channel_id
            )),
            fields: Some(channel_to_fields(&channel)),
            create_time: None,
            update_time: None,
        };

        let parsed = document_to_channel(&doc).unwrap();
        assert_eq!(parsed.channel_id, channel.channel_id);
        assert_eq!(parsed.name, "My Channel");
        assert_eq!(parsed.video_count, 0);
    }

    #[test]
    fn test_description_omitted_when_absent() {
        let channel = NewChannel {
            name: "n".to_string(),
            description: None,
        }
        .into_channel("user-1");
        assert!(!channel_to_fields(&channel).contains_key("description"));
    }
}
