//! Channel models.

use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;
use validator::Validate;

/// Unique identifier for a channel document.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(transparent)]
pub struct ChannelId(pub String);

impl ChannelId {
    /// Generate a new random channel ID.
    pub fn new() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    pub fn from_string(s: impl Into<String>) -> Self {
        Self(s.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for ChannelId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ChannelId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for ChannelId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for ChannelId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// Channel document as stored in the `channels` collection.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct Channel {
    /// Document ID
    pub channel_id: ChannelId,

    /// Display name
    pub name: String,

    /// User ID of the channel owner
    pub owner_id: String,

    /// Channel description
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// Number of videos published to this channel
    #[serde(default)]
    pub video_count: u64,

    /// Creation timestamp
    pub created_at: DateTime<Utc>,
}

/// User-submitted draft for a new channel.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct NewChannel {
    /// Display name
    #[validate(length(min = 1, max = 80))]
    pub name: String,

    /// Optional description
    #[validate(length(max = 2000))]
    pub description: Option<String>,
}

impl NewChannel {
    /// Materialize the draft into a channel owned by `owner_id`.
    pub fn into_channel(self, owner_id: impl Into<String>) -> Channel {
        Channel {
            channel_id: ChannelId::new(),
            name: self.name,
            owner_id: owner_id.into(),
            description: self.description,
            video_count: 0,
            created_at: Utc::now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_channel_starts_empty() {
        let draft = NewChannel {
            name: "Cooking with Rust".to_string(),
            description: None,
        };
        let channel = draft.into_channel("user-1");
        assert_eq!(channel.video_count, 0);
        assert_eq!(channel.owner_id, "user-1");
    }

    #[test]
    fn test_new_channel_rejects_empty_name() {
        let draft = NewChannel {
            name: String::new(),
            description: None,
        };
        assert!(draft.validate().is_err());
    }
}
