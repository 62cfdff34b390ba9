//! Comment models.

use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

/// Comment document stored under `videos/{videoId}/comments`.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct Comment {
    /// Document ID
    pub comment_id: String,

    /// Comment body
    pub text: String,

    /// Author UID
    pub user_id: String,

    /// Denormalized author display name
    #[serde(default)]
    pub display_name: String,

    /// Denormalized author avatar URL
    #[serde(rename = "photoURL", skip_serializing_if = "Option::is_none")]
    pub photo_url: Option<String>,

    /// Creation timestamp
    pub created_at: DateTime<Utc>,

    /// Like count on the comment
    #[serde(default)]
    pub likes: i64,
}

/// User-submitted comment draft.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct NewComment {
    /// Comment body
    #[validate(length(min = 1, max = 5000))]
    pub text: String,
}

impl NewComment {
    /// Materialize the draft into a comment authored by the given user.
    pub fn into_comment(
        self,
        user_id: impl Into<String>,
        display_name: impl Into<String>,
        photo_url: Option<String>,
    ) -> Comment {
        Comment {
            comment_id: Uuid::new_v4().to_string(),
            text: self.text,
            user_id: user_id.into(),
            display_name: display_name.into(),
            photo_url,
            created_at: Utc::now(),
            likes: 0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_comment_rejects_empty_text() {
        let draft = NewComment { text: String::new() };
        assert!(draft.validate().is_err());
    }

    #[test]
    fn test_into_comment_starts_unliked() {
        let draft = NewComment { text: "great video".to_string() };
        let comment = draft.into_comment("uid-1", "Casey", None);
        assert_eq!(comment.likes, 0);
        assert_eq!(comment.user_id, "uid-1");
    }
}
