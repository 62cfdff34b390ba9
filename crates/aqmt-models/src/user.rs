//! User profile and role models.

use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Platform role, from most to least privileged.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema, Default)]
#[serde(rename_all = "snake_case")]
pub enum UserRole {
    SuperAdmin,
    Admin,
    Moderator,
    #[default]
    User,
}

impl UserRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            UserRole::SuperAdmin => "super_admin",
            UserRole::Admin => "admin",
            UserRole::Moderator => "moderator",
            UserRole::User => "user",
        }
    }

    /// Parse from the wire value, defaulting to `User` for unknown input.
    pub fn from_str_lossy(s: &str) -> Self {
        match s {
            "super_admin" => UserRole::SuperAdmin,
            "admin" => UserRole::Admin,
            "moderator" => UserRole::Moderator,
            _ => UserRole::User,
        }
    }

    /// Moderators and above can publish, feature, and unpublish videos.
    pub fn can_manage_videos(&self) -> bool {
        matches!(self, UserRole::SuperAdmin | UserRole::Admin | UserRole::Moderator)
    }

    /// Admins and above can delete videos and manage users.
    pub fn can_delete_videos(&self) -> bool {
        matches!(self, UserRole::SuperAdmin | UserRole::Admin)
    }

    /// Admins and above can edit system settings.
    pub fn can_manage_settings(&self) -> bool {
        matches!(self, UserRole::SuperAdmin | UserRole::Admin)
    }
}

impl fmt::Display for UserRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// User profile document as stored in the `users` collection.
///
/// Authentication itself is the identity provider's concern; this document
/// only carries the platform-side profile.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    /// Identity provider UID (also the document ID)
    pub uid: String,

    /// Display name
    #[serde(default)]
    pub display_name: String,

    /// Email address
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,

    /// Avatar URL
    #[serde(rename = "photoURL", skip_serializing_if = "Option::is_none")]
    pub photo_url: Option<String>,

    /// Platform role
    #[serde(default)]
    pub role: UserRole,

    /// Banned users keep their data but cannot interact
    #[serde(default)]
    pub banned: bool,

    /// Channel IDs this user is subscribed to
    #[serde(default)]
    pub subscribed_channels: Vec<String>,

    /// First sign-in timestamp
    pub created_at: DateTime<Utc>,
}

impl UserProfile {
    /// Create the profile document written on first sign-in.
    pub fn new(uid: impl Into<String>, display_name: impl Into<String>) -> Self {
        Self {
            uid: uid.into(),
            display_name: display_name.into(),
            email: None,
            photo_url: None,
            role: UserRole::User,
            banned: false,
            subscribed_channels: Vec::new(),
            created_at: Utc::now(),
        }
    }

    /// Whether this user is subscribed to the given channel.
    pub fn is_subscribed(&self, channel_id: &str) -> bool {
        self.subscribed_channels.iter().any(|c| c == channel_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_permissions() {
        assert!(UserRole::Moderator.can_manage_videos());
        assert!(!UserRole::Moderator.can_delete_videos());
        assert!(!UserRole::Moderator.can_manage_settings());
        assert!(UserRole::Admin.can_delete_videos());
        assert!(UserRole::SuperAdmin.can_manage_settings());
        assert!(!UserRole::User.can_manage_videos());
    }

    #[test]
    fn test_role_parsing_is_lossy() {
        assert_eq!(UserRole::from_str_lossy("super_admin"), UserRole::SuperAdmin);
        assert_eq!(UserRole::from_str_lossy("viewer"), UserRole::User);
    }

    #[test]
    fn test_new_profile_defaults() {
        let profile = UserProfile::new("uid-1", "Casey");
        assert_eq!(profile.role, UserRole::User);
        assert!(!profile.banned);
        assert!(profile.subscribed_channels.is_empty());
    }

    #[test]
    fn test_subscription_lookup() {
        let mut profile = UserProfile::new("uid-1", "Casey");
        profile.subscribed_channels.push("ch-9".to_string());
        assert!(profile.is_subscribed("ch-9"));
        assert!(!profile.is_subscribed("ch-1"));
    }
}
