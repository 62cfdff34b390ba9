//! Platform-wide settings stored at `system/settings`.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Admin-editable platform settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct SystemSettings {
    /// Platform display name
    pub platform_name: String,

    /// Whether new accounts can be created
    pub allow_registration: bool,

    /// Whether sign-ups must verify their email first
    pub require_email_verification: bool,

    /// Whether uploads are currently accepted
    pub allow_video_uploads: bool,

    /// Maximum upload size in megabytes
    pub max_video_size: u64,

    /// When set, only admins can use the platform
    pub maintenance_mode: bool,

    /// Maximum number of videos on the featured shelf
    pub featured_videos_limit: u32,
}

impl Default for SystemSettings {
    fn default() -> Self {
        Self {
            platform_name: "AiQMateTube".to_string(),
            allow_registration: true,
            require_email_verification: false,
            allow_video_uploads: true,
            max_video_size: 500,
            maintenance_mode: false,
            featured_videos_limit: 10,
        }
    }
}

impl SystemSettings {
    /// Maximum upload size in bytes.
    pub fn max_video_size_bytes(&self) -> u64 {
        self.max_video_size * 1024 * 1024
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_console() {
        let settings = SystemSettings::default();
        assert_eq!(settings.platform_name, "AiQMateTube");
        assert_eq!(settings.max_video_size, 500);
        assert_eq!(settings.featured_videos_limit, 10);
        assert!(settings.allow_video_uploads);
        assert!(!settings.maintenance_mode);
    }

    #[test]
    fn test_size_conversion() {
        let settings = SystemSettings::default();
        assert_eq!(settings.max_video_size_bytes(), 500 * 1024 * 1024);
    }
}
