//! Typed repository for the platform settings document.

use std::collections::HashMap;

use tracing::info;

use aqmt_models::SystemSettings;

use crate::client::FirestoreClient;
use crate::error::FirestoreResult;
use crate::types::{Document, ToFirestoreValue, Value, Write};

/// Settings live at a fixed singleton path.
const SETTINGS_COLLECTION: &str = "system";
const SETTINGS_DOC_ID: &str = "settings";

/// Repository for the `system/settings` document.
pub struct SettingsRepository {
    client: FirestoreClient,
}

impl SettingsRepository {
    /// Create a new settings repository.
    pub fn new(client: FirestoreClient) -> Self {
        Self { client }
    }

    /// Read the platform settings, falling back to defaults for a missing
    /// document or missing fields (a fresh deployment has neither).
    pub async fn get(&self) -> FirestoreResult<SystemSettings> {
        let doc = self
            .client
            .get_document(SETTINGS_COLLECTION, SETTINGS_DOC_ID)
            .await?;

        Ok(doc.map(|d| document_to_settings(&d)).unwrap_or_default())
    }

    /// Save the full settings document (merge-upsert; creates it if absent).
    pub async fn save(&self, settings: &SystemSettings) -> FirestoreResult<()> {
        let name = self
            .client
            .full_document_name(SETTINGS_COLLECTION, SETTINGS_DOC_ID);
        self.client
            .commit(vec![Write::merge(name, settings_to_fields(settings))])
            .await?;
        info!("Saved platform settings");
        Ok(())
    }
}

fn settings_to_fields(settings: &SystemSettings) -> HashMap<String, Value> {
    let mut fields = HashMap::new();
    fields.insert(
        "platformName".to_string(),
        settings.platform_name.to_firestore_value(),
    );
    fields.insert(
        "allowRegistration".to_string(),
        settings.allow_registration.to_firestore_value(),
    );
    fields.insert(
        "requireEmailVerification".to_string(),
        settings.require_email_verification.to_firestore_value(),
    );
    fields.insert(
        "allowVideoUploads".to_string(),
        settings.allow_video_uploads.to_firestore_value(),
    );
    fields.insert(
        "maxVideoSize".to_string(),
        settings.max_video_size.to_firestore_value(),
    );
    fields.insert(
        "maintenanceMode".to_string(),
        settings.maintenance_mode.to_firestore_value(),
    );
    fields.insert(
        "featuredVideosLimit".to_string(),
        settings.featured_videos_limit.to_firestore_value(),
    );
    fields
}

fn document_to_settings(doc: &Document) -> SystemSettings {
    let defaults = SystemSettings::default();
    SystemSettings {
        platform_name: doc
            .get::<String>("platformName")
            .unwrap_or(defaults.platform_name),
        allow_registration: doc
            .get::<bool>("allowRegistration")
            .unwrap_or(defaults.allow_registration),
        require_email_verification: doc
            .get::<bool>("requireEmailVerification")
            .unwrap_or(defaults.require_email_verification),
        allow_video_uploads: doc
            .get::<bool>("allowVideoUploads")
            .unwrap_or(defaults.allow_video_uploads),
        max_video_size: doc
            .get::<u64>("maxVideoSize")
            .unwrap_or(defaults.max_video_size),
        maintenance_mode: doc
            .get::<bool>("maintenanceMode")
            .unwrap_or(defaults.maintenance_mode),
        featured_videos_limit: doc
            .get::<u32>("featuredVideosLimit")
            .unwrap_or(defaults.featured_videos_limit),
    }
}
