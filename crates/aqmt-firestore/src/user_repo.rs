//! Typed repository for the `users` collection.

use std::collections::HashMap;

use chrono::Utc;
use tracing::info;

use aqmt_models::{UserProfile, UserRole};

use crate::client::FirestoreClient;
use crate::error::{FirestoreError, FirestoreResult};
use crate::types::{Document, FieldTransform, ToFirestoreValue, Value, Write};

/// Collection path for user profile documents.
const USERS_COLLECTION: &str = "users";

/// Repository for user profile documents.
pub struct UserProfileRepository {
    client: FirestoreClient,
}

impl UserProfileRepository {
    /// Create a new user profile repository.
    pub fn new(client: FirestoreClient) -> Self {
        Self { client }
    }

    /// Get a profile by UID.
    pub async fn get(&self, uid: &str) -> FirestoreResult<Option<UserProfile>> {
        let doc = self.client.get_document(USERS_COLLECTION, uid).await?;
        match doc {
            Some(d) => Ok(Some(document_to_profile(&d)?)),
            None => Ok(None),
        }
    }

    /// Get a profile, creating it on first sign-in.
    pub async fn ensure(&self, profile: UserProfile) -> FirestoreResult<UserProfile> {
        if let Some(existing) = self.get(&profile.uid).await? {
            return Ok(existing);
        }

        let fields = profile_to_fields(&profile);
        match self
            .client
            .create_document(USERS_COLLECTION, &profile.uid, fields)
            .await
        {
            Ok(_) => {
                info!("Created profile for user: {}", profile.uid);
                Ok(profile)
            }
            // Another session created it between our read and write.
            Err(FirestoreError::AlreadyExists(_)) => self
                .get(&profile.uid)
                .await?
                .ok_or_else(|| FirestoreError::invalid_response("Profile vanished after create")),
            Err(e) => Err(e),
        }
    }

    /// All profiles, for the admin console.
    pub async fn list(&self) -> FirestoreResult<Vec<UserProfile>> {
        let mut profiles = Vec::new();
        let mut page_token: Option<String> = None;

        loop {
            let page = self
                .client
                .list_documents(USERS_COLLECTION, Some(300), page_token.as_deref())
                .await?;

            for doc in page.documents.unwrap_or_default() {
                profiles.push(document_to_profile(&doc)?);
            }

            match page.next_page_token {
                Some(token) if !token.is_empty() => page_token = Some(token),
                _ => break,
            }
        }

        Ok(profiles)
    }

    /// Change a user's platform role.
    pub async fn set_role(&self, uid: &str, role: UserRole) -> FirestoreResult<()> {
        let mut fields = HashMap::new();
        fields.insert("role".to_string(), role.as_str().to_firestore_value());

        self.client
            .update_document(USERS_COLLECTION, uid, fields, Some(vec!["role".to_string()]))
            .await?;
        info!("Set role {} for user: {}", role, uid);
        Ok(())
    }

    /// Ban or unban a user.
    pub async fn set_banned(&self, uid: &str, banned: bool) -> FirestoreResult<()> {
        let mut fields = HashMap::new();
        fields.insert("banned".to_string(), banned.to_firestore_value());

        self.client
            .update_document(
                USERS_COLLECTION,
                uid,
                fields,
                Some(vec!["banned".to_string()]),
            )
            .await?;
        Ok(())
    }

    /// Delete a profile document.
    pub async fn delete(&self, uid: &str) -> FirestoreResult<()> {
        self.client.delete_document(USERS_COLLECTION, uid).await?;
        info!("Deleted profile for user: {}", uid);
        Ok(())
    }

    /// Add a channel to the user's subscriptions. Subscribing twice is a
    /// no-op server-side (append-missing semantics).
    pub async fn subscribe_channel(&self, uid: &str, channel_id: &str) -> FirestoreResult<()> {
        self.apply_subscription_transform(
            uid,
            FieldTransform::append_missing(
                "subscribedChannels",
                channel_id.to_firestore_value(),
            ),
        )
        .await
    }

    /// Remove a channel from the user's subscriptions.
    pub async fn unsubscribe_channel(&self, uid: &str, channel_id: &str) -> FirestoreResult<()> {
        self.apply_subscription_transform(
            uid,
            FieldTransform::remove_all("subscribedChannels", channel_id.to_firestore_value()),
        )
        .await
    }

    async fn apply_subscription_transform(
        &self,
        uid: &str,
        transform: FieldTransform,
    ) -> FirestoreResult<()> {
        let name = self.client.full_document_name(USERS_COLLECTION, uid);
        self.client
            .commit(vec![Write::transform_only(name, vec![transform])])
            .await?;
        Ok(())
    }
}

fn profile_to_fields(profile: &UserProfile) -> HashMap<String, Value> {
    let mut fields = HashMap::new();
    fields.insert(
        "displayName".to_string(),
        profile.display_name.to_firestore_value(),
    );
    fields.insert("role".to_string(), profile.role.as_str().to_firestore_value());
    fields.insert("banned".to_string(), profile.banned.to_firestore_value());
    fields.insert(
        "subscribedChannels".to_string(),
        profile.subscribed_channels.to_firestore_value(),
    );
    fields.insert(
        "createdAt".to_string(),
        profile.created_at.to_firestore_value(),
    );
    if let Some(email) = &profile.email {
        fields.insert("email".to_string(), email.to_firestore_value());
    }
    if let Some(photo_url) = &profile.photo_url {
        fields.insert("photoURL".to_string(), photo_url.to_firestore_value());
    }
    fields
}

fn document_to_profile(doc: &Document) -> FirestoreResult<UserProfile> {
    let uid = doc
        .id()
        .map(str::to_string)
        .ok_or_else(|| FirestoreError::invalid_response("User document has no name"))?;

    if doc.fields.is_none() {
        return Err(FirestoreError::invalid_response("User document has no fields"));
    }

    Ok(UserProfile {
        uid,
        display_name: doc.get::<String>("displayName").unwrap_or_default(),
        email: doc.get::<String>("email"),
        photo_url: doc.get::<String>("photoURL"),
        role: doc
            .get::<String>("role")
            .map(|s| UserRole::from_str_lossy(&s))
            .unwrap_or_default(),
        banned: doc.get::<bool>("banned").unwrap_or(false),
        subscribed_channels: doc.get::<Vec<String>>("subscribedChannels").unwrap_or_default(),
        created_at: doc.get("createdAt").unwrap_or_else(Utc::now),
    })
}
