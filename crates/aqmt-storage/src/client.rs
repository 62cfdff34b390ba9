//! Firebase Storage client.
//!
//! Media objects live in the platform's GCS bucket behind the Firebase
//! Storage REST surface. Uploads return object metadata carrying a download
//! token; the tokened `alt=media` URL is what gets stored on the video
//! document and handed to the player.

use std::sync::Arc;
use std::time::{Duration, Instant};

use gcp_auth::{CustomServiceAccount, TokenProvider};
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use tracing::{debug, info_span, Instrument};

use crate::error::{StorageError, StorageResult};

/// OAuth scope for bucket object access.
pub const STORAGE_SCOPE: &str = "https://www.googleapis.com/auth/devstorage.read_write";

/// The emulator accepts a fixed bearer token instead of real credentials.
const EMULATOR_TOKEN: &str = "owner";

// =============================================================================
// Configuration
// =============================================================================

/// Storage client configuration.
#[derive(Debug, Clone)]
pub struct StorageConfig {
    /// Bucket name, e.g. "my-project.appspot.com"
    pub bucket: String,
    /// Emulator host:port; switches to plain HTTP with a fixed owner token
    pub emulator_host: Option<String>,
    /// Request timeout (uploads can be large)
    pub timeout: Duration,
    /// Connect timeout
    pub connect_timeout: Duration,
}

impl StorageConfig {
    /// Create config from environment variables.
    pub fn from_env() -> StorageResult<Self> {
        let bucket = std::env::var("FIREBASE_STORAGE_BUCKET").map_err(|_| {
            StorageError::auth_error("FIREBASE_STORAGE_BUCKET must be set to access media storage")
        })?;

        if bucket.is_empty() {
            return Err(StorageError::auth_error(
                "FIREBASE_STORAGE_BUCKET cannot be empty",
            ));
        }

        Ok(Self {
            bucket,
            emulator_host: std::env::var("FIREBASE_STORAGE_EMULATOR_HOST")
                .ok()
                .filter(|h| !h.is_empty()),
            timeout: Duration::from_secs(300),
            connect_timeout: Duration::from_secs(5),
        })
    }

    /// Config pointed at an emulator (or any stand-in speaking the REST API).
    pub fn for_emulator(bucket: impl Into<String>, host: impl Into<String>) -> Self {
        Self {
            bucket: bucket.into(),
            emulator_host: Some(host.into()),
            timeout: Duration::from_secs(10),
            connect_timeout: Duration::from_secs(2),
        }
    }
}

// =============================================================================
// Object Metadata
// =============================================================================

/// Object metadata as returned by the storage surface.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MediaObject {
    /// Object name within the bucket
    pub name: String,

    /// Bucket holding the object
    #[serde(default)]
    pub bucket: String,

    /// Content type as stored
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content_type: Option<String>,

    /// Object size in bytes (the wire sends a string)
    #[serde(default)]
    pub size: Option<String>,

    /// Download token(s); the first one keys the playback URL
    #[serde(skip_serializing_if = "Option::is_none")]
    pub download_tokens: Option<String>,

    /// Creation timestamp
    #[serde(skip_serializing_if = "Option::is_none")]
    pub time_created: Option<String>,
}

impl MediaObject {
    /// Object size in bytes.
    pub fn size_bytes(&self) -> u64 {
        self.size
            .as_deref()
            .and_then(|s| s.parse().ok())
            .unwrap_or(0)
    }

    /// First download token, when the object has one.
    pub fn download_token(&self) -> Option<&str> {
        self.download_tokens
            .as_deref()
            .and_then(|t| t.split(',').next())
            .filter(|t| !t.is_empty())
    }
}

// =============================================================================
// Client
// =============================================================================

/// Firebase Storage client.
#[derive(Clone)]
pub struct MediaStorageClient {
    http: Client,
    config: StorageConfig,
    base_url: String,
    auth: Option<Arc<dyn TokenProvider>>,
}

impl MediaStorageClient {
    /// Create a new storage client.
    pub fn new(config: StorageConfig) -> StorageResult<Self> {
        let auth = match config.emulator_host {
            Some(_) => None,
            None => Some(Self::create_auth_provider()?),
        };

        let http = Client::builder()
            .timeout(config.timeout)
            .connect_timeout(config.connect_timeout)
            .user_agent(concat!("aqmt-storage/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(StorageError::Network)?;

        let base_url = match &config.emulator_host {
            Some(host) => format!("http://{}/v0/b/{}/o", host, config.bucket),
            None => format!(
                "https://firebasestorage.googleapis.com/v0/b/{}/o",
                config.bucket
            ),
        };

        Ok(Self {
            http,
            config,
            base_url,
            auth,
        })
    }

    fn create_auth_provider() -> StorageResult<Arc<dyn TokenProvider>> {
        let service_account = CustomServiceAccount::from_env().map_err(|e| {
            StorageError::auth_error(format!("Failed to load service account: {}", e))
        })?;

        match service_account {
            Some(sa) => Ok(Arc::new(sa)),
            None => Err(StorageError::auth_error(
                "GOOGLE_APPLICATION_CREDENTIALS not set. \
                 Set it to the path of your service account JSON file.",
            )),
        }
    }

    /// Create from environment variables.
    pub fn from_env() -> StorageResult<Self> {
        Self::new(StorageConfig::from_env()?)
    }

    async fn token(&self) -> StorageResult<String> {
        match &self.auth {
            // The provider caches tokens internally; no extra cache layer here.
            Some(provider) => provider
                .token(&[STORAGE_SCOPE])
                .await
                .map(|t| t.as_str().to_string())
                .map_err(|e| StorageError::auth_error(format!("Failed to obtain token: {}", e))),
            None => Ok(EMULATOR_TOKEN.to_string()),
        }
    }

    fn object_url(&self, object_name: &str) -> String {
        format!("{}/{}", self.base_url, urlencoding::encode(object_name))
    }

    /// Upload an object and return its stored metadata.
    pub async fn upload(
        &self,
        object_name: &str,
        bytes: Vec<u8>,
        content_type: &str,
    ) -> StorageResult<MediaObject> {
        let url = format!("{}?name={}", self.base_url, urlencoding::encode(object_name));
        let size = bytes.len();

        let span = info_span!("storage_upload", object = %object_name, bytes = size);
        async {
            let token = self.token().await?;
            let response = self
                .http
                .post(&url)
                .bearer_auth(&token)
                .header(reqwest::header::CONTENT_TYPE, content_type)
                .body(bytes)
                .send()
                .await?;

            let status = response.status();
            if !status.is_success() {
                let body = response.text().await.unwrap_or_default();
                return Err(StorageError::RequestFailed(
                    status.as_u16(),
                    format!("upload of {} failed: {}", object_name, body),
                ));
            }

            let object: MediaObject = response.json().await?;
            debug!(object = %object.name, bytes = size, "Uploaded media object");
            Ok(object)
        }
        .instrument(span)
        .await
    }

    /// Fetch object metadata. Returns `None` when the object does not exist.
    pub async fn metadata(&self, object_name: &str) -> StorageResult<Option<MediaObject>> {
        let url = self.object_url(object_name);

        let span = info_span!("storage_metadata", object = %object_name);
        async {
            let token = self.token().await?;
            let response = self.http.get(&url).bearer_auth(&token).send().await?;

            match response.status() {
                StatusCode::OK => Ok(Some(response.json::<MediaObject>().await?)),
                StatusCode::NOT_FOUND => Ok(None),
                status => {
                    let body = response.text().await.unwrap_or_default();
                    Err(StorageError::RequestFailed(
                        status.as_u16(),
                        format!("metadata for {} failed: {}", object_name, body),
                    ))
                }
            }
        }
        .instrument(span)
        .await
    }

    /// Delete an object. Deleting an already-missing object succeeds.
    pub async fn delete(&self, object_name: &str) -> StorageResult<()> {
        let url = self.object_url(object_name);

        let span = info_span!("storage_delete", object = %object_name);
        let start = Instant::now();
        let result = async {
            let token = self.token().await?;
            let response = self.http.delete(&url).bearer_auth(&token).send().await?;

            match response.status() {
                StatusCode::OK | StatusCode::NO_CONTENT => Ok(()),
                StatusCode::NOT_FOUND => {
                    debug!(object = %object_name, "Object already deleted (idempotent)");
                    Ok(())
                }
                status => {
                    let body = response.text().await.unwrap_or_default();
                    Err(StorageError::RequestFailed(
                        status.as_u16(),
                        format!("delete of {} failed: {}", object_name, body),
                    ))
                }
            }
        }
        .instrument(span)
        .await;

        debug!(
            object = %object_name,
            elapsed_ms = start.elapsed().as_millis() as u64,
            ok = result.is_ok(),
            "Delete finished"
        );
        result
    }

    /// The tokened playback URL for an uploaded object.
    ///
    /// This is the `url` persisted on the video document; it requires the
    /// object's download token, which only uploads mint.
    pub fn download_url(&self, object: &MediaObject) -> StorageResult<String> {
        let token = object.download_token().ok_or_else(|| {
            StorageError::invalid_response(format!(
                "Object {} has no download token",
                object.name
            ))
        })?;

        Ok(format!(
            "{}?alt=media&token={}",
            self.object_url(&object.name),
            token
        ))
    }

    /// Bucket this client addresses.
    pub fn bucket(&self) -> &str {
        &self.config.bucket
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use wiremock::matchers::{header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn mock_client(server: &MockServer) -> MediaStorageClient {
        let host = server.uri().strip_prefix("http://").unwrap().to_string();
        MediaStorageClient::new(StorageConfig::for_emulator("test-bucket", host)).unwrap()
    }

    #[test]
    #[serial]
    fn test_config_requires_bucket() {
        std::env::remove_var("FIREBASE_STORAGE_BUCKET");
        assert!(StorageConfig::from_env().is_err());
    }

    #[test]
    #[serial]
    fn test_config_reads_bucket_and_emulator() {
        std::env::set_var("FIREBASE_STORAGE_BUCKET", "proj.appspot.com");
        std::env::set_var("FIREBASE_STORAGE_EMULATOR_HOST", "localhost:9199");
        let config = StorageConfig::from_env().unwrap();
        assert_eq!(config.bucket, "proj.appspot.com");
        assert_eq!(config.emulator_host.as_deref(), Some("localhost:9199"));
        std::env::remove_var("FIREBASE_STORAGE_EMULATOR_HOST");
    }

    #[tokio::test]
    async fn test_upload_returns_metadata() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v0/b/test-bucket/o"))
            .and(query_param("name", "videos/user-1/1_clip.mp4"))
            .and(header("content-type", "video/mp4"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "name": "videos/user-1/1_clip.mp4",
                "bucket": "test-bucket",
                "contentType": "video/mp4",
                "size": "4096",
                "downloadTokens": "tok-123"
            })))
            .expect(1)
            .mount(&server)
            .await;

        let client = mock_client(&server);
        let object = client
            .upload("videos/user-1/1_clip.mp4", vec![0u8; 4096], "video/mp4")
            .await
            .unwrap();

        assert_eq!(object.size_bytes(), 4096);
        assert_eq!(object.download_token(), Some("tok-123"));
    }

    #[tokio::test]
    async fn test_download_url_shape() {
        let server = MockServer::start().await;
        let client = mock_client(&server);
        let object = MediaObject {
            name: "videos/user-1/1_clip.mp4".to_string(),
            bucket: "test-bucket".to_string(),
            content_type: Some("video/mp4".to_string()),
            size: Some("1".to_string()),
            download_tokens: Some("tok-123".to_string()),
            time_created: None,
        };

        let url = client.download_url(&object).unwrap();
        assert!(url.contains("/v0/b/test-bucket/o/videos%2Fuser-1%2F1_clip.mp4"));
        assert!(url.ends_with("?alt=media&token=tok-123"));
    }

    #[tokio::test]
    async fn test_download_url_requires_token() {
        let server = MockServer::start().await;
        let client = mock_client(&server);
        let object = MediaObject {
            name: "videos/x".to_string(),
            bucket: "test-bucket".to_string(),
            content_type: None,
            size: None,
            download_tokens: None,
            time_created: None,
        };
        assert!(client.download_url(&object).is_err());
    }

    #[tokio::test]
    async fn test_metadata_missing_is_none() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v0/b/test-bucket/o/videos%2Fgone"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let client = mock_client(&server);
        assert!(client.metadata("videos/gone").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_delete_idempotent_on_404() {
        let server = MockServer::start().await;
        Mock::given(method("DELETE"))
            .and(path("/v0/b/test-bucket/o/videos%2Fgone"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let client = mock_client(&server);
        client.delete("videos/gone").await.unwrap();
    }
}
