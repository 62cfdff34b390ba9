//! Tests for Firestore client functionality.
//!
//! The REST surface is exercised against a wiremock server through the
//! emulator-host seam; no live credentials are involved.

use std::collections::HashMap;

use wiremock::matchers::{body_partial_json, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use crate::client::{FirestoreClient, FirestoreConfig};
use crate::error::FirestoreError;
use crate::types::{FieldTransform, ToFirestoreValue, Value, Write};

async fn mock_client(server: &MockServer) -> FirestoreClient {
    let host = server
        .uri()
        .strip_prefix("http://")
        .expect("wiremock serves plain http")
        .to_string();
    FirestoreClient::new(FirestoreConfig::for_emulator("test-project", host))
        .await
        .expect("client construction does not hit the network")
}

fn documents_path(suffix: &str) -> String {
    format!(
        "/v1/projects/test-project/databases/(default)/documents{}",
        suffix
    )
}

#[tokio::test]
async fn test_get_document_found() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(documents_path("/videos/v1")))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "name": "projects/test-project/databases/(default)/documents/videos/v1",
            "fields": { "title": { "stringValue": "First" } },
            "createTime": "2025-01-01T00:00:00Z",
            "updateTime": "2025-01-02T00:00:00Z"
        })))
        .mount(&server)
        .await;

    let client = mock_client(&server).await;
    let doc = client.get_document("videos", "v1").await.unwrap().unwrap();
    assert_eq!(doc.id(), Some("v1"));
    assert_eq!(doc.get::<String>("title").as_deref(), Some("First"));
}

#[tokio::test]
async fn test_get_document_missing_is_none() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(documents_path("/videos/absent")))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let client = mock_client(&server).await;
    let doc = client.get_document("videos", "absent").await.unwrap();
    assert!(doc.is_none());
}

#[tokio::test]
async fn test_get_document_server_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(documents_path("/videos/v1")))
        .respond_with(ResponseTemplate::new(503).set_body_string("unavailable"))
        .mount(&server)
        .await;

    let client = mock_client(&server).await;
    let err = client.get_document("videos", "v1").await.unwrap_err();
    assert!(matches!(err, FirestoreError::ServerError(503, _)));
    assert!(err.is_retryable());
}

#[tokio::test]
async fn test_update_document_sends_mask() {
    let server = MockServer::start().await;
    Mock::given(method("PATCH"))
        .and(path(documents_path("/videos/v1")))
        .and(query_param("updateMask.fieldPaths", "published"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "name": "projects/test-project/databases/(default)/documents/videos/v1",
            "fields": { "published": { "booleanValue": true } }
        })))
        .expect(1)
        .mount(&server)
        .await;

    let client = mock_client(&server).await;
    let mut fields = HashMap::new();
    fields.insert("published".to_string(), true.to_firestore_value());
    client
        .update_document("videos", "v1", fields, Some(vec!["published".to_string()]))
        .await
        .unwrap();
}

#[tokio::test]
async fn test_commit_sends_increment_transform() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(documents_path(":commit")))
        .and(body_partial_json(serde_json::json!({
            "writes": [{
                "transform": {
                    "fieldTransforms": [{
                        "fieldPath": "views",
                        "increment": { "integerValue": "1" }
                    }]
                }
            }]
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "writeResults": [{ "updateTime": "2025-01-02T00:00:00Z" }],
            "commitTime": "2025-01-02T00:00:00Z"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let client = mock_client(&server).await;
    let name = client.full_document_name("videos", "v1");
    client
        .commit(vec![Write::transform_only(
            name,
            vec![FieldTransform::increment("views", 1)],
        )])
        .await
        .unwrap();
}

#[tokio::test]
async fn test_commit_empty_is_local_noop() {
    // No server: an empty commit must not produce a request.
    let server = MockServer::start().await;
    let client = mock_client(&server).await;
    let response = client.commit(vec![]).await.unwrap();
    assert_eq!(response.write_results.unwrap().len(), 0);
}

#[tokio::test]
async fn test_run_query_parses_partial_responses() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(documents_path("/users/u1:runQuery")))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([
            {
                "document": {
                    "name": "projects/test-project/databases/(default)/documents/users/u1/history/v1",
                    "fields": { "progress": { "doubleValue": 0.4 } }
                }
            },
            { "readTime": "2025-01-02T00:00:00Z" }
        ])))
        .mount(&server)
        .await;

    let client = mock_client(&server).await;
    let docs = client
        .run_query(
            "users/u1",
            crate::types::StructuredQuery::collection("history").order_by_desc("watchedAt"),
        )
        .await
        .unwrap();
    assert_eq!(docs.len(), 1);
    assert_eq!(docs[0].get::<f64>("progress"), Some(0.4));
}

#[tokio::test]
async fn test_delete_document_idempotent_on_404() {
    let server = MockServer::start().await;
    Mock::given(method("DELETE"))
        .and(path(documents_path("/videos/gone")))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let client = mock_client(&server).await;
    client.delete_document("videos", "gone").await.unwrap();
}

#[tokio::test]
async fn test_value_double_and_integer_interop() {
    // Firestore may answer a counter as integerValue or doubleValue
    // depending on write history; both must decode.
    use crate::types::FromFirestoreValue;
    assert_eq!(
        u64::from_firestore_value(&Value::IntegerValue("12".into())),
        Some(12)
    );
    assert_eq!(u64::from_firestore_value(&Value::DoubleValue(12.0)), Some(12));
}
