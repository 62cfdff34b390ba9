//! Firestore REST API types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Firestore document value types.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Value {
    NullValue(()),
    BooleanValue(bool),
    IntegerValue(String), // Firestore sends integers as strings
    DoubleValue(f64),
    TimestampValue(String),
    StringValue(String),
    BytesValue(String),
    ReferenceValue(String),
    ArrayValue(ArrayValue),
    MapValue(MapValue),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArrayValue {
    pub values: Option<Vec<Value>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MapValue {
    pub fields: Option<HashMap<String, Value>>,
}

/// Firestore document.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Document {
    /// Full resource name
    pub name: Option<String>,
    /// Document fields
    pub fields: Option<HashMap<String, Value>>,
    /// Create time
    pub create_time: Option<String>,
    /// Update time
    pub update_time: Option<String>,
}

impl Document {
    /// Create a new document with the given fields.
    pub fn new(fields: HashMap<String, Value>) -> Self {
        Self {
            name: None,
            fields: Some(fields),
            create_time: None,
            update_time: None,
        }
    }

    /// Document ID: the last path segment of the resource name.
    pub fn id(&self) -> Option<&str> {
        self.name.as_deref().and_then(|n| n.rsplit('/').next())
    }

    /// Look up a field value.
    pub fn field(&self, key: &str) -> Option<&Value> {
        self.fields.as_ref().and_then(|f| f.get(key))
    }

    /// Typed field lookup.
    pub fn get<T: FromFirestoreValue>(&self, key: &str) -> Option<T> {
        self.field(key).and_then(T::from_firestore_value)
    }
}

/// List documents response.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListDocumentsResponse {
    pub documents: Option<Vec<Document>>,
    pub next_page_token: Option<String>,
}

// ============================================================================
// Write / Commit Types
// ============================================================================

/// A single write operation in a commit.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct Write {
    /// Update or insert a document.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub update: Option<Document>,

    /// Delete a document by name.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub delete: Option<String>,

    /// Field mask for partial updates.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub update_mask: Option<DocumentMask>,

    /// Transforms applied after the update fields, in order.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub update_transforms: Option<Vec<FieldTransform>>,

    /// Standalone document transform (no field update).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub transform: Option<DocumentTransform>,

    /// Precondition for the write.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub current_document: Option<Precondition>,
}

impl Write {
    /// Merge-write the given fields into a document, creating it if absent.
    pub fn merge(name: impl Into<String>, fields: HashMap<String, Value>) -> Self {
        let mask = DocumentMask {
            field_paths: fields.keys().cloned().collect(),
        };
        let mut doc = Document::new(fields);
        doc.name = Some(name.into());
        Self {
            update: Some(doc),
            update_mask: Some(mask),
            ..Default::default()
        }
    }

    /// Attach post-update transforms (e.g. counter increments) to a write.
    pub fn with_transforms(mut self, transforms: Vec<FieldTransform>) -> Self {
        self.update_transforms = Some(transforms);
        self
    }

    /// A write that only applies transforms to a document.
    pub fn transform_only(name: impl Into<String>, transforms: Vec<FieldTransform>) -> Self {
        Self {
            transform: Some(DocumentTransform {
                document: name.into(),
                field_transforms: transforms,
            }),
            ..Default::default()
        }
    }

    /// A write that deletes a document.
    pub fn delete_document(name: impl Into<String>) -> Self {
        Self {
            delete: Some(name.into()),
            ..Default::default()
        }
    }
}

/// Document field mask for partial updates.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentMask {
    pub field_paths: Vec<String>,
}

/// Precondition for a write operation.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Precondition {
    /// Document must exist.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub exists: Option<bool>,

    /// Document must have this update time.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub update_time: Option<String>,
}

/// Server-side transform of a whole document.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentTransform {
    /// Full resource name of the document to transform.
    pub document: String,
    /// Transforms to apply, in order.
    pub field_transforms: Vec<FieldTransform>,
}

/// Server-side transform of a single field.
///
/// Increments treat a missing field (or document) as zero, which is what
/// makes counter updates safe without a prior read.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct FieldTransform {
    /// Path of the field to transform.
    pub field_path: String,

    /// Atomic numeric increment.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub increment: Option<Value>,

    /// Append elements not already present in the array field.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub append_missing_elements: Option<ArrayValue>,

    /// Remove all occurrences of the elements from the array field.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub remove_all_from_array: Option<ArrayValue>,
}

impl FieldTransform {
    /// Atomic `field += delta`.
    pub fn increment(field_path: impl Into<String>, delta: i64) -> Self {
        Self {
            field_path: field_path.into(),
            increment: Some(Value::IntegerValue(delta.to_string())),
            ..Default::default()
        }
    }

    /// Add `element` to an array field if absent.
    pub fn append_missing(field_path: impl Into<String>, element: Value) -> Self {
        Self {
            field_path: field_path.into(),
            append_missing_elements: Some(ArrayValue {
                values: Some(vec![element]),
            }),
            ..Default::default()
        }
    }

    /// Remove every occurrence of `element` from an array field.
    pub fn remove_all(field_path: impl Into<String>, element: Value) -> Self {
        Self {
            field_path: field_path.into(),
            remove_all_from_array: Some(ArrayValue {
                values: Some(vec![element]),
            }),
            ..Default::default()
        }
    }
}

/// Commit request: all writes apply atomically.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommitRequest {
    pub writes: Vec<Write>,
}

/// Result of a single write in a commit.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WriteResult {
    /// Update time of the written document.
    pub update_time: Option<String>,
    /// Results of applied transforms, in order.
    pub transform_results: Option<Vec<Value>>,
}

/// Commit response.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommitResponse {
    /// Results for each write, in order.
    pub write_results: Option<Vec<WriteResult>>,
    /// Time the commit was applied.
    pub commit_time: Option<String>,
}

impl CommitResponse {
    /// Response for an empty commit.
    pub fn empty() -> Self {
        Self {
            write_results: Some(vec![]),
            commit_time: None,
        }
    }
}

// ============================================================================
// Query Types
// ============================================================================

/// Subset of the Firestore structured query surface used by the repositories.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct StructuredQuery {
    pub from: Vec<CollectionSelector>,

    #[serde(rename = "where", skip_serializing_if = "Option::is_none")]
    pub filter: Option<Filter>,

    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub order_by: Vec<Order>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub limit: Option<i32>,
}

impl StructuredQuery {
    /// Query over a single collection under the query parent.
    pub fn collection(collection_id: impl Into<String>) -> Self {
        Self {
            from: vec![CollectionSelector {
                collection_id: collection_id.into(),
            }],
            ..Default::default()
        }
    }

    /// Order descending by a field.
    pub fn order_by_desc(mut self, field_path: impl Into<String>) -> Self {
        self.order_by.push(Order {
            field: FieldReference {
                field_path: field_path.into(),
            },
            direction: Direction::Descending,
        });
        self
    }

    /// Order ascending by a field.
    pub fn order_by_asc(mut self, field_path: impl Into<String>) -> Self {
        self.order_by.push(Order {
            field: FieldReference {
                field_path: field_path.into(),
            },
            direction: Direction::Ascending,
        });
        self
    }

    /// Equality filter on a field.
    pub fn where_eq(mut self, field_path: impl Into<String>, value: Value) -> Self {
        self.filter = Some(Filter {
            field_filter: Some(FieldFilter {
                field: FieldReference {
                    field_path: field_path.into(),
                },
                op: FieldOperator::Equal,
                value,
            }),
        });
        self
    }

    /// Cap the number of returned documents.
    pub fn with_limit(mut self, limit: i32) -> Self {
        self.limit = Some(limit);
        self
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CollectionSelector {
    pub collection_id: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Filter {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub field_filter: Option<FieldFilter>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldFilter {
    pub field: FieldReference,
    pub op: FieldOperator,
    pub value: Value,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FieldOperator {
    Equal,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldReference {
    pub field_path: String,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Direction {
    Ascending,
    Descending,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    pub field: FieldReference,
    pub direction: Direction,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RunQueryRequest {
    pub structured_query: StructuredQuery,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RunQueryResponse {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub document: Option<Document>,
}

// ============================================================================
// Value Conversions
// ============================================================================

/// Convert a Rust value to a Firestore Value.
pub trait ToFirestoreValue {
    fn to_firestore_value(&self) -> Value;
}

impl ToFirestoreValue for String {
    fn to_firestore_value(&self) -> Value {
        Value::StringValue(self.clone())
    }
}

impl ToFirestoreValue for &str {
    fn to_firestore_value(&self) -> Value {
        Value::StringValue(self.to_string())
    }
}

impl ToFirestoreValue for i64 {
    fn to_firestore_value(&self) -> Value {
        Value::IntegerValue(self.to_string())
    }
}

impl ToFirestoreValue for i32 {
    fn to_firestore_value(&self) -> Value {
        Value::IntegerValue((*self as i64).to_string())
    }
}

impl ToFirestoreValue for u32 {
    fn to_firestore_value(&self) -> Value {
        Value::IntegerValue((*self as i64).to_string())
    }
}

impl ToFirestoreValue for u64 {
    fn to_firestore_value(&self) -> Value {
        Value::IntegerValue((*self as i64).to_string())
    }
}

impl ToFirestoreValue for f64 {
    fn to_firestore_value(&self) -> Value {
        Value::DoubleValue(*self)
    }
}

impl ToFirestoreValue for bool {
    fn to_firestore_value(&self) -> Value {
        Value::BooleanValue(*self)
    }
}

impl ToFirestoreValue for DateTime<Utc> {
    fn to_firestore_value(&self) -> Value {
        Value::TimestampValue(self.to_rfc3339())
    }
}

impl<T: ToFirestoreValue> ToFirestoreValue for Option<T> {
    fn to_firestore_value(&self) -> Value {
        match self {
            Some(v) => v.to_firestore_value(),
            None => Value::NullValue(()),
        }
    }
}

impl<T: ToFirestoreValue> ToFirestoreValue for Vec<T> {
    fn to_firestore_value(&self) -> Value {
        Value::ArrayValue(ArrayValue {
            values: Some(self.iter().map(|v| v.to_firestore_value()).collect()),
        })
    }
}

/// Convert a Firestore Value to a Rust type.
pub trait FromFirestoreValue: Sized {
    fn from_firestore_value(value: &Value) -> Option<Self>;
}

impl FromFirestoreValue for String {
    fn from_firestore_value(value: &Value) -> Option<Self> {
        match value {
            Value::StringValue(s) => Some(s.clone()),
            _ => None,
        }
    }
}

impl FromFirestoreValue for i64 {
    fn from_firestore_value(value: &Value) -> Option<Self> {
        match value {
            Value::IntegerValue(s) => s.parse().ok(),
            Value::DoubleValue(f) => Some(*f as i64),
            _ => None,
        }
    }
}

impl FromFirestoreValue for u32 {
    fn from_firestore_value(value: &Value) -> Option<Self> {
        match value {
            Value::IntegerValue(s) => s.parse().ok(),
            Value::DoubleValue(f) if *f >= 0.0 => Some(*f as u32),
            _ => None,
        }
    }
}

impl FromFirestoreValue for u64 {
    fn from_firestore_value(value: &Value) -> Option<Self> {
        match value {
            Value::IntegerValue(s) => s.parse().ok(),
            Value::DoubleValue(f) if *f >= 0.0 => Some(*f as u64),
            _ => None,
        }
    }
}

impl FromFirestoreValue for f64 {
    fn from_firestore_value(value: &Value) -> Option<Self> {
        match value {
            Value::DoubleValue(f) => Some(*f),
            Value::IntegerValue(s) => s.parse().ok(),
            _ => None,
        }
    }
}

impl FromFirestoreValue for bool {
    fn from_firestore_value(value: &Value) -> Option<Self> {
        match value {
            Value::BooleanValue(b) => Some(*b),
            _ => None,
        }
    }
}

impl FromFirestoreValue for DateTime<Utc> {
    fn from_firestore_value(value: &Value) -> Option<Self> {
        match value {
            Value::TimestampValue(s) => DateTime::parse_from_rfc3339(s).ok().map(|dt| dt.into()),
            _ => None,
        }
    }
}

impl FromFirestoreValue for Vec<String> {
    fn from_firestore_value(value: &Value) -> Option<Self> {
        match value {
            Value::ArrayValue(arr) => Some(
                arr.values
                    .as_deref()
                    .unwrap_or_default()
                    .iter()
                    .filter_map(String::from_firestore_value)
                    .collect(),
            ),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_value_serialization_shape() {
        let json = serde_json::to_value(Value::StringValue("hi".into())).unwrap();
        assert_eq!(json, serde_json::json!({ "stringValue": "hi" }));

        let json = serde_json::to_value(Value::IntegerValue("42".into())).unwrap();
        assert_eq!(json, serde_json::json!({ "integerValue": "42" }));
    }

    #[test]
    fn test_increment_transform_shape() {
        let transform = FieldTransform::increment("views", 1);
        let json = serde_json::to_value(&transform).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "fieldPath": "views",
                "increment": { "integerValue": "1" }
            })
        );
    }

    #[test]
    fn test_merge_write_carries_mask() {
        let mut fields = HashMap::new();
        fields.insert("progress".to_string(), 0.5f64.to_firestore_value());
        let write = Write::merge("projects/p/databases/d/documents/users/u/history/v", fields);
        let mask = write.update_mask.expect("mask");
        assert_eq!(mask.field_paths, vec!["progress".to_string()]);
    }

    #[test]
    fn test_query_builder() {
        let query = StructuredQuery::collection("history")
            .order_by_desc("watchedAt")
            .with_limit(50);
        let json = serde_json::to_value(&query).unwrap();
        assert_eq!(json["from"][0]["collectionId"], "history");
        assert_eq!(json["orderBy"][0]["direction"], "DESCENDING");
        assert_eq!(json["limit"], 50);
    }

    #[test]
    fn test_document_id_from_name() {
        let doc = Document {
            name: Some("projects/p/databases/d/documents/videos/abc".to_string()),
            fields: None,
            create_time: None,
            update_time: None,
        };
        assert_eq!(doc.id(), Some("abc"));
    }

    #[test]
    fn test_integer_roundtrip_through_value() {
        let value = 7u64.to_firestore_value();
        assert_eq!(u64::from_firestore_value(&value), Some(7));
    }

    #[test]
    fn test_string_array_roundtrip() {
        let value = vec!["a".to_string(), "b".to_string()].to_firestore_value();
        assert_eq!(
            Vec::<String>::from_firestore_value(&value),
            Some(vec!["a".to_string(), "b".to_string()])
        );
    }
}
