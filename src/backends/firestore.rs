//! # Firestore
//!
//! Orders are written through the Firestore REST API rather than an SDK.
//! Every JSON value has to be wrapped in its typed form (`stringValue`,
//! `mapValue`, ...), so records are serialized with serde first and then
//! re-encoded by [`encode_value`].
//!
//! Only inserts are issued. Firestore picks the document id and returns it as
//! the last segment of the document `name`.

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{json, Map, Value};
use tracing::{debug, instrument};

use super::{Document, OrderStore};
use crate::config::FirestoreConfig;
use crate::error::StoreError;

pub struct FirestoreStore {
    http: reqwest::Client,
    base_url: String,
    project_id: String,
    api_key: String,
}

#[derive(Deserialize)]
struct CreatedDocument {
    name: String,
}

impl FirestoreStore {
    pub fn new(http: reqwest::Client, config: &FirestoreConfig) -> Self {
        Self {
            http,
            base_url: config.url.trim_end_matches('/').to_string(),
            project_id: config.project_id.clone(),
            api_key: config.api_key.clone(),
        }
    }

    fn collection_url(&self, collection: &str) -> String {
        format!(
            "{}/v1/projects/{}/databases/(default)/documents/{}",
            self.base_url, self.project_id, collection
        )
    }
}

#[async_trait]
impl OrderStore for FirestoreStore {
    #[instrument(name = "firestore_insert", skip(self, document))]
    async fn insert(&self, collection: &str, document: Document) -> Result<String, StoreError> {
        debug!("Sending request");
        let response = self
            .http
            .post(self.collection_url(collection))
            .query(&[("key", self.api_key.as_str())])
            .json(&encode_document(&document))
            .send()
            .await
            .map_err(|e| StoreError::Transport(e.to_string()))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| StoreError::Transport(e.to_string()))?;

        if !status.is_success() {
            return Err(StoreError::Rejected {
                status: status.as_u16(),
                message: error_message(&body),
            });
        }

        let created: CreatedDocument =
            serde_json::from_str(&body).map_err(|e| StoreError::MalformedResponse(e.to_string()))?;
        document_id(&created.name)
            .map(ToString::to_string)
            .ok_or_else(|| StoreError::MalformedResponse(created.name))
    }
}

/// Builds the request body for a new document.
pub fn encode_document(document: &Document) -> Value {
    let mut fields: Map<String, Value> = document
        .fields
        .iter()
        .map(|(key, value)| (key.clone(), encode_value(value)))
        .collect();
    fields.insert(
        "createdAt".to_string(),
        json!({ "timestampValue": document.created_at.to_rfc3339() }),
    );
    json!({ "fields": fields })
}

/// Wraps a plain JSON value in Firestore's typed value representation.
pub fn encode_value(value: &Value) -> Value {
    match value {
        Value::Null => json!({ "nullValue": null }),
        Value::Bool(b) => json!({ "booleanValue": b }),
        Value::Number(n) => match (n.as_i64(), n.as_u64()) {
            // Firestore carries 64-bit integers as strings.
            (Some(i), _) => json!({ "integerValue": i.to_string() }),
            (None, Some(u)) => json!({ "integerValue": u.to_string() }),
            _ => json!({ "doubleValue": n.as_f64() }),
        },
        Value::String(s) => json!({ "stringValue": s }),
        Value::Array(items) => json!({
            "arrayValue": { "values": items.iter().map(encode_value).collect::<Vec<_>>() }
        }),
        Value::Object(map) => {
            let fields: Map<String, Value> = map
                .iter()
                .map(|(key, value)| (key.clone(), encode_value(value)))
                .collect();
            json!({ "mapValue": { "fields": fields } })
        }
    }
}

/// `projects/p/databases/(default)/documents/orders/abc123` → `abc123`.
pub fn document_id(name: &str) -> Option<&str> {
    name.rsplit('/').next().filter(|id| !id.is_empty() && *id != name)
}

fn error_message(body: &str) -> String {
    serde_json::from_str::<Value>(body)
        .ok()
        .and_then(|v| v["error"]["message"].as_str().map(ToString::to_string))
        .unwrap_or_else(|| body.chars().take(200).collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    #[test]
    fn encodes_scalars_as_typed_values() {
        assert_eq!(encode_value(&json!("a")), json!({ "stringValue": "a" }));
        assert_eq!(encode_value(&json!(true)), json!({ "booleanValue": true }));
        assert_eq!(encode_value(&json!(42)), json!({ "integerValue": "42" }));
        assert_eq!(encode_value(&json!(1.5)), json!({ "doubleValue": 1.5 }));
        assert_eq!(encode_value(&Value::Null), json!({ "nullValue": null }));
    }

    #[test]
    fn encodes_nested_maps_and_arrays() {
        let encoded = encode_value(&json!({ "pets_0": { "slot": 0, "tags": ["dog"] } }));
        assert_eq!(
            encoded,
            json!({
                "mapValue": { "fields": {
                    "pets_0": { "mapValue": { "fields": {
                        "slot": { "integerValue": "0" },
                        "tags": { "arrayValue": { "values": [ { "stringValue": "dog" } ] } }
                    } } }
                } }
            })
        );
    }

    #[test]
    fn document_gets_native_timestamp() {
        let created_at = Utc.with_ymd_and_hms(2025, 3, 1, 12, 0, 0).unwrap();
        let mut fields = Map::new();
        fields.insert("status".to_string(), json!("pending"));
        let body = encode_document(&Document { fields, created_at });

        assert_eq!(body["fields"]["status"], json!({ "stringValue": "pending" }));
        assert_eq!(
            body["fields"]["createdAt"],
            json!({ "timestampValue": "2025-03-01T12:00:00+00:00" })
        );
    }

    #[test]
    fn extracts_document_id_from_name() {
        assert_eq!(
            document_id("projects/p/databases/(default)/documents/orders/Xy12"),
            Some("Xy12")
        );
        assert_eq!(document_id("projects/p/documents/orders/"), None);
        assert_eq!(document_id("bare"), None);
    }

    #[test]
    fn reads_google_error_message() {
        let body = r#"{"error":{"code":403,"message":"Missing or insufficient permissions.","status":"PERMISSION_DENIED"}}"#;
        assert_eq!(error_message(body), "Missing or insufficient permissions.");
        assert_eq!(error_message("oops"), "oops");
    }
}
