use async_trait::async_trait;
use chrono::DateTime;
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use serde_json::{json, Map, Number, Value};
use tracing::debug;

use crate::adapters::storage::check_status;
use crate::application::ports::{Document, DocumentStorePort};
use crate::domain::errors::{DomainError, DomainResult};

const FIRESTORE_BASE: &str = "https://firestore.googleapis.com/v1";
const PAGE_SIZE: &str = "300";

/// Firestore a través de su API REST, con codificación tipada de valores.
pub struct FirestoreDocumentStore {
    client: Client,
    documents_url: String,
    access_token: String,
}

#[derive(Debug, Deserialize)]
struct FirestoreDocument {
    name: String,
    #[serde(default)]
    fields: Map<String, Value>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ListResponse {
    #[serde(default)]
    documents: Vec<FirestoreDocument>,
    next_page_token: Option<String>,
}

impl FirestoreDocument {
    fn id(&self) -> &str {
        self.name.rsplit('/').next().unwrap_or(&self.name)
    }

    fn into_document(self) -> (String, Document) {
        let id = self.id().to_string();
        (id, decode_fields(&self.fields))
    }
}

impl FirestoreDocumentStore {
    pub fn new(client: Client, project_id: &str, access_token: impl Into<String>) -> Self {
        Self {
            client,
            documents_url: format!("{FIRESTORE_BASE}/projects/{project_id}/databases/(default)/documents"),
            access_token: access_token.into(),
        }
    }

    fn collection_url(&self, collection: &str) -> String {
        format!("{}/{}", self.documents_url, urlencoding::encode(collection))
    }
}

#[async_trait]
impl DocumentStorePort for FirestoreDocumentStore {
    async fn insert(&self, collection: &str, document: Document) -> DomainResult<String> {
        let res = self
            .client
            .post(self.collection_url(collection))
            .bearer_auth(&self.access_token)
            .json(&json!({ "fields": encode_fields(&document) }))
            .send()
            .await
            .map_err(|e| DomainError::Storage(format!("insert into {collection}: {e}")))?;
        let created: FirestoreDocument = check_status(res, "insert")
            .await?
            .json()
            .await
            .map_err(|e| DomainError::Storage(format!("insert response: {e}")))?;
        debug!(collection = %collection, id = %created.id(), "Document created");
        Ok(created.id().to_string())
    }

    async fn get(&self, collection: &str, id: &str) -> DomainResult<Option<Document>> {
        let url = format!("{}/{}", self.collection_url(collection), urlencoding::encode(id));
        let res = self
            .client
            .get(url)
            .bearer_auth(&self.access_token)
            .send()
            .await
            .map_err(|e| DomainError::Storage(format!("get {collection}/{id}: {e}")))?;
        if res.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        let doc: FirestoreDocument = check_status(res, "get")
            .await?
            .json()
            .await
            .map_err(|e| DomainError::Storage(format!("get response: {e}")))?;
        Ok(Some(doc.into_document().1))
    }

    async fn list(&self, collection: &str) -> DomainResult<Vec<(String, Document)>> {
        let mut out = Vec::new();
        let mut page_token: Option<String> = None;
        loop {
            let mut req = self
                .client
                .get(self.collection_url(collection))
                .bearer_auth(&self.access_token)
                .query(&[("pageSize", PAGE_SIZE)]);
            if let Some(token) = &page_token {
                req = req.query(&[("pageToken", token.as_str())]);
            }
            let res = req
                .send()
                .await
                .map_err(|e| DomainError::Storage(format!("list {collection}: {e}")))?;
            let page: ListResponse = check_status(res, "list")
                .await?
                .json()
                .await
                .map_err(|e| DomainError::Storage(format!("list response: {e}")))?;

            out.extend(page.documents.into_iter().map(FirestoreDocument::into_document));
            match page.next_page_token {
                Some(token) if !token.is_empty() => page_token = Some(token),
                _ => break,
            }
        }
        Ok(out)
    }
}

/// Campo que se guarda como `timestampValue` cuando es una fecha RFC 3339.
const TIMESTAMP_FIELD: &str = "timestamp";

pub fn encode_fields(doc: &Document) -> Value {
    Value::Object(doc.iter().map(|(k, v)| (k.clone(), encode_field(k, v))).collect())
}

fn encode_field(key: &str, v: &Value) -> Value {
    match v {
        Value::String(s) if key == TIMESTAMP_FIELD && DateTime::parse_from_rfc3339(s).is_ok() => {
            json!({ "timestampValue": s })
        }
        _ => encode_value(v),
    }
}

pub fn encode_value(v: &Value) -> Value {
    match v {
        Value::Null => json!({ "nullValue": null }),
        Value::Bool(b) => json!({ "booleanValue": b }),
        Value::Number(n) if n.is_i64() || n.is_u64() => json!({ "integerValue": n.to_string() }),
        Value::Number(n) => json!({ "doubleValue": n }),
        Value::String(s) => json!({ "stringValue": s }),
        Value::Array(items) => {
            json!({ "arrayValue": { "values": items.iter().map(encode_value).collect::<Vec<_>>() } })
        }
        Value::Object(map) => json!({ "mapValue": { "fields": encode_fields(map) } }),
    }
}

pub fn decode_fields(fields: &Map<String, Value>) -> Document {
    fields.iter().map(|(k, v)| (k.clone(), decode_value(v))).collect()
}

pub fn decode_value(v: &Value) -> Value {
    let Some((kind, inner)) = v.as_object().and_then(|m| m.iter().next()) else {
        return Value::Null;
    };
    match kind.as_str() {
        "booleanValue" => inner.clone(),
        "integerValue" => inner
            .as_str()
            .and_then(|s| s.parse::<i64>().ok())
            .map(|n| Value::Number(Number::from(n)))
            .unwrap_or_else(|| inner.clone()),
        "doubleValue" => inner.clone(),
        "stringValue" | "timestampValue" | "referenceValue" | "bytesValue" => inner.clone(),
        "arrayValue" => Value::Array(
            inner
                .get("values")
                .and_then(Value::as_array)
                .map(|vals| vals.iter().map(decode_value).collect())
                .unwrap_or_default(),
        ),
        "mapValue" => Value::Object(
            inner
                .get("fields")
                .and_then(Value::as_object)
                .map(decode_fields)
                .unwrap_or_default(),
        ),
        "geoPointValue" => inner.clone(),
        _ => Value::Null,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encodes_typed_values() {
        let doc = json!({
            "n": 3,
            "f": 0.5,
            "s": "x",
            "b": true,
            "z": null,
            "box": [1.5, 2],
            "m": { "k": "v" }
        });
        let enc = encode_fields(doc.as_object().unwrap());
        assert_eq!(enc["n"], json!({ "integerValue": "3" }));
        assert_eq!(enc["f"], json!({ "doubleValue": 0.5 }));
        assert_eq!(enc["s"], json!({ "stringValue": "x" }));
        assert_eq!(enc["b"], json!({ "booleanValue": true }));
        assert_eq!(enc["z"], json!({ "nullValue": null }));
        assert_eq!(
            enc["box"],
            json!({ "arrayValue": { "values": [{ "doubleValue": 1.5 }, { "integerValue": "2" }] } })
        );
        assert_eq!(enc["m"], json!({ "mapValue": { "fields": { "k": { "stringValue": "v" } } } }));
    }

    #[test]
    fn decode_reverses_encode() {
        let doc = json!({
            "title": "Tomat",
            "tags": ["a", "b"],
            "count": 7,
            "nested": { "ok": false, "score": 0.25 }
        });
        let map = doc.as_object().unwrap();
        let enc = encode_fields(map);
        assert_eq!(Value::Object(decode_fields(enc.as_object().unwrap())), doc);
    }

    #[test]
    fn decodes_timestamps_and_empty_containers() {
        let fields = json!({
            "timestamp": { "timestampValue": "2024-05-01T10:00:00Z" },
            "empty": { "arrayValue": {} },
            "m": { "mapValue": {} }
        });
        let dec = decode_fields(fields.as_object().unwrap());
        assert_eq!(dec["timestamp"], "2024-05-01T10:00:00Z");
        assert_eq!(dec["empty"], json!([]));
        assert_eq!(dec["m"], json!({}));
    }

    #[test]
    fn timestamp_field_is_stored_as_timestamp() {
        let doc = json!({
            "timestamp": "2024-05-01T10:00:00.123456+00:00",
            "publishDate": "2024-05-01T10:00:00Z",
            "m": { "timestamp": "2024-05-01T10:00:00Z" }
        });
        let enc = encode_fields(doc.as_object().unwrap());
        assert_eq!(enc["timestamp"], json!({ "timestampValue": "2024-05-01T10:00:00.123456+00:00" }));
        assert_eq!(enc["publishDate"], json!({ "stringValue": "2024-05-01T10:00:00Z" }));
        assert_eq!(
            enc["m"],
            json!({ "mapValue": { "fields": { "timestamp": { "timestampValue": "2024-05-01T10:00:00Z" } } } })
        );

        let dec = decode_fields(enc.as_object().unwrap());
        assert_eq!(dec["timestamp"], "2024-05-01T10:00:00.123456+00:00");
    }

    #[test]
    fn non_date_timestamp_stays_a_string() {
        let doc = json!({ "timestamp": "yesterday" });
        let enc = encode_fields(doc.as_object().unwrap());
        assert_eq!(enc["timestamp"], json!({ "stringValue": "yesterday" }));
    }

    #[test]
    fn document_id_is_last_path_segment() {
        let doc = FirestoreDocument {
            name: "projects/p/databases/(default)/documents/articles/abc123".into(),
            fields: Map::new(),
        };
        assert_eq!(doc.id(), "abc123");
    }
}
