use async_trait::async_trait;
use reqwest::Client;
use serde_json::json;
use tracing::debug;

use crate::adapters::storage::check_status;
use crate::application::ports::ObjectStorePort;
use crate::domain::errors::{DomainError, DomainResult};

const UPLOAD_BASE: &str = "https://storage.googleapis.com/upload/storage/v1";
const API_BASE: &str = "https://storage.googleapis.com/storage/v1";
const PUBLIC_BASE: &str = "https://storage.googleapis.com";

/// Bucket de Cloud Storage accedido mediante la API JSON (el bucket por defecto de Firebase).
pub struct GcsObjectStore {
    client: Client,
    bucket: String,
    access_token: String,
}

impl GcsObjectStore {
    pub fn new(client: Client, bucket: impl Into<String>, access_token: impl Into<String>) -> Self {
        Self { client, bucket: bucket.into(), access_token: access_token.into() }
    }

    fn object_url(&self, key: &str) -> String {
        format!("{API_BASE}/b/{}/o/{}", self.bucket, urlencoding::encode(key))
    }
}

#[async_trait]
impl ObjectStorePort for GcsObjectStore {
    async fn upload(&self, key: &str, bytes: Vec<u8>, content_type: &str) -> DomainResult<()> {
        let url = format!("{UPLOAD_BASE}/b/{}/o", self.bucket);
        let res = self
            .client
            .post(&url)
            .bearer_auth(&self.access_token)
            .query(&[("uploadType", "media"), ("name", key)])
            .header(reqwest::header::CONTENT_TYPE, content_type)
            .body(bytes)
            .send()
            .await
            .map_err(|e| DomainError::Storage(format!("upload {key}: {e}")))?;
        check_status(res, "upload").await?;
        debug!(bucket = %self.bucket, key = %key, "Object uploaded");
        Ok(())
    }

    async fn make_public(&self, key: &str) -> DomainResult<()> {
        let res = self
            .client
            .post(format!("{}/acl", self.object_url(key)))
            .bearer_auth(&self.access_token)
            .json(&json!({ "entity": "allUsers", "role": "READER" }))
            .send()
            .await
            .map_err(|e| DomainError::Storage(format!("acl {key}: {e}")))?;
        check_status(res, "make public").await?;
        Ok(())
    }

    fn public_url(&self, key: &str) -> String {
        format!("{PUBLIC_BASE}/{}/{}", self.bucket, key)
    }
}
