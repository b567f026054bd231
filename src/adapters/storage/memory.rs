use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::application::ports::{Document, DocumentStorePort};
use crate::domain::errors::DomainResult;

/// Almacén de documentos en memoria del proceso. Las colecciones mantienen el orden de inserción.
#[derive(Default)]
pub struct InMemoryDocumentStore {
    collections: RwLock<HashMap<String, Vec<(String, Document)>>>,
}

impl InMemoryDocumentStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn count(&self, collection: &str) -> usize {
        self.collections.read().await.get(collection).map_or(0, Vec::len)
    }
}

#[async_trait]
impl DocumentStorePort for InMemoryDocumentStore {
    async fn insert(&self, collection: &str, document: Document) -> DomainResult<String> {
        let id = Uuid::new_v4().simple().to_string();
        self.collections
            .write()
            .await
            .entry(collection.to_string())
            .or_default()
            .push((id.clone(), document));
        Ok(id)
    }

    async fn get(&self, collection: &str, id: &str) -> DomainResult<Option<Document>> {
        Ok(self
            .collections
            .read()
            .await
            .get(collection)
            .and_then(|docs| docs.iter().find(|(doc_id, _)| doc_id == id))
            .map(|(_, doc)| doc.clone()))
    }

    async fn list(&self, collection: &str) -> DomainResult<Vec<(String, Document)>> {
        Ok(self.collections.read().await.get(collection).cloned().unwrap_or_default())
    }
}
