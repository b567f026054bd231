use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;
use image::RgbImage;
use serde_json::{Map, Value};

use crate::domain::{detection::RawDetection, errors::DomainResult};

/// Objeto JSON tal como se guarda en una colección de documentos.
pub type Document = Map<String, Value>;

#[async_trait]
pub trait DetectorPort: Send + Sync {
    /// Ejecuta el modelo sobre una imagen decodificada. El resultado no tiene orden garantizado.
    async fn detect(&self, image: Arc<RgbImage>) -> DomainResult<Vec<RawDetection>>;
    fn name(&self) -> &str;
}

#[async_trait]
pub trait ObjectStorePort: Send + Sync {
    async fn upload(&self, key: &str, bytes: Vec<u8>, content_type: &str) -> DomainResult<()>;
    async fn make_public(&self, key: &str) -> DomainResult<()>;
    fn public_url(&self, key: &str) -> String;
}

#[async_trait]
pub trait DocumentStorePort: Send + Sync {
    /// Inserta un documento y devuelve el id asignado por el almacén.
    async fn insert(&self, collection: &str, document: Document) -> DomainResult<String>;
    async fn get(&self, collection: &str, id: &str) -> DomainResult<Option<Document>>;
    async fn list(&self, collection: &str) -> DomainResult<Vec<(String, Document)>>;
}

/// Almacenamiento local transitorio de las subidas, desde que llegan hasta que se limpian.
#[async_trait]
pub trait ScratchPort: Send + Sync {
    async fn write(&self, name: &str, bytes: &[u8]) -> DomainResult<PathBuf>;
    async fn remove(&self, name: &str) -> DomainResult<()>;
}
