use std::path::{Component, Path, PathBuf};

use async_trait::async_trait;
use tracing::debug;

use crate::application::ports::ObjectStorePort;
use crate::domain::errors::{DomainError, DomainResult};

/// Almacén de objetos en el sistema de ficheros local. La capa HTTP los sirve
/// bajo `public_base_url`, así que todos los objetos son ya públicos.
pub struct LocalObjectStore {
    root: PathBuf,
    public_base_url: String,
}

impl LocalObjectStore {
    pub fn new(root: impl Into<PathBuf>, public_base_url: impl Into<String>) -> Self {
        Self {
            root: root.into(),
            public_base_url: public_base_url.into().trim_end_matches('/').to_string(),
        }
    }

    fn path_for(&self, key: &str) -> DomainResult<PathBuf> {
        let rel = Path::new(key);
        if rel.components().any(|c| !matches!(c, Component::Normal(_))) {
            return Err(DomainError::InvalidInput(format!("invalid object key '{key}'")));
        }
        Ok(self.root.join(rel))
    }
}

#[async_trait]
impl ObjectStorePort for LocalObjectStore {
    async fn upload(&self, key: &str, bytes: Vec<u8>, _content_type: &str) -> DomainResult<()> {
        let path = self.path_for(key)?;
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| DomainError::Storage(format!("create {}: {e}", parent.display())))?;
        }
        tokio::fs::write(&path, bytes)
            .await
            .map_err(|e| DomainError::Storage(format!("write {}: {e}", path.display())))?;
        debug!(key = %key, "Object stored locally");
        Ok(())
    }

    async fn make_public(&self, _key: &str) -> DomainResult<()> {
        Ok(())
    }

    fn public_url(&self, key: &str) -> String {
        format!("{}/{}", self.public_base_url, key)
    }
}
