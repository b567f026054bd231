use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tracing::debug;

use crate::application::ports::ScratchPort;
use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::upload::secure_file_name;

/// Directorio temporal para subidas y copias anotadas. Se sirve en solo lectura bajo `/image`.
pub struct ScratchArea {
    root: PathBuf,
}

impl ScratchArea {
    pub async fn open(root: impl Into<PathBuf>) -> DomainResult<Self> {
        let root = root.into();
        tokio::fs::create_dir_all(&root)
            .await
            .map_err(|e| DomainError::Storage(format!("create scratch dir {}: {e}", root.display())))?;
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn path_for(&self, name: &str) -> PathBuf {
        self.root.join(secure_file_name(name))
    }
}

#[async_trait]
impl ScratchPort for ScratchArea {
    async fn write(&self, name: &str, bytes: &[u8]) -> DomainResult<PathBuf> {
        let path = self.path_for(name);
        tokio::fs::write(&path, bytes)
            .await
            .map_err(|e| DomainError::Storage(format!("write {}: {e}", path.display())))?;
        debug!(path = %path.display(), "Scratch file written");
        Ok(path)
    }

    /// Borrar un fichero que nunca se escribió no es un error.
    async fn remove(&self, name: &str) -> DomainResult<()> {
        let path = self.path_for(name);
        match tokio::fs::remove_file(&path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(DomainError::Storage(format!("remove {}: {e}", path.display()))),
        }
    }
}
