pub mod firestore;
pub mod gcs;
pub mod local;
pub mod memory;

use crate::domain::errors::{DomainError, DomainResult};

/// Convierte una respuesta no 2xx en `DomainError::Storage` con el texto del cuerpo.
pub(crate) async fn check_status(res: reqwest::Response, op: &str) -> DomainResult<reqwest::Response> {
    let status = res.status();
    if status.is_success() {
        return Ok(res);
    }
    let body = res.text().await.unwrap_or_default();
    Err(DomainError::Storage(format!("{op} failed ({status}): {body}")))
}
