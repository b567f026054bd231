use std::sync::Arc;
use crate::application::services::{ArticleService, DetectionService};

/// Estado compartido para los manejadores HTTP de Axum.
/// Siguiendo la Arquitectura Hexagonal, el estado contiene los servicios (Casos de Uso).
#[derive(Clone)]
pub struct HttpState {
    /// Pipeline de detección: subida, inferencia, anotación y publicación.
    pub detection: Arc<DetectionService>,
    /// CRUD de artículos sobre el almacén de documentos.
    pub articles: Arc<ArticleService>,
}
