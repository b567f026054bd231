use std::sync::Arc;

use anyhow::Context;
use axum::extract::DefaultBodyLimit;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;

use tomato_detect::adapters::{
    fs::scratch::ScratchArea,
    http::{router, state::HttpState},
    onnx::build_detector,
    storage::{firestore::FirestoreDocumentStore, gcs::GcsObjectStore, local::LocalObjectStore, memory::InMemoryDocumentStore},
};
use tomato_detect::application::{
    annotator::Annotator,
    filter::DetectionFilter,
    font::LabelFont,
    ports::{DocumentStorePort, ObjectStorePort},
    publisher::ResultPublisher,
    services::{ArticleService, DetectionService},
};
use tomato_detect::config::{AppConfig, StorageConfig};
use tomato_detect::domain::labels::LabelCatalog;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // 1. Inicializar logs (RUST_LOG=info por defecto)
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cfg = AppConfig::from_env().context("invalid configuration")?;
    tracing::info!("🔧 Inicializando adaptadores de infraestructura...");

    // 2. Instanciar Adaptadores (Capa de Infraestructura)
    let detector = build_detector(&cfg.inference)?;
    tracing::info!("🔍 Detector activo: {}", detector.name());
    let scratch = Arc::new(ScratchArea::open(&cfg.scratch_dir).await?);

    let objects: Arc<dyn ObjectStorePort>;
    let documents: Arc<dyn DocumentStorePort>;
    let mut storage_dir = None;
    match &cfg.storage {
        StorageConfig::Local { root, public_base_url } => {
            tracing::warn!("STORAGE_BACKEND=local: los documentos solo se guardan en memoria");
            objects = Arc::new(LocalObjectStore::new(root.clone(), public_base_url.clone()));
            documents = Arc::new(InMemoryDocumentStore::new());
            storage_dir = Some(root.clone());
        }
        StorageConfig::Firebase { project_id, bucket, access_token } => {
            let client = reqwest::Client::new();
            objects = Arc::new(GcsObjectStore::new(client.clone(), bucket.clone(), access_token.clone()));
            documents = Arc::new(FirestoreDocumentStore::new(client, project_id, access_token.clone()));
        }
    }

    // 3. Instanciar Servicios (Capa de Aplicación - Casos de Uso)
    let labels = Arc::new(LabelCatalog::tomato());
    let annotator = Arc::new(Annotator::new(LabelFont::load(&cfg.font_path, cfg.font_size)));
    let publisher = ResultPublisher::new(objects.clone(), documents.clone(), cfg.detection_collection.clone());
    let detection = Arc::new(DetectionService::new(
        detector,
        scratch.clone(),
        publisher,
        annotator,
        labels,
        DetectionFilter::new(cfg.confidence_threshold),
    ));
    let articles = Arc::new(ArticleService::new(objects, documents, cfg.article_collection.clone()));

    // 4. Configurar el Router de Axum y Archivos Estáticos
    let mut app = router(HttpState { detection, articles }, scratch.root());
    if let Some(dir) = storage_dir {
        app = app.nest_service("/storage", ServeDir::new(dir));
    }
    let app = app
        .layer(DefaultBodyLimit::max(cfg.max_upload_bytes))
        .layer(TraceLayer::new_for_http());

    // 5. Lanzar el Servidor
    let addr = cfg.bind_addr();
    tracing::info!(
        "🚀 Servidor de detección iniciado en http://{} (umbral de confianza {})",
        addr,
        cfg.confidence_threshold
    );

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
