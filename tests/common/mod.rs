#![allow(dead_code)]

use std::collections::HashMap;
use std::io::Cursor;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{header::CONTENT_TYPE, Method, Request, Response};
use axum::Router;
use http_body_util::BodyExt;
use image::{ImageFormat, RgbImage};
use tokio::sync::RwLock;
use tower::ServiceExt;

use tomato_detect::adapters::fs::scratch::ScratchArea;
use tomato_detect::adapters::http::{router, state::HttpState};
use tomato_detect::adapters::storage::memory::InMemoryDocumentStore;
use tomato_detect::application::annotator::Annotator;
use tomato_detect::application::filter::DetectionFilter;
use tomato_detect::application::font::LabelFont;
use tomato_detect::application::ports::{Document, DetectorPort, DocumentStorePort, ObjectStorePort};
use tomato_detect::application::publisher::ResultPublisher;
use tomato_detect::application::services::{ArticleService, DetectionService};
use tomato_detect::domain::detection::{BoundingBox, RawDetection};
use tomato_detect::domain::errors::{DomainError, DomainResult};
use tomato_detect::domain::labels::LabelCatalog;

pub const DETECTIONS: &str = "tomato_detections";
pub const ARTICLES: &str = "articles";
pub const PUBLIC_BASE: &str = "https://storage.test";
const BOUNDARY: &str = "X-TOMATO-BOUNDARY";

// ---------------------------------------------------------------------------
// Dobles de prueba
// ---------------------------------------------------------------------------

/// Detector que devuelve siempre las mismas detecciones.
pub struct StubDetector {
    output: Vec<RawDetection>,
    pub calls: AtomicUsize,
}

impl StubDetector {
    pub fn new(output: Vec<RawDetection>) -> Self {
        Self { output, calls: AtomicUsize::new(0) }
    }
}

#[async_trait]
impl DetectorPort for StubDetector {
    async fn detect(&self, _image: Arc<RgbImage>) -> DomainResult<Vec<RawDetection>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.output.clone())
    }

    fn name(&self) -> &str {
        "stub"
    }
}

#[derive(Debug, Clone)]
pub struct StoredObject {
    pub bytes: Vec<u8>,
    pub content_type: String,
    pub public: bool,
}

#[derive(Default)]
pub struct MemoryObjectStore {
    pub objects: RwLock<HashMap<String, StoredObject>>,
}

#[async_trait]
impl ObjectStorePort for MemoryObjectStore {
    async fn upload(&self, key: &str, bytes: Vec<u8>, content_type: &str) -> DomainResult<()> {
        self.objects.write().await.insert(
            key.to_string(),
            StoredObject { bytes, content_type: content_type.to_string(), public: false },
        );
        Ok(())
    }

    async fn make_public(&self, key: &str) -> DomainResult<()> {
        match self.objects.write().await.get_mut(key) {
            Some(obj) => {
                obj.public = true;
                Ok(())
            }
            None => Err(DomainError::Storage(format!("no such object {key}"))),
        }
    }

    fn public_url(&self, key: &str) -> String {
        format!("{PUBLIC_BASE}/{key}")
    }
}

/// Almacén de documentos en el que toda operación falla.
pub struct FailingDocumentStore;

#[async_trait]
impl DocumentStorePort for FailingDocumentStore {
    async fn insert(&self, _collection: &str, _document: Document) -> DomainResult<String> {
        Err(DomainError::Storage("document store unavailable".into()))
    }

    async fn get(&self, _collection: &str, _id: &str) -> DomainResult<Option<Document>> {
        Err(DomainError::Storage("document store unavailable".into()))
    }

    async fn list(&self, _collection: &str) -> DomainResult<Vec<(String, Document)>> {
        Err(DomainError::Storage("document store unavailable".into()))
    }
}

// ---------------------------------------------------------------------------
// Construcción de la app
// ---------------------------------------------------------------------------

pub struct TestApp {
    pub router: Router,
    pub detector: Arc<StubDetector>,
    pub objects: Arc<MemoryObjectStore>,
    pub documents: Arc<InMemoryDocumentStore>,
    pub scratch_dir: tempfile::TempDir,
}

impl TestApp {
    pub async fn new(output: Vec<RawDetection>, threshold: f32) -> Self {
        let documents = Arc::new(InMemoryDocumentStore::new());
        Self::with_documents(output, threshold, documents.clone(), documents).await
    }

    /// `store` respalda los servicios; `documents` es lo que inspecciona el test.
    pub async fn with_documents(
        output: Vec<RawDetection>,
        threshold: f32,
        store: Arc<dyn DocumentStorePort>,
        documents: Arc<InMemoryDocumentStore>,
    ) -> Self {
        let scratch_dir = tempfile::tempdir().unwrap();
        let scratch = Arc::new(ScratchArea::open(scratch_dir.path()).await.unwrap());
        let detector = Arc::new(StubDetector::new(output));
        let objects = Arc::new(MemoryObjectStore::default());

        let publisher = ResultPublisher::new(objects.clone(), store.clone(), DETECTIONS);
        let detection = DetectionService::new(
            detector.clone(),
            scratch,
            publisher,
            Arc::new(Annotator::new(LabelFont::builtin(16.0))),
            Arc::new(LabelCatalog::tomato()),
            DetectionFilter::new(threshold),
        );
        let articles = ArticleService::new(objects.clone(), store, ARTICLES);

        let router = router(
            HttpState { detection: Arc::new(detection), articles: Arc::new(articles) },
            scratch_dir.path(),
        );
        Self { router, detector, objects, documents, scratch_dir }
    }

    pub async fn send(&self, req: Request<Body>) -> Response<Body> {
        self.router.clone().oneshot(req).await.unwrap()
    }

    pub fn scratch_files(&self) -> Vec<String> {
        std::fs::read_dir(self.scratch_dir.path())
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .collect()
    }
}

// ---------------------------------------------------------------------------
// Utilidades de petición / respuesta
// ---------------------------------------------------------------------------

pub fn raw(class_index: usize, confidence: f32, bbox: [f32; 4]) -> RawDetection {
    RawDetection { class_index, confidence, bbox: BoundingBox::from(bbox) }
}

/// PNG pequeño que el servicio puede decodificar.
pub fn png_bytes(width: u32, height: u32) -> Vec<u8> {
    let img = RgbImage::from_pixel(width, height, image::Rgb([180, 40, 30]));
    let mut buf = Cursor::new(Vec::new());
    img.write_to(&mut buf, ImageFormat::Png).unwrap();
    buf.into_inner()
}

pub enum Part<'a> {
    File { name: &'a str, filename: &'a str, content_type: &'a str, bytes: &'a [u8] },
    Text { name: &'a str, value: &'a str },
}

pub fn multipart_request(uri: &str, parts: &[Part<'_>]) -> Request<Body> {
    let mut body = Vec::new();
    for part in parts {
        body.extend_from_slice(format!("--{BOUNDARY}\r\n").as_bytes());
        match part {
            Part::File { name, filename, content_type, bytes } => {
                body.extend_from_slice(
                    format!(
                        "Content-Disposition: form-data; name=\"{name}\"; filename=\"{filename}\"\r\nContent-Type: {content_type}\r\n\r\n"
                    )
                    .as_bytes(),
                );
                body.extend_from_slice(bytes);
            }
            Part::Text { name, value } => {
                body.extend_from_slice(
                    format!("Content-Disposition: form-data; name=\"{name}\"\r\n\r\n{value}").as_bytes(),
                );
            }
        }
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());

    Request::builder()
        .method(Method::POST)
        .uri(uri)
        .header(CONTENT_TYPE, format!("multipart/form-data; boundary={BOUNDARY}"))
        .body(Body::from(body))
        .unwrap()
}

pub fn image_part<'a>(filename: &'a str, bytes: &'a [u8]) -> Part<'a> {
    Part::File { name: "image", filename, content_type: "image/png", bytes }
}

pub fn get(uri: &str) -> Request<Body> {
    Request::builder().method(Method::GET).uri(uri).body(Body::empty()).unwrap()
}

pub async fn body_json(response: Response<Body>) -> serde_json::Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}
