use std::sync::Arc;

use image::RgbImage;
use serde_json::Value;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::{
    application::{
        annotator::{encode_jpeg, Annotator},
        dto::DetectionReport,
        filter::DetectionFilter,
        ports::{DetectorPort, DocumentStorePort, ObjectStorePort, ScratchPort},
        publisher::ResultPublisher,
    },
    domain::{
        article::{Article, NewArticle, StoredArticle},
        condition::{classify, Condition},
        errors::{DomainError, DomainResult},
        labels::LabelCatalog,
        record::DetectionRecord,
        upload::UploadedImage,
    },
};

pub const ARTICLE_IMAGES_PREFIX: &str = "articles";

/// Orquestador del pipeline de detección:
/// subida -> detector -> filtro -> clasificación -> anotación -> publicación.
///
/// Todo el estado compartido (etiquetas, umbral, puertos) es de solo lectura.
#[derive(Clone)]
pub struct DetectionService {
    detector: Arc<dyn DetectorPort>,
    scratch: Arc<dyn ScratchPort>,
    publisher: ResultPublisher,
    annotator: Arc<Annotator>,
    labels: Arc<LabelCatalog>,
    filter: DetectionFilter,
}

impl DetectionService {
    pub fn new(
        detector: Arc<dyn DetectorPort>,
        scratch: Arc<dyn ScratchPort>,
        publisher: ResultPublisher,
        annotator: Arc<Annotator>,
        labels: Arc<LabelCatalog>,
        filter: DetectionFilter,
    ) -> Self {
        Self { detector, scratch, publisher, annotator, labels, filter }
    }

    /// Ejecuta el pipeline completo para una subida.
    ///
    /// Los ficheros temporales se nombran solo con un id por petición (más la
    /// extensión saneada), nunca con el nombre del cliente. Se borran al
    /// terminar la petición, haya ido bien o no.
    pub async fn detect(&self, upload: UploadedImage) -> DomainResult<DetectionReport> {
        let request_id = Uuid::new_v4().simple().to_string();
        let original = match upload.extension() {
            Some(ext) => format!("{request_id}.{ext}"),
            None => request_id.clone(),
        };
        let annotated = format!("detected_{request_id}.jpg");

        let outcome = self.run(&upload, &original, &annotated).await;

        for name in [&original, &annotated] {
            if let Err(e) = self.scratch.remove(name).await {
                warn!(scratch = %name, "No se pudo borrar el fichero temporal: {}", e);
            }
        }
        outcome
    }

    async fn run(&self, upload: &UploadedImage, original: &str, annotated: &str) -> DomainResult<DetectionReport> {
        self.scratch.write(original, &upload.bytes).await?;

        let image = Arc::new(decode_image(upload.bytes.clone()).await?);
        let raw = self.detector.detect(image.clone()).await?;
        let detections = self.filter.apply(&raw, &self.labels);
        debug!(raw = raw.len(), kept = detections.len(), threshold = self.filter.threshold(), "Detections filtered");

        let (condition, remark) = classify(&detections);
        info!(scratch = %original, condition = %condition, boxes = detections.len(), "🍅 Image classified");

        if condition == Condition::NotATomato {
            return Ok(DetectionReport { condition, remark, detections, image_url: None });
        }

        let annotator = self.annotator.clone();
        let labels = self.labels.clone();
        let to_draw = detections.clone();
        let jpeg = tokio::task::spawn_blocking(move || {
            encode_jpeg(&annotator.annotate(&image, &to_draw, &labels.palette))
        })
        .await
        .map_err(|e| DomainError::OperationFailed(e.to_string()))??;
        self.scratch.write(annotated, &jpeg).await?;

        let record = self
            .publisher
            .publish(jpeg, DetectionRecord::draft(condition, remark, detections))
            .await?;

        info!(
            scratch = %original,
            record = record.id.as_deref().unwrap_or_default(),
            "✅ Detección completada"
        );
        Ok(DetectionReport {
            condition: record.condition,
            remark: record.remark,
            detections: record.detections,
            image_url: record.image_url,
        })
    }
}

async fn decode_image(bytes: Vec<u8>) -> DomainResult<RgbImage> {
    tokio::task::spawn_blocking(move || {
        image::load_from_memory(&bytes)
            .map(|img| img.to_rgb8())
            .map_err(|e| DomainError::Decode(e.to_string()))
    })
    .await
    .map_err(|e| DomainError::OperationFailed(e.to_string()))?
}

/// Servicio de artículos: CRUD sencillo sobre el almacén de documentos.
#[derive(Clone)]
pub struct ArticleService {
    objects: Arc<dyn ObjectStorePort>,
    documents: Arc<dyn DocumentStorePort>,
    collection: String,
}

impl ArticleService {
    pub fn new(
        objects: Arc<dyn ObjectStorePort>,
        documents: Arc<dyn DocumentStorePort>,
        collection: impl Into<String>,
    ) -> Self {
        Self { objects, documents, collection: collection.into() }
    }

    /// `data` es el JSON tal cual llega en el campo `data` del formulario.
    pub async fn create(&self, image: UploadedImage, data: &str) -> DomainResult<StoredArticle> {
        let new: NewArticle = serde_json::from_str(data)
            .map_err(|e| DomainError::InvalidInput(format!("Data artikel tidak valid: {e}")))?;

        let key = format!("{ARTICLE_IMAGES_PREFIX}/{}_{}", Uuid::new_v4(), image.safe_file_name());
        let content_type = image.content_type_or_default().to_string();
        self.objects.upload(&key, image.bytes, &content_type).await?;
        self.objects.make_public(&key).await?;

        let article = Article::from_new(new.dedup_tags(), self.objects.public_url(&key));
        let document = match serde_json::to_value(&article) {
            Ok(Value::Object(map)) => map,
            _ => return Err(DomainError::OperationFailed("article is not a JSON object".into())),
        };
        let id = self.documents.insert(&self.collection, document).await?;
        info!(id = %id, key = %key, "📝 Article created");

        Ok(StoredArticle { id, article })
    }

    pub async fn list(&self) -> DomainResult<Vec<StoredArticle>> {
        self.documents
            .list(&self.collection)
            .await?
            .into_iter()
            .map(|(id, doc)| to_article(id, doc))
            .collect()
    }

    pub async fn get(&self, id: &str) -> DomainResult<StoredArticle> {
        match self.documents.get(&self.collection, id).await? {
            Some(doc) => to_article(id.to_string(), doc),
            None => Err(DomainError::NotFound("Artikel tidak ditemukan".into())),
        }
    }
}

fn to_article(id: String, doc: crate::application::ports::Document) -> DomainResult<StoredArticle> {
    let article: Article = serde_json::from_value(Value::Object(doc))
        .map_err(|e| DomainError::OperationFailed(format!("malformed article {id}: {e}")))?;
    Ok(StoredArticle { id, article })
}
