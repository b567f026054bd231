use std::sync::Arc;

use serde_json::Value;
use tracing::{info, warn};
use uuid::Uuid;

use crate::application::ports::{DocumentStorePort, ObjectStorePort};
use crate::domain::{
    condition::Condition,
    errors::{DomainError, DomainResult},
    record::DetectionRecord,
};

pub const DETECTED_IMAGES_PREFIX: &str = "detected_images";

/// Sube la imagen anotada y guarda el registro de la detección.
///
/// La subida y la inserción son llamadas independientes, sin transacción:
/// si la inserción falla después de subir la imagen, la imagen se queda en
/// el almacén y el error se devuelve tal cual.
#[derive(Clone)]
pub struct ResultPublisher {
    objects: Arc<dyn ObjectStorePort>,
    documents: Arc<dyn DocumentStorePort>,
    collection: String,
}

impl ResultPublisher {
    pub fn new(
        objects: Arc<dyn ObjectStorePort>,
        documents: Arc<dyn DocumentStorePort>,
        collection: impl Into<String>,
    ) -> Self {
        Self { objects, documents, collection: collection.into() }
    }

    pub async fn publish(&self, jpeg: Vec<u8>, draft: DetectionRecord) -> DomainResult<DetectionRecord> {
        if draft.condition == Condition::NotATomato {
            return Err(DomainError::InvalidInput(
                "records without detections are never published".into(),
            ));
        }

        let key = format!("{DETECTED_IMAGES_PREFIX}/{}.jpg", Uuid::new_v4());
        self.objects.upload(&key, jpeg, "image/jpeg").await?;
        self.objects.make_public(&key).await?;
        let image_url = self.objects.public_url(&key);

        let mut record = DetectionRecord { image_url: Some(image_url), ..draft };
        let document = match serde_json::to_value(&record) {
            Ok(Value::Object(map)) => map,
            Ok(_) => return Err(DomainError::OperationFailed("record is not a JSON object".into())),
            Err(e) => return Err(DomainError::OperationFailed(e.to_string())),
        };

        let id = self.documents.insert(&self.collection, document).await.inspect_err(|e| {
            warn!(key = %key, "Record insert failed after image upload: {}", e);
        })?;
        info!(id = %id, key = %key, boxes = record.num_boxes_detected, "📦 Detection published");

        record.id = Some(id);
        Ok(record)
    }
}
