use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::condition::Condition;
use super::detection::Detection;

/// Resultado persistido de una petición de detección con al menos una caja aceptada.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DetectionRecord {
    /// Id asignado por el almacén; no forma parte del documento guardado.
    #[serde(skip)]
    pub id: Option<String>,
    pub timestamp: DateTime<Utc>,
    #[serde(rename = "Kondisi Tomat")]
    pub condition: Condition,
    #[serde(rename = "Keterangan")]
    pub remark: String,
    pub num_boxes_detected: usize,
    pub detections: Vec<Detection>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
}

impl DetectionRecord {
    /// Registro aún sin publicar: sin URL de imagen ni id de documento.
    pub fn draft(condition: Condition, remark: String, detections: Vec<Detection>) -> Self {
        Self {
            id: None,
            timestamp: Utc::now(),
            condition,
            remark,
            num_boxes_detected: detections.len(),
            detections,
            image_url: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::detection::BoundingBox;

    #[test]
    fn stored_shape_uses_localized_keys() {
        let mut record = DetectionRecord::draft(
            Condition::NotHealthy,
            "remark".into(),
            vec![Detection {
                label: "cracking".into(),
                confidence: 0.75,
                bbox: BoundingBox::from_corners(1.0, 2.0, 3.0, 4.0),
            }],
        );
        record.image_url = Some("http://x/detected_images/a.jpg".into());
        record.id = Some("abc".into());

        let doc = serde_json::to_value(&record).unwrap();
        assert_eq!(doc["Kondisi Tomat"], "Not Healthy");
        assert_eq!(doc["Keterangan"], "remark");
        assert_eq!(doc["num_boxes_detected"], 1);
        assert_eq!(doc["detections"][0]["disease"], "cracking");
        assert_eq!(doc["detections"][0]["box"], serde_json::json!([1.0, 2.0, 3.0, 4.0]));
        assert_eq!(doc["image_url"], "http://x/detected_images/a.jpg");
        assert!(doc.get("id").is_none());
        assert!(doc["timestamp"].is_string());
    }
}
