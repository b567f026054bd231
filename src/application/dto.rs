use serde::{Deserialize, Serialize};

use crate::domain::{
    article::{Article, StoredArticle},
    condition::Condition,
    detection::Detection,
};

/// Resultado del pipeline de detección para una petición.
#[derive(Debug, Clone, PartialEq)]
pub struct DetectionReport {
    pub condition: Condition,
    pub remark: String,
    pub detections: Vec<Detection>,
    pub image_url: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DetectResponse {
    pub condition: Condition,
    pub remark: String,
    pub num_boxes_detected: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detections: Option<Vec<Detection>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
}

impl From<DetectionReport> for DetectResponse {
    fn from(r: DetectionReport) -> Self {
        let num_boxes_detected = r.detections.len();
        let detections = match r.condition {
            Condition::NotATomato => None,
            _ => Some(r.detections),
        };
        Self {
            condition: r.condition,
            remark: r.remark,
            num_boxes_detected,
            detections,
            image_url: r.image_url,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArticleCreatedResponse {
    pub message: String,
    pub id: String,
    pub article: Article,
}

impl From<StoredArticle> for ArticleCreatedResponse {
    fn from(s: StoredArticle) -> Self {
        Self {
            message: "Artikel berhasil diposting".to_string(),
            id: s.id,
            article: s.article,
        }
    }
}
