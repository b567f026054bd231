use serde::{Deserialize, Serialize};

/// Umbral del despliegue de producción.
pub const STRICT_CONFIDENCE_THRESHOLD: f32 = 0.5;
/// Umbral del despliegue alternativo.
pub const LENIENT_CONFIDENCE_THRESHOLD: f32 = 0.3;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DetectorBackend {
    /// Exportación RT-DETR: `[1, N, 4 + C]`, cajas normalizadas, sin NMS.
    RtDetr,
    /// Exportación YOLOv8: `[1, 4 + C, N]`, cajas en píxeles de entrada, requiere NMS.
    YoloV8,
}

impl std::str::FromStr for DetectorBackend {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "rtdetr" | "rt-detr" => Ok(Self::RtDetr),
            "yolov8" | "yolo" => Ok(Self::YoloV8),
            other => Err(format!("unknown detector backend '{other}' (expected rtdetr or yolov8)")),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelId {
    pub name: String,       // nombre lógico, p. ej. "rtdetr-tomato"
    pub onnx_path: String,  // ruta en disco
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DetectorParams {
    pub input_size: u32,        // normalmente 640
    pub min_score: f32,         // corte del detector, por debajo del umbral de la petición
    pub iou_threshold: f32,     // 0..1, solo YOLO
    pub max_detections: usize,  // p. ej. 300
}

impl Default for DetectorParams {
    fn default() -> Self {
        Self {
            input_size: 640,
            min_score: 0.25,
            iou_threshold: 0.45,
            max_detections: 300,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InferenceConfig {
    pub backend: DetectorBackend,
    pub model: ModelId,
    pub params: DetectorParams,
}

/// Acepta `strict`, `lenient` o un número en `[0, 1]`.
pub fn parse_confidence_threshold(raw: &str) -> Result<f32, String> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "strict" => Ok(STRICT_CONFIDENCE_THRESHOLD),
        "lenient" => Ok(LENIENT_CONFIDENCE_THRESHOLD),
        other => {
            let value: f32 = other
                .parse()
                .map_err(|_| format!("invalid confidence threshold '{raw}'"))?;
            if (0.0..=1.0).contains(&value) {
                Ok(value)
            } else {
                Err(format!("confidence threshold {value} outside [0, 1]"))
            }
        }
    }
}
