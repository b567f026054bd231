use std::path::PathBuf;
use std::str::FromStr;

use anyhow::{anyhow, bail, Context, Result};

use crate::domain::model::{
    parse_confidence_threshold, DetectorBackend, DetectorParams, InferenceConfig, ModelId,
    STRICT_CONFIDENCE_THRESHOLD,
};

/// Configuración del proceso. Se construye una vez al arrancar y se pasa a las
/// factorías de adaptadores y a los servicios.
///
/// | Variable               | Valor por defecto                |
/// |------------------------|----------------------------------|
/// | `HOST`                 | `0.0.0.0`                        |
/// | `PORT`                 | `8080`                           |
/// | `MAX_UPLOAD_BYTES`     | `20971520`                       |
/// | `SCRATCH_DIR`          | `uploads`                        |
/// | `DETECTOR_BACKEND`     | `rtdetr`                         |
/// | `MODEL_PATH`           | `models/best.onnx`               |
/// | `MODEL_INPUT_SIZE`     | `640`                            |
/// | `DETECTOR_MIN_SCORE`   | `0.25`                           |
/// | `IOU_THRESHOLD`        | `0.45`                           |
/// | `MAX_DETECTIONS`       | `300`                            |
/// | `CONFIDENCE_THRESHOLD` | `strict` (0.5; `lenient` = 0.3)  |
/// | `LABEL_FONT_PATH`      | `arial.ttf`                      |
/// | `LABEL_FONT_SIZE`      | `16`                             |
/// | `STORAGE_BACKEND`      | `local`                          |
/// | `LOCAL_STORAGE_DIR`    | `storage`                        |
/// | `PUBLIC_BASE_URL`      | `http://localhost:{PORT}/storage`|
/// | `FIREBASE_PROJECT_ID`  | obligatoria con `firebase`       |
/// | `FIREBASE_BUCKET`      | obligatoria con `firebase`       |
/// | `GOOGLE_ACCESS_TOKEN`  | obligatoria con `firebase`       |
/// | `DETECTION_COLLECTION` | `tomato_detections`              |
/// | `ARTICLE_COLLECTION`   | `articles`                       |
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    pub max_upload_bytes: usize,
    pub scratch_dir: PathBuf,
    pub inference: InferenceConfig,
    pub confidence_threshold: f32,
    pub font_path: PathBuf,
    pub font_size: f32,
    pub storage: StorageConfig,
    pub detection_collection: String,
    pub article_collection: String,
}

#[derive(Debug, Clone)]
pub enum StorageConfig {
    /// Imágenes en un directorio local servido en `/storage`; documentos en memoria.
    Local { root: PathBuf, public_base_url: String },
    /// Bucket de Cloud Storage y base de datos Firestore de un proyecto Firebase.
    Firebase { project_id: String, bucket: String, access_token: String },
}

impl AppConfig {
    /// Carga `.env` (si existe) y lee el entorno.
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();

        let port: u16 = env_or("PORT", 8080)?;
        let defaults = DetectorParams::default();

        let backend = std::env::var("DETECTOR_BACKEND")
            .unwrap_or_else(|_| "rtdetr".into())
            .parse::<DetectorBackend>()
            .map_err(|e| anyhow!(e))?;
        let onnx_path = std::env::var("MODEL_PATH").unwrap_or_else(|_| "models/best.onnx".into());
        let inference = InferenceConfig {
            backend,
            model: ModelId { name: model_name(&onnx_path), onnx_path },
            params: DetectorParams {
                input_size: env_or("MODEL_INPUT_SIZE", defaults.input_size)?,
                min_score: env_or("DETECTOR_MIN_SCORE", defaults.min_score)?,
                iou_threshold: env_or("IOU_THRESHOLD", defaults.iou_threshold)?,
                max_detections: env_or("MAX_DETECTIONS", defaults.max_detections)?,
            },
        };

        let confidence_threshold = match std::env::var("CONFIDENCE_THRESHOLD") {
            Ok(raw) => parse_confidence_threshold(&raw).map_err(|e| anyhow!(e))?,
            Err(_) => STRICT_CONFIDENCE_THRESHOLD,
        };

        let storage = match std::env::var("STORAGE_BACKEND").unwrap_or_else(|_| "local".into()).as_str() {
            "local" => StorageConfig::Local {
                root: env_or("LOCAL_STORAGE_DIR", PathBuf::from("storage"))?,
                public_base_url: std::env::var("PUBLIC_BASE_URL")
                    .unwrap_or_else(|_| format!("http://localhost:{port}/storage")),
            },
            "firebase" => StorageConfig::Firebase {
                project_id: required("FIREBASE_PROJECT_ID")?,
                bucket: required("FIREBASE_BUCKET")?,
                access_token: required("GOOGLE_ACCESS_TOKEN")?,
            },
            other => bail!("STORAGE_BACKEND must be 'local' or 'firebase', got '{other}'"),
        };

        Ok(Self {
            host: std::env::var("HOST").unwrap_or_else(|_| "0.0.0.0".into()),
            port,
            max_upload_bytes: env_or("MAX_UPLOAD_BYTES", 20 * 1024 * 1024)?,
            scratch_dir: env_or("SCRATCH_DIR", PathBuf::from("uploads"))?,
            inference,
            confidence_threshold,
            font_path: env_or("LABEL_FONT_PATH", PathBuf::from("arial.ttf"))?,
            font_size: env_or("LABEL_FONT_SIZE", 16.0)?,
            storage,
            detection_collection: std::env::var("DETECTION_COLLECTION")
                .unwrap_or_else(|_| "tomato_detections".into()),
            article_collection: std::env::var("ARTICLE_COLLECTION").unwrap_or_else(|_| "articles".into()),
        })
    }

    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

fn env_or<T>(key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match std::env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse()
            .map_err(|e| anyhow!("{e}"))
            .with_context(|| format!("{key} has an invalid value '{raw}'")),
        Err(_) => Ok(default),
    }
}

fn required(key: &str) -> Result<String> {
    std::env::var(key).with_context(|| format!("{key} must be set when STORAGE_BACKEND=firebase"))
}

fn model_name(onnx_path: &str) -> String {
    std::path::Path::new(onnx_path)
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "detector".into())
}
