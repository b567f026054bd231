pub mod model_catalog;
pub mod rtdetr_engine;
pub mod session;
pub mod yolo_engine;

use std::sync::Arc;

use anyhow::Context;
use tracing::info;

use crate::application::ports::DetectorPort;
use crate::domain::model::{DetectorBackend, InferenceConfig};
use rtdetr_engine::OnnxRtDetrEngine;
use session::OnnxSession;
use yolo_engine::OnnxYoloEngine;

/// Carga el modelo y devuelve la variante de detector elegida en la configuración.
pub fn build_detector(cfg: &InferenceConfig) -> anyhow::Result<Arc<dyn DetectorPort>> {
    model_catalog::validate_model(&cfg.model)?;
    let session = Arc::new(
        OnnxSession::load(&cfg.model.onnx_path)
            .with_context(|| format!("loading ONNX model {}", cfg.model.onnx_path))?,
    );
    info!("🧠 Model {} loaded ({:?})", cfg.model.name, cfg.backend);

    let detector: Arc<dyn DetectorPort> = match cfg.backend {
        DetectorBackend::RtDetr => Arc::new(OnnxRtDetrEngine::new(session, cfg.params.clone())),
        DetectorBackend::YoloV8 => Arc::new(OnnxYoloEngine::new(session, cfg.params.clone())),
    };
    Ok(detector)
}
