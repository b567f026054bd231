use std::sync::Arc;

use anyhow::{bail, Result};
use async_trait::async_trait;
use image::RgbImage;
use ndarray::{ArrayViewD, Axis, Ix2, IxDyn};

use crate::adapters::onnx::session::{best_class, finalize, OnnxSession};
use crate::application::ports::DetectorPort;
use crate::domain::detection::{BoundingBox, RawDetection};
use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::model::DetectorParams;

/// Detector RT-DETR: salida `[1, N, 4 + C]`, cajas como `cx, cy, w, h` normalizadas.
/// Cada consulta corresponde ya a un objeto, así que no hay paso de NMS.
pub struct OnnxRtDetrEngine {
    session: Arc<OnnxSession>,
    params: DetectorParams,
}

impl OnnxRtDetrEngine {
    pub fn new(session: Arc<OnnxSession>, params: DetectorParams) -> Self {
        Self { session, params }
    }
}

#[async_trait]
impl DetectorPort for OnnxRtDetrEngine {
    async fn detect(&self, image: Arc<RgbImage>) -> DomainResult<Vec<RawDetection>> {
        let session = self.session.clone();
        let params = self.params.clone();
        tokio::task::spawn_blocking(move || -> Result<Vec<RawDetection>> {
            let out = session.run(&image, params.input_size)?;
            let candidates = decode(&out.dims, &out.data, &params, image.width(), image.height())?;
            Ok(finalize(candidates, image.width(), image.height(), params.max_detections))
        })
        .await
        .map_err(|e| DomainError::OperationFailed(e.to_string()))?
        .map_err(|e| DomainError::Inference(e.to_string()))
    }

    fn name(&self) -> &str {
        "rtdetr"
    }
}

pub fn decode(dims: &[usize], data: &[f32], params: &DetectorParams, width: u32, height: u32) -> Result<Vec<RawDetection>> {
    if dims.len() != 3 || dims[2] <= 4 {
        bail!("unexpected RT-DETR output shape {dims:?}");
    }
    let array_view = ArrayViewD::from_shape(IxDyn(dims), data)?;
    let view = array_view.index_axis(Axis(0), 0).into_dimensionality::<Ix2>()?;
    let (w_img, h_img) = (width as f32, height as f32);

    let mut detections = Vec::new();
    for query in view.outer_iter() {
        let Some((class_index, score)) = best_class(query.iter().skip(4).copied()) else {
            continue;
        };
        if score < params.min_score {
            continue;
        }
        detections.push(RawDetection {
            class_index,
            confidence: score,
            bbox: BoundingBox::from_center(
                query[0] * w_img,
                query[1] * h_img,
                query[2] * w_img,
                query[3] * h_img,
            ),
        });
    }
    Ok(detections)
}
