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

/// Detector YOLOv8: salida `[1, 4 + C, N]`, cajas como `cx, cy, w, h` en píxeles de entrada.
pub struct OnnxYoloEngine {
    session: Arc<OnnxSession>,
    params: DetectorParams,
}

impl OnnxYoloEngine {
    pub fn new(session: Arc<OnnxSession>, params: DetectorParams) -> Self {
        Self { session, params }
    }
}

#[async_trait]
impl DetectorPort for OnnxYoloEngine {
    async fn detect(&self, image: Arc<RgbImage>) -> DomainResult<Vec<RawDetection>> {
        let session = self.session.clone();
        let params = self.params.clone();
        tokio::task::spawn_blocking(move || -> Result<Vec<RawDetection>> {
            let out = session.run(&image, params.input_size)?;
            let sx = image.width() as f32 / params.input_size as f32;
            let sy = image.height() as f32 / params.input_size as f32;
            let candidates = decode(&out.dims, &out.data, &params, sx, sy)?;
            let kept = non_max_suppression(candidates, params.iou_threshold);
            Ok(finalize(kept, image.width(), image.height(), params.max_detections))
        })
        .await
        .map_err(|e| DomainError::OperationFailed(e.to_string()))?
        .map_err(|e| DomainError::Inference(e.to_string()))
    }

    fn name(&self) -> &str {
        "yolov8"
    }
}

pub fn decode(dims: &[usize], data: &[f32], params: &DetectorParams, sx: f32, sy: f32) -> Result<Vec<RawDetection>> {
    if dims.len() != 3 || dims[1] <= 4 {
        bail!("unexpected YOLOv8 output shape {dims:?}");
    }
    let array_view = ArrayViewD::from_shape(IxDyn(dims), data)?;
    let view = array_view.index_axis(Axis(0), 0).into_dimensionality::<Ix2>()?;
    let num_candidates = view.shape()[1];

    let mut detections = Vec::new();
    for i in 0..num_candidates {
        let column = view.index_axis(Axis(1), i);
        let Some((class_index, score)) = best_class(column.iter().skip(4).copied()) else {
            continue;
        };
        if score < params.min_score {
            continue;
        }
        let (cx, cy, w, h) = (column[0], column[1], column[2], column[3]);
        detections.push(RawDetection {
            class_index,
            confidence: score,
            bbox: BoundingBox::from_center(cx * sx, cy * sy, w * sx, h * sy),
        });
    }
    Ok(detections)
}

/// NMS voraz por clase.
pub fn non_max_suppression(mut candidates: Vec<RawDetection>, iou_threshold: f32) -> Vec<RawDetection> {
    candidates.sort_unstable_by(|a, b| b.confidence.total_cmp(&a.confidence));
    let mut kept: Vec<RawDetection> = Vec::with_capacity(candidates.len());
    for c in candidates {
        let suppressed = kept
            .iter()
            .any(|k| k.class_index == c.class_index && k.bbox.iou(&c.bbox) > iou_threshold);
        if !suppressed {
            kept.push(c);
        }
    }
    kept
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params() -> DetectorParams {
        DetectorParams { min_score: 0.25, ..DetectorParams::default() }
    }

    #[test]
    fn decodes_channel_major_output() {
        // 2 clases, 3 candidatas -> forma [1, 6, 3]
        #[rustfmt::skip]
        let data = vec![
            100.0, 200.0, 10.0,   // cx
            100.0, 200.0, 10.0,   // cy
             20.0,  40.0,  4.0,   // w
             20.0,  40.0,  4.0,   // h
              0.9,   0.1,  0.1,   // clase 0
              0.05,  0.8,  0.2,   // clase 1
        ];
        let dets = decode(&[1, 6, 3], &data, &params(), 2.0, 1.0).unwrap();
        assert_eq!(dets.len(), 2);
        assert_eq!(dets[0].class_index, 0);
        assert_eq!(dets[0].bbox, BoundingBox::from_corners(180.0, 90.0, 220.0, 110.0));
        assert_eq!(dets[1].class_index, 1);
        assert!((dets[1].confidence - 0.8).abs() < 1e-6);
    }

    #[test]
    fn rejects_bad_shape() {
        assert!(decode(&[1, 4, 3], &[0.0; 12], &params(), 1.0, 1.0).is_err());
    }

    #[test]
    fn nms_suppresses_same_class_overlaps_only() {
        let raw = |class_index, confidence, x0: f32| RawDetection {
            class_index,
            confidence,
            bbox: BoundingBox::from_corners(x0, 0.0, x0 + 10.0, 10.0),
        };
        let kept = non_max_suppression(
            vec![raw(0, 0.6, 1.0), raw(0, 0.9, 0.0), raw(1, 0.7, 0.0), raw(0, 0.5, 50.0)],
            0.45,
        );
        let summary: Vec<(usize, f32)> = kept.iter().map(|d| (d.class_index, d.confidence)).collect();
        assert_eq!(summary, vec![(0, 0.9), (1, 0.7), (0, 0.5)]);
    }
}
