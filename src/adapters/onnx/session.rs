use std::fs;
use std::sync::Mutex;

use anyhow::{anyhow, Result};
use image::{imageops::FilterType, RgbImage};
use ndarray::Array4;
use ort::execution_providers::CUDAExecutionProvider;
use ort::session::Session;
use ort::value::Value;

use crate::domain::detection::RawDetection;

/// Sesión ONNX compartida por las dos variantes de detector.
///
/// `Session::run` requiere acceso exclusivo, así que las inferencias se serializan.
pub struct OnnxSession {
    session: Mutex<Session>,
}

/// Salida cruda del modelo: dimensiones y datos (por filas) del primer tensor de salida.
pub struct ModelOutput {
    pub dims: Vec<usize>,
    pub data: Vec<f32>,
}

impl OnnxSession {
    pub fn load(path: &str) -> Result<Self> {
        let mut builder = Session::builder()?.with_intra_threads(4)?;

        // CUDA es opcional: si está disponible se registra, si no continuamos en CPU.
        let cuda = CUDAExecutionProvider::default().build();
        if let Ok(builder_with_cuda) = builder.clone().with_execution_providers([cuda]) {
            builder = builder_with_cuda;
        }

        let model_bytes = fs::read(path)?;
        let session = builder.commit_from_memory(&model_bytes)?;

        Ok(Self { session: Mutex::new(session) })
    }

    /// Redimensiona a `imgsz x imgsz`, escala a [0, 1] en orden NCHW y ejecuta el modelo.
    pub fn run(&self, rgb: &RgbImage, imgsz: u32) -> Result<ModelOutput> {
        let input = to_input_tensor(rgb, imgsz);
        let size = imgsz as usize;
        let input_shape = vec![1, 3, size as i64, size as i64];
        let (data, _) = input.into_raw_vec_and_offset();
        let input_tensor = Value::from_array((input_shape, data))?;

        let mut session = self.session.lock().map_err(|_| anyhow!("ONNX session lock poisoned"))?;
        let outputs = session.run(ort::inputs![input_tensor])?;
        let (shape_out, data_out) = outputs[0].try_extract_tensor::<f32>()?;

        Ok(ModelOutput {
            dims: shape_out.iter().map(|&x| x as usize).collect(),
            data: data_out.to_vec(),
        })
    }
}

fn to_input_tensor(rgb: &RgbImage, imgsz: u32) -> Array4<f32> {
    let size = imgsz as usize;
    let resized = image::imageops::resize(rgb, imgsz, imgsz, FilterType::Triangle);

    let mut input = Array4::<f32>::zeros((1, 3, size, size));
    for (x, y, pixel) in resized.enumerate_pixels() {
        input[[0, 0, y as usize, x as usize]] = pixel[0] as f32 / 255.0;
        input[[0, 1, y as usize, x as usize]] = pixel[1] as f32 / 255.0;
        input[[0, 2, y as usize, x as usize]] = pixel[2] as f32 / 255.0;
    }
    input
}

/// Ajusta las cajas a la imagen, ordena por confianza (mayor primero) y limita el número.
pub fn finalize(mut detections: Vec<RawDetection>, width: u32, height: u32, max: usize) -> Vec<RawDetection> {
    for d in &mut detections {
        d.bbox = d.bbox.clamp_to(width, height);
    }
    detections.sort_unstable_by(|a, b| b.confidence.total_cmp(&a.confidence));
    detections.truncate(max);
    detections
}

/// Índice y valor de la puntuación más alta de `scores`.
pub fn best_class(scores: impl Iterator<Item = f32>) -> Option<(usize, f32)> {
    scores.enumerate().max_by(|(_, a), (_, b)| a.total_cmp(b))
}
