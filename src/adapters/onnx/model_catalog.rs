use std::path::Path;

use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::model::ModelId;

pub fn validate_model(model: &ModelId) -> DomainResult<()> {
    if model.onnx_path.trim().is_empty() {
        return Err(DomainError::InvalidInput("onnx_path empty".into()));
    }
    if !Path::new(&model.onnx_path).exists() {
        return Err(DomainError::NotFound(format!("model file not found: {}", model.onnx_path)));
    }
    Ok(())
}
