use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use super::detection::Detection;
use super::labels::HEALTHY_LABEL;

pub const HEALTHY_REMARK: &str = "Tomat Anda sedang tidak dalam Kondisi terjangkit penyakit";
pub const NOT_A_TOMATO_REMARK: &str = "Aplikasi ini hanya digunakan untuk mengecek kondisi tomat";
const NOT_HEALTHY_PREFIX: &str = "Tomat Anda saat ini terdeteksi terkena penyakit";

/// Veredicto global para una imagen subida.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Condition {
    #[serde(rename = "Healthy")]
    Healthy,
    #[serde(rename = "Not Healthy")]
    NotHealthy,
    #[serde(rename = "Bukan Gambar Tomat")]
    NotATomato,
}

impl Condition {
    pub fn as_str(&self) -> &'static str {
        match self {
            Condition::Healthy => "Healthy",
            Condition::NotHealthy => "Not Healthy",
            Condition::NotATomato => "Bukan Gambar Tomat",
        }
    }
}

impl std::fmt::Display for Condition {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Obtiene el veredicto y la observación a partir de las detecciones aceptadas.
///
/// Solo depende del multiconjunto de etiquetas: las enfermedades de la
/// observación se deduplican y se listan ordenadas, así que el orden de las
/// detecciones nunca cambia el resultado.
pub fn classify(detections: &[Detection]) -> (Condition, String) {
    if detections.is_empty() {
        return (Condition::NotATomato, NOT_A_TOMATO_REMARK.to_string());
    }

    let diseases: BTreeSet<&str> = detections
        .iter()
        .map(|d| d.label.as_str())
        .filter(|label| *label != HEALTHY_LABEL)
        .collect();

    if diseases.is_empty() {
        return (Condition::Healthy, HEALTHY_REMARK.to_string());
    }

    let listed = diseases.into_iter().collect::<Vec<_>>().join(", ");
    (Condition::NotHealthy, format!("{NOT_HEALTHY_PREFIX} {listed}"))
}
