use crate::domain::{
    detection::{Detection, RawDetection},
    labels::LabelCatalog,
};

/// Política de confianza y etiquetas aplicada a la salida cruda del modelo.
///
/// Una detección cruda se conserva si y solo si su confianza es `>= threshold`,
/// su índice de clase tiene etiqueta en el vocabulario y esa etiqueta tiene
/// color en la paleta. El resto se descarta en silencio; una clase desconocida
/// nunca es un error.
#[derive(Debug, Clone)]
pub struct DetectionFilter {
    threshold: f32,
}

impl DetectionFilter {
    pub fn new(threshold: f32) -> Self {
        Self { threshold }
    }

    pub fn threshold(&self) -> f32 {
        self.threshold
    }

    pub fn accepts(&self, raw: &RawDetection, labels: &LabelCatalog) -> bool {
        raw.confidence >= self.threshold
            && labels
                .vocabulary
                .label(raw.class_index)
                .is_some_and(|label| labels.palette.contains(label))
    }

    /// Respeta el orden de entrada de las detecciones aceptadas.
    pub fn apply(&self, raw: &[RawDetection], labels: &LabelCatalog) -> Vec<Detection> {
        raw.iter()
            .filter(|r| self.accepts(r, labels))
            .filter_map(|r| {
                let label = labels.vocabulary.label(r.class_index)?;
                Some(Detection {
                    label: label.to_string(),
                    confidence: r.confidence,
                    bbox: r.bbox,
                })
            })
            .collect()
    }
}
