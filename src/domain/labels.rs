use std::collections::HashMap;

pub const HEALTHY_LABEL: &str = "Healthy";

/// Índice de clase del modelo -> etiqueta, en el orden con el que se entrenó el detector.
pub const TOMATO_LABELS: [&str; 7] = [
    "Healthy",
    "Rotten-Tomato",
    "bacterial-Spot",
    "blossomendrotrotation",
    "cracking",
    "spliting",
    "sunscaled",
];

const TOMATO_COLORS: [(&str, [u8; 3]); 7] = [
    ("bacterial-Spot", [14, 122, 254]),
    ("Healthy", [199, 252, 0]),
    ("Rotten-Tomato", [0, 183, 235]),
    ("blossomendrotrotation", [134, 34, 255]),
    ("cracking", [254, 0, 86]),
    ("spliting", [0, 255, 206]),
    ("sunscaled", [255, 128, 0]),
];

#[derive(Debug, Clone, PartialEq)]
pub struct LabelVocabulary {
    labels: Vec<String>,
}

impl LabelVocabulary {
    pub fn new<I, S>(labels: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self { labels: labels.into_iter().map(Into::into).collect() }
    }

    pub fn tomato() -> Self {
        Self::new(TOMATO_LABELS)
    }

    /// Un índice fuera de rango devuelve `None`; no es un error.
    pub fn label(&self, class_index: usize) -> Option<&str> {
        self.labels.get(class_index).map(String::as_str)
    }
}

/// Etiqueta -> color RGB de dibujo. Hace también de segundo filtro:
/// una etiqueta del vocabulario sin color nunca se reporta.
#[derive(Debug, Clone, PartialEq)]
pub struct LabelPalette {
    colors: HashMap<String, [u8; 3]>,
}

impl LabelPalette {
    pub fn new<I, S>(entries: I) -> Self
    where
        I: IntoIterator<Item = (S, [u8; 3])>,
        S: Into<String>,
    {
        Self { colors: entries.into_iter().map(|(l, c)| (l.into(), c)).collect() }
    }

    pub fn tomato() -> Self {
        Self::new(TOMATO_COLORS)
    }

    pub fn color(&self, label: &str) -> Option<[u8; 3]> {
        self.colors.get(label).copied()
    }

    pub fn contains(&self, label: &str) -> bool {
        self.colors.contains_key(label)
    }

    /// Copia de la paleta sin las etiquetas dadas (clases "conocidas pero no mostradas").
    pub fn without<'a>(&self, hidden: impl IntoIterator<Item = &'a str>) -> Self {
        let mut colors = self.colors.clone();
        for label in hidden {
            colors.remove(label);
        }
        Self { colors }
    }
}

/// Tablas de etiquetas de solo lectura compartidas por todas las peticiones.
#[derive(Debug, Clone, PartialEq)]
pub struct LabelCatalog {
    pub vocabulary: LabelVocabulary,
    pub palette: LabelPalette,
}

impl LabelCatalog {
    pub fn tomato() -> Self {
        Self { vocabulary: LabelVocabulary::tomato(), palette: LabelPalette::tomato() }
    }
}
