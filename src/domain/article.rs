use serde::{Deserialize, Serialize};

/// Campos del artículo que envía el cliente en el campo `data` del formulario.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewArticle {
    pub title: String,
    pub content: String,
    pub author: String,
    pub publish_date: String,
    pub tags: Vec<String>,
}

impl NewArticle {
    /// Las etiquetas se comportan como un conjunto; gana la primera aparición.
    pub fn dedup_tags(mut self) -> Self {
        let mut seen = std::collections::HashSet::new();
        self.tags.retain(|t| seen.insert(t.clone()));
        self
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Article {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub author: String,
    #[serde(default)]
    pub publish_date: String,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub image_url: String,
}

impl Article {
    pub fn from_new(new: NewArticle, image_url: String) -> Self {
        Self {
            title: new.title,
            content: new.content,
            author: new.author,
            publish_date: new.publish_date,
            tags: new.tags,
            image_url,
        }
    }
}

/// Artículo guardado junto con su id de documento.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredArticle {
    pub id: String,
    #[serde(flatten)]
    pub article: Article,
}
