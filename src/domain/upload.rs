/// Fichero de imagen recibido en un formulario multipart.
#[derive(Debug, Clone)]
pub struct UploadedImage {
    pub file_name: String,
    pub content_type: Option<String>,
    pub bytes: Vec<u8>,
}

impl UploadedImage {
    pub fn safe_file_name(&self) -> String {
        secure_file_name(&self.file_name)
    }

    /// Extensión del nombre saneado, en minúsculas. `None` si no hay o no es alfanumérica.
    pub fn extension(&self) -> Option<String> {
        let name = self.safe_file_name();
        let (stem, ext) = name.rsplit_once('.')?;
        let valid = !stem.is_empty()
            && !ext.is_empty()
            && ext.len() <= MAX_EXTENSION_LEN
            && ext.chars().all(|c| c.is_ascii_alphanumeric());
        valid.then(|| ext.to_ascii_lowercase())
    }

    pub fn content_type_or_default(&self) -> &str {
        self.content_type.as_deref().unwrap_or("application/octet-stream")
    }
}

const MAX_FILE_NAME_LEN: usize = 100;
const MAX_EXTENSION_LEN: usize = 10;

/// Reduce un nombre de fichero del cliente a `[A-Za-z0-9._-]`; separadores de ruta
/// y espacios pasan a `_`. Nunca devuelve una cadena vacía y nunca supera
/// `MAX_FILE_NAME_LEN` bytes (la extensión se conserva al recortar).
pub fn secure_file_name(name: &str) -> String {
    let words: Vec<String> = name
        .split(|c: char| c == '/' || c == '\\' || c.is_whitespace())
        .filter(|w| !w.is_empty())
        .map(|w| {
            w.chars()
                .filter(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-'))
                .collect::<String>()
        })
        .filter(|w| !w.is_empty())
        .collect();

    let joined = words.join("_");
    let trimmed = joined.trim_matches(|c| c == '.' || c == '_');
    if trimmed.is_empty() {
        "upload".to_string()
    } else {
        truncate_keeping_extension(trimmed)
    }
}

// Solo recibe ASCII, así que cortar por bytes es seguro.
fn truncate_keeping_extension(name: &str) -> String {
    if name.len() <= MAX_FILE_NAME_LEN {
        return name.to_string();
    }
    let ext = match name.rfind('.') {
        Some(i) if i > 0 && name.len() - i <= MAX_EXTENSION_LEN + 1 => &name[i..],
        _ => "",
    };
    format!("{}{}", &name[..MAX_FILE_NAME_LEN - ext.len()], ext)
}
