use std::path::Path;

use ab_glyph::{FontArc, PxScale};
use image::{Rgb, RgbImage};
use imageproc::drawing::{draw_text_mut, text_size};
use tracing::{error, info, warn};

/// Fuente embebida que se usa cuando la truetype configurada no está disponible.
static BUILTIN_FONT: &[u8] = include_bytes!("../../assets/DejaVuSansMono.ttf");

/// Fuente para las etiquetas de las cajas.
///
/// Cargarla nunca falla: si el fichero truetype falta o es ilegible se usa la
/// fuente embebida.
#[derive(Clone)]
pub struct LabelFont {
    font: Option<FontArc>,
    scale: PxScale,
    builtin: bool,
}

impl LabelFont {
    pub fn load(path: &Path, size: f32) -> Self {
        match std::fs::read(path).map_err(|e| e.to_string()).and_then(|bytes| {
            FontArc::try_from_vec(bytes).map_err(|e| e.to_string())
        }) {
            Ok(font) => {
                info!("🔤 Fuente de etiquetas cargada desde {}", path.display());
                Self { font: Some(font), scale: PxScale::from(size), builtin: false }
            }
            Err(e) => {
                warn!("Fuente {} no disponible ({}), se usa la fuente embebida", path.display(), e);
                Self::builtin(size)
            }
        }
    }

    pub fn builtin(size: f32) -> Self {
        let font = FontArc::try_from_slice(BUILTIN_FONT)
            .inspect_err(|e| error!("Fuente embebida inválida ({}): las etiquetas se dibujan sin texto", e))
            .ok();
        Self { font, scale: PxScale::from(size), builtin: true }
    }

    pub fn is_builtin(&self) -> bool {
        self.builtin
    }

    /// Tamaño (ancho, alto) de `text` ya renderizado.
    pub fn measure(&self, text: &str) -> (u32, u32) {
        match &self.font {
            Some(font) if !text.is_empty() => text_size(self.scale, font, text),
            _ => (0, 0),
        }
    }

    /// Dibuja `text` con la esquina superior izquierda en `(x, y)`; lo que cae fuera del lienzo se recorta.
    pub fn draw(&self, canvas: &mut RgbImage, color: Rgb<u8>, x: i32, y: i32, text: &str) {
        if let Some(font) = &self.font {
            draw_text_mut(canvas, color, x, y, self.scale, font, text);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const WHITE: Rgb<u8> = Rgb([255, 255, 255]);

    fn render(font: &LabelFont, text: &str) -> RgbImage {
        let mut img = RgbImage::new(80, 24);
        font.draw(&mut img, WHITE, 2, 2, text);
        img
    }

    #[test]
    fn missing_font_falls_back_to_builtin() {
        let font = LabelFont::load(Path::new("/definitely/not/here/arial.ttf"), 16.0);
        assert!(font.is_builtin());
        assert!(font.measure("Healthy 0.91").0 > 0);
    }

    #[test]
    fn invalid_font_file_falls_back_to_builtin() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.ttf");
        std::fs::write(&path, b"not a font").unwrap();
        assert!(LabelFont::load(&path, 16.0).is_builtin());
    }

    #[test]
    fn builtin_keeps_letter_case() {
        let font = LabelFont::builtin(16.0);
        assert_ne!(render(&font, "spot"), render(&font, "SPOT"));
    }

    #[test]
    fn measure_grows_with_text() {
        let font = LabelFont::builtin(16.0);
        let (short_w, short_h) = font.measure("cracking");
        let (long_w, _) = font.measure("cracking 0.75");
        assert!(short_h > 0);
        assert!(long_w > short_w);
        assert_eq!(font.measure(""), (0, 0));
    }

    #[test]
    fn draw_clips_off_canvas() {
        let mut img = RgbImage::new(20, 20);
        LabelFont::builtin(16.0).draw(&mut img, WHITE, -6, -8, "HHHH");
        assert!(img.pixels().any(|p| p.0 != [0, 0, 0]));
        assert_eq!(img.get_pixel(19, 19).0, [0, 0, 0]);
    }
}
