use image::codecs::jpeg::JpegEncoder;
use image::{Rgb, RgbImage};
use imageproc::drawing::{draw_filled_rect_mut, draw_hollow_rect_mut};
use imageproc::rect::Rect;

use crate::application::font::LabelFont;
use crate::domain::{
    detection::Detection,
    errors::{DomainError, DomainResult},
    labels::LabelPalette,
};

pub const BOX_LINE_WIDTH: u32 = 3;
const LABEL_TEXT_COLOR: Rgb<u8> = Rgb([255, 255, 255]);
const JPEG_QUALITY: u8 = 90;

/// Dibuja las cajas y las etiquetas `"{label} {confidence:.2}"` sobre una copia de la imagen.
pub struct Annotator {
    font: LabelFont,
}

impl Annotator {
    pub fn new(font: LabelFont) -> Self {
        Self { font }
    }

    /// Las detecciones se dibujan en el orden recibido: las últimas tapan a las primeras.
    /// Las etiquetas sin color en la paleta se omiten.
    pub fn annotate(
        &self,
        source: &RgbImage,
        detections: &[Detection],
        palette: &LabelPalette,
    ) -> RgbImage {
        let mut canvas = source.clone();
        for det in detections {
            let Some(rgb) = palette.color(&det.label) else { continue };
            self.draw_detection(&mut canvas, det, Rgb(rgb));
        }
        canvas
    }

    fn draw_detection(&self, canvas: &mut RgbImage, det: &Detection, color: Rgb<u8>) {
        let x0 = det.bbox.x_min.round() as i32;
        let y0 = det.bbox.y_min.round() as i32;
        let x1 = det.bbox.x_max.round() as i32;
        let y1 = det.bbox.y_max.round() as i32;
        let w = (x1 - x0 + 1).max(1) as u32;
        let h = (y1 - y0 + 1).max(1) as u32;

        // El contorno crece hacia dentro desde el borde de la caja.
        for t in 0..BOX_LINE_WIDTH {
            let (iw, ih) = (w.saturating_sub(2 * t), h.saturating_sub(2 * t));
            if iw == 0 || ih == 0 {
                break;
            }
            draw_hollow_rect_mut(canvas, Rect::at(x0 + t as i32, y0 + t as i32).of_size(iw, ih), color);
        }

        let text = format!("{} {:.2}", det.label, det.confidence);
        let (_, text_h) = self.font.measure(&text);
        if text_h == 0 {
            return;
        }
        // Sin recorte de coordenadas: junto al borde superior la etiqueta sale del lienzo.
        let text_y = y0 - text_h as i32;
        draw_filled_rect_mut(canvas, Rect::at(x0, text_y).of_size(w, text_h), color);
        self.font.draw(canvas, LABEL_TEXT_COLOR, x0, text_y, &text);
    }
}

pub fn encode_jpeg(image: &RgbImage) -> DomainResult<Vec<u8>> {
    let mut buf = Vec::new();
    let mut encoder = JpegEncoder::new_with_quality(&mut buf, JPEG_QUALITY);
    encoder
        .encode_image(image)
        .map_err(|e| DomainError::OperationFailed(format!("jpeg encoding: {e}")))?;
    Ok(buf)
}
