use ab_glyph::{FontVec, PxScale};
use image::{Rgb, RgbImage};
use imageproc::drawing::{draw_filled_rect_mut, draw_hollow_rect_mut, draw_text_mut, text_size};
use imageproc::rect::Rect;

use crate::application::ports::AnnotatorPort;
use crate::domain::detection::Detection;

const PALETTE: [Rgb<u8>; 20] = [
    Rgb([0xFF, 0x38, 0x38]), Rgb([0xFF, 0x9D, 0x97]), Rgb([0xFF, 0x70, 0x1F]), Rgb([0xFF, 0xB2, 0x1D]),
    Rgb([0xCF, 0xD2, 0x31]), Rgb([0x48, 0xF9, 0x0A]), Rgb([0x92, 0xCC, 0x17]), Rgb([0x3D, 0xDB, 0x86]),
    Rgb([0x1A, 0x93, 0x34]), Rgb([0x00, 0xD4, 0xBB]), Rgb([0x2C, 0x99, 0xA8]), Rgb([0x00, 0xC2, 0xFF]),
    Rgb([0x34, 0x45, 0x93]), Rgb([0x64, 0x73, 0xFF]), Rgb([0x00, 0x18, 0xEC]), Rgb([0x84, 0x38, 0xFF]),
    Rgb([0x52, 0x00, 0x85]), Rgb([0xCB, 0x38, 0xFF]), Rgb([0xFF, 0x95, 0xC8]), Rgb([0xFF, 0x37, 0xC7]),
];

const TEXT_COLOR: Rgb<u8> = Rgb([255, 255, 255]);
const LABEL_PADDING: u32 = 2;

pub fn class_color(class_id: usize) -> Rgb<u8> {
    PALETTE[class_id % PALETTE.len()]
}

/// Pinta cajas y etiquetas sobre una copia de la imagen.
pub struct BoxPainter {
    font: Option<FontVec>,
}

impl BoxPainter {
    pub fn new(font: Option<FontVec>) -> Self {
        Self { font }
    }

    pub fn has_font(&self) -> bool {
        self.font.is_some()
    }

    fn draw_box(canvas: &mut RgbImage, d: &Detection, line_width: u32, color: Rgb<u8>) {
        let box_w = d.xmax.saturating_sub(d.xmin);
        let box_h = d.ymax.saturating_sub(d.ymin);
        for i in 0..line_width {
            let (w, h) = (box_w.saturating_sub(2 * i), box_h.saturating_sub(2 * i));
            if w == 0 || h == 0 {
                break;
            }
            let rect = Rect::at((d.xmin + i) as i32, (d.ymin + i) as i32).of_size(w, h);
            draw_hollow_rect_mut(canvas, rect, color);
        }
    }

    fn draw_label(&self, canvas: &mut RgbImage, d: &Detection, font_px: f32, color: Rgb<u8>) {
        let text = format!("{} {:.2}", d.name, d.confidence);
        let scale = PxScale::from(font_px);

        let (text_w, text_h) = match &self.font {
            Some(font) => text_size(scale, font, &text),
            // sin fuente: pestaña de tamaño aproximado
            None => ((text.chars().count() as f32 * font_px * 0.55) as u32, font_px as u32),
        };
        let tab_w = text_w + 2 * LABEL_PADDING;
        let tab_h = text_h.max(1) + 2 * LABEL_PADDING;

        // encima de la caja salvo que no quepa
        let tab_y = if d.ymin >= tab_h { d.ymin - tab_h } else { d.ymin };
        let tab = Rect::at(d.xmin as i32, tab_y as i32).of_size(tab_w.max(1), tab_h);
        draw_filled_rect_mut(canvas, tab, color);

        if let Some(font) = &self.font {
            let x = (d.xmin + LABEL_PADDING) as i32;
            let y = (tab_y + LABEL_PADDING) as i32;
            draw_text_mut(canvas, TEXT_COLOR, x, y, scale, font, &text);
        }
    }
}

impl AnnotatorPort for BoxPainter {
    fn annotate(&self, image: &RgbImage, detections: &[Detection]) -> RgbImage {
        let mut canvas = image.clone();
        let (w, h) = canvas.dimensions();
        if w == 0 || h == 0 {
            return canvas;
        }

        let half_perimeter = (w + h) as f32 / 2.0;
        let line_width = ((half_perimeter * 0.003).round() as u32).max(2);
        let font_px = (half_perimeter * 0.035).round().max(12.0);

        for d in detections {
            let color = class_color(d.class_id);
            Self::draw_box(&mut canvas, d, line_width, color);
            self.draw_label(&mut canvas, d, font_px, color);
        }
        canvas
    }
}
