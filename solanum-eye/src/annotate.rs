//! Rendering detections onto frames

use crate::error::VisionError;
use ab_glyph::{FontArc, PxScale};
use image::{Rgb, RgbImage};
use imageproc::drawing::{draw_filled_rect_mut, draw_hollow_rect_mut, draw_text_mut, text_size};
use imageproc::rect::Rect;
use solanum_core::Detection;
use std::path::Path;
use tracing::info;

const PALETTE: &[[u8; 3]] = &[
    [255, 56, 56],
    [255, 157, 151],
    [255, 112, 31],
    [255, 178, 29],
    [207, 210, 49],
    [72, 249, 10],
    [146, 204, 23],
    [61, 219, 134],
    [26, 147, 52],
    [0, 212, 187],
    [44, 153, 168],
    [0, 194, 255],
    [52, 69, 147],
    [100, 115, 255],
    [0, 24, 236],
    [132, 56, 255],
];

const BOX_THICKNESS: i32 = 2;
const LABEL_HEIGHT: f32 = 16.0;
const TAB_HEIGHT: u32 = 12;
const TAB_WIDTH: u32 = 24;

/// Draws bounding boxes and class labels
#[derive(Clone, Default)]
pub struct Annotator {
    font: Option<FontArc>,
}

impl Annotator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load a TTF/OTF font for label text
    pub fn with_font_file(path: &Path) -> Result<Self, VisionError> {
        let bytes = std::fs::read(path)
            .map_err(|e| VisionError::Config(format!("Cannot read font {}: {}", path.display(), e)))?;
        let font = FontArc::try_from_vec(bytes)
            .map_err(|e| VisionError::Config(format!("Invalid font {}: {}", path.display(), e)))?;
        info!("Loaded label font {:?}", path);
        Ok(Self { font: Some(font) })
    }

    pub fn has_font(&self) -> bool {
        self.font.is_some()
    }

    pub fn color_for(class_id: usize) -> Rgb<u8> {
        Rgb(PALETTE[class_id % PALETTE.len()])
    }

    /// Copy of `image` with every detection drawn on it
    pub fn annotate(&self, image: &RgbImage, detections: &[Detection]) -> RgbImage {
        let mut canvas = image.clone();
        let (width, height) = canvas.dimensions();

        for detection in detections {
            let Some(bbox) = detection.bbox.clamp_to(width, height) else {
                continue;
            };
            let color = Self::color_for(detection.class_id);
            let (x, y) = (bbox.x.round() as i32, bbox.y.round() as i32);
            let (w, h) = (bbox.width.round().max(1.0) as u32, bbox.height.round().max(1.0) as u32);

            for t in 0..BOX_THICKNESS {
                let (tw, th) = (w as i32 - 2 * t, h as i32 - 2 * t);
                if tw < 1 || th < 1 {
                    break;
                }
                draw_hollow_rect_mut(&mut canvas, Rect::at(x + t, y + t).of_size(tw as u32, th as u32), color);
            }

            self.draw_label(&mut canvas, detection, x, y, color);
        }
        canvas
    }

    fn draw_label(&self, canvas: &mut RgbImage, detection: &Detection, x: i32, y: i32, color: Rgb<u8>) {
        let text = format!("{} {:.2}", detection.class_name, detection.confidence);
        let (tab_w, tab_h) = match &self.font {
            Some(font) => {
                let (tw, th) = text_size(PxScale::from(LABEL_HEIGHT), font, &text);
                (tw + 4, th.max(1) + 4)
            }
            None => (TAB_WIDTH, TAB_HEIGHT),
        };

        // Tab sits above the box, or inside it when the box touches the top edge.
        let tab_y = if y >= tab_h as i32 { y - tab_h as i32 } else { y };
        draw_filled_rect_mut(canvas, Rect::at(x, tab_y).of_size(tab_w, tab_h), color);

        if let Some(font) = &self.font {
            draw_text_mut(
                canvas,
                Rgb([255, 255, 255]),
                x + 2,
                tab_y + 2,
                PxScale::from(LABEL_HEIGHT),
                font,
                &text,
            );
        }
    }
}
