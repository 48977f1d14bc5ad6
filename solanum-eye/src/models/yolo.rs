//! YOLOv8 detection model running on ONNX Runtime

use super::{non_max_suppression, Model};
use crate::error::VisionError;
use image::{imageops::FilterType, RgbImage};
use ndarray::{Array4, Axis, Ix3};
use ort::session::Session;
use ort::value::TensorRef;
use parking_lot::Mutex;
use solanum_core::{BoundingBox, Detection};
use std::path::Path;
use tracing::{debug, info};

const INPUT_SIZE: u32 = 640;
const NMS_IOU: f32 = 0.45;
const PAD_VALUE: f32 = 144.0 / 255.0;

/// YOLOv8 export with output shape `[1, 4 + classes, anchors]`
pub struct YoloModel {
    name: String,
    session: Mutex<Session>,
    class_names: Vec<String>,
}

impl YoloModel {
    /// Load an ONNX export. Class names are used in order of class id;
    /// ids without a name are reported as `class_<id>`.
    ///
    /// Load failures are configuration errors, not inference errors.
    pub fn load(model_path: &Path, class_names: Vec<String>) -> Result<Self, VisionError> {
        if !model_path.is_file() {
            return Err(VisionError::Config(format!(
                "Model file {} does not exist",
                model_path.display()
            )));
        }
        let session = Session::builder()
            .map_err(|e| VisionError::Config(format!("Failed to create ONNX session builder: {}", e)))?
            .commit_from_file(model_path)
            .map_err(|e| VisionError::Config(format!("Failed to load YOLO model {}: {}", model_path.display(), e)))?;

        info!("YOLO model loaded from {:?} ({} class names)", model_path, class_names.len());
        Ok(Self {
            name: model_path
                .file_stem()
                .map(|s| s.to_string_lossy().into_owned())
                .unwrap_or_else(|| "yolo".to_string()),
            session: Mutex::new(session),
            class_names,
        })
    }

    fn class_name(&self, class_id: usize) -> String {
        self.class_names
            .get(class_id)
            .cloned()
            .unwrap_or_else(|| format!("class_{}", class_id))
    }

    /// Letterbox into the top-left of a padded 640x640 tensor. Returns the scale applied.
    fn preprocess(image: &RgbImage) -> (Array4<f32>, f32) {
        let (w0, h0) = image.dimensions();
        let scale = (INPUT_SIZE as f32 / w0 as f32).min(INPUT_SIZE as f32 / h0 as f32);
        let w1 = ((w0 as f32 * scale).round() as u32).clamp(1, INPUT_SIZE);
        let h1 = ((h0 as f32 * scale).round() as u32).clamp(1, INPUT_SIZE);
        let resized = image::imageops::resize(image, w1, h1, FilterType::Triangle);

        let size = INPUT_SIZE as usize;
        let mut input = Array4::from_elem((1, 3, size, size), PAD_VALUE);
        for (x, y, pixel) in resized.enumerate_pixels() {
            let (x, y) = (x as usize, y as usize);
            for c in 0..3 {
                input[[0, c, y, x]] = pixel.0[c] as f32 / 255.0;
            }
        }
        (input, scale)
    }
}

impl Model for YoloModel {
    fn name(&self) -> &str {
        &self.name
    }

    fn predict(&self, image: &RgbImage, confidence: f32) -> Result<Vec<Detection>, VisionError> {
        let (input, scale) = Self::preprocess(image);
        let tensor = TensorRef::from_array_view(input.view())
            .map_err(|e| VisionError::Model(format!("Failed to build input tensor: {}", e)))?;

        let mut session = self.session.lock();
        let outputs = session
            .run(ort::inputs![tensor])
            .map_err(|e| VisionError::Model(format!("YOLO inference failed: {}", e)))?;
        let output = outputs[0]
            .try_extract_array::<f32>()
            .map_err(|e| VisionError::Model(format!("Failed to extract output tensor: {}", e)))?;

        let shape = output.shape().to_vec();
        let output = output
            .into_dimensionality::<Ix3>()
            .ok()
            .filter(|o| o.shape()[0] == 1 && o.shape()[1] > 4)
            .ok_or_else(|| VisionError::Model(format!("Unexpected YOLO output shape {:?}", shape)))?;
        debug!("YOLO output shape: {:?}", shape);

        let (width, height) = image.dimensions();
        let rows = output.index_axis(Axis(0), 0);
        let mut candidates = Vec::new();
        for anchor in rows.axis_iter(Axis(1)) {
            let (class_id, score) = anchor
                .iter()
                .skip(4)
                .copied()
                .enumerate()
                .fold((0, f32::MIN), |best, (i, s)| if s > best.1 { (i, s) } else { best });
            if score.is_nan() || score < confidence {
                continue;
            }

            let (cx, cy, w, h) = (anchor[0] / scale, anchor[1] / scale, anchor[2] / scale, anchor[3] / scale);
            let bbox = BoundingBox::new(cx - w / 2.0, cy - h / 2.0, w, h);
            if let Some(bbox) = bbox.clamp_to(width, height) {
                candidates.push(Detection::new(class_id, self.class_name(class_id), score, bbox));
            }
        }

        let detections = non_max_suppression(candidates, NMS_IOU);
        debug!("YOLO detected {} objects at confidence {:.2}", detections.len(), confidence);
        Ok(detections)
    }
}
