//! Detection model loading

use crate::config::ModelConfig;
use solanum_core::Error;
use solanum_eye::Model;
use std::sync::Arc;

/// Load the configured detection model
#[cfg(feature = "onnx")]
pub fn load(config: &ModelConfig) -> Result<Arc<dyn Model>, Error> {
    use solanum_eye::models::YoloModel;

    let path = config
        .path
        .as_deref()
        .ok_or_else(|| Error::Configuration("no model path configured ([model] path)".to_string()))?;
    let model = YoloModel::load(path, config.class_names.clone())?;
    Ok(Arc::new(model))
}

/// Load the configured detection model
#[cfg(not(feature = "onnx"))]
pub fn load(_config: &ModelConfig) -> Result<Arc<dyn Model>, Error> {
    Err(Error::Configuration(
        "detection requires building solanum with the `onnx` feature".to_string(),
    ))
}
