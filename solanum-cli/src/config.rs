//! Application configuration file

use anyhow::{bail, Context};
use serde::{Deserialize, Serialize};
use solanum_eye::EyeConfig;
use solanum_storage::HistoryConfig;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Detection model settings
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelConfig {
    /// ONNX export of the detection model
    pub path: Option<PathBuf>,
    /// Class names in class-id order
    pub class_names: Vec<String>,
}

/// Contents of `config.toml`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub eye: EyeConfig,
    pub history: HistoryConfig,
    pub model: ModelConfig,
}

impl AppConfig {
    /// `~/.solanum/config.toml`
    pub fn default_path() -> Option<PathBuf> {
        dirs::home_dir().map(|home| home.join(".solanum").join("config.toml"))
    }

    /// Load `path`, or the default file when it exists, or built-in defaults
    pub fn load(path: Option<&Path>) -> anyhow::Result<Self> {
        let path = match path {
            Some(path) => path.to_path_buf(),
            None => match Self::default_path().filter(|p| p.is_file()) {
                Some(path) => path,
                None => return Ok(Self::default()),
            },
        };

        let text = std::fs::read_to_string(&path)
            .with_context(|| format!("Failed to read config {}", path.display()))?;
        let config = Self::from_toml(&text).with_context(|| format!("Invalid config {}", path.display()))?;
        debug!("Loaded configuration from {:?}", path);
        Ok(config)
    }

    pub fn from_toml(text: &str) -> anyhow::Result<Self> {
        let config: Self = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        if let Err(e) = self.eye.validate() {
            bail!("eye: {}", e);
        }
        if let Err(e) = self.history.validate() {
            bail!("history: {}", e);
        }
        Ok(())
    }
}
