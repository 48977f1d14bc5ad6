//! Configuration for the history store

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// History store configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HistoryConfig {
    /// Directory of the sled database
    pub path: PathBuf,
    /// When false the store starts disabled and history operations report it
    pub enabled: bool,
}

impl Default for HistoryConfig {
    fn default() -> Self {
        let path = dirs::home_dir()
            .map(|mut p| {
                p.push(".solanum");
                p.push("history.db");
                p
            })
            .unwrap_or_else(|| PathBuf::from("./history.db"));

        Self {
            path,
            enabled: true,
        }
    }
}

impl HistoryConfig {
    pub fn at(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            enabled: true,
        }
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.enabled && self.path.as_os_str().is_empty() {
            return Err("History path must not be empty".to_string());
        }
        Ok(())
    }
}
