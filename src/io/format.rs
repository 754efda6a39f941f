//! Serialization format definitions

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Supported configuration file formats
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConfigFormat {
    /// JSON format (human-readable, strict)
    Json,

    /// YAML format (human-readable, good for configs)
    Yaml,
}

impl ConfigFormat {
    /// Get file extension for this format
    pub fn extension(&self) -> &str {
        match self {
            ConfigFormat::Json => "json",
            ConfigFormat::Yaml => "yaml",
        }
    }

    /// Detect format from file extension
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_lowercase().as_str() {
            "json" => Some(ConfigFormat::Json),
            "yaml" | "yml" => Some(ConfigFormat::Yaml),
            _ => None,
        }
    }

    /// Detect format from the extension of `path`
    pub fn from_path(path: &Path) -> Result<Self> {
        let ext = path
            .extension()
            .and_then(|s| s.to_str())
            .ok_or_else(|| Error::Serialization(format!("{} has no extension", path.display())))?;
        Self::from_extension(ext)
            .ok_or_else(|| Error::Serialization(format!("Unsupported file extension: {ext}")))
    }

    pub(crate) fn render(&self, json: &serde_json::Value) -> Result<String> {
        match self {
            ConfigFormat::Json => serde_json::to_string_pretty(json)
                .map_err(|e| Error::Serialization(format!("JSON serialization failed: {e}"))),
            ConfigFormat::Yaml => serde_yaml::to_string(json)
                .map_err(|e| Error::Serialization(format!("YAML serialization failed: {e}"))),
        }
    }

    pub(crate) fn read(&self, content: &str) -> Result<serde_json::Value> {
        match self {
            ConfigFormat::Json => serde_json::from_str(content)
                .map_err(|e| Error::Serialization(format!("JSON deserialization failed: {e}"))),
            ConfigFormat::Yaml => serde_yaml::from_str(content)
                .map_err(|e| Error::Serialization(format!("YAML deserialization failed: {e}"))),
        }
    }
}
