//! Inspector configuration, loaded from TOML

use crate::capture::{CaptureBuffer, CaptureError, DEFAULT_EVENT_CAPACITY, DEFAULT_LOG_CAPACITY, LOG_CATEGORIES};
use crate::viewer::{RenderOptions, DEFAULT_DRILL_STEP};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid configuration: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("failed to serialize configuration: {0}")]
    Serialize(#[from] toml::ser::Error),
    #[error("invalid capture settings: {0}")]
    Capture(#[from] CaptureError),
    #[error("{0} must be at least 1")]
    ZeroCapacity(&'static str),
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct InspectorConfig {
    pub capture: CaptureConfig,
    pub viewer: ViewerConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CaptureConfig {
    /// Global capture switch
    pub enabled: bool,
    pub log_capacity: usize,
    pub event_capacity: usize,
    pub log_export_prefix: String,
    pub event_export_prefix: String,
    /// Where exports are written
    pub export_dir: PathBuf,
    /// Per-category flags for the log buffer; unlisted categories start enabled
    pub categories: BTreeMap<String, bool>,
}

impl Default for CaptureConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            log_capacity: DEFAULT_LOG_CAPACITY,
            event_capacity: DEFAULT_EVENT_CAPACITY,
            log_export_prefix: "inspector_logs".to_string(),
            event_export_prefix: "inspector_events".to_string(),
            export_dir: PathBuf::from("."),
            categories: BTreeMap::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewerConfig {
    pub max_depth: usize,
    /// Depth added to the budget on each drill
    pub drill_step: usize,
    /// Strings longer than this are truncated in the view
    pub truncate_at: usize,
}

impl Default for ViewerConfig {
    fn default() -> Self {
        let options = RenderOptions::default();
        Self {
            max_depth: options.max_depth,
            drill_step: DEFAULT_DRILL_STEP,
            truncate_at: options.truncate_at,
        }
    }
}

impl InspectorConfig {
    /// Load configuration from TOML file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(content)?)
    }

    /// Save configuration to TOML file
    pub fn to_file(&self, path: impl AsRef<Path>) -> Result<(), ConfigError> {
        let path = path.as_ref();
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Protocol log buffer with the configured capacity and flags
    pub fn log_buffer(&self) -> Result<CaptureBuffer, ConfigError> {
        if self.capture.log_capacity == 0 {
            return Err(ConfigError::ZeroCapacity("capture.log_capacity"));
        }
        let mut buffer = CaptureBuffer::for_logs(self.capture.log_capacity)
            .with_export_prefix(self.capture.log_export_prefix.clone());
        let flags: HashMap<String, bool> = self.capture.categories.clone().into_iter().collect();
        buffer.configure(LOG_CATEGORIES, &flags)?;
        buffer.set_all_enabled(self.capture.enabled);
        Ok(buffer)
    }

    pub fn event_buffer(&self) -> Result<CaptureBuffer, ConfigError> {
        if self.capture.event_capacity == 0 {
            return Err(ConfigError::ZeroCapacity("capture.event_capacity"));
        }
        let mut buffer = CaptureBuffer::for_events(self.capture.event_capacity)
            .with_export_prefix(self.capture.event_export_prefix.clone());
        buffer.set_all_enabled(self.capture.enabled);
        Ok(buffer)
    }

    pub fn render_options(&self) -> RenderOptions {
        RenderOptions {
            max_depth: self.viewer.max_depth,
            truncate_at: self.viewer.truncate_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_config_uses_defaults() {
        let config = InspectorConfig::from_toml_str("").unwrap();
        assert_eq!(config, InspectorConfig::default());
        assert_eq!(config.capture.log_capacity, 200);
        assert_eq!(config.capture.event_capacity, 100);
        assert_eq!(config.render_options(), RenderOptions::default());
    }

    #[test]
    fn test_partial_config() {
        let config = InspectorConfig::from_toml_str(
            r#"
            [capture]
            log_capacity = 2
            categories = { sent = false }

            [viewer]
            max_depth = 5
            "#,
        )
        .unwrap();

        let mut buffer = config.log_buffer().unwrap();
        assert_eq!(buffer.capacity(), 2);
        assert_eq!(buffer.record("sent", vec![]).unwrap(), None);
        assert!(buffer.record("received", vec![]).unwrap().is_some());
        assert_eq!(config.viewer.max_depth, 5);
        assert_eq!(config.viewer.drill_step, 3);
    }

    #[test]
    fn test_unknown_category_is_rejected() {
        let config = InspectorConfig::from_toml_str("[capture]\ncategories = { bogus = true }").unwrap();
        assert!(matches!(config.log_buffer(), Err(ConfigError::Capture(CaptureError::UnknownCategory(_)))));
    }

    #[test]
    fn test_zero_capacity_is_rejected() {
        let config = InspectorConfig::from_toml_str("[capture]\nlog_capacity = 0").unwrap();
        assert!(matches!(config.log_buffer(), Err(ConfigError::ZeroCapacity("capture.log_capacity"))));
        assert!(config.event_buffer().is_ok());

        let config = InspectorConfig::from_toml_str("[capture]\nevent_capacity = 0").unwrap();
        assert!(matches!(config.event_buffer(), Err(ConfigError::ZeroCapacity(_))));
    }

    #[test]
    fn test_file_round_trip() {
        let path = std::env::temp_dir().join(format!("inspector_config_{}.toml", std::process::id()));
        let mut config = InspectorConfig::default();
        config.capture.enabled = false;
        config.to_file(&path).unwrap();

        assert_eq!(InspectorConfig::from_file(&path).unwrap(), config);
        let _ = std::fs::remove_file(&path);
        assert!(matches!(InspectorConfig::from_file(&path), Err(ConfigError::Io { .. })));
    }
}
