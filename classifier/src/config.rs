use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

const EMBEDDED_CONFIG: &str = include_str!("../../config/classifier.yaml");

pub const DEFAULT_MODEL_URL: &str = "/web_model/model.json";
pub const DEFAULT_CONFIDENCE_THRESHOLD: f32 = 0.7;
pub const DEFAULT_MAX_FILE_SIZE: u64 = 10 * 1024 * 1024;
pub const DEFAULT_ACCEPTED_FORMATS: [&str; 3] = ["image/jpeg", "image/png", "image/webp"];

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse config: {0}")]
    Parse(#[from] serde_yaml::Error),
    #[error("confidence_threshold must be within [0, 1], got {0}")]
    ThresholdOutOfRange(f32),
    #[error("max_file_size must be greater than zero")]
    ZeroFileSize,
    #[error("accepted_formats must list at least one media type")]
    NoAcceptedFormats,
    #[error("model_url must not be empty")]
    EmptyModelUrl,
}

/// Static, load-time settings for the classifier. Keys missing from the
/// YAML source fall back to their defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClassifierConfig {
    pub version: f32,
    pub model_url: String,
    pub confidence_threshold: f32,
    pub max_file_size: u64,
    pub accepted_formats: Vec<String>,
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            version: 1.0,
            model_url: DEFAULT_MODEL_URL.to_string(),
            confidence_threshold: DEFAULT_CONFIDENCE_THRESHOLD,
            max_file_size: DEFAULT_MAX_FILE_SIZE,
            accepted_formats: DEFAULT_ACCEPTED_FORMATS.iter().map(|f| f.to_string()).collect(),
        }
    }
}

impl ClassifierConfig {
    /// Parses the `config/classifier.yaml` bundled into the binary.
    pub fn load() -> Result<Self, ConfigError> {
        Self::from_yaml_str(EMBEDDED_CONFIG)
    }

    pub fn load_from_path(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let config_str = std::fs::read_to_string(path)?;
        Self::from_yaml_str(&config_str)
    }

    pub fn from_yaml_str(source: &str) -> Result<Self, ConfigError> {
        let config: ClassifierConfig = serde_yaml::from_str(source)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(0.0..=1.0).contains(&self.confidence_threshold) {
            return Err(ConfigError::ThresholdOutOfRange(self.confidence_threshold));
        }
        if self.max_file_size == 0 {
            return Err(ConfigError::ZeroFileSize);
        }
        if self.accepted_formats.is_empty() {
            return Err(ConfigError::NoAcceptedFormats);
        }
        if self.model_url.trim().is_empty() {
            return Err(ConfigError::EmptyModelUrl);
        }
        Ok(())
    }

    /// The size limit expressed in whole megabytes, as shown to users.
    pub fn max_file_size_mb(&self) -> u64 {
        self.max_file_size / (1024 * 1024)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn embedded_config_matches_defaults() {
        let config = ClassifierConfig::load().unwrap();
        assert_eq!(config, ClassifierConfig::default());
        assert_eq!(config.max_file_size_mb(), 10);
    }

    #[test]
    fn missing_keys_fall_back_to_defaults() {
        let config = ClassifierConfig::from_yaml_str("confidence_threshold: 0.55\n").unwrap();
        assert_eq!(config.confidence_threshold, 0.55);
        assert_eq!(config.model_url, DEFAULT_MODEL_URL);
        assert_eq!(config.accepted_formats.len(), 3);
    }

    #[test]
    fn rejects_threshold_outside_unit_interval() {
        let err = ClassifierConfig::from_yaml_str("confidence_threshold: 1.5\n").unwrap_err();
        assert!(matches!(err, ConfigError::ThresholdOutOfRange(t) if t == 1.5));
    }

    #[test]
    fn rejects_empty_format_list() {
        let err = ClassifierConfig::from_yaml_str("accepted_formats: []\n").unwrap_err();
        assert!(matches!(err, ConfigError::NoAcceptedFormats));
    }

    #[test]
    fn rejects_malformed_yaml() {
        let err = ClassifierConfig::from_yaml_str("max_file_size: [oops").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn loads_and_validates_a_file_on_disk() {
        let dir = std::env::temp_dir().join(format!("classifier-config-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();

        let good = dir.join("classifier.yaml");
        std::fs::write(&good, "model_url: /models/pets.onnx\nmax_file_size: 2097152\n").unwrap();
        let config = ClassifierConfig::load_from_path(&good).unwrap();
        assert_eq!(config.model_url, "/models/pets.onnx");
        assert_eq!(config.max_file_size_mb(), 2);

        let bad = dir.join("zero.yaml");
        std::fs::write(&bad, "max_file_size: 0\n").unwrap();
        assert!(matches!(ClassifierConfig::load_from_path(&bad), Err(ConfigError::ZeroFileSize)));

        let missing = ClassifierConfig::load_from_path(dir.join("absent.yaml")).unwrap_err();
        assert!(matches!(missing, ConfigError::Io(_)));

        std::fs::remove_dir_all(&dir).unwrap();
    }
}
