use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Top-level revlens configuration, matching `revlens.toml`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RevlensConfig {
    #[serde(default)]
    pub server: ServerSection,
    #[serde(default)]
    pub storage: StorageSection,
    #[serde(default)]
    pub classifier: ClassifierSection,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerSection {
    pub host: String,
    pub port: u16,
}

impl Default for ServerSection {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 5000,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageSection {
    /// Directory holding the durable product collection (`analyzed.json`).
    pub data_dir: PathBuf,
    /// Directory holding the per-product chart artifacts (`{id}.png`).
    pub graphs_dir: PathBuf,
}

impl Default for StorageSection {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("data"),
            graphs_dir: PathBuf::from("static/graphs"),
        }
    }
}

impl StorageSection {
    /// Path of the durable product collection file.
    pub fn data_file(&self) -> PathBuf {
        self.data_dir.join("analyzed.json")
    }
}

/// Which classification backend to construct.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ClassifierBackend {
    /// Local ModernBERT inference via candle.
    #[default]
    Modernbert,
    /// Hugging Face Inference API over HTTP.
    Remote,
}

/// ModernBERT checkpoint size for the local backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ModelSize {
    #[default]
    Base,
    Large,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ClassifierSection {
    pub backend: ClassifierBackend,
    /// Checkpoint size for the local backend.
    pub size: ModelSize,
    /// Inference device: `cpu` or `cuda:N`.
    pub device: String,
    /// Wall-clock bound on one classification batch.
    pub timeout_secs: u64,
    /// Model id used by the remote backend.
    pub remote_model_id: String,
    /// Environment variable holding the remote API token.
    pub api_key_env: String,
}

impl Default for ClassifierSection {
    fn default() -> Self {
        Self {
            backend: ClassifierBackend::Modernbert,
            size: ModelSize::Base,
            device: "cpu".to_string(),
            timeout_secs: 30,
            remote_model_id: "tabularisai/multilingual-sentiment-analysis".to_string(),
            api_key_env: "HF_API_TOKEN".to_string(),
        }
    }
}

impl RevlensConfig {
    /// Load configuration from a TOML file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Err(ConfigError::NotFound(path.display().to_string()));
        }
        let raw = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::Parse(format!("{}: {e}", path.display())))?;
        Self::from_toml(&raw)
    }

    /// Load configuration from `path` if it exists, falling back to defaults.
    pub fn load_or_default(path: &Path) -> Result<Self, ConfigError> {
        if path.exists() {
            Self::load(path)
        } else {
            Ok(Self::default())
        }
    }

    /// Parse and validate a TOML document.
    pub fn from_toml(raw: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(raw).map_err(|e| ConfigError::Parse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.classifier.timeout_secs == 0 {
            return Err(ConfigError::Invalid(
                "classifier.timeout_secs must be positive".to_string(),
            ));
        }
        if self.storage.data_dir.as_os_str().is_empty() {
            return Err(ConfigError::Invalid(
                "storage.data_dir must not be empty".to_string(),
            ));
        }
        if self.storage.graphs_dir.as_os_str().is_empty() {
            return Err(ConfigError::Invalid(
                "storage.graphs_dir must not be empty".to_string(),
            ));
        }
        if self.classifier.backend == ClassifierBackend::Remote
            && self.classifier.remote_model_id.trim().is_empty()
        {
            return Err(ConfigError::Invalid(
                "classifier.remote_model_id must be set for the remote backend".to_string(),
            ));
        }
        Ok(())
    }
}

// ── Tests ───────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_service_layout() {
        let config = RevlensConfig::default();
        assert_eq!(config.server.port, 5000);
        assert_eq!(config.storage.data_file(), PathBuf::from("data/analyzed.json"));
        assert_eq!(config.storage.graphs_dir, PathBuf::from("static/graphs"));
        assert_eq!(config.classifier.backend, ClassifierBackend::Modernbert);
        assert_eq!(config.classifier.timeout_secs, 30);
    }

    #[test]
    fn partial_toml_fills_defaults() {
        let config = RevlensConfig::from_toml(
            r#"
            [server]
            host = "127.0.0.1"
            port = 8080
            "#,
        )
        .unwrap();
        assert_eq!(config.server.host, "127.0.0.1");
        assert_eq!(config.server.port, 8080);
        // untouched sections keep their defaults
        assert_eq!(config.classifier.size, ModelSize::Base);
        assert_eq!(config.storage.data_dir, PathBuf::from("data"));
    }

    #[test]
    fn backend_and_size_parse_lowercase() {
        let config = RevlensConfig::from_toml(
            r#"
            [classifier]
            backend = "remote"
            size = "large"
            "#,
        )
        .unwrap();
        assert_eq!(config.classifier.backend, ClassifierBackend::Remote);
        assert_eq!(config.classifier.size, ModelSize::Large);
    }

    #[test]
    fn zero_timeout_rejected() {
        let err = RevlensConfig::from_toml(
            r#"
            [classifier]
            timeout_secs = 0
            "#,
        )
        .unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
    }

    #[test]
    fn malformed_toml_is_parse_error() {
        let err = RevlensConfig::from_toml("[server\nport = ]").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn missing_file_is_not_found() {
        let err = RevlensConfig::load(Path::new("/nonexistent/revlens.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::NotFound(_)));
    }
}
