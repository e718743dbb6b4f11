#![deny(unsafe_code)]

//! Configuration loading and validation for refdex.
//!
//! Loads TOML configuration files and validates them against expected schemas.
//! Provides the [`IndexConfig`] type as the central configuration structure:
//! where the manifest lives, how documents are retrieved, and how logging is
//! set up.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Errors that can occur during configuration loading and validation.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("validation error: {0}")]
    Validation(String),
}

/// Accepted values for `manifest.format`.
pub const MANIFEST_FORMATS: [&str; 4] = ["auto", "toml", "json", "markdown"];

/// Accepted values for `retrieval.backend`.
pub const RETRIEVAL_BACKENDS: [&str; 2] = ["fs", "http"];

/// Top-level configuration.
#[derive(Debug, Default, Clone, Serialize, Deserialize)]
pub struct IndexConfig {
    /// Manifest source.
    #[serde(default)]
    pub manifest: ManifestConfig,

    /// Document retrieval.
    #[serde(default)]
    pub retrieval: RetrievalConfig,

    /// Logging configuration.
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Where the manifest lives and how to read it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ManifestConfig {
    /// Path to the manifest file. When the configuration is read with
    /// [`IndexConfig::load`], a relative path is taken relative to the
    /// configuration file's directory.
    #[serde(default = "default_manifest_path")]
    pub path: String,

    /// Source format: "auto" (by extension), "toml", "json", or "markdown".
    #[serde(default = "default_manifest_format")]
    pub format: String,
}

impl Default for ManifestConfig {
    fn default() -> Self {
        Self {
            path: default_manifest_path(),
            format: default_manifest_format(),
        }
    }
}

fn default_manifest_path() -> String {
    "references/index.toml".to_string()
}

fn default_manifest_format() -> String {
    "auto".to_string()
}

/// Document retrieval configuration.
///
/// ## TOML Example
///
/// ```toml
/// [retrieval]
/// backend = "http"
/// base_url = "https://docs.example.com/bundle/"
/// timeout_secs = 5
/// max_concurrent = 8
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetrievalConfig {
    /// Retrieval backend: "fs" or "http".
    #[serde(default = "default_backend")]
    pub backend: String,

    /// Document root for the "fs" backend. Empty means the manifest's
    /// own directory. Relative roots follow the same rule as
    /// [`ManifestConfig::path`].
    #[serde(default)]
    pub root: String,

    /// Base URL for the "http" backend.
    #[serde(default)]
    pub base_url: String,

    /// Per-document timeout in seconds (0 = no timeout).
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Maximum number of documents fetched at once.
    #[serde(default = "default_max_concurrent")]
    pub max_concurrent: usize,

    /// Byte budget for budgeted loads (0 = unlimited).
    #[serde(default)]
    pub max_bytes: u64,
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            backend: default_backend(),
            root: String::new(),
            base_url: String::new(),
            timeout_secs: default_timeout_secs(),
            max_concurrent: default_max_concurrent(),
            max_bytes: 0,
        }
    }
}

fn default_backend() -> String {
    "fs".to_string()
}

fn default_timeout_secs() -> u64 {
    10
}

fn default_max_concurrent() -> usize {
    4
}

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level filter (e.g. "info", "debug", "trace").
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

impl IndexConfig {
    /// Load configuration from a TOML file at the given path using async I/O.
    ///
    /// Relative `manifest.path` and `retrieval.root` values are rebased onto
    /// the file's directory, so the result does not depend on the process
    /// working directory.
    pub async fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = tokio::fs::read_to_string(path).await?;
        let mut config = Self::parse(&content)?;
        if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
            config.rebase(dir);
        }
        tracing::debug!(
            path = %path.display(),
            manifest = %config.manifest.path,
            "Loaded configuration"
        );
        Ok(config)
    }

    /// Resolve relative file paths against `base`. Absolute paths are kept.
    pub fn rebase(&mut self, base: &Path) {
        self.manifest.path = rebase_path(base, &self.manifest.path);
        if !self.retrieval.root.is_empty() {
            self.retrieval.root = rebase_path(base, &self.retrieval.root);
        }
    }

    /// Parse configuration from a TOML string.
    pub fn parse(s: &str) -> Result<Self, ConfigError> {
        let config: IndexConfig = toml::from_str(s)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.manifest.path.trim().is_empty() {
            return Err(ConfigError::Validation(
                "manifest.path must not be empty".to_string(),
            ));
        }
        if !MANIFEST_FORMATS.contains(&self.manifest.format.as_str()) {
            return Err(ConfigError::Validation(format!(
                "manifest.format must be one of {:?}, got {:?}",
                MANIFEST_FORMATS, self.manifest.format
            )));
        }

        if !RETRIEVAL_BACKENDS.contains(&self.retrieval.backend.as_str()) {
            return Err(ConfigError::Validation(format!(
                "retrieval.backend must be one of {:?}, got {:?}",
                RETRIEVAL_BACKENDS, self.retrieval.backend
            )));
        }
        if self.retrieval.backend == "http" {
            let url = self.retrieval.base_url.as_str();
            if url.is_empty() {
                return Err(ConfigError::Validation(
                    "retrieval.base_url is required when backend is \"http\"".to_string(),
                ));
            }
            if !(url.starts_with("http://") || url.starts_with("https://")) {
                return Err(ConfigError::Validation(format!(
                    "retrieval.base_url must be an http(s) URL, got {url:?}"
                )));
            }
        }
        if self.retrieval.max_concurrent == 0 {
            return Err(ConfigError::Validation(
                "retrieval.max_concurrent must be at least 1".to_string(),
            ));
        }

        if self.logging.level.trim().is_empty() {
            return Err(ConfigError::Validation(
                "logging.level must not be empty".to_string(),
            ));
        }

        Ok(())
    }

    /// The per-document retrieval timeout, if any.
    pub fn timeout(&self) -> Option<Duration> {
        match self.retrieval.timeout_secs {
            0 => None,
            secs => Some(Duration::from_secs(secs)),
        }
    }

    /// The byte budget for budgeted loads, if any.
    pub fn byte_budget(&self) -> Option<u64> {
        match self.retrieval.max_bytes {
            0 => None,
            bytes => Some(bytes),
        }
    }

    /// Directory the "fs" backend reads documents from.
    ///
    /// Falls back to the manifest's parent directory when `retrieval.root`
    /// is unset.
    pub fn document_root(&self) -> PathBuf {
        if !self.retrieval.root.is_empty() {
            return PathBuf::from(&self.retrieval.root);
        }
        Path::new(&self.manifest.path)
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from("."))
    }
}

fn rebase_path(base: &Path, path: &str) -> String {
    base.join(path).to_string_lossy().into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    #[test]
    fn test_default_config() {
        let config = IndexConfig::default();
        assert_eq!(config.manifest.path, "references/index.toml");
        assert_eq!(config.manifest.format, "auto");
        assert_eq!(config.retrieval.backend, "fs");
        assert_eq!(config.retrieval.max_concurrent, 4);
        assert_eq!(config.logging.level, "info");
    }

    #[test]
    fn test_parse_minimal_toml() {
        let config = IndexConfig::parse("").unwrap();
        assert_eq!(config.retrieval.timeout_secs, 10);
        assert_eq!(config.timeout(), Some(Duration::from_secs(10)));
        assert_eq!(config.byte_budget(), None);
    }

    #[test]
    fn test_parse_full_toml() {
        let toml = r#"
            [manifest]
            path = "docs/SKILL.md"
            format = "markdown"

            [retrieval]
            backend = "http"
            base_url = "https://docs.example.com/bundle/"
            timeout_secs = 0
            max_concurrent = 8
            max_bytes = 65536

            [logging]
            level = "debug"
        "#;
        let config = IndexConfig::parse(toml).unwrap();
        assert_eq!(config.manifest.path, "docs/SKILL.md");
        assert_eq!(config.manifest.format, "markdown");
        assert_eq!(config.retrieval.backend, "http");
        assert_eq!(config.retrieval.max_concurrent, 8);
        assert_eq!(config.timeout(), None);
        assert_eq!(config.byte_budget(), Some(65536));
        assert_eq!(config.logging.level, "debug");
    }

    #[test]
    fn test_validation_rejects_empty_manifest_path() {
        let toml = r#"
            [manifest]
            path = ""
        "#;
        assert!(IndexConfig::parse(toml).is_err());
    }

    #[test]
    fn test_validation_rejects_unknown_format() {
        let toml = r#"
            [manifest]
            format = "yaml"
        "#;
        let err = IndexConfig::parse(toml).unwrap_err();
        assert!(err.to_string().contains("manifest.format"));
    }

    #[test]
    fn test_validation_rejects_unknown_backend() {
        let toml = r#"
            [retrieval]
            backend = "s3"
        "#;
        assert!(IndexConfig::parse(toml).is_err());
    }

    #[test]
    fn test_http_backend_requires_base_url() {
        let toml = r#"
            [retrieval]
            backend = "http"
        "#;
        let err = IndexConfig::parse(toml).unwrap_err();
        assert!(err.to_string().contains("base_url"));
    }

    #[test]
    fn test_http_backend_rejects_non_http_url() {
        let toml = r#"
            [retrieval]
            backend = "http"
            base_url = "ftp://docs.example.com"
        "#;
        assert!(IndexConfig::parse(toml).is_err());
    }

    #[test]
    fn test_validation_rejects_zero_concurrency() {
        let toml = r#"
            [retrieval]
            max_concurrent = 0
        "#;
        assert!(IndexConfig::parse(toml).is_err());
    }

    #[test]
    fn test_document_root_defaults_to_manifest_dir() {
        let config = IndexConfig::default();
        assert_eq!(config.document_root(), PathBuf::from("references"));

        let toml = r#"
            [manifest]
            path = "index.toml"
        "#;
        let config = IndexConfig::parse(toml).unwrap();
        assert_eq!(config.document_root(), PathBuf::from("."));
    }

    #[test]
    fn test_document_root_explicit() {
        let toml = r#"
            [retrieval]
            root = "/srv/docs"
        "#;
        let config = IndexConfig::parse(toml).unwrap();
        assert_eq!(config.document_root(), PathBuf::from("/srv/docs"));
    }

    // ── Async file-based loading ──────────────────────────────────────

    #[test_log::test(tokio::test)]
    async fn test_load_from_file() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("refdex.toml");
        tokio::fs::write(
            &path,
            b"[manifest]\npath = \"guide/index.json\"\n\n[retrieval]\ntimeout_secs = 3\n",
        )
        .await
        .unwrap();

        let config = IndexConfig::load(&path).await.unwrap();
        assert_eq!(
            PathBuf::from(&config.manifest.path),
            tmp.path().join("guide/index.json")
        );
        assert_eq!(config.document_root(), tmp.path().join("guide"));
        assert_eq!(config.timeout(), Some(Duration::from_secs(3)));
    }

    #[tokio::test]
    async fn test_load_rebases_root_but_keeps_absolute_paths() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("refdex.toml");
        tokio::fs::write(
            &path,
            b"[manifest]\npath = \"/srv/bundle/SKILL.md\"\n\n[retrieval]\nroot = \"docs\"\n",
        )
        .await
        .unwrap();

        let config = IndexConfig::load(&path).await.unwrap();
        assert_eq!(config.manifest.path, "/srv/bundle/SKILL.md");
        assert_eq!(config.document_root(), tmp.path().join("docs"));
    }

    #[test]
    fn test_parse_keeps_relative_paths() {
        let config = IndexConfig::parse("[manifest]\npath = \"refs/index.md\"\n").unwrap();
        assert_eq!(config.manifest.path, "refs/index.md");
    }

    #[tokio::test]
    async fn test_load_nonexistent_file() {
        let result = IndexConfig::load(Path::new("/nonexistent/refdex.toml")).await;
        assert!(matches!(result, Err(ConfigError::Io(_))));
    }

    #[tokio::test]
    async fn test_load_invalid_toml_file() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("bad.toml");
        tokio::fs::write(&path, b"not valid toml [[[").await.unwrap();

        let result = IndexConfig::load(&path).await;
        assert!(matches!(result, Err(ConfigError::Parse(_))));
    }

    #[test]
    fn test_config_error_display() {
        let err = ConfigError::Validation("bad value".to_string());
        assert_eq!(err.to_string(), "validation error: bad value");
    }

    #[test]
    fn test_serialize_round_trip() {
        let config = IndexConfig::default();
        let text = toml::to_string_pretty(&config).unwrap();
        let parsed = IndexConfig::parse(&text).unwrap();
        assert_eq!(parsed.manifest.path, config.manifest.path);
        assert_eq!(parsed.retrieval.timeout_secs, config.retrieval.timeout_secs);
    }
}
