//! Configuration settings for cineload.

use serde::{Deserialize, Serialize};
use std::num::NonZeroUsize;
use std::path::PathBuf;

use crate::error::{CineloadError, Result};

/// Environment variable holding the Pinecone API key.
pub const API_KEY_ENV: &str = "PINECONE_API_KEY";

/// Root configuration structure.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
#[derive(Default)]
pub struct Settings {
    pub general: GeneralSettings,
    pub index: IndexSettings,
    pub ingest: IngestSettings,
}

/// General application settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralSettings {
    /// Log level used when no -v flag is given (trace, debug, info, warn, error).
    pub log_level: String,
}

impl Default for GeneralSettings {
    fn default() -> Self {
        Self {
            log_level: "warn".to_string(),
        }
    }
}

/// Remote index settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct IndexSettings {
    /// Name of the index to write into.
    pub name: String,
    /// Namespace inside the index.
    pub namespace: String,
    /// Data-plane host. Resolved through the control plane when unset.
    pub host: Option<String>,
    /// Control-plane base URL.
    pub control_plane_url: String,
    /// Value sent in the X-Pinecone-API-Version header.
    pub api_version: String,
    /// Request timeout in seconds.
    pub timeout_secs: u64,
}

impl Default for IndexSettings {
    fn default() -> Self {
        Self {
            name: "imdb-movies".to_string(),
            namespace: "movies".to_string(),
            host: None,
            control_plane_url: "https://api.pinecone.io".to_string(),
            api_version: "2025-01".to_string(),
            timeout_secs: 60,
        }
    }
}

/// Ingestion pipeline settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct IngestSettings {
    /// Maximum number of documents per upsert call.
    pub batch_size: usize,
    /// Number of rows to read from the input (0 reads every row).
    pub limit: usize,
    /// Input column holding the unique row identifier.
    pub id_column: String,
    /// Metadata key the identifier is copied to.
    pub id_metadata_key: String,
    /// Record field the index embeds.
    pub text_field: String,
}

impl Default for IngestSettings {
    fn default() -> Self {
        Self {
            batch_size: 50,
            limit: 100,
            id_column: "imdb_title_id".to_string(),
            id_metadata_key: "imdb_id".to_string(),
            text_field: "text".to_string(),
        }
    }
}

impl IngestSettings {
    /// Batch size as a non-zero count.
    pub fn batch_size(&self) -> Result<NonZeroUsize> {
        NonZeroUsize::new(self.batch_size)
            .ok_or_else(|| CineloadError::Config("ingest.batch_size must be at least 1".to_string()))
    }

    /// Row limit, `None` when every row should be read.
    pub fn row_limit(&self) -> Option<usize> {
        (self.limit > 0).then_some(self.limit)
    }
}

impl Settings {
    /// Load settings from the default configuration file.
    pub fn load() -> Result<Self> {
        Self::load_from(None)
    }

    /// Load settings from a specific path, or default location if None.
    pub fn load_from(path: Option<&PathBuf>) -> Result<Self> {
        let config_path = match path {
            Some(p) => p.clone(),
            None => Self::default_config_path(),
        };

        if config_path.exists() {
            let content = std::fs::read_to_string(&config_path)?;
            let settings: Settings = toml::from_str(&content)?;
            Ok(settings)
        } else {
            Ok(Settings::default())
        }
    }

    /// Save settings to a specific path.
    pub fn save_to(&self, path: &PathBuf) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content =
            toml::to_string_pretty(self).map_err(|e| CineloadError::Config(e.to_string()))?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Get the default configuration file path.
    pub fn default_config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("cineload")
            .join("config.toml")
    }

    /// Expand shell variables in paths (e.g., ~).
    pub fn expand_path(path: &str) -> PathBuf {
        PathBuf::from(shellexpand::tilde(path).to_string())
    }

    /// Reject settings the pipeline cannot run with.
    pub fn validate(&self) -> Result<()> {
        self.ingest.batch_size()?;

        if self.index.name.trim().is_empty() {
            return Err(CineloadError::Config("index.name must not be empty".to_string()));
        }
        if self.index.namespace.trim().is_empty() {
            return Err(CineloadError::Config(
                "index.namespace must not be empty".to_string(),
            ));
        }
        if self.ingest.id_column.trim().is_empty() {
            return Err(CineloadError::Config(
                "ingest.id_column must not be empty".to_string(),
            ));
        }
        if self.index.timeout_secs == 0 {
            return Err(CineloadError::Config(
                "index.timeout_secs must be at least 1".to_string(),
            ));
        }
        Ok(())
    }

    /// Read the API key from the environment.
    pub fn api_key() -> Result<String> {
        match std::env::var(API_KEY_ENV) {
            Ok(key) if !key.trim().is_empty() => Ok(key),
            Ok(_) => Err(CineloadError::Config(format!("{} is empty", API_KEY_ENV))),
            Err(_) => Err(CineloadError::Config(format!(
                "{} environment variable is not set",
                API_KEY_ENV
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let settings = Settings::default();
        assert_eq!(settings.ingest.batch_size, 50);
        assert_eq!(settings.ingest.limit, 100);
        assert_eq!(settings.index.name, "imdb-movies");
        assert_eq!(settings.index.namespace, "movies");
        assert!(settings.validate().is_ok());
    }

    #[test]
    fn test_zero_batch_size_rejected() {
        let mut settings = Settings::default();
        settings.ingest.batch_size = 0;
        assert!(matches!(settings.validate(), Err(CineloadError::Config(_))));
    }

    #[test]
    fn test_empty_namespace_rejected() {
        let mut settings = Settings::default();
        settings.index.namespace = "  ".to_string();
        assert!(settings.validate().is_err());
    }

    #[test]
    fn test_row_limit() {
        let mut ingest = IngestSettings::default();
        assert_eq!(ingest.row_limit(), Some(100));
        ingest.limit = 0;
        assert_eq!(ingest.row_limit(), None);
    }

    #[test]
    fn test_partial_toml_uses_defaults() {
        let settings: Settings = toml::from_str(
            r#"
            [index]
            name = "films"

            [ingest]
            batch_size = 10
            "#,
        )
        .unwrap();

        assert_eq!(settings.index.name, "films");
        assert_eq!(settings.index.namespace, "movies");
        assert_eq!(settings.ingest.batch_size, 10);
        assert_eq!(settings.ingest.id_column, "imdb_title_id");
    }

    #[test]
    fn test_save_and_load_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");

        let mut settings = Settings::default();
        settings.index.host = Some("https://movies-abc.svc.pinecone.io".to_string());
        settings.save_to(&path).unwrap();

        let loaded = Settings::load_from(Some(&path)).unwrap();
        assert_eq!(loaded.index.host, settings.index.host);
    }

    #[test]
    fn test_missing_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("absent.toml");
        let loaded = Settings::load_from(Some(&path)).unwrap();
        assert_eq!(loaded.ingest.batch_size, 50);
    }
}
