//! Configuration file handling
//!
//! ```toml
//! data_dir = "/home/me/.fx-ratecache/data"
//! ttl_secs = 3600
//! request_timeout_secs = 30
//!
//! [provider]
//! kind = "exchange-api"            # or "chat-completion", "in-memory"
//! base_url = "https://open.er-api.com/v6"
//! api_key_env = "OPENAI_API_KEY"   # chat-completion only
//! model = "gpt-4o-mini"            # chat-completion only
//! rates_csv = "rates.csv"          # in-memory only
//! ```

use crate::data::fx::DEFAULT_TTL_SECS;
use crate::error::{RateCacheError, Result};
use crate::storage::FileStore;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

const APP_DIR: &str = ".fx-ratecache";

/// Top-level configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FxConfig {
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,
    #[serde(default = "default_ttl_secs")]
    pub ttl_secs: i64,
    #[serde(default = "default_timeout_secs")]
    pub request_timeout_secs: u64,
    #[serde(default)]
    pub provider: ProviderConfig,
}

/// Which rate source to use and how to reach it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProviderConfig {
    #[serde(default)]
    pub kind: ProviderKind,
    #[serde(default)]
    pub base_url: Option<String>,
    #[serde(default = "default_api_key_env")]
    pub api_key_env: String,
    #[serde(default)]
    pub model: Option<String>,
    #[serde(default)]
    pub rates_csv: Option<PathBuf>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ProviderKind {
    #[default]
    ExchangeApi,
    ChatCompletion,
    InMemory,
}

fn app_dir() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(APP_DIR)
}

fn default_data_dir() -> PathBuf {
    app_dir().join("data")
}

fn default_ttl_secs() -> i64 {
    DEFAULT_TTL_SECS
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_api_key_env() -> String {
    "OPENAI_API_KEY".to_string()
}

/// Default configuration file location (`~/.fx-ratecache/config.toml`)
pub fn default_config_path() -> PathBuf {
    app_dir().join("config.toml")
}

impl Default for FxConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            ttl_secs: default_ttl_secs(),
            request_timeout_secs: default_timeout_secs(),
            provider: ProviderConfig::default(),
        }
    }
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            kind: ProviderKind::default(),
            base_url: None,
            api_key_env: default_api_key_env(),
            model: None,
            rates_csv: None,
        }
    }
}

impl FxConfig {
    /// Parse and validate a TOML document
    pub fn from_toml_str(contents: &str) -> Result<Self> {
        let config: FxConfig = toml::from_str(contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration, falling back to defaults
    ///
    /// With no explicit path the default location is tried. A missing file
    /// yields defaults silently; an unreadable or invalid one is logged and
    /// also yields defaults.
    pub fn load(path: Option<&Path>) -> Self {
        let config_path = match path {
            Some(path) => path.to_path_buf(),
            None => default_config_path(),
        };

        if !config_path.exists() {
            if path.is_some() {
                log::warn!("Config file {} not found; using defaults", config_path.display());
            }
            return FxConfig::default();
        }

        let loaded = fs::read_to_string(&config_path)
            .map_err(RateCacheError::from)
            .and_then(|contents| Self::from_toml_str(&contents));
        match loaded {
            Ok(config) => {
                log::debug!("Loaded config from {}", config_path.display());
                config
            }
            Err(e) => {
                log::warn!("Failed to load config {}: {}", config_path.display(), e);
                FxConfig::default()
            }
        }
    }

    fn validate(&self) -> Result<()> {
        if self.ttl_secs <= 0 {
            return Err(RateCacheError::Config(format!(
                "ttl_secs must be positive, got {}",
                self.ttl_secs
            )));
        }
        if self.request_timeout_secs == 0 {
            return Err(RateCacheError::Config(
                "request_timeout_secs must be positive".to_string(),
            ));
        }
        Ok(())
    }

    pub fn ttl(&self) -> chrono::Duration {
        chrono::Duration::seconds(self.ttl_secs)
    }

    /// Open the file store under `data_dir`
    pub fn open_store(&self) -> Result<FileStore> {
        FileStore::open(&self.data_dir)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::{tempdir, NamedTempFile};

    #[test]
    fn test_defaults() {
        let config = FxConfig::default();
        assert_eq!(config.ttl_secs, 3600);
        assert_eq!(config.provider.kind, ProviderKind::ExchangeApi);
        assert!(config.data_dir.ends_with("data"));
    }

    #[test]
    fn test_parse_partial_document() {
        let config = FxConfig::from_toml_str(
            r#"
            ttl_secs = 600

            [provider]
            kind = "chat-completion"
            model = "gpt-4o"
            "#,
        )
        .unwrap();

        assert_eq!(config.ttl(), chrono::Duration::minutes(10));
        assert_eq!(config.request_timeout_secs, 30);
        assert_eq!(config.provider.kind, ProviderKind::ChatCompletion);
        assert_eq!(config.provider.model.as_deref(), Some("gpt-4o"));
        assert_eq!(config.provider.api_key_env, "OPENAI_API_KEY");
    }

    #[test]
    fn test_rejects_invalid_values() {
        assert!(matches!(
            FxConfig::from_toml_str("ttl_secs = 0"),
            Err(RateCacheError::Config(_))
        ));
        assert!(matches!(
            FxConfig::from_toml_str("[provider]\nkind = \"carrier-pigeon\""),
            Err(RateCacheError::Config(_))
        ));
    }

    #[test]
    fn test_load_explicit_file() {
        let dir = tempdir().unwrap();
        let mut file = NamedTempFile::new().unwrap();
        writeln!(
            file,
            "data_dir = {:?}\n[provider]\nkind = \"in-memory\"\nrates_csv = \"rates.csv\"",
            dir.path().display().to_string()
        )
        .unwrap();

        let config = FxConfig::load(Some(file.path()));
        assert_eq!(config.data_dir, dir.path());
        assert_eq!(config.provider.kind, ProviderKind::InMemory);

        let store = config.open_store().unwrap();
        assert_eq!(store.dir(), dir.path());
    }

    #[test]
    fn test_load_invalid_file_falls_back() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "ttl_secs = \"soon\"").unwrap();

        assert_eq!(FxConfig::load(Some(file.path())), FxConfig::default());
    }

    #[test]
    fn test_load_missing_file_falls_back() {
        let dir = tempdir().unwrap();
        let config = FxConfig::load(Some(&dir.path().join("absent.toml")));
        assert_eq!(config, FxConfig::default());
    }
}
