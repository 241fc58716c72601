//! Catalog configuration.
//!
//! Defaults can be overridden by a YAML file and then by `CATALOG_*`
//! environment variables.

use std::env;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::debug;

use catalog_common::{parse_calendar_date, DateValue};

/// Earliest date for which the archive has imagery.
pub const DEFAULT_EARLIEST_DATE: &str = "20141119";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config file {path}: {source}")]
    Yaml {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("Invalid value for {key}: {message}")]
    Invalid { key: &'static str, message: String },
}

/// Top-level catalog configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CatalogConfig {
    /// Base URL of the image host; index files live under `{base_url}/data/`.
    pub base_url: String,

    /// Read index files from a local mirror instead of over HTTP.
    pub mirror_dir: Option<PathBuf>,

    /// Earliest accepted start date (`YYYYMMDD`).
    pub earliest_date: String,

    /// HTTP request timeout in seconds.
    pub request_timeout_secs: u64,

    /// HTTP connect timeout in seconds.
    pub connect_timeout_secs: u64,

    /// Maximum number of month indexes fetched at once per query.
    pub max_concurrent_fetches: usize,
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8000".to_string(),
            mirror_dir: None,
            earliest_date: DEFAULT_EARLIEST_DATE.to_string(),
            request_timeout_secs: 30,
            connect_timeout_secs: 10,
            max_concurrent_fetches: 4,
        }
    }
}

impl CatalogConfig {
    /// Load configuration from a YAML file. Missing keys take defaults.
    pub fn from_yaml_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        debug!(path = %path.display(), "Loaded catalog config file");
        Self::from_yaml_str(&contents).map_err(|source| ConfigError::Yaml {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn from_yaml_str(contents: &str) -> Result<Self, serde_yaml::Error> {
        serde_yaml::from_str(contents)
    }

    /// Defaults with environment overrides applied.
    pub fn from_env() -> Result<Self, ConfigError> {
        let mut config = Self::default();
        config.apply_env()?;
        Ok(config)
    }

    /// Override fields from `CATALOG_*` environment variables.
    pub fn apply_env(&mut self) -> Result<(), ConfigError> {
        if let Ok(url) = env::var("CATALOG_BASE_URL") {
            self.base_url = url;
        }
        if let Ok(dir) = env::var("CATALOG_MIRROR_DIR") {
            self.mirror_dir = Some(PathBuf::from(dir));
        }
        if let Ok(date) = env::var("CATALOG_EARLIEST_DATE") {
            self.earliest_date = date;
        }
        if let Ok(v) = env::var("CATALOG_REQUEST_TIMEOUT_SECS") {
            self.request_timeout_secs = parse_env("CATALOG_REQUEST_TIMEOUT_SECS", &v)?;
        }
        if let Ok(v) = env::var("CATALOG_CONNECT_TIMEOUT_SECS") {
            self.connect_timeout_secs = parse_env("CATALOG_CONNECT_TIMEOUT_SECS", &v)?;
        }
        if let Ok(v) = env::var("CATALOG_MAX_CONCURRENT_FETCHES") {
            self.max_concurrent_fetches = parse_env("CATALOG_MAX_CONCURRENT_FETCHES", &v)?;
        }
        Ok(())
    }

    /// Check cross-field constraints and return the parsed earliest date.
    pub fn validate(&self) -> Result<DateValue, ConfigError> {
        if self.max_concurrent_fetches == 0 {
            return Err(ConfigError::Invalid {
                key: "max_concurrent_fetches",
                message: "must be at least 1".to_string(),
            });
        }
        if self.mirror_dir.is_none() && self.base_url.trim().is_empty() {
            return Err(ConfigError::Invalid {
                key: "base_url",
                message: "must not be empty".to_string(),
            });
        }
        parse_calendar_date(&self.earliest_date).ok_or_else(|| ConfigError::Invalid {
            key: "earliest_date",
            message: format!("'{}' is not a valid YYYYMMDD date", self.earliest_date),
        })
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }
}

fn parse_env<T: std::str::FromStr>(key: &'static str, value: &str) -> Result<T, ConfigError> {
    value.trim().parse().map_err(|_| ConfigError::Invalid {
        key,
        message: format!("'{}' is not a valid number", value),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_validate() {
        let config = CatalogConfig::default();
        let earliest = config.validate().unwrap();
        assert_eq!(earliest.to_string(), DEFAULT_EARLIEST_DATE);
        assert_eq!(config.request_timeout(), Duration::from_secs(30));
    }

    #[test]
    fn test_yaml_partial_override() {
        let config = CatalogConfig::from_yaml_str(
            "base_url: https://images.example.org\nmax_concurrent_fetches: 2\n",
        )
        .unwrap();
        assert_eq!(config.base_url, "https://images.example.org");
        assert_eq!(config.max_concurrent_fetches, 2);
        assert_eq!(config.earliest_date, DEFAULT_EARLIEST_DATE);
        assert!(config.mirror_dir.is_none());
    }

    #[test]
    fn test_yaml_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("catalog.yaml");
        std::fs::write(&path, "mirror_dir: /srv/mirror\nearliest_date: \"20150101\"\n").unwrap();
        let config = CatalogConfig::from_yaml_file(&path).unwrap();
        assert_eq!(config.mirror_dir, Some(PathBuf::from("/srv/mirror")));
        assert_eq!(config.validate().unwrap().to_string(), "20150101");
    }

    #[test]
    fn test_env_connect_timeout() {
        env::set_var("CATALOG_CONNECT_TIMEOUT_SECS", "7");
        let config = CatalogConfig::from_env().unwrap();
        assert_eq!(config.connect_timeout(), Duration::from_secs(7));

        env::set_var("CATALOG_CONNECT_TIMEOUT_SECS", "soon");
        let err = CatalogConfig::from_env().unwrap_err();
        env::remove_var("CATALOG_CONNECT_TIMEOUT_SECS");
        assert!(matches!(
            err,
            ConfigError::Invalid {
                key: "CATALOG_CONNECT_TIMEOUT_SECS",
                ..
            }
        ));
    }

    #[test]
    fn test_missing_file() {
        let err = CatalogConfig::from_yaml_file("/nonexistent/catalog.yaml").unwrap_err();
        assert!(matches!(err, ConfigError::Read { .. }));
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let config = CatalogConfig {
            earliest_date: "20141131".to_string(),
            ..CatalogConfig::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::Invalid { key: "earliest_date", .. })
        ));

        let config = CatalogConfig {
            max_concurrent_fetches: 0,
            ..CatalogConfig::default()
        };
        assert!(config.validate().is_err());
    }
}
