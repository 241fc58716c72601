//! Configuration loading for the catalog service.
//!
//! Precedence, lowest first: built-in defaults, YAML file, `CATALOG_*`
//! environment variables, command-line flags.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tracing::{info, warn};

use catalog::CatalogConfig;

pub fn load_config(
    path: Option<&Path>,
    base_url: Option<String>,
    mirror_dir: Option<PathBuf>,
) -> Result<CatalogConfig> {
    let mut config = match path {
        Some(path) if path.exists() => {
            info!(path = %path.display(), "Loading catalog config");
            CatalogConfig::from_yaml_file(path)
                .with_context(|| format!("loading {}", path.display()))?
        }
        Some(path) => {
            warn!(path = %path.display(), "Config file not found, using defaults");
            CatalogConfig::default()
        }
        None => CatalogConfig::default(),
    };

    config
        .apply_env()
        .context("applying CATALOG_* environment overrides")?;

    if let Some(url) = base_url {
        config.base_url = url;
    }
    if let Some(dir) = mirror_dir {
        config.mirror_dir = Some(dir);
    }

    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_flags_override_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "base_url: http://archive.test\nmax_concurrent_fetches: 2").unwrap();

        let config = load_config(
            Some(file.path()),
            Some("http://flag.test".to_string()),
            Some(PathBuf::from("/srv/mirror")),
        )
        .unwrap();

        assert_eq!(config.base_url, "http://flag.test");
        assert_eq!(config.mirror_dir, Some(PathBuf::from("/srv/mirror")));
        assert_eq!(config.max_concurrent_fetches, 2);
    }

    #[test]
    fn test_missing_file_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = load_config(Some(&dir.path().join("absent.yaml")), None, None).unwrap();
        assert_eq!(config.earliest_date, catalog::DEFAULT_EARLIEST_DATE);
    }

    #[test]
    fn test_bad_yaml_is_an_error() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "max_concurrent_fetches: [1, 2]").unwrap();
        assert!(load_config(Some(file.path()), None, None).is_err());
    }
}
