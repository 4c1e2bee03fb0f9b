use std::collections::BTreeMap;
use std::fs::OpenOptions;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

use clap::ValueEnum;
use log::info;
use serde::{Deserialize, Serialize};
use strum::Display;

use crate::CONFIG_FILE;
use anyhow::{Context, Result};

pub const DEFAULT_ENV_PREFIX: &str = "AIRFLOW_CONN_";

/// Expands environment variables in a string value.
/// Supports ${VAR} and $VAR syntax.
pub fn expand_env_vars(value: &str) -> Result<String> {
    shellexpand::env(value)
        .map(|s| s.into_owned())
        .map_err(|e| anyhow::anyhow!("Failed to expand environment variable in '{}': {}", value, e))
}

/// Textual form a connection is written in.
#[derive(Deserialize, Serialize, Debug, Clone, Copy, PartialEq, Default, ValueEnum, Display)]
pub enum OutputFormat {
    #[default]
    #[strum(to_string = "uri")]
    Uri,
    #[strum(to_string = "json")]
    Json,
}

#[derive(Deserialize, Serialize, Debug, Clone, Default)]
pub struct ConnrsConfig {
    /// Prefix of the environment variables holding connections.
    pub env_prefix: Option<String>,
    #[serde(default)]
    pub default_format: OutputFormat,
    /// Connection id to URI or JSON string. Values may reference
    /// environment variables, which are expanded when the connection is read.
    #[serde(default)]
    pub connections: BTreeMap<String, String>,
    #[serde(skip_serializing)]
    pub path: Option<PathBuf>,
}

impl ConnrsConfig {
    pub fn from_file(config_path: Option<&PathBuf>) -> Result<Self> {
        Self::from_file_or(config_path, CONFIG_FILE.as_path())
    }

    fn from_file_or(config_path: Option<&PathBuf>, default_path: &Path) -> Result<Self> {
        let path = config_path
            .filter(|p| p.exists())
            .cloned()
            .unwrap_or_else(|| {
                info!("Using configuration path: {}", default_path.display());
                default_path.to_path_buf()
            });

        // Only a missing file means an empty (default) config
        let toml_config = match std::fs::read_to_string(&path) {
            Ok(text) => text,
            Err(e) if e.kind() == ErrorKind::NotFound => String::new(),
            Err(e) => {
                return Err(e)
                    .with_context(|| format!("Failed to read config file {}", path.display()))
            }
        };
        let mut config = Self::from_str(&toml_config)
            .with_context(|| format!("Invalid config file {}", path.display()))?;
        config.path = Some(path);
        Ok(config)
    }

    /// Like [`Self::from_file`], but a user supplied path that does not exist
    /// yet starts out empty, so that writes land there without copying the
    /// default config.
    pub fn for_update(config_path: Option<&PathBuf>) -> Result<Self> {
        Self::for_update_or(config_path, CONFIG_FILE.as_path())
    }

    fn for_update_or(config_path: Option<&PathBuf>, default_path: &Path) -> Result<Self> {
        match config_path {
            Some(user_path) if !user_path.exists() => {
                info!("Creating new configuration at {}", user_path.display());
                Ok(Self {
                    path: Some(user_path.clone()),
                    ..Default::default()
                })
            }
            _ => Self::from_file_or(config_path, default_path),
        }
    }

    pub fn from_str(config: &str) -> Result<Self> {
        let config: ConnrsConfig = toml::from_str(config)?;
        info!(
            "Loaded config: connections={}, default_format={}",
            config.connections.len(),
            config.default_format
        );
        Ok(config)
    }

    pub fn env_prefix(&self) -> &str {
        self.env_prefix.as_deref().unwrap_or(DEFAULT_ENV_PREFIX)
    }

    pub fn to_str(&self) -> Result<String> {
        toml::to_string(self).map_err(std::convert::Into::into)
    }

    pub fn write_to_file(&self) -> Result<()> {
        let path = self
            .path
            .clone()
            .unwrap_or(CONFIG_FILE.as_path().to_path_buf());
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }

        // Stored connections usually carry passwords: rw------- on Unix
        #[cfg(unix)]
        let mut file = {
            use std::os::unix::fs::OpenOptionsExt;
            OpenOptions::new()
                .write(true)
                .truncate(true)
                .create(true)
                .mode(0o600)
                .open(&path)?
        };

        #[cfg(not(unix))]
        let mut file = OpenOptions::new()
            .write(true)
            .truncate(true)
            .create(true)
            .open(&path)?;

        file.write_all(self.to_str()?.as_bytes())?;
        info!("Wrote config to {}", path.display());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TEST_CONFIG: &str = r#"env_prefix = "MY_CONN_"
default_format = "Json"

[connections]
my_db = "postgres://user:${DB_PASS}@db:5432/app"
"#;

    #[test]
    fn test_get_config() {
        let result = ConnrsConfig::from_str(TEST_CONFIG).unwrap();
        assert_eq!(result.env_prefix(), "MY_CONN_");
        assert_eq!(result.default_format, OutputFormat::Json);
        assert_eq!(result.connections.len(), 1);
        assert_eq!(
            result.connections["my_db"],
            "postgres://user:${DB_PASS}@db:5432/app"
        );
    }

    #[test]
    fn test_empty_config_uses_defaults() {
        let result = ConnrsConfig::from_str("").unwrap();
        assert_eq!(result.env_prefix(), DEFAULT_ENV_PREFIX);
        assert_eq!(result.default_format, OutputFormat::Uri);
        assert!(result.connections.is_empty());
    }

    #[test]
    fn test_write_config() {
        let mut config = ConnrsConfig {
            env_prefix: Some("MY_CONN_".to_string()),
            default_format: OutputFormat::Json,
            ..Default::default()
        };
        config.connections.insert(
            "my_db".to_string(),
            "postgres://user:${DB_PASS}@db:5432/app".to_string(),
        );

        let serialized_config = config.to_str().unwrap();
        assert_eq!(serialized_config.trim(), TEST_CONFIG.trim());
    }

    #[test]
    fn test_invalid_format_is_rejected() {
        assert!(ConnrsConfig::from_str(r#"default_format = "Yaml""#).is_err());
    }

    fn temp_dir(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("connrs-{name}-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        dir
    }

    #[test]
    fn non_existing_path_falls_back_to_default() {
        let dir = temp_dir("fallback");
        let default_path = dir.join("default.toml");
        std::fs::write(&default_path, "[connections]\nshared = \"http://h\"\n").unwrap();

        let missing = dir.join("non-existing.toml");
        let config = ConnrsConfig::from_file_or(Some(&missing), &default_path).unwrap();
        assert_eq!(config.path, Some(default_path));
        assert_eq!(config.connections["shared"], "http://h");
        std::fs::remove_dir_all(dir).unwrap();
    }

    #[test]
    fn missing_default_file_is_empty() {
        let dir = temp_dir("missing-default");
        let default_path = dir.join("config.toml");
        let config = ConnrsConfig::from_file_or(None, &default_path).unwrap();
        assert!(config.connections.is_empty());
        assert_eq!(config.path, Some(default_path));
        std::fs::remove_dir_all(dir).unwrap();
    }

    #[test]
    fn for_update_starts_new_file_empty() {
        let dir = temp_dir("for-update");
        let default_path = dir.join("default.toml");
        std::fs::write(
            &default_path,
            "[connections]\nsecret_db = \"pg://u:hunter2@h\"\n",
        )
        .unwrap();

        let fresh = dir.join("fresh.toml");
        let config = ConnrsConfig::for_update_or(Some(&fresh), &default_path).unwrap();
        assert_eq!(config.path, Some(fresh));
        assert!(config.connections.is_empty());

        let config = ConnrsConfig::for_update_or(None, &default_path).unwrap();
        assert_eq!(config.path, Some(default_path));
        assert_eq!(config.connections.len(), 1);
        std::fs::remove_dir_all(dir).unwrap();
    }

    #[test]
    fn unreadable_config_is_an_error() {
        let dir = temp_dir("unreadable");
        let path = dir.join("config.toml");
        std::fs::write(&path, b"[connections]\nkeep = \"http://h\"\n\xff\n").unwrap();

        let err = ConnrsConfig::from_file(Some(&path)).unwrap_err();
        assert!(format!("{err:#}").contains("config.toml"), "{err:#}");
        assert!(ConnrsConfig::for_update(Some(&path)).is_err());

        // A directory exists but cannot be read as a file
        assert!(ConnrsConfig::from_file(Some(&dir)).is_err());
        std::fs::remove_dir_all(dir).unwrap();
    }

    #[test]
    fn write_and_read_back() {
        let path = std::env::temp_dir()
            .join(format!("connrs-test-{}", std::process::id()))
            .join("config.toml");
        let mut config = ConnrsConfig {
            path: Some(path.clone()),
            ..Default::default()
        };
        config
            .connections
            .insert("api".to_string(), "http://api.example.com".to_string());
        config.write_to_file().unwrap();

        let read_back = ConnrsConfig::from_file(Some(&path)).unwrap();
        assert_eq!(read_back.connections, config.connections);

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let mode = std::fs::metadata(&path).unwrap().permissions().mode();
            assert_eq!(mode & 0o777, 0o600);
        }
        std::fs::remove_dir_all(path.parent().unwrap()).unwrap();
    }

    #[test]
    fn test_expand_env_vars() {
        std::env::set_var("CONNRS_TEST_EXPAND", "secret");
        assert_eq!(
            expand_env_vars("pg://u:${CONNRS_TEST_EXPAND}@h").unwrap(),
            "pg://u:secret@h"
        );
        assert!(expand_env_vars("${CONNRS_TEST_SURELY_UNSET_VAR}").is_err());
    }
}
