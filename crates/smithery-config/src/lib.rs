//! Layered configuration for smithery-rs.
//!
//! Reads configuration from multiple sources with precedence:
//! CLI flags > env vars > config file > defaults

use serde::{Deserialize, Serialize};
use smithery_core::{DEFAULT_REGISTRY_URL, DEFAULT_SERVER_HOST};
use std::path::{Path, PathBuf};
use thiserror::Error;

pub const API_KEY_ENV: &str = "SMITHERY_API_KEY";
pub const REGISTRY_URL_ENV: &str = "SMITHERY_REGISTRY_URL";
pub const VERBOSE_ENV: &str = "SMITHERY_VERBOSE";
pub const CONFIG_DIR_ENV: &str = "SMITHERY_CONFIG_DIR";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required setting: {key}")]
    MissingKey { key: String },
}

/// Resolved configuration for a smithery run.
#[derive(Clone)]
pub struct SmitheryConfig {
    pub api_key: String,
    pub registry_url: String,
    pub server_host: String,
    pub verbose: bool,
    pub config_dir: PathBuf,
}

impl std::fmt::Debug for SmitheryConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SmitheryConfig")
            .field("api_key", &smithery_core::redact(&self.api_key, &self.api_key))
            .field("registry_url", &self.registry_url)
            .field("server_host", &self.server_host)
            .field("verbose", &self.verbose)
            .field("config_dir", &self.config_dir)
            .finish()
    }
}

/// Settings that can be read from `config.toml`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SettingsFile {
    #[serde(default)]
    pub api: ApiSettings,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ApiSettings {
    pub api_key: Option<String>,
    pub registry_url: Option<String>,
    pub server_host: Option<String>,
    pub verbose: Option<bool>,
}

/// CLI overrides that take highest precedence.
#[derive(Debug, Clone, Default)]
pub struct CliOverrides {
    pub api_key: Option<String>,
    pub verbose: bool,
}

impl SmitheryConfig {
    /// Load configuration from the process environment and `~/.smithery/config.toml`.
    ///
    /// Precedence (highest to lowest):
    /// 1. CLI flags
    /// 2. Environment variables
    /// 3. Config file (`$SMITHERY_CONFIG_DIR/config.toml` or `~/.smithery/config.toml`)
    /// 4. Defaults
    pub fn load(overrides: CliOverrides) -> Result<Self, ConfigError> {
        Self::load_from(overrides, config_dir(), |key| std::env::var(key).ok())
    }

    /// Same as [`load`](Self::load) with an explicit config directory and
    /// environment lookup.
    pub fn load_from(
        overrides: CliOverrides,
        config_dir: PathBuf,
        env: impl Fn(&str) -> Option<String>,
    ) -> Result<Self, ConfigError> {
        let settings = load_settings_file(&config_dir.join("config.toml"));

        // Resolve API key: CLI > env > config file
        let api_key = overrides
            .api_key
            .or_else(|| env(API_KEY_ENV))
            .or(settings.api.api_key)
            .filter(|key| !key.trim().is_empty())
            .ok_or_else(|| ConfigError::MissingKey {
                key: format!("api_key (pass --api-key, set {API_KEY_ENV} or add it to config.toml)"),
            })?;

        let registry_url = env(REGISTRY_URL_ENV)
            .or(settings.api.registry_url)
            .unwrap_or_else(|| DEFAULT_REGISTRY_URL.to_string());

        let server_host = settings
            .api
            .server_host
            .unwrap_or_else(|| DEFAULT_SERVER_HOST.to_string());

        let verbose = overrides.verbose
            || env(VERBOSE_ENV).is_some_and(|v| is_truthy(&v))
            || settings.api.verbose.unwrap_or(false);

        Ok(SmitheryConfig {
            api_key,
            registry_url,
            server_host,
            verbose,
            config_dir,
        })
    }
}

/// Get the smithery config directory path (~/.smithery/).
pub fn config_dir() -> PathBuf {
    if let Ok(dir) = std::env::var(CONFIG_DIR_ENV) {
        return PathBuf::from(dir);
    }
    dirs_next::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".smithery")
}

fn is_truthy(value: &str) -> bool {
    matches!(
        value.trim().to_ascii_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}

/// Load and parse a TOML settings file, returning defaults on any error.
fn load_settings_file(path: &Path) -> SettingsFile {
    match std::fs::read_to_string(path) {
        Ok(content) => toml::from_str(&content).unwrap_or_else(|e| {
            tracing::warn!("Failed to parse {}: {}", path.display(), e);
            SettingsFile::default()
        }),
        Err(_) => SettingsFile::default(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn no_env(_: &str) -> Option<String> {
        None
    }

    fn write_config(dir: &Path, body: &str) {
        std::fs::write(dir.join("config.toml"), body).unwrap();
    }

    #[test]
    fn test_settings_toml_parse() {
        let toml_str = r#"
[api]
api_key = "from-file"
registry_url = "http://localhost:4000"
verbose = true
"#;
        let settings: SettingsFile = toml::from_str(toml_str).unwrap();
        assert_eq!(settings.api.api_key.as_deref(), Some("from-file"));
        assert_eq!(settings.api.registry_url.as_deref(), Some("http://localhost:4000"));
        assert_eq!(settings.api.verbose, Some(true));
        assert!(settings.api.server_host.is_none());
    }

    #[test]
    fn test_defaults_when_only_key_given() {
        let dir = tempfile::tempdir().unwrap();
        let overrides = CliOverrides {
            api_key: Some("cli-key".into()),
            verbose: false,
        };
        let config = SmitheryConfig::load_from(overrides, dir.path().to_path_buf(), no_env).unwrap();
        assert_eq!(config.api_key, "cli-key");
        assert_eq!(config.registry_url, DEFAULT_REGISTRY_URL);
        assert_eq!(config.server_host, DEFAULT_SERVER_HOST);
        assert!(!config.verbose);
    }

    #[test]
    fn test_missing_key_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = SmitheryConfig::load_from(CliOverrides::default(), dir.path().to_path_buf(), no_env)
            .unwrap_err();
        assert!(err.to_string().contains(API_KEY_ENV));
    }

    #[test]
    fn test_blank_key_counts_as_missing() {
        let dir = tempfile::tempdir().unwrap();
        let overrides = CliOverrides {
            api_key: Some("  ".into()),
            verbose: false,
        };
        assert!(SmitheryConfig::load_from(overrides, dir.path().to_path_buf(), no_env).is_err());
    }

    #[test]
    fn test_precedence_cli_over_env_over_file() {
        let dir = tempfile::tempdir().unwrap();
        write_config(
            dir.path(),
            "[api]\napi_key = \"file-key\"\nregistry_url = \"http://file\"\nserver_host = \"file.test\"\n",
        );
        let env: HashMap<&str, &str> =
            HashMap::from([(API_KEY_ENV, "env-key"), (REGISTRY_URL_ENV, "http://env")]);
        let lookup = |k: &str| env.get(k).map(|v| v.to_string());

        let config =
            SmitheryConfig::load_from(CliOverrides::default(), dir.path().to_path_buf(), lookup)
                .unwrap();
        assert_eq!(config.api_key, "env-key");
        assert_eq!(config.registry_url, "http://env");
        assert_eq!(config.server_host, "file.test");

        let overrides = CliOverrides {
            api_key: Some("cli-key".into()),
            verbose: false,
        };
        let config = SmitheryConfig::load_from(overrides, dir.path().to_path_buf(), lookup).unwrap();
        assert_eq!(config.api_key, "cli-key");
    }

    #[test]
    fn test_verbose_from_env_or_file() {
        let dir = tempfile::tempdir().unwrap();
        write_config(dir.path(), "[api]\napi_key = \"k\"\n");
        let config = SmitheryConfig::load_from(CliOverrides::default(), dir.path().to_path_buf(), |k| {
            (k == VERBOSE_ENV).then(|| "yes".to_string())
        })
        .unwrap();
        assert!(config.verbose);

        write_config(dir.path(), "[api]\napi_key = \"k\"\nverbose = true\n");
        let config =
            SmitheryConfig::load_from(CliOverrides::default(), dir.path().to_path_buf(), no_env)
                .unwrap();
        assert!(config.verbose);
    }

    #[test]
    fn test_malformed_file_falls_back_to_defaults() {
        let dir = tempfile::tempdir().unwrap();
        write_config(dir.path(), "[api\napi_key = ");
        let overrides = CliOverrides {
            api_key: Some("k".into()),
            verbose: false,
        };
        let config = SmitheryConfig::load_from(overrides, dir.path().to_path_buf(), no_env).unwrap();
        assert_eq!(config.registry_url, DEFAULT_REGISTRY_URL);
    }

    #[test]
    fn test_debug_hides_key() {
        let dir = tempfile::tempdir().unwrap();
        let overrides = CliOverrides {
            api_key: Some("very-secret".into()),
            verbose: false,
        };
        let config = SmitheryConfig::load_from(overrides, dir.path().to_path_buf(), no_env).unwrap();
        assert!(!format!("{config:?}").contains("very-secret"));
    }
}
