//! Layered configuration lookup for tabula.
//!
//! [`LayeredConfig::load`] reads `~/.config/tabula/config.toml`, creating it
//! with the built-in defaults if it does not yet exist. Every setting has a
//! definition carrying its default under `[definitions]`; an installation
//! overrides it under `[values]` or through `TABULA_VALUES__<NAME>`
//! environment variables. [`LayeredConfig::defaults`] returns the built-in
//! definitions without touching the filesystem (useful in tests).

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use config::{Environment, File, FileFormat};
use serde::Deserialize;

use crate::error::ConfigError;

// ---------------------------------------------------------------------------
// Embedded defaults
// ---------------------------------------------------------------------------

const DEFAULT_CONFIG: &str = r#"
# Setting definitions and their default values. An empty value is unset.
[definitions]
search_max_records      = "500"
report_default_language = ""
store_path              = "records.json"
server_bind             = "127.0.0.1:8080"
profile_path            = ""

# Overrides for this installation, e.g.
# search_max_records = "100"
[values]
"#;

/// Names of the settings tabula itself reads.
pub mod settings {
    pub const SEARCH_MAX_RECORDS: &str = "search_max_records";
    pub const REPORT_DEFAULT_LANGUAGE: &str = "report_default_language";
    pub const STORE_PATH: &str = "store_path";
    pub const SERVER_BIND: &str = "server_bind";
    pub const PROFILE_PATH: &str = "profile_path";
}

// ---------------------------------------------------------------------------
// Lookup capability
// ---------------------------------------------------------------------------

/// Two-step named setting lookup: override value, else definition default.
pub trait ConfigLookup {
    /// Resolved value of `schema_name`, or `None` when neither layer has one.
    fn get(&self, schema_name: &str) -> Option<String>;

    fn require(&self, schema_name: &str) -> Result<String, ConfigError> {
        self.get(schema_name)
            .ok_or_else(|| ConfigError::Missing(schema_name.to_string()))
    }

    /// Parse the resolved value. Absent settings are `Ok(None)`.
    fn get_parsed<T>(&self, schema_name: &str) -> Result<Option<T>, ConfigError>
    where
        Self: Sized,
        T: FromStr,
        T::Err: std::fmt::Display,
    {
        self.get(schema_name)
            .map(|value| {
                value.trim().parse::<T>().map_err(|e| ConfigError::Invalid {
                    name: schema_name.to_string(),
                    value: value.clone(),
                    reason: e.to_string(),
                })
            })
            .transpose()
    }
}

// ---------------------------------------------------------------------------
// Layered implementation
// ---------------------------------------------------------------------------

/// Definitions plus overrides, merged from defaults, file and environment.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct LayeredConfig {
    #[serde(default)]
    definitions: HashMap<String, String>,
    #[serde(default)]
    values: HashMap<String, String>,
}

impl LayeredConfig {
    /// Load from `~/.config/tabula/config.toml`, layered on top of the
    /// built-in defaults and under the environment. Creates the file with
    /// defaults if it does not exist.
    pub fn load() -> Result<Self, ConfigError> {
        let path = config_path();

        if !path.exists() {
            let io = |source| ConfigError::Io {
                path: path.display().to_string(),
                source,
            };
            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent).map_err(io)?;
            }
            std::fs::write(&path, DEFAULT_CONFIG.trim_start()).map_err(io)?;
        }

        Self::load_from(&path)
    }

    /// Load with `path` as the user file. A missing file is not an error.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        Self::build(Some(path), env_source())
    }

    /// Return the built-in definitions without touching the filesystem or
    /// the environment.
    pub fn defaults() -> Self {
        config::Config::builder()
            .add_source(File::from_str(DEFAULT_CONFIG, FileFormat::Toml))
            .build()
            .expect("built-in default config must be valid TOML")
            .try_deserialize()
            .expect("built-in default config must deserialize correctly")
    }

    pub(crate) fn build(path: Option<&Path>, env: Environment) -> Result<Self, ConfigError> {
        let mut builder = config::Config::builder()
            .add_source(File::from_str(DEFAULT_CONFIG, FileFormat::Toml));
        if let Some(path) = path {
            builder = builder.add_source(File::from(path).required(false));
        }
        let cfg: Self = builder.add_source(env).build()?.try_deserialize()?;
        tracing::debug!(
            definitions = cfg.definitions.len(),
            overrides = cfg.values.len(),
            "configuration loaded"
        );
        Ok(cfg)
    }

    /// Set an override in memory.
    pub fn with_value(mut self, schema_name: &str, value: impl Into<String>) -> Self {
        self.values.insert(schema_name.to_string(), value.into());
        self
    }

    /// Every name that has a definition or an override, sorted.
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self
            .definitions
            .keys()
            .chain(self.values.keys())
            .map(String::as_str)
            .collect();
        names.sort_unstable();
        names.dedup();
        names
    }
}

impl ConfigLookup for LayeredConfig {
    /// Empty strings count as unset in both layers.
    fn get(&self, schema_name: &str) -> Option<String> {
        let non_empty = |v: &&String| !v.trim().is_empty();
        self.values
            .get(schema_name)
            .filter(non_empty)
            .or_else(|| self.definitions.get(schema_name).filter(non_empty))
            .cloned()
    }
}

impl<T: ConfigLookup + ?Sized> ConfigLookup for &T {
    fn get(&self, schema_name: &str) -> Option<String> {
        (**self).get(schema_name)
    }
}

// ---------------------------------------------------------------------------
// Path helpers
// ---------------------------------------------------------------------------

fn env_source() -> Environment {
    Environment::with_prefix("TABULA")
        .prefix_separator("_")
        .separator("__")
}

fn config_path() -> PathBuf {
    std::env::var("XDG_CONFIG_HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| {
            PathBuf::from(std::env::var("HOME").unwrap_or_else(|_| ".".to_string()))
                .join(".config")
        })
        .join("tabula")
        .join("config.toml")
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn env(pairs: &[(&str, &str)]) -> Environment {
        env_source().source(Some(
            pairs
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
        ))
    }

    #[test]
    fn defaults_load() {
        let cfg = LayeredConfig::defaults();
        assert_eq!(cfg.get(settings::SEARCH_MAX_RECORDS).as_deref(), Some("500"));
        assert_eq!(cfg.get(settings::SERVER_BIND).as_deref(), Some("127.0.0.1:8080"));
        assert_eq!(cfg.get_parsed::<usize>(settings::SEARCH_MAX_RECORDS).unwrap(), Some(500));
    }

    #[test]
    fn empty_definition_is_absent() {
        let cfg = LayeredConfig::defaults();
        assert_eq!(cfg.get(settings::PROFILE_PATH), None);
        assert!(matches!(
            cfg.require(settings::PROFILE_PATH),
            Err(ConfigError::Missing(_))
        ));
    }

    #[test]
    fn override_wins_over_definition() {
        let cfg = LayeredConfig::defaults().with_value(settings::SEARCH_MAX_RECORDS, "25");
        assert_eq!(cfg.get_parsed::<usize>(settings::SEARCH_MAX_RECORDS).unwrap(), Some(25));
    }

    #[test]
    fn unknown_setting_is_absent() {
        assert_eq!(LayeredConfig::defaults().get("no_such_setting"), None);
    }

    #[test]
    fn invalid_value_is_reported() {
        let cfg = LayeredConfig::defaults().with_value(settings::SEARCH_MAX_RECORDS, "lots");
        let err = cfg.get_parsed::<usize>(settings::SEARCH_MAX_RECORDS).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { .. }));
    }

    #[test]
    fn file_and_environment_layers() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(
            &path,
            "[values]\nstore_path = \"/srv/records.json\"\nserver_bind = \"0.0.0.0:9000\"\n",
        )
        .unwrap();

        let cfg = LayeredConfig::build(
            Some(&path),
            env(&[("TABULA_VALUES__SERVER_BIND", "0.0.0.0:9100")]),
        )
        .unwrap();
        assert_eq!(cfg.get(settings::STORE_PATH).as_deref(), Some("/srv/records.json"));
        assert_eq!(cfg.get(settings::SERVER_BIND).as_deref(), Some("0.0.0.0:9100"));
        assert_eq!(cfg.get(settings::REPORT_DEFAULT_LANGUAGE), None);
    }

    #[test]
    fn missing_user_file_is_fine() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = LayeredConfig::build(Some(&dir.path().join("absent.toml")), env(&[])).unwrap();
        assert_eq!(cfg.get(settings::STORE_PATH).as_deref(), Some("records.json"));
    }
}
