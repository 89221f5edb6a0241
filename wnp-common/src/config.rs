//! Settings loading and config file resolution
//!
//! Settings are a read-only key lookup. A TOML file is flattened so that
//! `[recognition] replaceartist = true` becomes the key `recognition/replaceartist`.
//!
//! # Settings Sources Priority
//!
//! 1. Environment overrides (`WNP_<SECTION>__<KEY>`)
//! 2. TOML configuration file
//! 3. Built-in defaults (missing keys read as `false` / `None` / empty)

use crate::{Error, Result};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Environment variable naming the config file
pub const CONFIG_ENV_VAR: &str = "WNP_CONFIG";

/// Prefix for per-key environment overrides
pub const ENV_OVERRIDE_PREFIX: &str = "WNP_";

/// Logging configuration (`[logging]` table)
#[derive(Debug, Clone)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    pub level: String,

    /// Log file path (optional, logs to stderr if not specified)
    pub file: Option<PathBuf>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            file: None,
        }
    }
}

/// Process-wide, read-only settings store
#[derive(Debug, Clone, Default)]
pub struct Settings {
    values: HashMap<String, toml::Value>,
}

impl Settings {
    /// Empty settings (every lookup falls back to its default)
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse settings from TOML text
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let table: toml::Table = toml::from_str(content)?;
        let mut values = HashMap::new();
        flatten_table("", &table, &mut values);
        Ok(Self { values })
    }

    /// Load settings from a TOML file
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("Read {} failed: {}", path.display(), e)))?;
        let settings = Self::from_toml_str(&content)?;
        info!(path = %path.display(), keys = settings.values.len(), "Loaded settings");
        Ok(settings)
    }

    /// Load settings, degrading to defaults when the file is missing or invalid
    ///
    /// Environment overrides are applied in both cases.
    pub fn load_or_default(path: Option<&Path>) -> Self {
        let settings = match path {
            Some(path) => match Self::load(path) {
                Ok(settings) => settings,
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "Settings unavailable, using defaults");
                    Self::default()
                }
            },
            None => {
                debug!("No config file found, using defaults");
                Self::default()
            }
        };
        settings.with_env_overrides(ENV_OVERRIDE_PREFIX)
    }

    /// Apply `<PREFIX><SECTION>__<KEY>=value` environment variables on top
    pub fn with_env_overrides(mut self, prefix: &str) -> Self {
        for (name, value) in std::env::vars() {
            if let Some(key) = env_var_to_key(&name, prefix) {
                debug!(key = %key, "Setting overridden from environment");
                self.values.insert(key, toml::Value::String(value));
            }
        }
        self
    }

    /// Builder-style setter
    pub fn with_value(mut self, key: impl Into<String>, value: impl Into<toml::Value>) -> Self {
        self.values.insert(key.into(), value.into());
        self
    }

    /// Whether a key is present at all
    pub fn contains(&self, key: &str) -> bool {
        self.values.contains_key(key)
    }

    /// Boolean lookup; missing or unparseable values read as `false`
    pub fn value_bool(&self, key: &str) -> bool {
        self.value_bool_or(key, false)
    }

    /// Boolean lookup with an explicit default for missing keys
    pub fn value_bool_or(&self, key: &str, default: bool) -> bool {
        match self.values.get(key) {
            Some(toml::Value::Boolean(b)) => *b,
            Some(toml::Value::Integer(i)) => *i != 0,
            Some(toml::Value::String(s)) => matches!(
                s.trim().to_ascii_lowercase().as_str(),
                "true" | "1" | "yes" | "on"
            ),
            Some(_) => false,
            None => default,
        }
    }

    /// String lookup; blank strings read as missing
    pub fn value_str(&self, key: &str) -> Option<String> {
        match self.values.get(key)? {
            toml::Value::String(s) => {
                let trimmed = s.trim();
                (!trimmed.is_empty()).then(|| trimmed.to_string())
            }
            toml::Value::Integer(i) => Some(i.to_string()),
            toml::Value::Float(f) => Some(f.to_string()),
            toml::Value::Boolean(b) => Some(b.to_string()),
            _ => None,
        }
    }

    /// Ordered list lookup; accepts a TOML array or a comma-separated string
    pub fn value_list(&self, key: &str) -> Vec<String> {
        match self.values.get(key) {
            Some(toml::Value::Array(items)) => items
                .iter()
                .filter_map(|item| item.as_str())
                .map(str::trim)
                .filter(|item| !item.is_empty())
                .map(str::to_string)
                .collect(),
            Some(toml::Value::String(s)) => s
                .split(',')
                .map(str::trim)
                .filter(|item| !item.is_empty())
                .map(str::to_string)
                .collect(),
            _ => Vec::new(),
        }
    }

    /// `[logging]` table, with defaults for anything missing
    pub fn logging(&self) -> LoggingConfig {
        let mut config = LoggingConfig::default();
        if let Some(level) = self.value_str("logging/level") {
            config.level = level;
        }
        config.file = self.value_str("logging/file").map(PathBuf::from);
        config
    }
}

/// Resolve the config file path
///
/// Priority order:
/// 1. Command-line argument
/// 2. `WNP_CONFIG` environment variable
/// 3. `<config dir>/wnp/config.toml` if it exists
pub fn resolve_config_path(cli_arg: Option<&Path>, env_var_name: &str) -> Option<PathBuf> {
    if let Some(path) = cli_arg {
        return Some(path.to_path_buf());
    }

    if let Ok(path) = std::env::var(env_var_name) {
        if !path.trim().is_empty() {
            return Some(PathBuf::from(path));
        }
    }

    default_config_path().filter(|path| path.exists())
}

/// Platform default config file location
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("wnp").join("config.toml"))
}

fn flatten_table(prefix: &str, table: &toml::Table, out: &mut HashMap<String, toml::Value>) {
    for (key, value) in table {
        let full_key = if prefix.is_empty() {
            key.clone()
        } else {
            format!("{}/{}", prefix, key)
        };
        match value {
            toml::Value::Table(inner) => flatten_table(&full_key, inner, out),
            other => {
                out.insert(full_key, other.clone());
            }
        }
    }
}

fn env_var_to_key(name: &str, prefix: &str) -> Option<String> {
    let rest = name.strip_prefix(prefix)?;
    if !rest.contains("__") {
        return None;
    }
    Some(rest.to_ascii_lowercase().replace("__", "/"))
}
