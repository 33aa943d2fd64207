//! Effective configuration with provenance
//!
//! Records the merged configuration together with the layers that
//! contributed to it. Secret values are redacted in the recorded copy;
//! [`EffectiveConfig::settings`] reads the unredacted values.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sha2::{Digest, Sha256};
use std::fs;
use std::path::Path;

use super::defaults::BuiltinDefaults;
use super::merge::merge_layers;
use super::settings::Settings;

/// Origin of a configuration layer
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ConfigOrigin {
    Builtin,
    File,
    Cli,
}

/// A contributing layer
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfigSource {
    pub origin: ConfigOrigin,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,

    /// SHA-256 of the raw file bytes
    #[serde(skip_serializing_if = "Option::is_none")]
    pub digest: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EffectiveConfig {
    pub created_at: DateTime<Utc>,

    /// Merged configuration, secrets redacted
    pub config: Value,

    /// Contributing layers, lowest precedence first
    pub sources: Vec<ConfigSource>,

    /// Dotted paths of redacted values
    pub redactions: Vec<String>,

    #[serde(skip)]
    resolved: Value,
}

const SECRET_KEYS: &[&str] = &["token", "password", "secret"];

const REDACTED: &str = "[REDACTED]";

impl EffectiveConfig {
    /// Merge defaults, an optional TOML file and optional CLI overrides.
    ///
    /// A file path that was given but cannot be read is an error.
    pub fn build(config_path: Option<&Path>, cli_overrides: Option<Value>) -> Result<Self, ConfigError> {
        let mut layers = vec![BuiltinDefaults::default().to_value()];
        let mut sources = vec![ConfigSource {
            origin: ConfigOrigin::Builtin,
            path: None,
            digest: None,
        }];

        if let Some(path) = config_path {
            let (value, digest) = load_toml_file(path)?;
            layers.push(value);
            sources.push(ConfigSource {
                origin: ConfigOrigin::File,
                path: Some(path.display().to_string()),
                digest: Some(digest),
            });
        }

        if let Some(cli) = cli_overrides {
            layers.push(cli);
            sources.push(ConfigSource {
                origin: ConfigOrigin::Cli,
                path: None,
                digest: None,
            });
        }

        let resolved = merge_layers(layers);
        parse_settings(&resolved)?.validate()?;

        let mut config = resolved.clone();
        let mut redactions = Vec::new();
        redact(&mut config, "", &mut redactions);

        Ok(Self {
            created_at: Utc::now(),
            config,
            sources,
            redactions,
            resolved,
        })
    }

    /// Typed settings from the unredacted configuration
    pub fn settings(&self) -> Result<Settings, ConfigError> {
        parse_settings(&self.resolved)
    }

    /// Value at a dotted path in the redacted configuration
    pub fn get(&self, path: &str) -> Option<&Value> {
        path.split('.').try_fold(&self.config, |current, part| current.get(part))
    }

    pub fn get_str(&self, path: &str) -> Option<&str> {
        self.get(path).and_then(Value::as_str)
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}

fn parse_settings(value: &Value) -> Result<Settings, ConfigError> {
    serde_json::from_value(value.clone()).map_err(|e| ConfigError::Parse(format!("invalid configuration: {}", e)))
}

/// Read a TOML file, returning its value and the digest of its bytes
fn load_toml_file(path: &Path) -> Result<(Value, String), ConfigError> {
    let bytes = fs::read(path).map_err(|e| ConfigError::Io {
        path: path.display().to_string(),
        message: e.to_string(),
    })?;
    let digest = hex::encode(Sha256::digest(&bytes));

    let contents = String::from_utf8(bytes)
        .map_err(|e| ConfigError::Parse(format!("{}: invalid UTF-8: {}", path.display(), e)))?;
    let table: toml::Value = toml::from_str(&contents)
        .map_err(|e| ConfigError::Parse(format!("{}: {}", path.display(), e)))?;

    Ok((toml_to_json(table), digest))
}

fn toml_to_json(value: toml::Value) -> Value {
    match value {
        toml::Value::String(s) => Value::String(s),
        toml::Value::Integer(i) => Value::Number(i.into()),
        toml::Value::Float(f) => serde_json::Number::from_f64(f)
            .map(Value::Number)
            .unwrap_or(Value::Null),
        toml::Value::Boolean(b) => Value::Bool(b),
        toml::Value::Datetime(dt) => Value::String(dt.to_string()),
        toml::Value::Array(items) => Value::Array(items.into_iter().map(toml_to_json).collect()),
        toml::Value::Table(table) => Value::Object(
            table
                .into_iter()
                .map(|(k, v)| (k, toml_to_json(v)))
                .collect(),
        ),
    }
}

fn redact(value: &mut Value, path: &str, redactions: &mut Vec<String>) {
    let Value::Object(map) = value else {
        return;
    };
    for (key, val) in map.iter_mut() {
        let current = if path.is_empty() {
            key.clone()
        } else {
            format!("{}.{}", path, key)
        };
        let lower = key.to_lowercase();
        let is_secret = SECRET_KEYS.iter().any(|s| lower.contains(s));

        if val.is_object() {
            redact(val, &current, redactions);
        } else if is_secret && !val.is_null() {
            *val = Value::String(REDACTED.to_string());
            redactions.push(current);
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {message}")]
    Io { path: String, message: String },

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Validation error: {0}")]
    Validation(String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_defaults_only() {
        let config = EffectiveConfig::build(None, None).unwrap();

        assert_eq!(config.sources.len(), 1);
        assert_eq!(config.sources[0].origin, ConfigOrigin::Builtin);
        assert!(config.redactions.is_empty());

        let settings = config.settings().unwrap();
        assert_eq!(settings.repository_manager.base_url, "http://localhost:8080/api/");
        assert_eq!(settings.stores.shared_imports, "shared-imports");
        assert!(!settings.promotion.promote_build_output);
    }

    #[test]
    fn test_cli_overrides_defaults() {
        let cli = json!({"promotion": {"promote_build_output": true}});
        let config = EffectiveConfig::build(None, Some(cli)).unwrap();

        assert_eq!(config.sources.last().unwrap().origin, ConfigOrigin::Cli);
        assert!(config.settings().unwrap().promotion.promote_build_output);
    }

    #[test]
    fn test_file_layer_with_digest() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "[stores]").unwrap();
        writeln!(file, "shared_imports = \"imports\"").unwrap();

        let config = EffectiveConfig::build(Some(file.path()), None).unwrap();
        let source = &config.sources[1];
        assert_eq!(source.origin, ConfigOrigin::File);
        assert_eq!(source.digest.as_ref().unwrap().len(), 64);

        let settings = config.settings().unwrap();
        assert_eq!(settings.stores.shared_imports, "imports");
        assert_eq!(settings.stores.shared_releases, "shared-releases");
    }

    #[test]
    fn test_missing_file_is_error() {
        let err = EffectiveConfig::build(Some(Path::new("/nonexistent/repocap.toml")), None).unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }));
    }

    #[test]
    fn test_invalid_toml() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "[stores").unwrap();
        let err = EffectiveConfig::build(Some(file.path()), None).unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn test_token_redacted_but_usable() {
        let cli = json!({"repository_manager": {"auth_token": "s3cr3t"}});
        let config = EffectiveConfig::build(None, Some(cli)).unwrap();

        assert_eq!(config.get_str("repository_manager.auth_token"), Some(REDACTED));
        assert_eq!(config.redactions, vec!["repository_manager.auth_token".to_string()]);
        assert!(!config.to_json().unwrap().contains("s3cr3t"));
        assert_eq!(
            config.settings().unwrap().repository_manager.auth_token.as_deref(),
            Some("s3cr3t")
        );
    }

    #[test]
    fn test_validation_runs_on_build() {
        let cli = json!({"repository_manager": {"request_timeout_seconds": 0}});
        let err = EffectiveConfig::build(None, Some(cli)).unwrap_err();
        assert!(err.to_string().contains("request_timeout_seconds"));
    }

    #[test]
    fn test_wrong_type_is_parse_error() {
        let cli = json!({"promotion": {"promote_build_output": "yes"}});
        let err = EffectiveConfig::build(None, Some(cli)).unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }
}
