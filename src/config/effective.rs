//! Effective configuration with provenance
//!
//! Captures the merged settings plus the sources they came from. The
//! environment-derived part is a closed struct: every recognized key has
//! exactly one field, and unrecognized keys in the config file or on the
//! command line are rejected.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use sha2::{Digest, Sha256};
use std::fs;
use std::path::Path;
use std::str::FromStr;

use vintf_types::{Version, VersionFamily};

use super::defaults::BuiltinDefaults;
use super::merge::merge_layers;

/// Environment keys the assembler understands.
pub const RECOGNIZED_ENV_KEYS: &[&str] = &[
    "POLICYVERS",
    "BOARD_SEPOLICY_VERS",
    "FRAMEWORK_VBMETA_VERSION",
    "PRODUCT_ENFORCE_VINTF_MANIFEST",
];

/// Settings sourced from the build environment.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssembleEnv {
    /// `POLICYVERS`: overrides the matrix `<kernel-sepolicy-version>`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub policy_vers: Option<u32>,

    /// `BOARD_SEPOLICY_VERS`: overrides the matrix `<sepolicy-version>`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub board_sepolicy_vers: Option<VersionFamily>,

    /// `FRAMEWORK_VBMETA_VERSION`: overrides the matrix `<vbmeta-version>`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub framework_vbmeta_version: Option<Version>,

    /// `PRODUCT_ENFORCE_VINTF_MANIFEST`: when true, a device that fails
    /// validation fails the run instead of only being reported.
    #[serde(default)]
    pub enforce_vintf_manifest: bool,
}

impl AssembleEnv {
    /// Build from a flat `KEY -> value` object. Values may be strings,
    /// numbers or booleans; absent keys stay unset.
    pub fn from_value(value: &Value) -> Result<Self, ConfigError> {
        let empty = Map::new();
        let map = match value {
            Value::Object(map) => map,
            Value::Null => &empty,
            other => {
                return Err(ConfigError::ValidationError(format!(
                    "env must be a table, got {}",
                    other
                )))
            }
        };

        if let Some(key) = map
            .keys()
            .find(|k| !RECOGNIZED_ENV_KEYS.contains(&k.as_str()))
        {
            return Err(ConfigError::UnknownKey(key.clone()));
        }

        Ok(Self {
            policy_vers: parse_field(map, "POLICYVERS")?,
            board_sepolicy_vers: parse_field(map, "BOARD_SEPOLICY_VERS")?,
            framework_vbmeta_version: parse_field(map, "FRAMEWORK_VBMETA_VERSION")?,
            enforce_vintf_manifest: parse_bool(map, "PRODUCT_ENFORCE_VINTF_MANIFEST")?
                .unwrap_or(false),
        })
    }

    /// Build directly from a lookup function, e.g. a fixed map in tests.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        Self::from_value(&env_layer(lookup))
    }
}

fn scalar_text(map: &Map<String, Value>, key: &str) -> Option<String> {
    match map.get(key)? {
        Value::Null => None,
        Value::String(s) if s.trim().is_empty() => None,
        Value::String(s) => Some(s.trim().to_string()),
        other => Some(other.to_string()),
    }
}

fn parse_field<T>(map: &Map<String, Value>, key: &str) -> Result<Option<T>, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    scalar_text(map, key)
        .map(|text| {
            text.parse::<T>().map_err(|e| ConfigError::InvalidValue {
                key: key.to_string(),
                value: text.clone(),
                reason: e.to_string(),
            })
        })
        .transpose()
}

fn parse_bool(map: &Map<String, Value>, key: &str) -> Result<Option<bool>, ConfigError> {
    scalar_text(map, key)
        .map(|text| match text.as_str() {
            "true" | "1" => Ok(true),
            "false" | "0" => Ok(false),
            _ => Err(ConfigError::InvalidValue {
                key: key.to_string(),
                value: text.clone(),
                reason: "expected true or false".to_string(),
            }),
        })
        .transpose()
}

/// Collect every recognized key from `lookup` into a flat object.
fn env_layer(lookup: impl Fn(&str) -> Option<String>) -> Value {
    let map: Map<String, Value> = RECOGNIZED_ENV_KEYS
        .iter()
        .filter_map(|key| lookup(key).map(|v| (key.to_string(), Value::String(v))))
        .collect();
    Value::Object(map)
}

/// Read a config file, returning its JSON form and the SHA-256 of its bytes.
fn read_config_file(path: &Path) -> Result<(Value, String), ConfigError> {
    let bytes = fs::read(path)
        .map_err(|e| ConfigError::IoError(format!("{}: {}", path.display(), e)))?;
    let digest = hex::encode(Sha256::digest(&bytes));

    let text = std::str::from_utf8(&bytes)
        .map_err(|e| ConfigError::ParseError(format!("{}: not UTF-8: {}", path.display(), e)))?;
    let table: toml::Table = text
        .parse()
        .map_err(|e| ConfigError::ParseError(format!("{}: {}", path.display(), e)))?;

    Ok((toml_json(toml::Value::Table(table)), digest))
}

/// TOML to JSON. Floats keep their textual form so `10000.0` still parses
/// as a version, and datetimes become strings.
fn toml_json(value: toml::Value) -> Value {
    use toml::Value as T;
    match value {
        T::Table(table) => Value::Object(
            table
                .into_iter()
                .map(|(key, item)| (key, toml_json(item)))
                .collect(),
        ),
        T::Array(items) => items.into_iter().map(toml_json).collect(),
        T::Float(f) => Value::String(format!("{:?}", f)),
        T::Datetime(dt) => Value::String(dt.to_string()),
        T::Integer(i) => Value::from(i),
        T::Boolean(b) => Value::Bool(b),
        T::String(s) => Value::String(s),
    }
}

/// Serialization format of the assembled matrix.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    Xml,
    Json,
}

impl OutputFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            OutputFormat::Xml => "xml",
            OutputFormat::Json => "json",
        }
    }
}

impl FromStr for OutputFormat {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "xml" => Ok(OutputFormat::Xml),
            "json" => Ok(OutputFormat::Json),
            other => Err(ConfigError::InvalidValue {
                key: "output.format".to_string(),
                value: other.to_string(),
                reason: "expected xml or json".to_string(),
            }),
        }
    }
}

/// Origin of a configuration source
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "lowercase")]
pub enum ConfigOrigin {
    Builtin,
    File,
    Environment,
    Cli,
}

/// A contributing config source with provenance
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfigSource {
    pub origin: ConfigOrigin,

    /// File path (None unless origin is a file)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,

    /// SHA-256 digest of raw file bytes
    #[serde(skip_serializing_if = "Option::is_none")]
    pub digest: Option<String>,
}

/// Effective configuration with full provenance
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EffectiveConfig {
    pub env: AssembleEnv,

    pub output_format: OutputFormat,

    /// The merged configuration object
    pub merged: Value,

    /// Contributing sources in precedence order
    pub sources: Vec<ConfigSource>,
}

impl EffectiveConfig {
    /// Build the effective config from all layers.
    ///
    /// `process_env` is consulted only for [`RECOGNIZED_ENV_KEYS`].
    pub fn build(
        config_path: Option<&Path>,
        process_env: impl Fn(&str) -> Option<String>,
        cli_env: &[(String, String)],
        cli_format: Option<OutputFormat>,
    ) -> Result<Self, ConfigError> {
        let mut layers = Vec::new();
        let mut sources = Vec::new();

        // Layer 1: Built-in defaults
        layers.push(BuiltinDefaults::default().to_value());
        sources.push(ConfigSource {
            origin: ConfigOrigin::Builtin,
            path: None,
            digest: None,
        });

        // Layer 2: Config file
        if let Some(path) = config_path {
            let (value, digest) = read_config_file(path)?;
            Self::check_file_keys(&value)?;
            layers.push(value);
            sources.push(ConfigSource {
                origin: ConfigOrigin::File,
                path: Some(path.to_string_lossy().to_string()),
                digest: Some(digest),
            });
        }

        // Layer 3: Process environment
        let process = env_layer(process_env);
        if process.as_object().is_some_and(|m| !m.is_empty()) {
            layers.push(serde_json::json!({ "env": process }));
            sources.push(ConfigSource {
                origin: ConfigOrigin::Environment,
                path: None,
                digest: None,
            });
        }

        // Layer 4: CLI overrides
        if !cli_env.is_empty() || cli_format.is_some() {
            let env: Map<String, Value> = cli_env
                .iter()
                .map(|(k, v)| (k.clone(), Value::String(v.clone())))
                .collect();
            let mut cli = serde_json::json!({ "env": env });
            if let Some(format) = cli_format {
                cli["output"] = serde_json::json!({ "format": format.as_str() });
            }
            layers.push(cli);
            sources.push(ConfigSource {
                origin: ConfigOrigin::Cli,
                path: None,
                digest: None,
            });
        }

        let merged = merge_layers(layers);
        let env = AssembleEnv::from_value(&merged["env"])?;
        let output_format = merged["output"]["format"]
            .as_str()
            .unwrap_or(OutputFormat::Xml.as_str())
            .parse()?;

        Ok(Self {
            env,
            output_format,
            merged,
            sources,
        })
    }

    /// Only `[env]` and `[output]` tables are meaningful in a config file.
    fn check_file_keys(value: &Value) -> Result<(), ConfigError> {
        if let Some(map) = value.as_object() {
            if let Some(key) = map.keys().find(|k| !matches!(k.as_str(), "env" | "output")) {
                return Err(ConfigError::UnknownKey(key.clone()));
            }
        }
        Ok(())
    }

    /// Serialize to JSON
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    IoError(String),

    #[error("Parse error: {0}")]
    ParseError(String),

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("unrecognized configuration key '{0}'")]
    UnknownKey(String),

    #[error("invalid value '{value}' for {key}: {reason}")]
    InvalidValue {
        key: String,
        value: String,
        reason: String,
    },
}
