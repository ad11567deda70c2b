//! Assembly configuration
//!
//! Builds the closed set of environment-derived settings from four layers,
//! lowest precedence first:
//! 1. Built-in defaults
//! 2. Config file (`assemble-vintf.toml`)
//! 3. Process environment
//! 4. CLI `--env KEY=VALUE` flags

mod defaults;
mod effective;
mod merge;

pub use defaults::BuiltinDefaults;
pub use effective::{
    AssembleEnv, ConfigError, ConfigOrigin, ConfigSource, EffectiveConfig, OutputFormat,
    RECOGNIZED_ENV_KEYS,
};
pub use merge::{deep_merge, merge_layers};
