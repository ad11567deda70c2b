//! Input loading
//!
//! Reads matrix fragments, device descriptors and kernel config fragments
//! from disk. Fragments and devices are TOML or JSON, chosen by extension.
//! Every file read is hashed (SHA-256) and logged as provenance.

mod raw;

use globset::{Glob, GlobSet, GlobSetBuilder};
use sha2::{Digest, Sha256};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;
use walkdir::WalkDir;

use vintf_types::{
    ArchCondition, DeviceDescriptor, DeviceScalars, Have, KernelConfigKey, KernelConfigValue,
    KernelRequirementBlock, KernelVersion, MatrixFragment, RequirementEntry, ScalarFields,
    Tristate,
};

use crate::kernel::{parse_kernel_config, CfgParseError, KernelConfigInput};
use raw::{RawDevice, RawFragment, RawKernel, RawKernelConfig, RawScalar};

/// File names picked up when an input path is a directory.
pub const FRAGMENT_PATTERNS: &[&str] = &["compatibility_matrix*.toml", "compatibility_matrix*.json"];

/// Input loading errors
#[derive(Debug, thiserror::Error)]
pub enum InputError {
    #[error("IO error reading {path}: {message}")]
    Io { path: String, message: String },

    #[error("Failed to parse {path}: {message}")]
    Parse { path: String, message: String },

    #[error("Invalid input {path}: {message}")]
    Invalid { path: String, message: String },

    #[error("Unsupported input format for {0} (expected .toml or .json)")]
    UnsupportedFormat(String),

    #[error("Invalid kernel argument '{arg}': {reason}")]
    KernelArg { arg: String, reason: String },

    #[error("Kernel config {path}: {source}")]
    KernelConfig {
        path: String,
        #[source]
        source: CfgParseError,
    },

    #[error("Directory walk error: {0}")]
    Walk(#[from] walkdir::Error),

    #[error("Glob pattern error: {0}")]
    Glob(#[from] globset::Error),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum DocFormat {
    Toml,
    Json,
}

fn doc_format(path: &Path) -> Result<DocFormat, InputError> {
    match path.extension().and_then(|e| e.to_str()) {
        Some("toml") => Ok(DocFormat::Toml),
        Some("json") => Ok(DocFormat::Json),
        _ => Err(InputError::UnsupportedFormat(path.display().to_string())),
    }
}

/// SHA-256 hex digest of raw bytes
pub fn sha256_hex(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    hex::encode(hasher.finalize())
}

/// Read a UTF-8 file, logging its digest.
fn read_input(path: &Path, kind: &'static str) -> Result<String, InputError> {
    let shown = path.display().to_string();
    let bytes = fs::read(path).map_err(|e| InputError::Io {
        path: shown.clone(),
        message: e.to_string(),
    })?;
    info!(kind, path = %shown, sha256 = %sha256_hex(&bytes), "read input");
    String::from_utf8(bytes).map_err(|e| InputError::Parse {
        path: shown,
        message: format!("Invalid UTF-8: {}", e),
    })
}

fn parse_doc<T: serde::de::DeserializeOwned>(
    path: &Path,
    contents: &str,
) -> Result<T, InputError> {
    let parsed = match doc_format(path)? {
        DocFormat::Toml => toml::from_str(contents).map_err(|e| e.to_string()),
        DocFormat::Json => serde_json::from_str(contents).map_err(|e| e.to_string()),
    };
    parsed.map_err(|message| InputError::Parse {
        path: path.display().to_string(),
        message,
    })
}

/// Load one matrix fragment.
pub fn load_fragment(path: &Path) -> Result<MatrixFragment, InputError> {
    let contents = read_input(path, "fragment")?;
    let raw: RawFragment = parse_doc(path, &contents)?;
    fragment_from_raw(raw, &path.display().to_string())
}

/// Parse a fragment from text. `source_name` decides the format by its
/// extension and is kept for diagnostics.
pub fn parse_fragment(source_name: &str, contents: &str) -> Result<MatrixFragment, InputError> {
    let raw: RawFragment = parse_doc(Path::new(source_name), contents)?;
    fragment_from_raw(raw, source_name)
}

fn invalid(path: &str, message: impl Into<String>) -> InputError {
    InputError::Invalid {
        path: path.to_string(),
        message: message.into(),
    }
}

fn fragment_from_raw(raw: RawFragment, source_name: &str) -> Result<MatrixFragment, InputError> {
    let level = raw.level.unwrap_or(0);
    let mut entries = Vec::new();

    for hal in &raw.hal {
        if hal.version.is_empty() {
            return Err(invalid(source_name, format!("hal {} declares no version", hal.name)));
        }
        if hal.interface.iter().all(|i| i.instance.is_empty()) {
            return Err(invalid(
                source_name,
                format!("hal {} declares no interface instance", hal.name),
            ));
        }
        for iface in &hal.interface {
            for instance in &iface.instance {
                for version in &hal.version {
                    entries.push(RequirementEntry {
                        component_name: hal.name.clone(),
                        format: hal.format,
                        interface_name: iface.name.clone(),
                        instance_name: instance.clone(),
                        version_family: *version,
                        optional: hal.optional,
                        defined_at_level: level,
                    });
                }
            }
        }
    }

    let kernel_blocks = raw
        .kernel
        .iter()
        .map(|k| kernel_block_from_raw(k, source_name))
        .collect::<Result<Vec<_>, _>>()?;

    let sepolicy = raw.sepolicy.as_ref();
    let scalars = ScalarFields {
        kernel_sepolicy_version: sepolicy.and_then(|s| s.kernel_sepolicy_version),
        sepolicy_version: sepolicy.and_then(|s| s.sepolicy_version),
        vbmeta_version: raw.avb.as_ref().and_then(|a| a.vbmeta_version),
    };

    Ok(MatrixFragment {
        level: raw.level,
        source_name: source_name.to_string(),
        entries,
        scalars,
        kernel_blocks,
    })
}

fn kernel_block_from_raw(
    raw: &RawKernel,
    source_name: &str,
) -> Result<KernelRequirementBlock, InputError> {
    let condition = raw
        .condition
        .as_ref()
        .map(|c| {
            ArchCondition::from_condition(&c.key, &c.value).ok_or_else(|| {
                invalid(
                    source_name,
                    format!(
                        "kernel {}: unsupported condition {}={}",
                        raw.version, c.key, c.value
                    ),
                )
            })
        })
        .transpose()?;

    let keys = raw
        .config
        .iter()
        .map(|c| config_key_from_raw(c, raw.version, source_name))
        .collect::<Result<Vec<_>, _>>()?;

    Ok(KernelRequirementBlock {
        kernel_version: raw.version,
        condition,
        keys,
    })
}

fn config_key_from_raw(
    raw: &RawKernelConfig,
    version: KernelVersion,
    source_name: &str,
) -> Result<KernelConfigKey, InputError> {
    let bad = || {
        invalid(
            source_name,
            format!("kernel {}: invalid value for {}", version, raw.key),
        )
    };

    let tristate = match &raw.value {
        RawScalar::Str(s) => Tristate::parse(s),
        RawScalar::Int(_) => None,
    };

    let value = match (raw.kind.as_deref(), &raw.value, tristate) {
        (Some("tristate") | None, _, Some(t)) => KernelConfigValue::Tristate(t),
        (Some("tristate"), _, None) => return Err(bad()),
        (Some("int") | None, RawScalar::Int(i), _) => KernelConfigValue::Int(*i),
        (Some("int"), RawScalar::Str(s), _) => {
            let parsed = match s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
                Some(hex) => i64::from_str_radix(hex, 16),
                None => s.parse(),
            };
            KernelConfigValue::Int(parsed.map_err(|_| bad())?)
        }
        (Some("string") | None, RawScalar::Str(s), _) => KernelConfigValue::Str(s.clone()),
        (Some("string"), RawScalar::Int(i), _) => KernelConfigValue::Str(i.to_string()),
        (Some(other), _, _) => {
            return Err(invalid(
                source_name,
                format!("kernel {}: unknown value type '{}' for {}", version, other, raw.key),
            ))
        }
    };

    Ok(KernelConfigKey {
        name: raw.key.clone(),
        value,
    })
}

/// Load a device descriptor.
pub fn load_device(path: &Path) -> Result<DeviceDescriptor, InputError> {
    let contents = read_input(path, "device")?;
    parse_device(&path.display().to_string(), &contents)
}

/// Parse a device descriptor from text; see [`parse_fragment`].
pub fn parse_device(source_name: &str, contents: &str) -> Result<DeviceDescriptor, InputError> {
    let raw: RawDevice = parse_doc(Path::new(source_name), contents)?;

    let mut haves = Vec::new();
    for hal in &raw.hal {
        for iface in &hal.interface {
            for instance in &iface.instance {
                for version in &hal.version {
                    haves.push(Have {
                        component_name: hal.name.clone(),
                        format: hal.format,
                        interface_name: iface.name.clone(),
                        instance_name: instance.clone(),
                        version: *version,
                    });
                }
            }
        }
    }

    let sepolicy = raw.sepolicy.as_ref();
    Ok(DeviceDescriptor {
        target_level: raw.target_level,
        haves,
        scalars: DeviceScalars {
            kernel_sepolicy_version: sepolicy.and_then(|s| s.kernel_sepolicy_version),
            sepolicy_version: sepolicy.and_then(|s| s.version),
            vbmeta_version: raw.avb.as_ref().and_then(|a| a.vbmeta_version),
        },
    })
}

fn fragment_globs() -> Result<GlobSet, InputError> {
    let mut builder = GlobSetBuilder::new();
    for pattern in FRAGMENT_PATTERNS {
        builder.add(Glob::new(pattern)?);
    }
    Ok(builder.build()?)
}

/// Find fragment files under `dir`, sorted by path.
pub fn discover_fragments(dir: &Path) -> Result<Vec<PathBuf>, InputError> {
    let globs = fragment_globs()?;
    let mut found = Vec::new();

    for entry in WalkDir::new(dir).follow_links(false) {
        let entry = entry?;
        if !entry.file_type().is_file() {
            continue;
        }
        if globs.is_match(entry.file_name()) {
            found.push(entry.into_path());
        }
    }

    found.sort();
    Ok(found)
}

/// Load every fragment named by `paths`; directories are expanded with
/// [`discover_fragments`].
pub fn load_fragments(paths: &[PathBuf]) -> Result<Vec<MatrixFragment>, InputError> {
    let mut fragments = Vec::new();
    for path in paths {
        if path.is_dir() {
            for file in discover_fragments(path)? {
                fragments.push(load_fragment(&file)?);
            }
        } else {
            fragments.push(load_fragment(path)?);
        }
    }
    Ok(fragments)
}

/// Parse a `--kernel` argument: `<version>:<cfg>[:<cfg>...]`.
pub fn parse_kernel_arg(arg: &str) -> Result<(KernelVersion, Vec<PathBuf>), InputError> {
    let mut parts = arg.split(':');
    let version = parts
        .next()
        .unwrap_or_default()
        .parse::<KernelVersion>()
        .map_err(|e| InputError::KernelArg {
            arg: arg.to_string(),
            reason: e.to_string(),
        })?;

    let files: Vec<PathBuf> = parts.filter(|p| !p.is_empty()).map(PathBuf::from).collect();
    if files.is_empty() {
        return Err(InputError::KernelArg {
            arg: arg.to_string(),
            reason: "no config fragment given".to_string(),
        });
    }
    Ok((version, files))
}

/// Read and lex the kernel config fragments of one `--kernel` argument.
pub fn load_kernel_inputs(
    version: KernelVersion,
    files: &[PathBuf],
) -> Result<Vec<KernelConfigInput>, InputError> {
    files
        .iter()
        .map(|path| {
            let contents = read_input(path, "kernel-config")?;
            let keys = parse_kernel_config(&contents).map_err(|source| {
                InputError::KernelConfig {
                    path: path.display().to_string(),
                    source,
                }
            })?;
            Ok(KernelConfigInput::new(version, path.display().to_string(), keys))
        })
        .collect()
}
