//! Compatibility validation
//!
//! Checks a concrete device descriptor against an assembled matrix. Every
//! incompatibility is reported; validation never stops at the first one.
//!
//! - Required entries need a have of the same generation whose version lies
//!   in the entry's range.
//! - Optional entries may be absent, but a have of the same generation must
//!   still lie in the range.
//! - Scalars the device declares must be at least the required value.

mod report;

pub use report::{CheckReport, CHECK_SCHEMA_ID, CHECK_SCHEMA_VERSION};

use serde::{Deserialize, Serialize};
use std::fmt;

use vintf_types::{
    AssembledMatrix, DeviceDescriptor, LineageKey, RequirementEntry, Version, VersionFamily,
};

/// One device/matrix incompatibility.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "details")]
pub enum ValidationFailure {
    /// A required generation has no have at all.
    MissingHal {
        lineage: LineageKey,
        required: VersionFamily,
    },

    /// Haves of the generation exist but none lies in the required range.
    VersionMismatch {
        lineage: LineageKey,
        required: VersionFamily,
        provided: Vec<Version>,
        optional: bool,
    },

    KernelSepolicyTooOld { required: u32, provided: u32 },

    SepolicyTooOld {
        required: VersionFamily,
        provided: Version,
    },

    VbmetaTooOld { required: Version, provided: Version },
}

impl ValidationFailure {
    /// Stable machine-readable form, e.g.
    /// `MISSING_HAL:android.hardware.foo/IFoo/default@2.0`.
    pub fn to_machine_string(&self) -> String {
        match self {
            ValidationFailure::MissingHal { lineage, required } => {
                format!("MISSING_HAL:{}@{}", lineage, required)
            }
            ValidationFailure::VersionMismatch {
                lineage, required, ..
            } => format!("VERSION_MISMATCH:{}@{}", lineage, required),
            ValidationFailure::KernelSepolicyTooOld { required, .. } => {
                format!("KERNEL_SEPOLICY_TOO_OLD:{}", required)
            }
            ValidationFailure::SepolicyTooOld { required, .. } => {
                format!("SEPOLICY_TOO_OLD:{}", required)
            }
            ValidationFailure::VbmetaTooOld { required, .. } => {
                format!("VBMETA_TOO_OLD:{}", required)
            }
        }
    }
}

impl fmt::Display for ValidationFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValidationFailure::MissingHal { lineage, required } => write!(
                f,
                "{} ({}) is required at version {} but not provided",
                lineage, lineage.format, required
            ),
            ValidationFailure::VersionMismatch {
                lineage,
                required,
                provided,
                optional,
            } => {
                let provided: Vec<String> = provided.iter().map(|v| v.to_string()).collect();
                write!(
                    f,
                    "{} ({}) provides {} but the {} range is {}",
                    lineage,
                    lineage.format,
                    provided.join(", "),
                    if *optional { "optional" } else { "required" },
                    required
                )
            }
            ValidationFailure::KernelSepolicyTooOld { required, provided } => write!(
                f,
                "kernel sepolicy version {} is older than required {}",
                provided, required
            ),
            ValidationFailure::SepolicyTooOld { required, provided } => write!(
                f,
                "sepolicy version {} is older than required {}",
                provided, required
            ),
            ValidationFailure::VbmetaTooOld { required, provided } => write!(
                f,
                "vbmeta version {} is older than required {}",
                provided, required
            ),
        }
    }
}

fn check_entry(entry: &RequirementEntry, device: &DeviceDescriptor) -> Option<ValidationFailure> {
    let lineage = entry.lineage();
    let range = entry.version_family;
    let provided: Vec<Version> = device
        .haves_for(&lineage, range.major())
        .map(|h| h.version)
        .collect();

    if provided.iter().any(|v| range.contains(v)) {
        return None;
    }
    if provided.is_empty() {
        return (!entry.optional).then_some(ValidationFailure::MissingHal {
            lineage,
            required: range,
        });
    }
    Some(ValidationFailure::VersionMismatch {
        lineage,
        required: range,
        provided,
        optional: entry.optional,
    })
}

/// Validate `device` against `matrix`, returning every failure found.
///
/// Failures follow matrix entry order, then scalar fields. An empty result
/// means the device is compatible.
pub fn validate(matrix: &AssembledMatrix, device: &DeviceDescriptor) -> Vec<ValidationFailure> {
    let mut failures: Vec<ValidationFailure> = matrix
        .entries
        .iter()
        .filter_map(|entry| check_entry(entry, device))
        .collect();

    let required = &matrix.scalars;
    let provided = &device.scalars;

    if let Some(kernel) = provided.kernel_sepolicy_version {
        if kernel < required.kernel_sepolicy_version {
            failures.push(ValidationFailure::KernelSepolicyTooOld {
                required: required.kernel_sepolicy_version,
                provided: kernel,
            });
        }
    }
    if let Some(sepolicy) = provided.sepolicy_version {
        if sepolicy < required.sepolicy_version.min_version() {
            failures.push(ValidationFailure::SepolicyTooOld {
                required: required.sepolicy_version,
                provided: sepolicy,
            });
        }
    }
    if let Some(vbmeta) = provided.vbmeta_version {
        if vbmeta < required.vbmeta_version {
            failures.push(ValidationFailure::VbmetaTooOld {
                required: required.vbmeta_version,
                provided: vbmeta,
            });
        }
    }

    failures
}
