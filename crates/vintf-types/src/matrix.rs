//! Compatibility matrix types: requirement entries, fragments and the
//! assembled matrix.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::kernel::KernelRequirementBlock;
use crate::version::{Version, VersionFamily};

/// Interface definition language of a HAL.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HalFormat {
    Hidl,
    Aidl,
    Native,
}

impl HalFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            HalFormat::Hidl => "hidl",
            HalFormat::Aidl => "aidl",
            HalFormat::Native => "native",
        }
    }
}

impl fmt::Display for HalFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Identity of a requirement across levels, ignoring its major version.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct LineageKey {
    pub component_name: String,
    pub format: HalFormat,
    pub interface_name: String,
    pub instance_name: String,
}

impl fmt::Display for LineageKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}/{}/{}",
            self.component_name, self.interface_name, self.instance_name
        )
    }
}

/// One required (or optional) HAL instance at one version range.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequirementEntry {
    pub component_name: String,
    pub format: HalFormat,
    pub interface_name: String,
    pub instance_name: String,
    pub version_family: VersionFamily,
    pub optional: bool,
    /// Level of the fragment that introduced this entry.
    pub defined_at_level: u32,
}

impl RequirementEntry {
    pub fn lineage(&self) -> LineageKey {
        LineageKey {
            component_name: self.component_name.clone(),
            format: self.format,
            interface_name: self.interface_name.clone(),
            instance_name: self.instance_name.clone(),
        }
    }

    pub fn same_lineage(&self, key: &LineageKey) -> bool {
        self.component_name == key.component_name
            && self.format == key.format
            && self.interface_name == key.interface_name
            && self.instance_name == key.instance_name
    }
}

/// Scalar fields a fragment may declare. All optional at fragment level.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScalarFields {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kernel_sepolicy_version: Option<u32>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sepolicy_version: Option<VersionFamily>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vbmeta_version: Option<Version>,
}

/// Scalar fields of an assembled matrix. Every field is mandatory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatrixScalars {
    pub kernel_sepolicy_version: u32,
    pub sepolicy_version: VersionFamily,
    pub vbmeta_version: Version,
}

/// A partial matrix contributed to an assembly run.
///
/// The fragment without a level is the base: it supplies scalar defaults
/// and kernel blocks carried verbatim into every output.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatrixFragment {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub level: Option<u32>,

    /// Where the fragment came from, for diagnostics.
    #[serde(default)]
    pub source_name: String,

    #[serde(default)]
    pub entries: Vec<RequirementEntry>,

    #[serde(default)]
    pub scalars: ScalarFields,

    #[serde(default)]
    pub kernel_blocks: Vec<KernelRequirementBlock>,
}

impl MatrixFragment {
    pub fn is_base(&self) -> bool {
        self.level.is_none()
    }
}

/// The final, immutable output of an assembly run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssembledMatrix {
    /// Target level; `None` when assembled without level resolution.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub level: Option<u32>,
    pub entries: Vec<RequirementEntry>,
    pub kernel_blocks: Vec<KernelRequirementBlock>,
    pub scalars: MatrixScalars,
}

impl AssembledMatrix {
    pub fn required_entries(&self) -> impl Iterator<Item = &RequirementEntry> {
        self.entries.iter().filter(|e| !e.optional)
    }
}
