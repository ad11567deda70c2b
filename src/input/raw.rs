//! On-disk schema for matrix fragments and device descriptors.
//!
//! Both TOML and JSON inputs deserialize into these structs; conversion into
//! the data model happens in the parent module.

use serde::Deserialize;
use vintf_types::{HalFormat, KernelVersion, Version, VersionFamily};

fn default_format() -> HalFormat {
    HalFormat::Hidl
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub(crate) struct RawFragment {
    /// Absent on the base fragment
    #[serde(default)]
    pub level: Option<u32>,

    #[serde(default)]
    pub hal: Vec<RawHal>,

    #[serde(default)]
    pub kernel: Vec<RawKernel>,

    #[serde(default)]
    pub sepolicy: Option<RawSepolicy>,

    #[serde(default)]
    pub avb: Option<RawAvb>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub(crate) struct RawHal {
    #[serde(default = "default_format")]
    pub format: HalFormat,
    pub name: String,
    #[serde(default)]
    pub optional: bool,
    pub version: Vec<VersionFamily>,
    #[serde(default)]
    pub interface: Vec<RawInterface>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub(crate) struct RawInterface {
    pub name: String,
    pub instance: Vec<String>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub(crate) struct RawKernel {
    pub version: KernelVersion,
    #[serde(default)]
    pub condition: Option<RawCondition>,
    #[serde(default)]
    pub config: Vec<RawKernelConfig>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub(crate) struct RawCondition {
    pub key: String,
    pub value: String,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub(crate) struct RawKernelConfig {
    pub key: String,
    pub value: RawScalar,
    /// `tristate`, `int` or `string`; inferred from the value when absent
    #[serde(default, rename = "type")]
    pub kind: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub(crate) enum RawScalar {
    Int(i64),
    Str(String),
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub(crate) struct RawSepolicy {
    #[serde(default)]
    pub kernel_sepolicy_version: Option<u32>,
    #[serde(default)]
    pub sepolicy_version: Option<VersionFamily>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub(crate) struct RawAvb {
    #[serde(default)]
    pub vbmeta_version: Option<Version>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub(crate) struct RawDevice {
    #[serde(default)]
    pub target_level: Option<u32>,

    #[serde(default)]
    pub hal: Vec<RawDeviceHal>,

    #[serde(default)]
    pub sepolicy: Option<RawDeviceSepolicy>,

    #[serde(default)]
    pub avb: Option<RawAvb>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub(crate) struct RawDeviceHal {
    #[serde(default = "default_format")]
    pub format: HalFormat,
    pub name: String,
    pub version: Vec<Version>,
    #[serde(default)]
    pub interface: Vec<RawInterface>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub(crate) struct RawDeviceSepolicy {
    #[serde(default)]
    pub version: Option<Version>,
    #[serde(default)]
    pub kernel_sepolicy_version: Option<u32>,
}
