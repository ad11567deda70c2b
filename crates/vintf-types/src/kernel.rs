//! Kernel configuration requirement types.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::str::FromStr;

use crate::version::VersionError;

/// A kernel release. Equality and ordering only look at `(major, minor)`.
#[derive(Debug, Clone, Copy)]
pub struct KernelVersion {
    pub major: u32,
    pub minor: u32,
    pub patch: u32,
}

impl KernelVersion {
    pub const fn new(major: u32, minor: u32) -> Self {
        Self {
            major,
            minor,
            patch: 0,
        }
    }
}

impl PartialEq for KernelVersion {
    fn eq(&self, other: &Self) -> bool {
        (self.major, self.minor) == (other.major, other.minor)
    }
}

impl Eq for KernelVersion {}

impl Hash for KernelVersion {
    fn hash<H: Hasher>(&self, state: &mut H) {
        (self.major, self.minor).hash(state);
    }
}

impl PartialOrd for KernelVersion {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for KernelVersion {
    fn cmp(&self, other: &Self) -> Ordering {
        (self.major, self.minor).cmp(&(other.major, other.minor))
    }
}

impl fmt::Display for KernelVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.major, self.minor, self.patch)
    }
}

impl FromStr for KernelVersion {
    type Err = VersionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parts: Vec<&str> = s.trim().split('.').collect();
        if !(2..=3).contains(&parts.len()) {
            return Err(VersionError::Parse {
                input: s.to_string(),
                reason: "expected MAJOR.MINOR[.PATCH]".to_string(),
            });
        }
        let num = |part: &str| {
            part.parse::<u32>().map_err(|e| VersionError::Parse {
                input: s.to_string(),
                reason: e.to_string(),
            })
        };
        Ok(Self {
            major: num(parts[0])?,
            minor: num(parts[1])?,
            patch: parts.get(2).map(|p| num(p)).transpose()?.unwrap_or(0),
        })
    }
}

impl Serialize for KernelVersion {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for KernelVersion {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

/// Tristate kernel option value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Tristate {
    #[serde(rename = "y")]
    Yes,
    #[serde(rename = "n")]
    No,
    #[serde(rename = "m")]
    Module,
}

impl Tristate {
    pub fn as_str(&self) -> &'static str {
        match self {
            Tristate::Yes => "y",
            Tristate::No => "n",
            Tristate::Module => "m",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "y" => Some(Tristate::Yes),
            "n" => Some(Tristate::No),
            "m" => Some(Tristate::Module),
            _ => None,
        }
    }
}

/// Value required for a kernel option.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "lowercase")]
pub enum KernelConfigValue {
    Tristate(Tristate),
    Int(i64),
    #[serde(rename = "string")]
    Str(String),
}

impl KernelConfigValue {
    /// Name used for the `type` attribute of a rendered value.
    pub fn type_name(&self) -> &'static str {
        match self {
            KernelConfigValue::Tristate(_) => "tristate",
            KernelConfigValue::Int(_) => "int",
            KernelConfigValue::Str(_) => "string",
        }
    }
}

impl fmt::Display for KernelConfigValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            KernelConfigValue::Tristate(t) => f.write_str(t.as_str()),
            KernelConfigValue::Int(i) => write!(f, "{}", i),
            KernelConfigValue::Str(s) => f.write_str(s),
        }
    }
}

/// One `CONFIG_*` requirement.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct KernelConfigKey {
    pub name: String,
    pub value: KernelConfigValue,
}

impl KernelConfigKey {
    pub fn tristate(name: impl Into<String>, value: Tristate) -> Self {
        Self {
            name: name.into(),
            value: KernelConfigValue::Tristate(value),
        }
    }
}

/// Architecture a conditional kernel block applies to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ArchCondition {
    Arm,
    Arm64,
    X86,
    X86_64,
}

impl ArchCondition {
    pub const ALL: [ArchCondition; 4] = [
        ArchCondition::Arm,
        ArchCondition::Arm64,
        ArchCondition::X86,
        ArchCondition::X86_64,
    ];

    /// Architecture label as used in fragment file names.
    pub fn label(&self) -> &'static str {
        match self {
            ArchCondition::Arm => "arm",
            ArchCondition::Arm64 => "arm64",
            ArchCondition::X86 => "x86",
            ArchCondition::X86_64 => "x86_64",
        }
    }

    pub fn from_label(label: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|a| a.label() == label)
    }

    /// The kernel option that gates the block.
    pub fn condition_key(&self) -> &'static str {
        match self {
            ArchCondition::Arm => "CONFIG_ARM",
            ArchCondition::Arm64 => "CONFIG_ARM64",
            ArchCondition::X86 => "CONFIG_X86",
            ArchCondition::X86_64 => "CONFIG_X86_64",
        }
    }

    pub fn condition_value(&self) -> Tristate {
        Tristate::Yes
    }

    /// Recover the condition from its `{key, value}` pair.
    pub fn from_condition(key: &str, value: &str) -> Option<Self> {
        if Tristate::parse(value) != Some(Tristate::Yes) {
            return None;
        }
        Self::ALL.into_iter().find(|a| a.condition_key() == key)
    }
}

impl fmt::Display for ArchCondition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// A set of kernel requirements for one kernel version, optionally
/// restricted to one architecture.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KernelRequirementBlock {
    pub kernel_version: KernelVersion,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub condition: Option<ArchCondition>,
    pub keys: Vec<KernelConfigKey>,
}
