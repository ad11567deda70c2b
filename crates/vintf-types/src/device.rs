//! Concrete device descriptor checked against an assembled matrix.

use serde::{Deserialize, Serialize};

use crate::matrix::{HalFormat, LineageKey};
use crate::version::Version;

/// One HAL instance a device provides.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Have {
    pub component_name: String,
    pub format: HalFormat,
    pub interface_name: String,
    pub instance_name: String,
    pub version: Version,
}

impl Have {
    pub fn lineage(&self) -> LineageKey {
        LineageKey {
            component_name: self.component_name.clone(),
            format: self.format,
            interface_name: self.interface_name.clone(),
            instance_name: self.instance_name.clone(),
        }
    }
}

/// Scalar values a device declares. Undeclared values are not checked.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceScalars {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kernel_sepolicy_version: Option<u32>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sepolicy_version: Option<Version>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vbmeta_version: Option<Version>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceDescriptor {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_level: Option<u32>,

    #[serde(default)]
    pub haves: Vec<Have>,

    #[serde(default)]
    pub scalars: DeviceScalars,
}

impl DeviceDescriptor {
    /// Haves belonging to `lineage` whose major matches `major`.
    pub fn haves_for<'a>(
        &'a self,
        lineage: &'a LineageKey,
        major: u32,
    ) -> impl Iterator<Item = &'a Have> + 'a {
        self.haves.iter().filter(move |h| {
            h.version.major == major
                && h.component_name == lineage.component_name
                && h.format == lineage.format
                && h.interface_name == lineage.interface_name
                && h.instance_name == lineage.instance_name
        })
    }
}
