//! Built-in defaults (layer 1)

use serde::{Deserialize, Serialize};

use super::effective::OutputFormat;

/// Built-in default configuration values
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BuiltinDefaults {
    /// Validation failures fail the run (default: false)
    pub enforce_vintf_manifest: bool,

    /// Output format (default: xml)
    pub output_format: OutputFormat,
}

impl Default for BuiltinDefaults {
    fn default() -> Self {
        Self {
            enforce_vintf_manifest: false,
            output_format: OutputFormat::Xml,
        }
    }
}

impl BuiltinDefaults {
    /// Convert to JSON Value for merging
    pub fn to_value(&self) -> serde_json::Value {
        serde_json::json!({
            "env": {
                "PRODUCT_ENFORCE_VINTF_MANIFEST": self.enforce_vintf_manifest.to_string(),
            },
            "output": {
                "format": self.output_format.as_str(),
            }
        })
    }
}
