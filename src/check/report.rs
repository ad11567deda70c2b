//! Check report
//!
//! Serializable record of one device check, written by `--report` and by the
//! `check --json` command.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::ValidationFailure;

/// Schema version for check reports
pub const CHECK_SCHEMA_VERSION: u32 = 1;

/// Schema identifier for check reports
pub const CHECK_SCHEMA_ID: &str = "assemble-vintf/check_report@1";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CheckReport {
    /// Schema version
    pub schema_version: u32,
    /// Schema identifier
    pub schema_id: String,
    /// When the report was generated
    pub created_at: DateTime<Utc>,
    /// Level the matrix was assembled at, if any
    pub target_level: Option<u32>,
    /// SHA-256 of the canonical JSON form of the checked matrix
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub matrix_digest: Option<String>,
    /// Whether the device is compatible
    pub passed: bool,
    pub failure_count: usize,
    pub failures: Vec<ValidationFailure>,
}

impl CheckReport {
    pub fn new(target_level: Option<u32>, failures: Vec<ValidationFailure>) -> Self {
        Self {
            schema_version: CHECK_SCHEMA_VERSION,
            schema_id: CHECK_SCHEMA_ID.to_string(),
            created_at: Utc::now(),
            target_level,
            matrix_digest: None,
            passed: failures.is_empty(),
            failure_count: failures.len(),
            failures,
        }
    }

    pub fn with_matrix_digest(mut self, digest: impl Into<String>) -> Self {
        self.matrix_digest = Some(digest.into());
        self
    }

    /// Machine-readable failure codes, in report order
    pub fn failure_codes(&self) -> Vec<String> {
        self.failures
            .iter()
            .map(ValidationFailure::to_machine_string)
            .collect()
    }

    /// Convert to JSON
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Format as human-readable text
    pub fn to_human(&self) -> String {
        let mut output = String::new();
        let level = self
            .target_level
            .map(|l| l.to_string())
            .unwrap_or_else(|| "unresolved".to_string());

        output.push_str(&format!(
            "Device compatibility at level {}: {}\n",
            level,
            if self.passed { "PASS" } else { "FAIL" }
        ));
        if let Some(ref digest) = self.matrix_digest {
            output.push_str(&format!("Matrix digest: {}\n", digest));
        }
        if self.passed {
            return output;
        }

        output.push_str(&format!("\n--- {} failure(s) ---\n", self.failure_count));
        for failure in &self.failures {
            output.push_str(&format!("  ✗ {}\n", failure));
            output.push_str(&format!("    {}\n", failure.to_machine_string()));
        }
        output
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use vintf_types::{HalFormat, LineageKey};

    fn missing() -> ValidationFailure {
        ValidationFailure::MissingHal {
            lineage: LineageKey {
                component_name: "android.hardware.foo".to_string(),
                format: HalFormat::Hidl,
                interface_name: "IFoo".to_string(),
                instance_name: "default".to_string(),
            },
            required: "2.0".parse().unwrap(),
        }
    }

    #[test]
    fn test_empty_report_passes() {
        let report = CheckReport::new(Some(3), vec![]);
        assert!(report.passed);
        assert_eq!(report.failure_count, 0);
        assert!(report.to_human().contains("PASS"));
    }

    #[test]
    fn test_report_json_fields() {
        let report = CheckReport::new(Some(3), vec![missing()]).with_matrix_digest("abc123");
        let value: serde_json::Value = serde_json::from_str(&report.to_json().unwrap()).unwrap();

        assert_eq!(value["schema_version"], 1);
        assert_eq!(value["schema_id"], CHECK_SCHEMA_ID);
        assert_eq!(value["passed"], false);
        assert_eq!(value["failure_count"], 1);
        assert_eq!(value["matrix_digest"], "abc123");
        assert_eq!(value["failures"][0]["type"], "MissingHal");
        assert_eq!(
            value["failures"][0]["details"]["required"],
            "2.0"
        );
    }

    #[test]
    fn test_human_lists_failures() {
        let report = CheckReport::new(None, vec![missing()]);
        let text = report.to_human();
        assert!(text.contains("level unresolved: FAIL"));
        assert!(text.contains("MISSING_HAL:android.hardware.foo/IFoo/default@2.0"));
    }

    #[test]
    fn test_report_round_trips() {
        let report = CheckReport::new(Some(1), vec![missing()]);
        let parsed: CheckReport = serde_json::from_str(&report.to_json().unwrap()).unwrap();
        assert_eq!(parsed.failures, report.failures);
        assert_eq!(parsed.failure_codes(), report.failure_codes());
    }
}
