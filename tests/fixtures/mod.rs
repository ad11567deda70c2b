//! Test fixtures for golden-file assertions
//!
//! This module provides:
//! - Framework matrix fragments (base + levels 1..3) and their golden XML
//! - An empty base fragment with per-version kernel config fragments
//! - Device descriptors and the build environment used by both scenarios

#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};

use assemble_vintf::input::{load_fragments, load_kernel_inputs, parse_device};
use assemble_vintf::vintf_types::{DeviceDescriptor, KernelVersion, Version, VersionFamily};
use assemble_vintf::{AssembleEnv, AssembleRequest, KernelConfigInput};

fn fixtures_dir() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures")
}

/// Directory with the leveled framework matrix fragments and their base
pub fn framework_matrix_dir() -> PathBuf {
    fixtures_dir().join("framework_matrix")
}

/// Directory holding only an empty base fragment
pub fn empty_matrix_dir() -> PathBuf {
    fixtures_dir().join("empty_matrix")
}

/// Kernel config fragments for one kernel version, generic first
pub fn kernel_cfgs(version: &str) -> Vec<PathBuf> {
    let dir = fixtures_dir().join("kernel").join(version);
    vec![dir.join("android-base.cfg"), dir.join("android-base-arm64.cfg")]
}

/// `--kernel` style argument for one fixture kernel version
pub fn kernel_arg(version: &str) -> String {
    let mut parts = vec![version.to_string()];
    parts.extend(kernel_cfgs(version).iter().map(|p| p.display().to_string()));
    parts.join(":")
}

/// Golden XML output
pub fn golden(name: &str) -> String {
    fs::read_to_string(fixtures_dir().join("golden").join(name))
        .unwrap_or_else(|e| panic!("missing golden file {}: {}", name, e))
}

/// Build environment shared by the scenarios
pub fn scenario_env() -> AssembleEnv {
    AssembleEnv {
        policy_vers: Some(30),
        board_sepolicy_vers: Some(VersionFamily::exact(10000, 0)),
        framework_vbmeta_version: Some(Version::new(1, 0)),
        enforce_vintf_manifest: false,
    }
}

/// Kernel inputs for 3.18 and 4.4, generic and arm64 each
pub fn scenario_kernel_inputs() -> Vec<KernelConfigInput> {
    let mut inputs = load_kernel_inputs(KernelVersion::new(3, 18), &kernel_cfgs("3.18")).unwrap();
    inputs.extend(load_kernel_inputs(KernelVersion::new(4, 4), &kernel_cfgs("4.4")).unwrap());
    inputs
}

/// Empty base fragment plus kernel config fragments
pub fn empty_matrix_request() -> AssembleRequest {
    AssembleRequest {
        fragments: load_fragments(&[empty_matrix_dir()]).unwrap(),
        kernel_inputs: scenario_kernel_inputs(),
        env: scenario_env(),
        target_level: None,
    }
}

/// Leveled fragments with a populated base, enforcement on
pub fn framework_matrix_request(target_level: Option<u32>) -> AssembleRequest {
    AssembleRequest {
        fragments: load_fragments(&[framework_matrix_dir()]).unwrap(),
        kernel_inputs: Vec::new(),
        env: AssembleEnv {
            enforce_vintf_manifest: true,
            ..Default::default()
        },
        target_level,
    }
}

/// Device manifest providing foo 1.1 and 2.0
pub fn device_manifest_toml(target_level: u32) -> String {
    format!(
        r#"target_level = {}

[[hal]]
format = "hidl"
name = "android.hardware.foo"
version = ["1.1"]

[[hal.interface]]
name = "IFoo"
instance = ["default"]

[[hal]]
format = "hidl"
name = "android.hardware.foo"
version = ["2.0"]

[[hal.interface]]
name = "IFoo"
instance = ["default"]

[sepolicy]
version = "10000.0"
"#,
        target_level
    )
}

pub fn device_manifest(target_level: u32) -> DeviceDescriptor {
    parse_device("manifest.toml", &device_manifest_toml(target_level)).unwrap()
}
