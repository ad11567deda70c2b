//! Configuration layering and CLI exit codes
//!
//! The CLI tests run the built binary against tests/fixtures and check the
//! artifact on stdout plus the documented exit codes.

mod fixtures;

use std::fs;
use std::process::Command;
use tempfile::TempDir;

use assemble_vintf::config::{ConfigOrigin, EffectiveConfig};
use assemble_vintf::input::{load_fragments, load_kernel_inputs, parse_kernel_arg};
use assemble_vintf::{assemble, render_xml, AssembleRequest, OutputFormat};

fn no_env(_: &str) -> Option<String> {
    None
}

// =============================================================================
// Config layering
// =============================================================================

#[test]
fn test_config_file_supplies_env() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("assemble-vintf.toml");
    fs::write(
        &path,
        r#"
[env]
POLICYVERS = 30
BOARD_SEPOLICY_VERS = "10000.0"
FRAMEWORK_VBMETA_VERSION = "1.0"

[output]
format = "json"
"#,
    )
    .unwrap();

    let config = EffectiveConfig::build(Some(path.as_path()), no_env, &[], None).unwrap();
    assert_eq!(config.env, fixtures::scenario_env());
    assert_eq!(config.output_format, OutputFormat::Json);
    assert_eq!(config.sources.len(), 2);
    assert_eq!(config.sources[1].origin, ConfigOrigin::File);
    assert_eq!(config.sources[1].digest.as_ref().map(|d| d.len()), Some(64));
}

#[test]
fn test_cli_beats_process_env_beats_file() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("assemble-vintf.toml");
    fs::write(&path, "[env]\nPOLICYVERS = \"28\"\nFRAMEWORK_VBMETA_VERSION = \"1.0\"\n").unwrap();

    let process = |key: &str| match key {
        "POLICYVERS" => Some("29".to_string()),
        "PRODUCT_ENFORCE_VINTF_MANIFEST" => Some("true".to_string()),
        _ => None,
    };
    let cli = vec![("POLICYVERS".to_string(), "30".to_string())];

    let config =
        EffectiveConfig::build(Some(path.as_path()), process, &cli, Some(OutputFormat::Xml))
            .unwrap();
    assert_eq!(config.env.policy_vers, Some(30));
    assert!(config.env.enforce_vintf_manifest);
    assert_eq!(
        config.env.framework_vbmeta_version.map(|v| v.to_string()),
        Some("1.0".to_string())
    );

    let origins: Vec<ConfigOrigin> = config.sources.iter().map(|s| s.origin.clone()).collect();
    assert_eq!(
        origins,
        vec![
            ConfigOrigin::Builtin,
            ConfigOrigin::File,
            ConfigOrigin::Environment,
            ConfigOrigin::Cli
        ]
    );
}

#[test]
fn test_unknown_cli_env_key_rejected() {
    let cli = vec![("PRODUCT_SHIPPING_API_LEVEL".to_string(), "28".to_string())];
    assert!(EffectiveConfig::build(None, no_env, &cli, None).is_err());
}

#[test]
fn test_kernel_args_load_like_the_cli() {
    let mut kernel_inputs = Vec::new();
    for version in ["3.18", "4.4"] {
        let (version, files) = parse_kernel_arg(&fixtures::kernel_arg(version)).unwrap();
        kernel_inputs.extend(load_kernel_inputs(version, &files).unwrap());
    }
    let config = EffectiveConfig::build(
        None,
        no_env,
        &[
            ("POLICYVERS".to_string(), "30".to_string()),
            ("BOARD_SEPOLICY_VERS".to_string(), "10000.0".to_string()),
            ("FRAMEWORK_VBMETA_VERSION".to_string(), "1.0".to_string()),
        ],
        None,
    )
    .unwrap();

    let request = AssembleRequest {
        fragments: load_fragments(&[fixtures::empty_matrix_dir()]).unwrap(),
        kernel_inputs,
        env: config.env,
        target_level: None,
    };
    assert_eq!(
        render_xml(&assemble(&request).unwrap()),
        fixtures::golden("framework_matrix_empty.xml")
    );
}

// =============================================================================
// CLI
// =============================================================================

fn cli() -> Command {
    let mut cmd = Command::new(env!("CARGO_BIN_EXE_assemble-vintf"));
    for key in assemble_vintf::config::RECOGNIZED_ENV_KEYS {
        cmd.env_remove(key);
    }
    cmd
}

#[test]
fn test_cli_assemble_writes_xml_to_stdout() {
    let output = cli()
        .arg("assemble")
        .arg("-i")
        .arg(fixtures::framework_matrix_dir())
        .args(["--level", "3"])
        .output()
        .unwrap();

    assert_eq!(output.status.code(), Some(0));
    assert_eq!(
        String::from_utf8(output.stdout).unwrap(),
        fixtures::golden("framework_matrix_level_3.xml")
    );
}

#[test]
fn test_cli_enforced_incompatible_device_exits_10() {
    let temp = TempDir::new().unwrap();
    let device = temp.path().join("manifest.toml");
    fs::write(&device, "target_level = 3\n").unwrap();
    let report = temp.path().join("report.json");

    let output = cli()
        .arg("assemble")
        .arg("-i")
        .arg(fixtures::framework_matrix_dir())
        .arg("-c")
        .arg(&device)
        .args(["--env", "PRODUCT_ENFORCE_VINTF_MANIFEST=true"])
        .arg("--report")
        .arg(&report)
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(10));

    let value: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(&report).unwrap()).unwrap();
    assert_eq!(value["passed"], false);
    assert_eq!(value["target_level"], 3);
    assert_eq!(value["failures"][0]["type"], "MissingHal");
}

#[test]
fn test_cli_unenforced_incompatible_device_exits_0() {
    let temp = TempDir::new().unwrap();
    let device = temp.path().join("manifest.toml");
    fs::write(&device, "target_level = 3\n").unwrap();

    let output = cli()
        .arg("assemble")
        .arg("-i")
        .arg(fixtures::framework_matrix_dir())
        .arg("-c")
        .arg(&device)
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(0));
    assert!(String::from_utf8(output.stdout).unwrap().contains("level=\"3\""));
}

#[test]
fn test_cli_check_json_report() {
    let temp = TempDir::new().unwrap();
    let device = temp.path().join("manifest.toml");
    fs::write(&device, fixtures::device_manifest_toml(2)).unwrap();

    let output = cli()
        .arg("check")
        .arg("-i")
        .arg(fixtures::framework_matrix_dir())
        .arg("-c")
        .arg(&device)
        .arg("--json")
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(0));

    let value: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(value["passed"], true);
    assert_eq!(value["failure_count"], 0);
}

#[test]
fn test_cli_missing_scalar_exits_3() {
    let output = cli()
        .arg("assemble")
        .arg("-i")
        .arg(fixtures::empty_matrix_dir())
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(3));
}

#[test]
fn test_cli_kernel_conflict_exits_2() {
    let temp = TempDir::new().unwrap();
    let generic = temp.path().join("android-base.cfg");
    let arm64 = temp.path().join("android-base-arm64.cfg");
    fs::write(&generic, "CONFIG_FOO=y\n").unwrap();
    fs::write(&arm64, "CONFIG_FOO=m\n").unwrap();

    let output = cli()
        .arg("assemble")
        .arg("-i")
        .arg(fixtures::framework_matrix_dir())
        .arg("-k")
        .arg(format!("4.9:{}:{}", generic.display(), arm64.display()))
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(2));
}

#[test]
fn test_cli_bad_input_exits_1() {
    let temp = TempDir::new().unwrap();
    let bad = temp.path().join("compatibility_matrix.1.toml");
    fs::write(&bad, "level = \"one\"\n").unwrap();

    let output = cli().arg("assemble").arg("-i").arg(&bad).output().unwrap();
    assert_eq!(output.status.code(), Some(1));
}
