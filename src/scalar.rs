//! Scalar field injection
//!
//! Environment values overwrite the base fragment's security-policy and
//! verified-boot fields; absent environment values leave the base untouched.

use tracing::debug;
use vintf_types::{MatrixScalars, ScalarFields};

use crate::config::AssembleEnv;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ScalarError {
    #[error("missing required field {field}: set {env_key} or declare it in the base matrix")]
    MissingRequiredScalar {
        field: &'static str,
        env_key: &'static str,
    },
}

/// Overlay environment values on the base fragment's scalar fields.
pub fn inject_scalars(base: &ScalarFields, env: &AssembleEnv) -> Result<MatrixScalars, ScalarError> {
    if env.policy_vers.is_some() || env.board_sepolicy_vers.is_some() {
        debug!(
            policy_vers = ?env.policy_vers,
            board_sepolicy_vers = ?env.board_sepolicy_vers.map(|v| v.to_string()),
            "overriding sepolicy fields from environment"
        );
    }

    let kernel_sepolicy_version = env
        .policy_vers
        .or(base.kernel_sepolicy_version)
        .ok_or(ScalarError::MissingRequiredScalar {
            field: "kernel-sepolicy-version",
            env_key: "POLICYVERS",
        })?;

    let sepolicy_version = env
        .board_sepolicy_vers
        .or(base.sepolicy_version)
        .ok_or(ScalarError::MissingRequiredScalar {
            field: "sepolicy-version",
            env_key: "BOARD_SEPOLICY_VERS",
        })?;

    let vbmeta_version = env
        .framework_vbmeta_version
        .or(base.vbmeta_version)
        .ok_or(ScalarError::MissingRequiredScalar {
            field: "vbmeta-version",
            env_key: "FRAMEWORK_VBMETA_VERSION",
        })?;

    Ok(MatrixScalars {
        kernel_sepolicy_version,
        sepolicy_version,
        vbmeta_version,
    })
}
