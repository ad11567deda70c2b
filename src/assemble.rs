//! Assembly orchestration
//!
//! One run, in order:
//! 1. fragment hygiene (one base, HALs only in leveled fragments)
//! 2. kernel config merge
//! 3. level merge
//! 4. scalar injection
//!
//! The result is an immutable [`AssembledMatrix`]. [`run`] adds the
//! optional device check on top.

use std::collections::HashSet;

use tracing::{debug, info, warn};
use vintf_types::{
    AssembledMatrix, DeviceDescriptor, MatrixFragment, ScalarFields, VersionError,
};

use crate::check::{validate, CheckReport};
use crate::config::{AssembleEnv, ConfigError};
use crate::input::InputError;
use crate::kernel::{merge_kernel_requirements, KernelConfigInput, KernelMergeError};
use crate::matrix::merge_levels;
use crate::render::{matrix_digest, RenderError};
use crate::scalar::{inject_scalars, ScalarError};

/// Assembly errors
#[derive(Debug, thiserror::Error)]
pub enum AssembleError {
    #[error("invalid input {source_name}: {message}")]
    ParseInput {
        source_name: String,
        message: String,
    },

    #[error("incompatible version ranges: {0}")]
    IncompatibleFamily(#[from] VersionError),

    #[error(transparent)]
    Kernel(#[from] KernelMergeError),

    #[error(transparent)]
    MissingScalar(#[from] ScalarError),

    #[error("assembled matrix invariant violated: {0}")]
    Invariant(String),

    #[error(transparent)]
    Input(#[from] InputError),

    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("render error: {0}")]
    Render(#[from] RenderError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl AssembleError {
    /// Process exit code for this error
    pub fn exit_code(&self) -> i32 {
        match self {
            AssembleError::ParseInput { .. } => 1,
            AssembleError::Input(_) => 1,
            AssembleError::Config(_) => 1,
            AssembleError::Render(_) => 1,
            AssembleError::Io(_) => 1,
            AssembleError::Kernel(KernelMergeError::UnknownFragmentLabel { .. }) => 1,
            AssembleError::Kernel(_) => 2,
            AssembleError::MissingScalar(_) => 3,
            AssembleError::IncompatibleFamily(_) => 4,
            AssembleError::Invariant(_) => 4,
        }
    }
}

/// Exit code for a device that fails an enforced check.
pub const EXIT_INCOMPATIBLE_DEVICE: i32 = 10;

/// Everything one assembly run consumes.
#[derive(Debug, Clone, Default)]
pub struct AssembleRequest {
    pub fragments: Vec<MatrixFragment>,
    pub kernel_inputs: Vec<KernelConfigInput>,
    pub env: AssembleEnv,
    /// `None` assembles without level resolution.
    pub target_level: Option<u32>,
}

fn parse_input(source_name: &str, message: impl Into<String>) -> AssembleError {
    AssembleError::ParseInput {
        source_name: source_name.to_string(),
        message: message.into(),
    }
}

/// Find the base fragment and reject misplaced content.
fn check_fragments(fragments: &[MatrixFragment]) -> Result<Option<&MatrixFragment>, AssembleError> {
    let mut base: Option<&MatrixFragment> = None;

    for fragment in fragments {
        if fragment.is_base() {
            if let Some(first) = base {
                return Err(parse_input(
                    &fragment.source_name,
                    format!("second base fragment (first was {})", first.source_name),
                ));
            }
            if !fragment.entries.is_empty() {
                return Err(parse_input(
                    &fragment.source_name,
                    "base fragment may not declare HALs",
                ));
            }
            base = Some(fragment);
        } else if !fragment.kernel_blocks.is_empty() || fragment.scalars != ScalarFields::default() {
            return Err(parse_input(
                &fragment.source_name,
                "kernel requirements and sepolicy/avb fields belong in the base fragment",
            ));
        }
    }

    Ok(base)
}

/// Each (lineage, major) may appear at most once in a resolved matrix.
fn check_unique_generations(matrix: &AssembledMatrix) -> Result<(), AssembleError> {
    if matrix.level.is_none() {
        return Ok(());
    }
    let mut seen = HashSet::new();
    for entry in &matrix.entries {
        if !seen.insert((entry.lineage(), entry.version_family.major())) {
            return Err(AssembleError::Invariant(format!(
                "{}@{} emitted twice",
                entry.lineage(),
                entry.version_family
            )));
        }
    }
    Ok(())
}

/// Assemble one framework compatibility matrix.
pub fn assemble(request: &AssembleRequest) -> Result<AssembledMatrix, AssembleError> {
    let base = check_fragments(&request.fragments)?;
    let default_base = MatrixFragment::default();
    let base = base.unwrap_or(&default_base);

    let kernel_blocks = merge_kernel_requirements(
        &base.kernel_blocks,
        &base.source_name,
        &request.kernel_inputs,
    )?;

    let entries = merge_levels(&request.fragments, request.target_level)?;
    let scalars = inject_scalars(&base.scalars, &request.env)?;

    let matrix = AssembledMatrix {
        level: request.target_level,
        entries,
        kernel_blocks,
        scalars,
    };
    check_unique_generations(&matrix)?;

    info!(
        level = ?matrix.level,
        fragments = request.fragments.len(),
        entries = matrix.entries.len(),
        required = matrix.required_entries().count(),
        kernel_blocks = matrix.kernel_blocks.len(),
        "assembled compatibility matrix"
    );
    Ok(matrix)
}

/// Result of [`run`]
#[derive(Debug, Clone)]
pub struct RunOutcome {
    pub matrix: AssembledMatrix,
    /// Present when a device was checked
    pub report: Option<CheckReport>,
}

impl RunOutcome {
    /// `true` unless a device was checked and failed.
    pub fn is_compatible(&self) -> bool {
        self.report.as_ref().map_or(true, |r| r.passed)
    }
}

/// Assemble, then check `device` if one is given.
///
/// Without an explicit target level, the device's target level is used;
/// if the device has none either, the run is rejected.
/// Failures are logged at `warn`; whether they fail the run is up to the
/// caller (see [`AssembleEnv::enforce_vintf_manifest`]).
pub fn run(
    request: &AssembleRequest,
    device: Option<&DeviceDescriptor>,
) -> Result<RunOutcome, AssembleError> {
    let Some(device) = device else {
        return Ok(RunOutcome {
            matrix: assemble(request)?,
            report: None,
        });
    };

    let mut request = request.clone();
    if request.target_level.is_none() {
        debug!(target_level = ?device.target_level, "using device target level");
        request.target_level = device.target_level;
    }
    if request.target_level.is_none() {
        return Err(parse_input(
            "device",
            "device declares no target level and none was given",
        ));
    }

    let matrix = assemble(&request)?;
    let failures = validate(&matrix, device);
    for failure in &failures {
        warn!(code = %failure.to_machine_string(), "{}", failure);
    }

    let report =
        CheckReport::new(matrix.level, failures).with_matrix_digest(matrix_digest(&matrix)?);
    info!(
        passed = report.passed,
        failures = report.failure_count,
        enforced = request.env.enforce_vintf_manifest,
        "checked device against matrix"
    );

    Ok(RunOutcome {
        matrix,
        report: Some(report),
    })
}
