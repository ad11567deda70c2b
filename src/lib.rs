//! assemble-vintf - framework compatibility matrix assembler
//!
//! This crate merges per-level matrix fragments, per-architecture kernel
//! config fragments and build-environment values into one framework
//! compatibility matrix, and optionally checks a device descriptor
//! against it.

pub mod assemble;
pub mod check;
pub mod config;
pub mod input;
pub mod kernel;
pub mod matrix;
pub mod render;
pub mod scalar;

pub use assemble::{
    assemble, run, AssembleError, AssembleRequest, RunOutcome, EXIT_INCOMPATIBLE_DEVICE,
};
pub use check::{validate, CheckReport, ValidationFailure};
pub use config::{AssembleEnv, EffectiveConfig, OutputFormat};
pub use kernel::{
    merge_kernel_configs, merge_kernel_requirements, KernelConfigInput, KernelMergeError,
};
pub use matrix::merge_levels;
pub use render::{matrix_digest, render_json, render_xml};
pub use scalar::{inject_scalars, ScalarError};

pub use vintf_types;
