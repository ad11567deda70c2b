//! VINTF data model
//!
//! Types shared by the matrix assembler, the loader and the serializers:
//! version ranges, requirement entries, kernel blocks, fragments, device
//! descriptors and the assembled matrix.

pub mod device;
pub mod kernel;
pub mod matrix;
pub mod version;

pub use device::{DeviceDescriptor, DeviceScalars, Have};
pub use kernel::{
    ArchCondition, KernelConfigKey, KernelConfigValue, KernelRequirementBlock, KernelVersion,
    Tristate,
};
pub use matrix::{
    AssembledMatrix, HalFormat, LineageKey, MatrixFragment, MatrixScalars, RequirementEntry,
    ScalarFields,
};
pub use version::{Version, VersionError, VersionFamily};

/// Version attribute written on every assembled matrix.
pub const MATRIX_SCHEMA_VERSION: &str = "1.0";

/// Matrix type produced by the assembler.
pub const MATRIX_TYPE: &str = "framework";
