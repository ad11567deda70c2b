//! Kernel configuration merge
//!
//! Combines, per kernel version, one generic requirement set and any number
//! of architecture-specific sets into conditional requirement blocks:
//! - generic keys form the unconditioned block
//! - arch keys not named by the generic set form that arch's block
//! - a key named by both with the same value stays only in the generic block
//! - a key named by both with different values rejects the run
//!
//! Kernel versions are emitted in the order they were first registered.

mod cfg;

pub use cfg::{parse_kernel_config, CfgParseError};

use std::path::Path;

use tracing::debug;
use vintf_types::{
    ArchCondition, KernelConfigKey, KernelConfigValue, KernelRequirementBlock, KernelVersion,
};

/// File name of the generic kernel requirement fragment.
pub const GENERIC_FRAGMENT: &str = "android-base.cfg";

/// One kernel config fragment tagged with its kernel version and label.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KernelConfigInput {
    pub version: KernelVersion,
    /// Fragment file name, e.g. `android-base-arm64.cfg`.
    pub label: String,
    pub keys: Vec<KernelConfigKey>,
}

impl KernelConfigInput {
    pub fn new(version: KernelVersion, label: impl Into<String>, keys: Vec<KernelConfigKey>) -> Self {
        Self {
            version,
            label: label.into(),
            keys,
        }
    }

    /// Architecture this fragment is conditioned on, `None` for the generic one.
    pub fn condition(&self) -> Result<Option<ArchCondition>, KernelMergeError> {
        let name = Path::new(&self.label)
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or(&self.label);

        if name == GENERIC_FRAGMENT {
            return Ok(None);
        }

        name.strip_prefix("android-base-")
            .and_then(|rest| rest.strip_suffix(".cfg"))
            .and_then(ArchCondition::from_label)
            .map(Some)
            .ok_or_else(|| KernelMergeError::UnknownFragmentLabel {
                kernel_version: self.version,
                label: self.label.clone(),
            })
    }
}

/// Kernel merge errors
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum KernelMergeError {
    #[error(
        "kernel {kernel_version}: {key} is {first_value} in {first_source} but {second_value} in {second_source}"
    )]
    DuplicateKeyConflict {
        kernel_version: KernelVersion,
        key: String,
        first_source: String,
        first_value: KernelConfigValue,
        second_source: String,
        second_value: KernelConfigValue,
    },

    #[error("kernel {kernel_version}: unrecognized kernel config fragment '{label}'")]
    UnknownFragmentLabel {
        kernel_version: KernelVersion,
        label: String,
    },
}

/// Keys deduplicated by name, remembering which fragment supplied each.
#[derive(Debug, Default)]
struct KeySet {
    keys: Vec<(KernelConfigKey, String)>,
}

impl KeySet {
    fn get(&self, name: &str) -> Option<&(KernelConfigKey, String)> {
        self.keys.iter().find(|(k, _)| k.name == name)
    }

    fn insert(
        &mut self,
        version: KernelVersion,
        key: &KernelConfigKey,
        source: &str,
    ) -> Result<(), KernelMergeError> {
        match self.get(&key.name) {
            Some((existing, _)) if existing.value == key.value => Ok(()),
            Some((existing, existing_source)) => Err(conflict(
                version,
                existing,
                existing_source,
                key,
                source,
            )),
            None => {
                self.keys.push((key.clone(), source.to_string()));
                Ok(())
            }
        }
    }
}

fn conflict(
    version: KernelVersion,
    first: &KernelConfigKey,
    first_source: &str,
    second: &KernelConfigKey,
    second_source: &str,
) -> KernelMergeError {
    KernelMergeError::DuplicateKeyConflict {
        kernel_version: version,
        key: first.name.clone(),
        first_source: first_source.to_string(),
        first_value: first.value.clone(),
        second_source: second_source.to_string(),
        second_value: second.value.clone(),
    }
}

/// All fragments registered for one kernel version.
#[derive(Debug)]
struct VersionGroup {
    version: KernelVersion,
    generic: KeySet,
    /// Conditioned sets in registration order.
    conditioned: Vec<(ArchCondition, KeySet)>,
}

impl VersionGroup {
    fn new(version: KernelVersion) -> Self {
        Self {
            version,
            generic: KeySet::default(),
            conditioned: Vec::new(),
        }
    }

    fn slot(&mut self, condition: Option<ArchCondition>) -> &mut KeySet {
        let Some(arch) = condition else {
            return &mut self.generic;
        };
        let idx = match self.conditioned.iter().position(|(a, _)| *a == arch) {
            Some(idx) => idx,
            None => {
                self.conditioned.push((arch, KeySet::default()));
                self.conditioned.len() - 1
            }
        };
        &mut self.conditioned[idx].1
    }

    fn add_keys(
        &mut self,
        condition: Option<ArchCondition>,
        keys: &[KernelConfigKey],
        source: &str,
    ) -> Result<(), KernelMergeError> {
        let version = self.version;
        let target = self.slot(condition);
        for key in keys {
            target.insert(version, key, source)?;
        }
        Ok(())
    }

    fn add(&mut self, input: &KernelConfigInput) -> Result<(), KernelMergeError> {
        self.add_keys(input.condition()?, &input.keys, &input.label)
    }

    fn emit(self, out: &mut Vec<KernelRequirementBlock>) -> Result<(), KernelMergeError> {
        let mut conditioned_blocks = Vec::new();
        for (arch, set) in &self.conditioned {
            let mut exclusive = Vec::new();
            for (key, source) in &set.keys {
                match self.generic.get(&key.name) {
                    None => exclusive.push(key.clone()),
                    Some((generic, _)) if generic.value == key.value => {
                        debug!(
                            kernel = %self.version,
                            arch = %arch,
                            key = %key.name,
                            "arch key duplicates generic requirement, keeping generic"
                        );
                    }
                    Some((generic, generic_source)) => {
                        return Err(conflict(self.version, generic, generic_source, key, source));
                    }
                }
            }
            if !exclusive.is_empty() {
                conditioned_blocks.push(KernelRequirementBlock {
                    kernel_version: self.version,
                    condition: Some(*arch),
                    keys: exclusive,
                });
            }
        }

        if !self.generic.keys.is_empty() {
            out.push(KernelRequirementBlock {
                kernel_version: self.version,
                condition: None,
                keys: self.generic.keys.into_iter().map(|(k, _)| k).collect(),
            });
        }
        out.extend(conditioned_blocks);
        Ok(())
    }
}

fn group_for(groups: &mut Vec<VersionGroup>, version: KernelVersion) -> &mut VersionGroup {
    let idx = match groups.iter().position(|g| g.version == version) {
        Some(idx) => idx,
        None => {
            groups.push(VersionGroup::new(version));
            groups.len() - 1
        }
    };
    &mut groups[idx]
}

/// Merge kernel config fragments into conditional requirement blocks.
///
/// Pure: the same inputs always produce the same blocks, in the same order.
pub fn merge_kernel_configs(
    inputs: &[KernelConfigInput],
) -> Result<Vec<KernelRequirementBlock>, KernelMergeError> {
    merge_kernel_requirements(&[], "", inputs)
}

/// Like [`merge_kernel_configs`], with blocks already declared by a base
/// matrix (`base_source`) registered ahead of the fragments.
///
/// Base and fragment keys for one version share the same blocks, so a key
/// given different values by the two is a conflict.
pub fn merge_kernel_requirements(
    base: &[KernelRequirementBlock],
    base_source: &str,
    inputs: &[KernelConfigInput],
) -> Result<Vec<KernelRequirementBlock>, KernelMergeError> {
    let mut groups: Vec<VersionGroup> = Vec::new();

    for block in base {
        group_for(&mut groups, block.kernel_version).add_keys(
            block.condition,
            &block.keys,
            base_source,
        )?;
    }
    for input in inputs {
        group_for(&mut groups, input.version).add(input)?;
    }

    let mut blocks = Vec::new();
    for group in groups {
        group.emit(&mut blocks)?;
    }
    debug!(blocks = blocks.len(), "merged kernel requirements");
    Ok(blocks)
}
