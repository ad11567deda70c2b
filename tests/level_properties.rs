//! Property tests for level resolution
//!
//! Fragments are generated with one optional flag per (lineage, major), so
//! a generation's optionality only changes through demotion.

use proptest::prelude::*;
use std::collections::HashMap;

use assemble_vintf::vintf_types::{
    HalFormat, LineageKey, MatrixFragment, RequirementEntry, Version, VersionFamily,
};
use assemble_vintf::{assemble, matrix_digest, merge_levels, AssembleEnv, AssembleRequest};

const NAMES: [&str; 2] = ["android.hardware.foo", "android.hardware.bar"];

/// (level, name index, major, min minor, span)
type Decl = (u32, usize, u32, u32, u32);

fn arb_decls() -> impl Strategy<Value = Vec<Decl>> {
    prop::collection::vec((1u32..=5, 0usize..2, 1u32..=3, 0u32..=3, 0u32..=2), 1..12)
}

fn arb_optional_table() -> impl Strategy<Value = [[bool; 3]; 2]> {
    prop::array::uniform2(prop::array::uniform3(any::<bool>()))
}

fn fragments(decls: &[Decl], optional: &[[bool; 3]; 2]) -> Vec<MatrixFragment> {
    decls
        .iter()
        .map(|&(level, name, major, min, span)| MatrixFragment {
            level: Some(level),
            source_name: format!("compatibility_matrix.{}.toml", level),
            entries: vec![RequirementEntry {
                component_name: NAMES[name].to_string(),
                format: HalFormat::Hidl,
                interface_name: "IFoo".to_string(),
                instance_name: "default".to_string(),
                version_family: VersionFamily::new(major, min, min + span).unwrap(),
                optional: optional[name][(major - 1) as usize],
                defined_at_level: level,
            }],
            ..Default::default()
        })
        .collect()
}

fn visible(entries: &[RequirementEntry]) -> HashMap<(LineageKey, u32), bool> {
    entries
        .iter()
        .map(|e| ((e.lineage(), e.version_family.major()), e.optional))
        .collect()
}

fn env() -> AssembleEnv {
    AssembleEnv {
        policy_vers: Some(30),
        board_sepolicy_vers: Some(VersionFamily::exact(10000, 0)),
        framework_vbmeta_version: Some(Version::new(1, 0)),
        enforce_vintf_manifest: false,
    }
}

proptest! {
    /// Raising the target level only drops generations or makes them
    /// required; it never adds a generation or makes one optional.
    #[test]
    fn property_level_monotonicity(
        decls in arb_decls(),
        optional in arb_optional_table(),
        level in 1u32..=5,
    ) {
        let fragments = fragments(&decls, &optional);
        let lower = visible(&merge_levels(&fragments, Some(level)).unwrap());
        let higher = visible(&merge_levels(&fragments, Some(level + 1)).unwrap());

        for (key, higher_optional) in &higher {
            let lower_optional = lower.get(key);
            prop_assert!(lower_optional.is_some(), "{:?} appeared at level {}", key, level + 1);
            if *higher_optional {
                prop_assert_eq!(lower_optional, Some(&true));
            }
        }
    }

    /// Each lineage keeps at most one generation per major, and every
    /// declared minor stays inside the emitted range.
    #[test]
    fn property_generations_cover_declarations(
        decls in arb_decls(),
        optional in arb_optional_table(),
        level in 1u32..=6,
    ) {
        let fragments = fragments(&decls, &optional);
        let out = merge_levels(&fragments, Some(level)).unwrap();
        prop_assert_eq!(visible(&out).len(), out.len());

        for entry in &out {
            for decl in fragments.iter().flat_map(|f| &f.entries) {
                if decl.lineage() == entry.lineage()
                    && decl.version_family.major() == entry.version_family.major()
                {
                    prop_assert!(entry.version_family.contains(&decl.version_family.min_version()));
                }
            }
        }
    }

    /// Assembling the same request twice gives the same digest.
    #[test]
    fn property_assembly_is_idempotent(
        decls in arb_decls(),
        optional in arb_optional_table(),
        level in prop::option::of(1u32..=5),
    ) {
        let request = AssembleRequest {
            fragments: fragments(&decls, &optional),
            kernel_inputs: Vec::new(),
            env: env(),
            target_level: level,
        };
        let first = assemble(&request).unwrap();
        let second = assemble(&request).unwrap();
        prop_assert_eq!(matrix_digest(&first).unwrap(), matrix_digest(&second).unwrap());
    }
}
