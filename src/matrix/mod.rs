//! Matrix level merging
//!
//! Resolves leveled matrix fragments into the requirement entries visible at
//! one target level:
//! 1. entries are grouped into lineages (component/format/interface/instance)
//!    and, within a lineage, into generations (one per major version)
//! 2. each generation's range is the merge of every range declared for it
//! 3. a generation is dropped once a newer generation of the same lineage has
//!    been introduced at or below the target level
//! 4. a generation introduced above the target level is forced optional
//!
//! Without a target level, fragments are concatenated at their native levels.

mod lineage;

use tracing::{debug, warn};
use vintf_types::{MatrixFragment, RequirementEntry, VersionError};

use lineage::group_lineages;

/// Leveled fragments in ascending level order; fragments sharing a level
/// keep their relative order. The base fragment is skipped.
fn leveled(fragments: &[MatrixFragment]) -> Vec<(u32, &MatrixFragment)> {
    let mut leveled: Vec<(u32, &MatrixFragment)> = fragments
        .iter()
        .filter_map(|f| f.level.map(|level| (level, f)))
        .collect();
    leveled.sort_by_key(|(level, _)| *level);
    leveled
}

/// Merge leveled fragments into the entries of one assembled matrix.
///
/// `target_level` of `None` assembles without resolution: every entry is
/// emitted as declared, tagged with its fragment's level.
pub fn merge_levels(
    fragments: &[MatrixFragment],
    target_level: Option<u32>,
) -> Result<Vec<RequirementEntry>, VersionError> {
    let leveled = leveled(fragments);

    let Some(target) = target_level else {
        return Ok(leveled
            .iter()
            .flat_map(|(level, f)| {
                f.entries.iter().map(move |e| RequirementEntry {
                    defined_at_level: *level,
                    ..e.clone()
                })
            })
            .collect());
    };

    if let Some((max_level, _)) = leveled.last() {
        if target > *max_level {
            debug!(
                target,
                max_level, "target level beyond every fragment, highest level is terminal"
            );
        }
    }

    let lineages = group_lineages(
        leveled
            .iter()
            .flat_map(|(level, f)| f.entries.iter().map(move |e| (*level, e))),
    );

    let mut out = Vec::new();
    for lineage in &lineages {
        for generation in &lineage.generations {
            if lineage.is_superseded(generation, target) {
                debug!(
                    lineage = %lineage.key,
                    major = generation.major,
                    target,
                    "generation superseded"
                );
                continue;
            }

            let introduced_at = generation.introduced_at();
            let optionality = generation.optionality(target);
            if optionality.inconsistent {
                warn!(
                    lineage = %lineage.key,
                    major = generation.major,
                    target,
                    optional = optionality.optional,
                    "optional flag declared inconsistently across levels, using highest level"
                );
            }
            if optionality.demoted {
                debug!(
                    lineage = %lineage.key,
                    major = generation.major,
                    introduced_at,
                    target,
                    "generation introduced after target level, forcing optional"
                );
            }

            out.push(RequirementEntry {
                component_name: lineage.key.component_name.clone(),
                format: lineage.key.format,
                interface_name: lineage.key.interface_name.clone(),
                instance_name: lineage.key.instance_name.clone(),
                version_family: generation.family()?,
                optional: optionality.optional,
                defined_at_level: introduced_at,
            });
        }
    }

    Ok(out)
}
