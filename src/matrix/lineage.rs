//! Lineage and generation grouping for level merging.

use vintf_types::{LineageKey, RequirementEntry, VersionError, VersionFamily};

/// Entries of one lineage sharing a major version.
#[derive(Debug)]
pub(crate) struct Generation<'a> {
    pub major: u32,
    /// `(fragment level, entry)` in fragment order.
    pub entries: Vec<(u32, &'a RequirementEntry)>,
}

/// Effective `optional` flag of a generation at a target level.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Optionality {
    pub optional: bool,
    /// Not yet introduced at the target level.
    pub demoted: bool,
    /// Levels at or below the target disagree about the flag.
    pub inconsistent: bool,
}

impl<'a> Generation<'a> {
    /// Merge of every range declared for this generation, across all levels.
    pub fn family(&self) -> Result<VersionFamily, VersionError> {
        let mut iter = self.entries.iter().map(|(_, e)| e.version_family);
        // A generation is only created with at least one entry.
        let first = iter.next().unwrap_or(VersionFamily::exact(self.major, 0));
        iter.try_fold(first, |acc, next| acc.merge(&next))
    }

    /// Lowest level declaring this generation.
    pub fn introduced_at(&self) -> u32 {
        self.entries
            .iter()
            .map(|(level, _)| *level)
            .min()
            .unwrap_or(u32::MAX)
    }

    /// Value declared at the highest level not above `target`; `true` wins a
    /// tie within that level.
    pub fn optionality(&self, target: u32) -> Optionality {
        let visible: Vec<(u32, bool)> = self
            .entries
            .iter()
            .filter(|(level, _)| *level <= target)
            .map(|(level, e)| (*level, e.optional))
            .collect();

        let Some(highest) = visible.iter().map(|(level, _)| *level).max() else {
            return Optionality {
                optional: true,
                demoted: true,
                inconsistent: false,
            };
        };

        let optional = visible
            .iter()
            .any(|(level, optional)| *level == highest && *optional);
        let inconsistent = visible.iter().any(|(_, o)| *o != visible[0].1);

        Optionality {
            optional,
            demoted: false,
            inconsistent,
        }
    }
}

/// All generations of one `(component, format, interface, instance)`.
#[derive(Debug)]
pub(crate) struct Lineage<'a> {
    pub key: LineageKey,
    /// Sorted by ascending major.
    pub generations: Vec<Generation<'a>>,
}

impl<'a> Lineage<'a> {
    /// True iff a newer generation, already introduced at `target`, replaces `older`.
    pub fn is_superseded(&self, older: &Generation<'_>, target: u32) -> bool {
        let Some((_, older_entry)) = older.entries.first() else {
            return false;
        };
        self.generations.iter().any(|g| {
            g.introduced_at() <= target
                && g.entries
                    .iter()
                    .any(|(_, e)| e.version_family.supersedes(&older_entry.version_family))
        })
    }
}

/// Group leveled entries into lineages, keeping first-appearance order.
pub(crate) fn group_lineages<'a>(
    entries: impl IntoIterator<Item = (u32, &'a RequirementEntry)>,
) -> Vec<Lineage<'a>> {
    let mut lineages: Vec<Lineage<'a>> = Vec::new();

    for (level, entry) in entries {
        let idx = match lineages.iter().position(|l| entry.same_lineage(&l.key)) {
            Some(idx) => idx,
            None => {
                lineages.push(Lineage {
                    key: entry.lineage(),
                    generations: Vec::new(),
                });
                lineages.len() - 1
            }
        };

        let lineage = &mut lineages[idx];
        let major = entry.version_family.major();
        match lineage.generations.iter_mut().find(|g| g.major == major) {
            Some(generation) => generation.entries.push((level, entry)),
            None => lineage.generations.push(Generation {
                major,
                entries: vec![(level, entry)],
            }),
        }
    }

    for lineage in &mut lineages {
        lineage.generations.sort_by_key(|g| g.major);
    }
    lineages
}
