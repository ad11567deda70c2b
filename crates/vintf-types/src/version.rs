//! Version ranges and exact versions.
//!
//! A [`VersionFamily`] is a `major.minMinor[-maxMinor]` range. Two families
//! belong to the same family iff their majors match; only same-family ranges
//! can be merged.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

/// Errors produced by version parsing and family merging.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum VersionError {
    #[error("invalid version '{input}': {reason}")]
    Parse { input: String, reason: String },

    #[error("cannot merge version families {left} and {right}: majors differ")]
    IncompatibleFamily {
        left: VersionFamily,
        right: VersionFamily,
    },
}

/// An exact `major.minor` version, as declared by a device.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Version {
    pub major: u32,
    pub minor: u32,
}

impl Version {
    pub const fn new(major: u32, minor: u32) -> Self {
        Self { major, minor }
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.major, self.minor)
    }
}

impl FromStr for Version {
    type Err = VersionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (major, minor) = s
            .trim()
            .split_once('.')
            .ok_or_else(|| parse_error(s, "expected MAJOR.MINOR"))?;
        Ok(Self {
            major: parse_component(s, major)?,
            minor: parse_component(s, minor)?,
        })
    }
}

/// A range of minor versions within one major version.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct VersionFamily {
    major: u32,
    min_minor: u32,
    max_minor: u32,
}

impl VersionFamily {
    /// Build a range; `None` when `min_minor > max_minor`.
    pub fn new(major: u32, min_minor: u32, max_minor: u32) -> Option<Self> {
        (min_minor <= max_minor).then_some(Self {
            major,
            min_minor,
            max_minor,
        })
    }

    /// A range holding exactly one minor version.
    pub const fn exact(major: u32, minor: u32) -> Self {
        Self {
            major,
            min_minor: minor,
            max_minor: minor,
        }
    }

    pub fn major(&self) -> u32 {
        self.major
    }

    pub fn min_minor(&self) -> u32 {
        self.min_minor
    }

    pub fn max_minor(&self) -> u32 {
        self.max_minor
    }

    /// Lowest version admitted by this range.
    pub fn min_version(&self) -> Version {
        Version::new(self.major, self.min_minor)
    }

    /// True iff both ranges share a major version.
    pub fn same_family(&self, other: &VersionFamily) -> bool {
        self.major == other.major
    }

    /// Widen to cover both ranges. Callers check [`same_family`](Self::same_family) first.
    pub fn merge(&self, other: &VersionFamily) -> Result<VersionFamily, VersionError> {
        if !self.same_family(other) {
            return Err(VersionError::IncompatibleFamily {
                left: *self,
                right: *other,
            });
        }
        Ok(VersionFamily {
            major: self.major,
            min_minor: self.min_minor.min(other.min_minor),
            max_minor: self.max_minor.max(other.max_minor),
        })
    }

    /// True iff `exact` falls inside this range.
    pub fn contains(&self, exact: &Version) -> bool {
        exact.major == self.major && (self.min_minor..=self.max_minor).contains(&exact.minor)
    }

    /// True iff `self` fully replaces `older` once it is in effect.
    pub fn supersedes(&self, older: &VersionFamily) -> bool {
        self.major > older.major
    }
}

impl fmt::Display for VersionFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.min_minor == self.max_minor {
            write!(f, "{}.{}", self.major, self.min_minor)
        } else {
            write!(f, "{}.{}-{}", self.major, self.min_minor, self.max_minor)
        }
    }
}

impl FromStr for VersionFamily {
    type Err = VersionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (major, minors) = s
            .trim()
            .split_once('.')
            .ok_or_else(|| parse_error(s, "expected MAJOR.MINOR[-MAXMINOR]"))?;
        let major = parse_component(s, major)?;
        let (min_minor, max_minor) = match minors.split_once('-') {
            Some((lo, hi)) => (parse_component(s, lo)?, parse_component(s, hi)?),
            None => {
                let minor = parse_component(s, minors)?;
                (minor, minor)
            }
        };
        VersionFamily::new(major, min_minor, max_minor)
            .ok_or_else(|| parse_error(s, "minimum minor exceeds maximum minor"))
    }
}

fn parse_component(input: &str, part: &str) -> Result<u32, VersionError> {
    part.parse::<u32>()
        .map_err(|e| parse_error(input, &e.to_string()))
}

fn parse_error(input: &str, reason: &str) -> VersionError {
    VersionError::Parse {
        input: input.to_string(),
        reason: reason.to_string(),
    }
}

macro_rules! serde_via_str {
    ($ty:ty) => {
        impl Serialize for $ty {
            fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
                serializer.collect_str(self)
            }
        }

        impl<'de> Deserialize<'de> for $ty {
            fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
                let s = String::deserialize(deserializer)?;
                s.parse().map_err(serde::de::Error::custom)
            }
        }
    };
}

serde_via_str!(Version);
serde_via_str!(VersionFamily);

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn fam(s: &str) -> VersionFamily {
        s.parse().unwrap()
    }

    #[test]
    fn test_parse_and_display() {
        assert_eq!(fam("1.0").to_string(), "1.0");
        assert_eq!(fam("1.0-1").to_string(), "1.0-1");
        assert_eq!(fam("10000.0"), VersionFamily::exact(10000, 0));
        assert_eq!("1.1".parse::<Version>().unwrap(), Version::new(1, 1));
    }

    #[test]
    fn test_parse_rejects_inverted_range() {
        let err = "1.3-1".parse::<VersionFamily>().unwrap_err();
        assert!(err.to_string().contains("minimum minor exceeds maximum minor"));
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert!("1".parse::<VersionFamily>().is_err());
        assert!("a.b".parse::<VersionFamily>().is_err());
        assert!("1.x".parse::<Version>().is_err());
    }

    #[test]
    fn test_merge_widens_range() {
        let merged = fam("1.0").merge(&fam("1.1")).unwrap();
        assert_eq!(merged, fam("1.0-1"));
    }

    #[test]
    fn test_merge_rejects_different_major() {
        let err = fam("1.0").merge(&fam("2.0")).unwrap_err();
        assert!(matches!(err, VersionError::IncompatibleFamily { .. }));
    }

    #[test]
    fn test_contains() {
        let range = fam("1.0-2");
        assert!(range.contains(&Version::new(1, 0)));
        assert!(range.contains(&Version::new(1, 2)));
        assert!(!range.contains(&Version::new(1, 3)));
        assert!(!range.contains(&Version::new(2, 1)));
    }

    #[test]
    fn test_supersedes() {
        assert!(fam("2.0").supersedes(&fam("1.0-5")));
        assert!(!fam("1.4").supersedes(&fam("1.0")));
    }

    #[test]
    fn test_serde_uses_text_form() {
        let json = serde_json::to_string(&fam("3.1-4")).unwrap();
        assert_eq!(json, "\"3.1-4\"");
        let back: VersionFamily = serde_json::from_str(&json).unwrap();
        assert_eq!(back, fam("3.1-4"));
    }

    fn arb_family(major: u32) -> impl Strategy<Value = VersionFamily> {
        (0u32..20, 0u32..20).prop_map(move |(a, b)| {
            VersionFamily::new(major, a.min(b), a.max(b)).unwrap()
        })
    }

    proptest! {
        #[test]
        fn property_merge_is_associative_and_commutative(
            a in arb_family(1),
            b in arb_family(1),
            c in arb_family(1),
        ) {
            let left = a.merge(&b).unwrap().merge(&c).unwrap();
            let right = a.merge(&b.merge(&c).unwrap()).unwrap();
            prop_assert_eq!(left, right);
            prop_assert_eq!(a.merge(&b).unwrap(), b.merge(&a).unwrap());
        }

        #[test]
        fn property_merge_bounds_are_elementwise(a in arb_family(4), b in arb_family(4)) {
            let merged = a.merge(&b).unwrap();
            prop_assert_eq!(merged.min_minor(), a.min_minor().min(b.min_minor()));
            prop_assert_eq!(merged.max_minor(), a.max_minor().max(b.max_minor()));
        }

        #[test]
        fn property_display_round_trips(a in arb_family(7)) {
            prop_assert_eq!(a.to_string().parse::<VersionFamily>().unwrap(), a);
        }
    }
}
