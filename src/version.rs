//! Product version parsing and compatibility checks.
//!
//! Bonita versions are `major.minor.micro` with an optional qualifier, either
//! OSGi style (`7.12.0.202103011200`) or semver style (`10.2.0-alpha`).
//! Ordering only considers the numeric part.

use std::cmp::Ordering;
use std::fmt;

use crate::error::MigrationError;

/// Version of this product; projects at this version need no migration.
pub const CURRENT_VERSION: &str = "10.2.0";

/// Version of the `bonita-project` parent matching [`CURRENT_VERSION`].
pub const BONITA_RUNTIME_VERSION: &str = "10.2.0";

/// Oldest project version the migration pipeline supports.
pub const MIGRATION_MINIMAL_VERSION: &str = "7.10.0";

/// Oldest project version that can be imported at all.
pub const IMPORT_MINIMAL_VERSION: &str = "6.0.0";

/// A parsed product version.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProductVersion {
    core: semver::Version,
    qualifier: Option<String>,
}

impl ProductVersion {
    /// Parse a version string, failing on anything that is not
    /// `major[.minor[.micro]][(.|-)qualifier]`.
    pub fn parse(input: &str) -> Result<Self, MigrationError> {
        let invalid = |reason: &str| MigrationError::InvalidVersion {
            version: input.to_string(),
            reason: reason.to_string(),
        };

        let trimmed = input.trim();
        if trimmed.is_empty() {
            return Err(invalid("version is empty"));
        }

        let mut parts: Vec<&str> = trimmed.splitn(4, '.').collect();
        let mut qualifier = if parts.len() == 4 {
            parts.pop().map(str::to_string)
        } else {
            None
        };
        // A semver-style qualifier hangs off the last numeric segment.
        if let Some(last) = parts.last_mut() {
            let segment: &str = *last;
            if let Some((number, q)) = segment.split_once('-') {
                if qualifier.is_some() {
                    return Err(invalid("version has two qualifiers"));
                }
                *last = number;
                qualifier = Some(q.to_string());
            }
        }
        if qualifier.as_deref() == Some("") {
            return Err(invalid("qualifier is empty"));
        }

        let major = parts.first().copied().unwrap_or_default();
        let minor = parts.get(1).copied().unwrap_or("0");
        let micro = parts.get(2).copied().unwrap_or("0");

        let core = semver::Version::parse(&format!("{major}.{minor}.{micro}"))
            .map_err(|e| invalid(&e.to_string()))?;

        Ok(Self { core, qualifier })
    }

    pub fn major(&self) -> u64 {
        self.core.major
    }

    pub fn minor(&self) -> u64 {
        self.core.minor
    }

    pub fn micro(&self) -> u64 {
        self.core.patch
    }

    pub fn qualifier(&self) -> Option<&str> {
        self.qualifier.as_deref()
    }

    /// Compare numeric components only; qualifiers are ignored.
    pub fn cmp_ignoring_qualifier(&self, other: &ProductVersion) -> Ordering {
        self.core.cmp(&other.core)
    }

    /// True when major and minor components are equal.
    pub fn same_minor(&self, other: &ProductVersion) -> bool {
        self.major() == other.major() && self.minor() == other.minor()
    }

    /// True for build-timestamp qualifiers (all digits, or the literal `qualifier`).
    pub fn has_timestamp_qualifier(&self) -> bool {
        match &self.qualifier {
            Some(q) => q == "qualifier" || q.chars().all(|c| c.is_ascii_digit()),
            None => false,
        }
    }
}

impl fmt::Display for ProductVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.core)?;
        if let Some(q) = &self.qualifier {
            write!(f, ".{q}")?;
        }
        Ok(())
    }
}

/// Half-open range of source versions a step applies to.
///
/// Bounds are inclusive below and exclusive above, e.g. `before("9.0.0")`
/// contains `8.9.9` but not `9.0.0`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VersionRange {
    from: Option<&'static str>,
    until: Option<&'static str>,
}

impl VersionRange {
    /// `version < until`
    pub const fn before(until: &'static str) -> Self {
        Self {
            from: None,
            until: Some(until),
        }
    }

    /// `from <= version < until`
    pub const fn between(from: &'static str, until: &'static str) -> Self {
        Self {
            from: Some(from),
            until: Some(until),
        }
    }

    /// `from <= version`
    pub const fn since(from: &'static str) -> Self {
        Self {
            from: Some(from),
            until: None,
        }
    }

    /// Whether `version` lies in the range. Fails on an unparsable version.
    pub fn contains(&self, version: &str) -> Result<bool, MigrationError> {
        let version = ProductVersion::parse(version)?;
        if let Some(from) = self.from {
            let from = ProductVersion::parse(from)?;
            if version.cmp_ignoring_qualifier(&from) == Ordering::Less {
                return Ok(false);
            }
        }
        if let Some(until) = self.until {
            let until = ProductVersion::parse(until)?;
            if version.cmp_ignoring_qualifier(&until) != Ordering::Less {
                return Ok(false);
            }
        }
        Ok(true)
    }
}

fn current() -> Option<ProductVersion> {
    ProductVersion::parse(CURRENT_VERSION).ok()
}

/// Whether a project at `version` can go through the migration pipeline:
/// `MIGRATION_MINIMAL_VERSION <= version < CURRENT_VERSION`.
pub fn can_be_migrated(version: &str) -> bool {
    match VersionRange::between(MIGRATION_MINIMAL_VERSION, CURRENT_VERSION).contains(version) {
        Ok(result) => result,
        Err(e) => {
            tracing::debug!("Version '{}' cannot be migrated: {}", version, e);
            false
        }
    }
}

/// Whether a project at `version` can be imported (`>= 6.0.0`).
pub fn can_be_imported(version: &str) -> bool {
    VersionRange::since(IMPORT_MINIMAL_VERSION)
        .contains(version)
        .unwrap_or(false)
}

/// Whether `version` shares major and minor components with the current version.
pub fn same_minor_version(version: &str) -> bool {
    match (ProductVersion::parse(version), current()) {
        (Ok(version), Some(current)) => version.same_minor(&current),
        _ => false,
    }
}

/// `major.minor` of the current version, e.g. `10.2`.
pub fn minor_version() -> String {
    current()
        .map(|v| format!("{}.{}", v.major(), v.minor()))
        .unwrap_or_default()
}

/// `major.minor.micro` of the current version, e.g. `10.2.0`.
pub fn maintenance_version() -> String {
    current()
        .map(|v| format!("{}.{}.{}", v.major(), v.minor(), v.micro()))
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_parse_plain_and_qualified() {
        let v = ProductVersion::parse("7.12.0").unwrap();
        assert_eq!((v.major(), v.minor(), v.micro()), (7, 12, 0));
        assert_eq!(v.qualifier(), None);

        let v = ProductVersion::parse("10.2.0.202406011200").unwrap();
        assert_eq!(v.micro(), 0);
        assert_eq!(v.qualifier(), Some("202406011200"));

        let v = ProductVersion::parse("10.2.0-alpha").unwrap();
        assert_eq!(v.qualifier(), Some("alpha"));

        let v = ProductVersion::parse("7.12").unwrap();
        assert_eq!(v.to_string(), "7.12.0");
    }

    #[test]
    fn test_parse_rejects_garbage() {
        for input in ["", "   ", "abc", "7.x.0", "7.12.0.", "7.12-"] {
            assert!(
                matches!(
                    ProductVersion::parse(input),
                    Err(MigrationError::InvalidVersion { .. })
                ),
                "expected '{input}' to be rejected"
            );
        }
    }

    #[test]
    fn test_qualifier_ignored_for_ordering() {
        let a = ProductVersion::parse("9.0.0.qualifier").unwrap();
        let b = ProductVersion::parse("9.0.0").unwrap();
        assert_eq!(a.cmp_ignoring_qualifier(&b), Ordering::Equal);
    }

    #[test]
    fn test_range_boundaries() {
        let range = VersionRange::before("9.0.0");
        assert!(range.contains("8.9.9").unwrap());
        assert!(!range.contains("9.0.0").unwrap());
        assert!(!range.contains("9.0.0.202301011200").unwrap());

        let range = VersionRange::between("8.0.0", "9.0.0");
        assert!(!range.contains("7.13.0").unwrap());
        assert!(range.contains("8.0.0").unwrap());
        assert!(!range.contains("9.0.0").unwrap());

        assert!(range.contains("not-a-version").is_err());
    }

    #[test]
    fn test_can_be_migrated() {
        assert!(!can_be_migrated("7.9.0"));
        assert!(can_be_migrated("7.10.0"));
        assert!(can_be_migrated("7.12.0"));
        assert!(can_be_migrated("10.1.3"));
        assert!(!can_be_migrated(CURRENT_VERSION));
        assert!(!can_be_migrated("11.0.0"));
        assert!(!can_be_migrated("garbage"));
    }

    #[test]
    fn test_can_be_imported() {
        assert!(!can_be_imported("5.10.0"));
        assert!(can_be_imported("6.0.0"));
    }

    #[test]
    fn test_same_minor_version() {
        assert!(same_minor_version("10.2.0"));
        assert!(same_minor_version("10.2.5"));
        assert!(!same_minor_version("10.1.0"));
        assert!(!same_minor_version("garbage"));
    }

    #[test]
    fn test_timestamp_qualifier() {
        let has = |s: &str| ProductVersion::parse(s).unwrap().has_timestamp_qualifier();
        assert!(has("1.0.0.1233274"));
        assert!(!has("1.0.0"));
        assert!(!has("1.0.0.alpha-01"));
        assert!(has("1.0.0.qualifier"));
    }

    #[test]
    fn test_current_version_parts() {
        assert_eq!(minor_version(), "10.2");
        assert_eq!(maintenance_version(), CURRENT_VERSION);
    }

    proptest! {
        #[test]
        fn prop_range_membership_is_pure(major in 0u64..20, minor in 0u64..20, micro in 0u64..20) {
            let version = format!("{major}.{minor}.{micro}");
            let range = VersionRange::between("7.10.0", "10.0.0");
            let first = range.contains(&version).unwrap();
            let second = range.contains(&version).unwrap();
            prop_assert_eq!(first, second);
        }
    }
}
