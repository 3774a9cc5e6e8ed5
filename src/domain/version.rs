use crate::error::{ReleaseError, Result};
use std::fmt;
use std::str::FromStr;

/// Semantic version representation
///
/// Wraps [`semver::Version`] so parsing and ordering follow the semantic
/// versioning grammar, including prerelease precedence.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SemanticVersion(semver::Version);

impl SemanticVersion {
    /// Create a clean version without prerelease or build metadata
    pub fn new(major: u64, minor: u64, patch: u64) -> Self {
        SemanticVersion(semver::Version::new(major, minor, patch))
    }

    /// Parse a version string (e.g., "1.2.3", "1.2.3-beta.1+42")
    pub fn parse(input: &str) -> Result<Self> {
        semver::Version::parse(input.trim())
            .map(SemanticVersion)
            .map_err(|e| ReleaseError::invalid_version(input, e.to_string()))
    }

    pub fn major(&self) -> u64 {
        self.0.major
    }

    pub fn minor(&self) -> u64 {
        self.0.minor
    }

    pub fn patch(&self) -> u64 {
        self.0.patch
    }

    /// Prerelease identifier, if any
    pub fn prerelease(&self) -> Option<&str> {
        (!self.0.pre.is_empty()).then(|| self.0.pre.as_str())
    }

    /// Build metadata, if any
    pub fn build(&self) -> Option<&str> {
        (!self.0.build.is_empty()).then(|| self.0.build.as_str())
    }

    /// Apply a bump category
    ///
    /// - **Major**: major += 1, minor = 0, patch = 0
    /// - **Minor**: minor += 1, patch = 0
    /// - **Patch**: patch += 1
    ///
    /// Prerelease and build metadata are always dropped. A component already
    /// at `u64::MAX` cannot be bumped and yields `InvalidVersion`.
    pub fn increment(&self, category: BumpCategory) -> Result<Self> {
        let v = &self.0;
        let bumped = match category {
            BumpCategory::Major => v.major.checked_add(1).map(|major| (major, 0, 0)),
            BumpCategory::Minor => v.minor.checked_add(1).map(|minor| (v.major, minor, 0)),
            BumpCategory::Patch => v.patch.checked_add(1).map(|patch| (v.major, v.minor, patch)),
        };
        let (major, minor, patch) = bumped.ok_or_else(|| {
            ReleaseError::invalid_version(
                self.to_string(),
                format!("{} component cannot be incremented further", category),
            )
        })?;
        Ok(SemanticVersion::new(major, minor, patch))
    }
}

impl FromStr for SemanticVersion {
    type Err = ReleaseError;

    fn from_str(s: &str) -> Result<Self> {
        SemanticVersion::parse(s)
    }
}

impl fmt::Display for SemanticVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Parse a raw version string and bump it in one step
pub fn increment(version: &str, category: BumpCategory) -> Result<SemanticVersion> {
    SemanticVersion::parse(version)?.increment(category)
}

/// Granularity of a version bump, ordered by precedence (Patch < Minor < Major)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum BumpCategory {
    Patch,
    Minor,
    Major,
}

impl BumpCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            BumpCategory::Major => "major",
            BumpCategory::Minor => "minor",
            BumpCategory::Patch => "patch",
        }
    }
}

impl fmt::Display for BumpCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
