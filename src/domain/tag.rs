use crate::domain::SemanticVersion;
use crate::error::{ReleaseError, Result};
use std::fmt;

/// Name of the git tag created for a release
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TagName {
    pub name: String,
}

impl TagName {
    /// Format `<prefix><version>` (e.g., prefix "v", version 1.2.3 -> "v1.2.3")
    pub fn new(prefix: &str, version: &SemanticVersion) -> Result<Self> {
        validate_prefix(prefix)?;
        Ok(TagName {
            name: format!("{}{}", prefix, version),
        })
    }

    pub fn as_str(&self) -> &str {
        &self.name
    }
}

impl fmt::Display for TagName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

/// Reject prefixes git would refuse as part of a ref name
pub fn validate_prefix(prefix: &str) -> Result<()> {
    if prefix.chars().any(|c| c.is_whitespace() || c.is_control()) {
        return Err(ReleaseError::configuration(format!(
            "Tag prefix '{}' must not contain whitespace",
            prefix
        )));
    }
    if prefix.contains("..") || prefix.contains(['~', '^', ':', '?', '*', '[', '\\']) {
        return Err(ReleaseError::configuration(format!(
            "Tag prefix '{}' contains characters not allowed in a git ref",
            prefix
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_prefix() {
        let tag = TagName::new("v", &SemanticVersion::new(1, 2, 4)).unwrap();
        assert_eq!(tag.as_str(), "v1.2.4");
    }

    #[test]
    fn test_empty_prefix() {
        let tag = TagName::new("", &SemanticVersion::new(2, 0, 0)).unwrap();
        assert_eq!(tag.to_string(), "2.0.0");
    }

    #[test]
    fn test_custom_prefix() {
        let tag = TagName::new("release-", &SemanticVersion::new(0, 1, 0)).unwrap();
        assert_eq!(tag.as_str(), "release-0.1.0");
    }

    #[test]
    fn test_invalid_prefix() {
        assert!(TagName::new("v ", &SemanticVersion::new(1, 0, 0)).is_err());
        assert!(TagName::new("a..b", &SemanticVersion::new(1, 0, 0)).is_err());
        assert!(TagName::new("x:", &SemanticVersion::new(1, 0, 0)).is_err());
    }
}
