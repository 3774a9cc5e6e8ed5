use std::path::PathBuf;

use thiserror::Error;

/// Unified error type for release operations
#[derive(Error, Debug)]
pub enum ReleaseError {
    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Manifest not found: {}", .0.display())]
    ManifestNotFound(PathBuf),

    #[error("Manifest parse error in {}: {reason}", .path.display())]
    ManifestParse { path: PathBuf, reason: String },

    #[error("Manifest write failed for {}: {reason}", .path.display())]
    ManifestWrite { path: PathBuf, reason: String },

    #[error("Invalid version '{version}': {reason}")]
    InvalidVersion { version: String, reason: String },

    #[error("Preparation step failed: {0}")]
    Preparation(String),

    #[error("Verification failed: {0}")]
    Verification(String),

    #[error("Version control operation failed: {0}")]
    VersionControl(String),

    #[error("Publish failed: {0}")]
    Publish(String),

    #[error("Trigger context error: {0}")]
    Trigger(String),

    #[error("Credential error: {0}")]
    Credential(String),
}

/// Convenience type alias for Results in the release pipeline
pub type Result<T> = std::result::Result<T, ReleaseError>;

impl ReleaseError {
    /// Create a configuration error with context
    pub fn configuration(msg: impl Into<String>) -> Self {
        ReleaseError::Configuration(msg.into())
    }

    /// Create an invalid version error
    pub fn invalid_version(version: impl Into<String>, reason: impl Into<String>) -> Self {
        ReleaseError::InvalidVersion {
            version: version.into(),
            reason: reason.into(),
        }
    }

    /// Create a version control error with context
    pub fn version_control(msg: impl Into<String>) -> Self {
        ReleaseError::VersionControl(msg.into())
    }

    /// Create a trigger context error with context
    pub fn trigger(msg: impl Into<String>) -> Self {
        ReleaseError::Trigger(msg.into())
    }

    /// Create a credential error with context
    pub fn credential(msg: impl Into<String>) -> Self {
        ReleaseError::Credential(msg.into())
    }

    /// Stable label used in structured logs
    pub fn category(&self) -> &'static str {
        match self {
            ReleaseError::Configuration(_) => "configuration-error",
            ReleaseError::ManifestNotFound(_)
            | ReleaseError::ManifestParse { .. }
            | ReleaseError::ManifestWrite { .. } => "manifest-error",
            ReleaseError::InvalidVersion { .. } => "invalid-version",
            ReleaseError::Preparation(_) => "preparation-error",
            ReleaseError::Verification(_) => "verification-failure",
            ReleaseError::VersionControl(_) => "version-control-error",
            ReleaseError::Publish(_) => "publish-error",
            ReleaseError::Trigger(_) => "trigger-error",
            ReleaseError::Credential(_) => "credential-error",
        }
    }
}
