//! Package manifest (pubspec.yaml) access
//!
//! The store only ever mutates the top-level `version` field. Writes splice the
//! new value into the original text so comments, key order, and formatting of
//! unrelated content survive byte-for-byte, and go through a temporary file
//! that is renamed over the manifest so a crash never leaves it truncated.

use std::fs;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

use regex::Regex;
use serde_yaml::Value;
use tempfile::NamedTempFile;
use tracing::{debug, warn};

use crate::domain::SemanticVersion;
use crate::error::{ReleaseError, Result};

/// Default manifest file name for Dart and Flutter packages
pub const DEFAULT_MANIFEST: &str = "pubspec.yaml";

/// Matches the scalar of a column-zero `version:` key, quoted or bare
const VERSION_LINE: &str = r#"(?m)^version:[ \t]*(?P<value>"[^"\r\n]*"|'[^'\r\n]*'|[^\s#]+)"#;

/// A parsed snapshot of the manifest file
#[derive(Debug, Clone)]
pub struct Manifest {
    pub path: PathBuf,
    /// Exact file contents at read time
    pub raw: String,
    pub document: Value,
    version: String,
}

impl Manifest {
    fn parse(path: &Path, raw: String) -> Result<Self> {
        let document: Value =
            serde_yaml::from_str(&raw).map_err(|e| ReleaseError::ManifestParse {
                path: path.to_path_buf(),
                reason: e.to_string(),
            })?;

        let mapping = document
            .as_mapping()
            .ok_or_else(|| ReleaseError::ManifestParse {
                path: path.to_path_buf(),
                reason: "top level is not a mapping".to_string(),
            })?;

        let version = match mapping.get("version") {
            Some(Value::String(s)) => s.clone(),
            Some(Value::Number(n)) => n.to_string(),
            Some(other) => {
                return Err(ReleaseError::ManifestParse {
                    path: path.to_path_buf(),
                    reason: format!("version field is not a scalar: {:?}", other),
                })
            }
            None => {
                return Err(ReleaseError::ManifestParse {
                    path: path.to_path_buf(),
                    reason: "missing version field".to_string(),
                })
            }
        };

        Ok(Manifest {
            path: path.to_path_buf(),
            raw,
            document,
            version,
        })
    }

    /// Raw version string as written in the manifest
    pub fn version(&self) -> &str {
        &self.version
    }

    /// Version parsed as a semantic version
    pub fn semantic_version(&self) -> Result<SemanticVersion> {
        SemanticVersion::parse(&self.version)
    }

    /// Look up any other top-level field
    pub fn field(&self, key: &str) -> Option<&Value> {
        self.document.as_mapping().and_then(|m| m.get(key))
    }
}

/// Reads and rewrites the version field of a manifest on disk
#[derive(Debug, Clone)]
pub struct ManifestStore {
    path: PathBuf,
}

impl ManifestStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        ManifestStore { path: path.into() }
    }

    /// Store for `<dir>/<file_name>`
    pub fn in_dir(dir: &Path, file_name: &str) -> Self {
        ManifestStore::new(dir.join(file_name))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read and parse the manifest
    ///
    /// # Returns
    /// * `Err(ManifestNotFound)` - The file does not exist
    /// * `Err(ManifestParse)` - The file is not YAML or lacks a scalar `version`
    pub fn read(&self) -> Result<Manifest> {
        let raw = match fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                return Err(ReleaseError::ManifestNotFound(self.path.clone()))
            }
            Err(e) => {
                return Err(ReleaseError::ManifestParse {
                    path: self.path.clone(),
                    reason: e.to_string(),
                })
            }
        };
        Manifest::parse(&self.path, raw)
    }

    /// Replace only the version field, re-reading the file first.
    ///
    /// Returns the manifest as written.
    pub fn write_version(&self, version: &SemanticVersion) -> Result<Manifest> {
        let current = self.read()?;
        let new_version = version.to_string();

        let contents = match splice_version(&current.raw, &new_version) {
            Some(spliced) if reparsed_version(&self.path, &spliced) == Some(new_version.clone()) => {
                spliced
            }
            _ => {
                warn!(
                    path = %self.path.display(),
                    "version line not found verbatim, re-serializing manifest"
                );
                self.reserialize(current.document, &new_version)?
            }
        };

        self.write_atomic(&contents)?;
        debug!(path = %self.path.display(), version = %new_version, "manifest written");
        Manifest::parse(&self.path, contents)
    }

    /// Put back the exact bytes of an earlier snapshot
    pub fn restore(&self, snapshot: &Manifest) -> Result<()> {
        self.write_atomic(&snapshot.raw)?;
        debug!(path = %self.path.display(), version = snapshot.version(), "manifest restored");
        Ok(())
    }

    fn reserialize(&self, mut document: Value, version: &str) -> Result<String> {
        let mapping = document
            .as_mapping_mut()
            .ok_or_else(|| ReleaseError::ManifestWrite {
                path: self.path.clone(),
                reason: "top level is not a mapping".to_string(),
            })?;
        mapping.insert(
            Value::String("version".to_string()),
            Value::String(version.to_string()),
        );
        serde_yaml::to_string(&document).map_err(|e| ReleaseError::ManifestWrite {
            path: self.path.clone(),
            reason: e.to_string(),
        })
    }

    fn write_atomic(&self, contents: &str) -> Result<()> {
        let write_err = |reason: String| ReleaseError::ManifestWrite {
            path: self.path.clone(),
            reason,
        };

        let dir = match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };

        let mut tmp = NamedTempFile::new_in(dir).map_err(|e| write_err(e.to_string()))?;
        tmp.write_all(contents.as_bytes())
            .and_then(|_| tmp.as_file().sync_all())
            .map_err(|e| write_err(e.to_string()))?;

        if let Ok(metadata) = fs::metadata(&self.path) {
            tmp.as_file()
                .set_permissions(metadata.permissions())
                .map_err(|e| write_err(e.to_string()))?;
        }

        tmp.persist(&self.path)
            .map_err(|e| write_err(e.error.to_string()))?;
        Ok(())
    }
}

/// Swap the version scalar in place, keeping its quote style
fn splice_version(raw: &str, version: &str) -> Option<String> {
    let re = Regex::new(VERSION_LINE).ok()?;
    let value = re.captures(raw)?.name("value")?;

    let old = value.as_str();
    let replacement = match old.chars().next() {
        Some(quote @ ('"' | '\'')) => format!("{quote}{version}{quote}"),
        _ => version.to_string(),
    };

    let mut spliced = String::with_capacity(raw.len() + replacement.len());
    spliced.push_str(&raw[..value.start()]);
    spliced.push_str(&replacement);
    spliced.push_str(&raw[value.end()..]);
    Some(spliced)
}

fn reparsed_version(path: &Path, contents: &str) -> Option<String> {
    Manifest::parse(path, contents.to_string())
        .ok()
        .map(|m| m.version)
}
