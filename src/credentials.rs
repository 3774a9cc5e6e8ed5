//! Deploy credential lifecycle
//!
//! A credential is materialized for one run (key file or authenticated remote
//! URL) and removed again by [CredentialLifecycle::teardown], which the
//! orchestrator calls on every exit path. Dropping a lifecycle that was never
//! torn down still deletes the key file.

use std::fmt;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use tracing::{debug, info, warn};

use crate::error::{ReleaseError, Result};
use crate::git::Git;
use crate::trigger::RepositoryId;

/// Key file location relative to the workspace
pub const DEPLOY_KEY_PATH: &str = ".ssh/id_deploy_key";

/// Secret used to authenticate pushes
#[derive(Clone, PartialEq, Eq)]
pub enum DeployCredential {
    /// Decoded private key text
    SshKey(String),
    Token(String),
}

impl DeployCredential {
    /// Decode a base64-encoded private key
    pub fn ssh_key_from_base64(encoded: &str) -> Result<Self> {
        let compact: String = encoded.chars().filter(|c| !c.is_whitespace()).collect();
        let bytes = STANDARD
            .decode(compact)
            .map_err(|e| ReleaseError::configuration(format!("deploy-key is not valid base64: {}", e)))?;
        let mut key = String::from_utf8(bytes)
            .map_err(|_| ReleaseError::configuration("deploy-key does not decode to text"))?;

        if key.trim().is_empty() {
            return Err(ReleaseError::configuration("deploy-key is empty"));
        }
        // ssh rejects key files without a trailing newline
        if !key.ends_with('\n') {
            key.push('\n');
        }
        Ok(DeployCredential::SshKey(key))
    }

    pub fn token(token: impl Into<String>) -> Self {
        DeployCredential::Token(token.into())
    }

    pub fn kind(&self) -> &'static str {
        match self {
            DeployCredential::SshKey(_) => "ssh-key",
            DeployCredential::Token(_) => "token",
        }
    }
}

impl fmt::Debug for DeployCredential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "DeployCredential::{}(<redacted>)", self.kind())
    }
}

/// Credential as supplied on the command line or through action inputs.
///
/// Kept encoded until a run starts so a malformed key fails inside the run,
/// where credential teardown is guaranteed.
#[derive(Clone, PartialEq, Eq)]
pub enum CredentialInput {
    /// Base64-encoded private key
    DeployKey(String),
    Token(String),
}

impl CredentialInput {
    /// Decode into the credential that gets provisioned
    pub fn resolve(&self) -> Result<DeployCredential> {
        match self {
            CredentialInput::DeployKey(encoded) => DeployCredential::ssh_key_from_base64(encoded),
            CredentialInput::Token(token) => Ok(DeployCredential::token(token.clone())),
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            CredentialInput::DeployKey(_) => "ssh-key",
            CredentialInput::Token(_) => "token",
        }
    }
}

impl fmt::Debug for CredentialInput {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "CredentialInput::{}(<redacted>)", self.kind())
    }
}

/// What provisioning materialized, and therefore what teardown must undo
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CredentialHandle {
    KeyFile { path: PathBuf },
    TokenRemote { public_url: String },
}

/// Scoped owner of the deploy credential for one run
#[derive(Debug)]
pub struct CredentialLifecycle {
    key_path: PathBuf,
    handle: Option<CredentialHandle>,
    teardowns: usize,
}

impl CredentialLifecycle {
    pub fn new(workspace: &Path) -> Self {
        CredentialLifecycle {
            key_path: workspace.join(DEPLOY_KEY_PATH),
            handle: None,
            teardowns: 0,
        }
    }

    pub fn key_path(&self) -> &Path {
        &self.key_path
    }

    /// Times [CredentialLifecycle::teardown] has run
    pub fn teardown_count(&self) -> usize {
        self.teardowns
    }

    /// Materialize the credential and point git at it
    pub fn provision(
        &mut self,
        credential: &DeployCredential,
        git: &Git<'_>,
        repository: &RepositoryId,
    ) -> Result<()> {
        match credential {
            DeployCredential::SshKey(key) => {
                self.write_key_file(key)?;
                self.handle = Some(CredentialHandle::KeyFile {
                    path: self.key_path.clone(),
                });
                git.set_ssh_command(&self.key_path)?;
                git.set_remote_url(&repository.ssh_url(), None)?;
                info!(path = %self.key_path.display(), "deploy key provisioned");
            }
            DeployCredential::Token(token) => {
                self.handle = Some(CredentialHandle::TokenRemote {
                    public_url: repository.https_url(),
                });
                git.set_remote_url(&repository.authenticated_url(token), Some(token))?;
                info!(repository = %repository, "token remote provisioned");
            }
        }
        Ok(())
    }

    fn write_key_file(&self, key: &str) -> Result<()> {
        let to_err = |e: std::io::Error| {
            ReleaseError::credential(format!(
                "cannot write deploy key to {}: {}",
                self.key_path.display(),
                e
            ))
        };

        if let Some(dir) = self.key_path.parent() {
            fs::create_dir_all(dir).map_err(to_err)?;
        }

        let mut options = fs::OpenOptions::new();
        options.write(true).create(true).truncate(true);
        #[cfg(unix)]
        {
            use std::os::unix::fs::OpenOptionsExt;
            options.mode(0o600);
        }

        let mut file = options.open(&self.key_path).map_err(to_err)?;
        file.write_all(key.as_bytes()).map_err(to_err)?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            fs::set_permissions(&self.key_path, fs::Permissions::from_mode(0o600)).map_err(to_err)?;
        }
        Ok(())
    }

    /// Remove every trace of the credential.
    ///
    /// Safe to call when nothing was provisioned or after an earlier
    /// teardown. Failures are logged, never returned, so the caller's own
    /// outcome is what surfaces.
    pub fn teardown(&mut self, git: &Git<'_>) {
        self.teardowns += 1;

        match self.handle.take() {
            Some(CredentialHandle::KeyFile { .. }) => {
                if let Err(e) = git.unset_ssh_command() {
                    warn!(error = %e, "could not unset core.sshCommand");
                }
            }
            Some(CredentialHandle::TokenRemote { public_url }) => {
                if let Err(e) = git.set_remote_url(&public_url, None) {
                    warn!(error = %e, "could not reset remote url");
                }
            }
            None => debug!("no credential provisioned"),
        }

        self.remove_key_file();
    }

    fn remove_key_file(&self) {
        if !self.key_path.exists() {
            return;
        }
        match fs::remove_file(&self.key_path) {
            Ok(()) => {
                debug!(path = %self.key_path.display(), "deploy key removed");
                // Only succeeds when the directory is empty
                if let Some(dir) = self.key_path.parent() {
                    let _ = fs::remove_dir(dir);
                }
            }
            Err(e) => warn!(path = %self.key_path.display(), error = %e, "could not remove deploy key"),
        }
    }
}

impl Drop for CredentialLifecycle {
    fn drop(&mut self) {
        if self.handle.is_some() {
            self.remove_key_file();
        }
    }
}
