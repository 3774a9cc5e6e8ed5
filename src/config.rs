use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use crate::credentials::CredentialInput;
use crate::domain::tag::validate_prefix;
use crate::error::{ReleaseError, Result};
use crate::manifest::DEFAULT_MANIFEST;
use crate::package::PackageTool;

/// Config file looked up in the working directory
pub const LOCAL_CONFIG_FILE: &str = "release.toml";

/// Config file looked up in the user config directory
pub const USER_CONFIG_FILE: &str = "dart-conventional-release.toml";

/// What to do with the bumped manifest when verification fails
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum VerifyFailurePolicy {
    /// Keep the bumped, uncommitted manifest in the working tree
    #[default]
    LeaveDirty,
    /// Write back the exact pre-bump manifest bytes
    Restore,
}

/// Committer identity and remote used for the release commit
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct GitConfig {
    #[serde(default = "default_user_name")]
    pub user_name: String,

    #[serde(default = "default_user_email")]
    pub user_email: String,

    #[serde(default = "default_remote")]
    pub remote: String,
}

fn default_user_name() -> String {
    "Dart Conventional Release".to_string()
}

fn default_user_email() -> String {
    "gh_action_dart_conventional_release@users.noreply.github.com".to_string()
}

fn default_remote() -> String {
    "origin".to_string()
}

fn default_tag_prefix() -> String {
    "v".to_string()
}

fn default_manifest() -> String {
    DEFAULT_MANIFEST.to_string()
}

impl Default for GitConfig {
    fn default() -> Self {
        GitConfig {
            user_name: default_user_name(),
            user_email: default_user_email(),
            remote: default_remote(),
        }
    }
}

/// Complete configuration for one release run.
///
/// Built once at startup (defaults, then the optional TOML file, then CLI and
/// environment overrides) and passed by reference to every component.
/// Secrets never come from the file.
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct ReleaseConfig {
    #[serde(default = "default_tag_prefix")]
    pub tag_prefix: String,

    #[serde(default)]
    pub tool: PackageTool,

    #[serde(default)]
    pub script_pre_run: Option<PathBuf>,

    /// Package location relative to the workspace
    #[serde(default)]
    pub package_dir: Option<PathBuf>,

    #[serde(default = "default_manifest")]
    pub manifest: String,

    #[serde(default)]
    pub on_verify_failure: VerifyFailurePolicy,

    /// Leave publishing to a registry workflow triggered by the pushed tag
    #[serde(default)]
    pub skip_publish: bool,

    #[serde(default)]
    pub git: GitConfig,

    #[serde(skip)]
    pub workspace: PathBuf,

    /// Decoded when the run starts
    #[serde(skip)]
    pub credential: Option<CredentialInput>,
}

impl Default for ReleaseConfig {
    fn default() -> Self {
        ReleaseConfig {
            tag_prefix: default_tag_prefix(),
            tool: PackageTool::default(),
            script_pre_run: None,
            package_dir: None,
            manifest: default_manifest(),
            on_verify_failure: VerifyFailurePolicy::default(),
            skip_publish: false,
            git: GitConfig::default(),
            workspace: PathBuf::from("."),
            credential: None,
        }
    }
}

/// Values supplied on the command line or through action inputs
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub workspace: Option<PathBuf>,
    pub package_dir: Option<PathBuf>,
    pub tag_prefix: Option<String>,
    pub use_dart: bool,
    pub script_pre_run: Option<PathBuf>,
    pub on_verify_failure: Option<VerifyFailurePolicy>,
    pub skip_publish: bool,
    pub git_user_name: Option<String>,
    pub git_user_email: Option<String>,
    /// Base64-encoded private key
    pub deploy_key: Option<String>,
    pub token: Option<String>,
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

impl ReleaseConfig {
    /// Layer CLI/environment values over this configuration
    ///
    /// A deploy key takes precedence over a token. Blank values count as
    /// absent, which is how the action runner passes unset inputs.
    pub fn apply(mut self, overrides: ConfigOverrides) -> Self {
        if let Some(workspace) = overrides.workspace.filter(|w| !w.as_os_str().is_empty()) {
            self.workspace = workspace;
        }
        if let Some(dir) = overrides.package_dir.filter(|d| !d.as_os_str().is_empty()) {
            self.package_dir = Some(dir);
        }
        if let Some(prefix) = overrides.tag_prefix {
            self.tag_prefix = prefix;
        }
        if overrides.use_dart {
            self.tool = PackageTool::Dart;
        }
        if let Some(script) = overrides.script_pre_run.filter(|s| !s.as_os_str().is_empty()) {
            self.script_pre_run = Some(script);
        }
        if let Some(policy) = overrides.on_verify_failure {
            self.on_verify_failure = policy;
        }
        if overrides.skip_publish {
            self.skip_publish = true;
        }
        if let Some(name) = non_empty(overrides.git_user_name) {
            self.git.user_name = name;
        }
        if let Some(email) = non_empty(overrides.git_user_email) {
            self.git.user_email = email;
        }

        self.credential = match (non_empty(overrides.deploy_key), non_empty(overrides.token)) {
            (Some(key), _) => Some(CredentialInput::DeployKey(key)),
            (None, Some(token)) => Some(CredentialInput::Token(token)),
            (None, None) => self.credential,
        };

        self
    }

    /// Directory holding the manifest; all commands run here
    pub fn package_root(&self) -> PathBuf {
        match &self.package_dir {
            Some(dir) => self.workspace.join(dir),
            None => self.workspace.clone(),
        }
    }

    /// Check required inputs before anything is touched
    pub fn validate(&self) -> Result<()> {
        if self.credential.is_none() {
            return Err(ReleaseError::configuration(
                "no deploy-key or authentication token supplied",
            ));
        }
        validate_prefix(&self.tag_prefix)?;
        if self.manifest.trim().is_empty() {
            return Err(ReleaseError::configuration("manifest file name is empty"));
        }
        if self.git.remote.trim().is_empty() {
            return Err(ReleaseError::configuration("git remote name is empty"));
        }
        Ok(())
    }
}

/// Loads configuration from file or returns defaults.
///
/// Attempts to load configuration in the following order:
/// 1. Custom path provided as parameter
/// 2. `release.toml` in current directory
/// 3. `dart-conventional-release.toml` in user config directory
/// 4. Default configuration if no file found
///
/// # Returns
/// * `Ok(ReleaseConfig)` - Loaded or default configuration
/// * `Err` - If file exists but cannot be read or parsed
pub fn load_config(config_path: Option<&str>) -> Result<ReleaseConfig> {
    let path = if let Some(path) = config_path {
        Some(PathBuf::from(path))
    } else if Path::new(LOCAL_CONFIG_FILE).exists() {
        Some(PathBuf::from(LOCAL_CONFIG_FILE))
    } else {
        dirs::config_dir()
            .map(|dir| dir.join(USER_CONFIG_FILE))
            .filter(|p| p.exists())
    };

    let Some(path) = path else {
        return Ok(ReleaseConfig::default());
    };

    let config_str = fs::read_to_string(&path).map_err(|e| {
        ReleaseError::configuration(format!("cannot read {}: {}", path.display(), e))
    })?;
    parse_config(&config_str)
        .map_err(|e| ReleaseError::configuration(format!("{}: {}", path.display(), e)))
}

/// Parse TOML configuration text
pub fn parse_config(config_str: &str) -> std::result::Result<ReleaseConfig, toml::de::Error> {
    let mut config: ReleaseConfig = toml::from_str(config_str)?;
    config.workspace = env::current_dir().unwrap_or_else(|_| PathBuf::from("."));
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = ReleaseConfig::default();
        assert_eq!(config.tag_prefix, "v");
        assert_eq!(config.tool, PackageTool::Flutter);
        assert_eq!(config.manifest, "pubspec.yaml");
        assert_eq!(config.on_verify_failure, VerifyFailurePolicy::LeaveDirty);
        assert_eq!(config.git.remote, "origin");
        assert!(!config.skip_publish);
    }

    #[test]
    fn test_parse_partial_file() {
        let config = parse_config(
            r#"
tag_prefix = "release-"
tool = "dart"
on_verify_failure = "restore"

[git]
user_name = "Release Bot"
"#,
        )
        .unwrap();

        assert_eq!(config.tag_prefix, "release-");
        assert_eq!(config.tool, PackageTool::Dart);
        assert_eq!(config.on_verify_failure, VerifyFailurePolicy::Restore);
        assert_eq!(config.git.user_name, "Release Bot");
        assert_eq!(config.git.user_email, default_user_email());
        assert!(config.credential.is_none());
    }

    #[test]
    fn test_overrides_win() {
        let config = ReleaseConfig::default()
            .apply(ConfigOverrides {
                workspace: Some(PathBuf::from("/ws")),
                package_dir: Some(PathBuf::from("packages/core")),
                tag_prefix: Some("".to_string()),
                use_dart: true,
                token: Some("tok".to_string()),
                ..Default::default()
            });

        assert_eq!(config.tag_prefix, "");
        assert_eq!(config.tool, PackageTool::Dart);
        assert_eq!(config.package_root(), PathBuf::from("/ws/packages/core"));
        assert_eq!(config.credential, Some(CredentialInput::Token("tok".to_string())));
    }

    #[test]
    fn test_blank_inputs_are_ignored() {
        let config = ReleaseConfig::default()
            .apply(ConfigOverrides {
                workspace: Some(PathBuf::new()),
                package_dir: Some(PathBuf::new()),
                script_pre_run: Some(PathBuf::new()),
                git_user_name: Some("  ".to_string()),
                deploy_key: Some("".to_string()),
                token: Some("tok".to_string()),
                ..Default::default()
            });

        assert_eq!(config.workspace, PathBuf::from("."));
        assert!(config.package_dir.is_none());
        assert!(config.script_pre_run.is_none());
        assert_eq!(config.git.user_name, default_user_name());
        assert_eq!(config.credential, Some(CredentialInput::Token("tok".to_string())));
    }

    #[test]
    fn test_deploy_key_preferred_over_token() {
        use base64::Engine;
        let encoded = base64::engine::general_purpose::STANDARD.encode("KEY");
        let config = ReleaseConfig::default()
            .apply(ConfigOverrides {
                deploy_key: Some(encoded),
                token: Some("tok".to_string()),
                ..Default::default()
            });
        assert_eq!(config.credential.map(|c| c.kind()), Some("ssh-key"));
    }

    #[test]
    fn test_validate_requires_credential() {
        let err = ReleaseConfig::default().validate().unwrap_err();
        assert_eq!(err.category(), "configuration-error");
    }

    #[test]
    fn test_validate_rejects_bad_prefix() {
        let config = ReleaseConfig {
            tag_prefix: "v 1".to_string(),
            credential: Some(CredentialInput::Token("t".to_string())),
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }
}
