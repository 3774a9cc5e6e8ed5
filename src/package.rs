//! Dart / Flutter package-manager commands

use std::fmt;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::{ReleaseError, Result};
use crate::process::{run_checked, CommandRunner, CommandSpec};

/// Which SDK CLI drives dependency fetching and publishing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PackageTool {
    Dart,
    #[default]
    Flutter,
}

impl PackageTool {
    pub fn program(&self) -> &'static str {
        match self {
            PackageTool::Dart => "dart",
            PackageTool::Flutter => "flutter",
        }
    }
}

impl fmt::Display for PackageTool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.program())
    }
}

/// Package-manager CLI bound to a package directory
pub struct PackageCli<'a> {
    runner: &'a dyn CommandRunner,
    workdir: PathBuf,
    tool: PackageTool,
}

impl<'a> PackageCli<'a> {
    pub fn new(runner: &'a dyn CommandRunner, workdir: &Path, tool: PackageTool) -> Self {
        PackageCli {
            runner,
            workdir: workdir.to_path_buf(),
            tool,
        }
    }

    fn dart(&self) -> CommandSpec {
        CommandSpec::new("dart", &self.workdir)
    }

    fn tool(&self) -> CommandSpec {
        CommandSpec::new(self.tool.program(), &self.workdir)
    }

    /// Run a user script with `dart run <path>`
    pub fn run_script(&self, script: &Path) -> Result<()> {
        info!(script = %script.display(), "running pre-run script");
        run_checked(
            self.runner,
            &self.dart().arg("run").arg(script.display().to_string()),
            ReleaseError::Preparation,
        )?;
        Ok(())
    }

    /// `dart pub get` or `flutter packages get`
    pub fn fetch_dependencies(&self) -> Result<()> {
        let spec = match self.tool {
            PackageTool::Dart => self.dart().args(["pub", "get"]),
            PackageTool::Flutter => self.tool().args(["packages", "get"]),
        };
        run_checked(self.runner, &spec, ReleaseError::Preparation)?;
        Ok(())
    }

    pub fn analyze(&self) -> Result<()> {
        run_checked(
            self.runner,
            &self.dart().arg("analyze"),
            ReleaseError::Verification,
        )?;
        Ok(())
    }

    pub fn format_check(&self) -> Result<()> {
        run_checked(
            self.runner,
            &self.dart().args(["format", "--set-exit-if-changed", "."]),
            ReleaseError::Verification,
        )?;
        Ok(())
    }

    pub fn publish_dry_run(&self) -> Result<()> {
        run_checked(
            self.runner,
            &self.tool().args(["pub", "publish", "--dry-run"]),
            ReleaseError::Verification,
        )?;
        Ok(())
    }

    /// Lint, format check, then a dry-run publish; stops at the first failure
    pub fn verify(&self) -> Result<()> {
        self.analyze()?;
        self.format_check()?;
        self.publish_dry_run()
    }

    /// Publish to the registry without the interactive confirmation
    pub fn publish(&self) -> Result<()> {
        run_checked(
            self.runner,
            &self.tool().args(["pub", "publish", "--force"]),
            ReleaseError::Publish,
        )?;
        Ok(())
    }
}
