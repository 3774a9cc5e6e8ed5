use tracing::{debug, error, info, warn};

use crate::analyzer::{classify, release_commit_message, Classification};
use crate::config::{ReleaseConfig, VerifyFailurePolicy};
use crate::credentials::{CredentialInput, CredentialLifecycle};
use crate::error::Result;
use crate::git::{CommitStatus, Git};
use crate::manifest::ManifestStore;
use crate::package::PackageCli;
use crate::process::CommandRunner;
use crate::release::{ReleaseAttempt, ReleaseOutcome, ReleaseState};
use crate::trigger::TriggerContext;
use crate::ui;

/// Everything known about a finished run, successful or not
#[derive(Debug)]
pub struct RunReport {
    /// Terminal state: `NoOp`, `Done` or `Failed`
    pub state: ReleaseState,
    /// State that was active when the error occurred
    pub failed_in: Option<ReleaseState>,
    pub attempt: Option<ReleaseAttempt>,
    pub credential_teardowns: usize,
    pub result: Result<ReleaseOutcome>,
}

/// Runs one release attempt from classification to push
pub struct ReleaseOrchestrator<'a> {
    config: &'a ReleaseConfig,
    runner: &'a dyn CommandRunner,
}

impl<'a> ReleaseOrchestrator<'a> {
    pub fn new(config: &'a ReleaseConfig, runner: &'a dyn CommandRunner) -> Self {
        ReleaseOrchestrator { config, runner }
    }

    /// Run the release and return its outcome
    pub fn run(&self, trigger: &TriggerContext) -> Result<ReleaseOutcome> {
        self.run_detailed(trigger).result
    }

    /// Run the release, keeping the final state and attempt for inspection
    pub fn run_detailed(&self, trigger: &TriggerContext) -> RunReport {
        self.run_with(|| Ok(trigger.clone()))
    }

    /// Run the release with a trigger context loaded once the run has started.
    ///
    /// Credential teardown happens exactly once, after the body returns,
    /// whatever the outcome. That includes a malformed deploy key and a
    /// trigger context that cannot be loaded.
    pub fn run_with<F>(&self, load_trigger: F) -> RunReport
    where
        F: FnOnce() -> Result<TriggerContext>,
    {
        let root = self.config.package_root();
        let git = Git::new(self.runner, &root, &self.config.git.remote);
        let mut credentials = CredentialLifecycle::new(&root);
        let mut state = ReleaseState::Start;
        let mut attempt = None;

        let result = self.execute(load_trigger, &git, &mut credentials, &mut state, &mut attempt);
        credentials.teardown(&git);

        let failed_in = match &result {
            Ok(_) => None,
            Err(e) => {
                error!(state = %state, category = e.category(), error = %e, "release failed");
                if let Some(attempt) = &attempt {
                    for note in attempt.leftovers() {
                        warn!("{}", note);
                        ui::display_warning(&note);
                    }
                }
                let failed_in = state;
                enter(&mut state, ReleaseState::Failed);
                Some(failed_in)
            }
        };

        RunReport {
            state,
            failed_in,
            attempt,
            credential_teardowns: credentials.teardown_count(),
            result,
        }
    }

    /// Remove credential material left in the workspace by an earlier run.
    ///
    /// For runs that fail before a release can start, such as an unreadable
    /// config file.
    pub fn discard_credentials(&self) {
        let root = self.config.package_root();
        let git = Git::new(self.runner, &root, &self.config.git.remote);
        CredentialLifecycle::new(&root).teardown(&git);
    }

    fn execute<F>(
        &self,
        load_trigger: F,
        git: &Git<'_>,
        credentials: &mut CredentialLifecycle,
        state: &mut ReleaseState,
        slot: &mut Option<ReleaseAttempt>,
    ) -> Result<ReleaseOutcome>
    where
        F: FnOnce() -> Result<TriggerContext>,
    {
        self.config.validate()?;
        let credential = self
            .config
            .credential
            .as_ref()
            .map(CredentialInput::resolve)
            .transpose()?;
        let trigger = load_trigger()?;

        let root = self.config.package_root();
        let store = ManifestStore::in_dir(&root, &self.config.manifest);
        let manifest = store.read()?;
        debug!(
            path = %store.path().display(),
            package = manifest.field("name").and_then(|name| name.as_str()).unwrap_or("<unnamed>"),
            version = manifest.version(),
            "manifest loaded"
        );

        enter(state, ReleaseState::Classifying);
        let category = match classify(&trigger.commits) {
            Classification::NoOp => {
                enter(state, ReleaseState::NoOp);
                ui::display_success("No action necessary!");
                return Ok(ReleaseOutcome::NoOp);
            }
            Classification::Bump(category) => category,
        };
        info!(commits = trigger.commits.len(), category = %category, "commits classified");

        let previous = manifest.semantic_version()?;
        let attempt = slot.insert(ReleaseAttempt::new(
            previous,
            category,
            &self.config.tag_prefix,
        )?);
        ui::display_release_plan(
            trigger.commits.len(),
            category,
            &attempt.previous_version,
            &attempt.new_version,
            &attempt.tag_name,
        );

        enter(state, ReleaseState::Preparing);
        git.add_safe_directory(&self.config.workspace)?;
        git.configure_identity(&self.config.git.user_name, &self.config.git.user_email)?;
        if let Some(credential) = &credential {
            credentials.provision(credential, git, &trigger.repository)?;
        }
        let package = PackageCli::new(self.runner, &root, self.config.tool);
        if let Some(script) = &self.config.script_pre_run {
            package.run_script(script)?;
        }
        package.fetch_dependencies()?;

        enter(state, ReleaseState::Bumping);
        store.write_version(&attempt.new_version)?;
        attempt.manifest_written = true;
        ui::display_status(&format!(
            "Bumping version from {} to {}",
            attempt.previous_version, attempt.new_version
        ));

        enter(state, ReleaseState::Verifying);
        if let Err(e) = package.verify() {
            match self.config.on_verify_failure {
                VerifyFailurePolicy::Restore => match store.restore(&manifest) {
                    Ok(()) => {
                        attempt.manifest_written = false;
                        info!(version = manifest.version(), "manifest restored after failed verification");
                    }
                    Err(restore_err) => {
                        warn!(error = %restore_err, "could not restore manifest");
                    }
                },
                VerifyFailurePolicy::LeaveDirty => {
                    warn!(version = %attempt.new_version, "manifest left bumped after failed verification");
                }
            }
            return Err(e);
        }

        enter(state, ReleaseState::Committing);
        git.add(&self.config.manifest)?;
        if git.commit(&release_commit_message(&attempt.new_version))?
            == CommitStatus::NothingToCommit
        {
            ui::display_warning("Release commit already present, continuing");
        }
        attempt.committed = true;

        enter(state, ReleaseState::Tagging);
        git.tag(attempt.tag_name.as_str())?;
        attempt.tagged = true;

        enter(state, ReleaseState::Publishing);
        if self.config.skip_publish {
            attempt.publish_skipped = true;
            info!("publishing left to the tag-triggered workflow");
        } else {
            package.publish()?;
            attempt.published = true;
        }

        enter(state, ReleaseState::Pushing);
        git.push(trigger.branch())?;
        git.push_tag(attempt.tag_name.as_str())?;
        attempt.pushed = true;

        enter(state, ReleaseState::Done);
        ui::display_success(&format!(
            "Released {} ({} bump)",
            attempt.tag_name, attempt.category
        ));
        Ok(ReleaseOutcome::Released(attempt.clone()))
    }
}

fn enter(state: &mut ReleaseState, next: ReleaseState) {
    debug!(from = %state, to = %next, "state transition");
    *state = next;
    info!(state = %next, "release state");
}
