//! Release orchestration
//!
//! A run moves through [ReleaseState]s strictly in order:
//!
//! ```text
//! Start -> Classifying -> (NoOp | Preparing -> Bumping -> Verifying
//!       -> Committing -> Tagging -> Publishing -> Pushing -> Done)
//! ```
//!
//! Any state may end in `Failed`. Publishing happens before pushing: a
//! publish failure leaves the release commit and tag local only.

pub mod orchestrator;

pub use orchestrator::ReleaseOrchestrator;

use std::fmt;

use crate::domain::{BumpCategory, SemanticVersion, TagName};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReleaseState {
    Start,
    Classifying,
    NoOp,
    /// Git identity, credentials, pre-run script, dependency fetch
    Preparing,
    Bumping,
    Verifying,
    Committing,
    Tagging,
    Publishing,
    Pushing,
    Done,
    Failed,
}

impl ReleaseState {
    pub fn name(&self) -> &'static str {
        match self {
            ReleaseState::Start => "start",
            ReleaseState::Classifying => "classifying",
            ReleaseState::NoOp => "no-op",
            ReleaseState::Preparing => "preparing",
            ReleaseState::Bumping => "bumping",
            ReleaseState::Verifying => "verifying",
            ReleaseState::Committing => "committing",
            ReleaseState::Tagging => "tagging",
            ReleaseState::Publishing => "publishing",
            ReleaseState::Pushing => "pushing",
            ReleaseState::Done => "done",
            ReleaseState::Failed => "failed",
        }
    }

}

impl fmt::Display for ReleaseState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Transient state of one release attempt; never persisted
///
/// The completion flags tell the failure path what was left behind.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReleaseAttempt {
    pub previous_version: SemanticVersion,
    pub new_version: SemanticVersion,
    pub category: BumpCategory,
    pub tag_name: TagName,
    pub manifest_written: bool,
    pub committed: bool,
    pub tagged: bool,
    pub published: bool,
    /// Publishing is left to a tag-triggered registry workflow
    pub publish_skipped: bool,
    pub pushed: bool,
}

impl ReleaseAttempt {
    pub fn new(
        previous_version: SemanticVersion,
        category: BumpCategory,
        tag_prefix: &str,
    ) -> crate::error::Result<Self> {
        let new_version = previous_version.increment(category)?;
        let tag_name = TagName::new(tag_prefix, &new_version)?;
        Ok(ReleaseAttempt {
            previous_version,
            new_version,
            category,
            tag_name,
            manifest_written: false,
            committed: false,
            tagged: false,
            published: false,
            publish_skipped: false,
            pushed: false,
        })
    }

    /// What an operator has to clean up or finish by hand after a failure
    pub fn leftovers(&self) -> Vec<String> {
        let mut notes = Vec::new();
        if self.manifest_written && !self.committed {
            notes.push(format!(
                "manifest was bumped to {} but not committed",
                self.new_version
            ));
        }
        if self.committed && !self.pushed {
            notes.push(format!(
                "release commit for {} exists locally but was not pushed",
                self.new_version
            ));
        }
        if self.tagged && !self.published && !self.publish_skipped {
            notes.push(format!(
                "tag {} was created but the package was not published; publish the tagged commit manually",
                self.tag_name
            ));
        }
        if self.published && !self.pushed {
            notes.push(format!(
                "{} is published but the commit and tag {} were not pushed",
                self.new_version, self.tag_name
            ));
        }
        notes
    }
}

/// Successful end of a run
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReleaseOutcome {
    /// The push contained our own release commit; nothing was changed
    NoOp,
    Released(ReleaseAttempt),
}
