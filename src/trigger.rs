//! Trigger context: the commits and repository identity of the push event

use std::env;
use std::fs;
use std::path::Path;

use serde::Deserialize;
use tracing::debug;

use crate::domain::CommitRecord;
use crate::error::{ReleaseError, Result};

/// `owner/name` of the repository being released
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepositoryId {
    pub owner: String,
    pub name: String,
}

impl RepositoryId {
    pub fn new(owner: impl Into<String>, name: impl Into<String>) -> Self {
        RepositoryId {
            owner: owner.into(),
            name: name.into(),
        }
    }

    /// Parse `owner/name`
    pub fn parse(full_name: &str) -> Result<Self> {
        match full_name.trim().split_once('/') {
            Some((owner, name))
                if !owner.is_empty() && !name.is_empty() && !name.contains('/') =>
            {
                Ok(RepositoryId::new(owner, name))
            }
            _ => Err(ReleaseError::trigger(format!(
                "Repository '{}' is not in owner/name form",
                full_name
            ))),
        }
    }

    pub fn ssh_url(&self) -> String {
        format!("git@github.com:{}/{}.git", self.owner, self.name)
    }

    pub fn https_url(&self) -> String {
        format!("https://github.com/{}/{}.git", self.owner, self.name)
    }

    pub fn authenticated_url(&self, token: &str) -> String {
        format!(
            "https://x-access-token:{}@github.com/{}/{}.git",
            token, self.owner, self.name
        )
    }
}

impl std::fmt::Display for RepositoryId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.owner, self.name)
    }
}

#[derive(Deserialize)]
struct PushEvent {
    #[serde(default)]
    commits: Vec<CommitRecord>,
    repository: Option<EventRepository>,
}

#[derive(Deserialize)]
struct EventRepository {
    full_name: Option<String>,
}

/// Everything the release needs from the triggering event
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TriggerContext {
    pub commits: Vec<CommitRecord>,
    pub repository: RepositoryId,
    pub git_ref: Option<String>,
}

impl TriggerContext {
    pub fn new(commits: Vec<CommitRecord>, repository: RepositoryId) -> Self {
        TriggerContext {
            commits,
            repository,
            git_ref: None,
        }
    }

    pub fn with_ref(mut self, git_ref: impl Into<String>) -> Self {
        self.git_ref = Some(git_ref.into());
        self
    }

    /// Read `GITHUB_EVENT_PATH`, `GITHUB_REPOSITORY` and `GITHUB_REF`
    pub fn from_env() -> Result<Self> {
        let event_path = env::var("GITHUB_EVENT_PATH")
            .map_err(|_| ReleaseError::trigger("GITHUB_EVENT_PATH is not set"))?;
        let repository = env::var("GITHUB_REPOSITORY").ok();
        let git_ref = env::var("GITHUB_REF").ok().filter(|r| !r.is_empty());

        Self::from_event_file(Path::new(&event_path), repository.as_deref(), git_ref)
    }

    pub fn from_event_file(
        path: &Path,
        repository: Option<&str>,
        git_ref: Option<String>,
    ) -> Result<Self> {
        let json = fs::read_to_string(path).map_err(|e| {
            ReleaseError::trigger(format!("Cannot read event payload {}: {}", path.display(), e))
        })?;
        Self::from_event_json(&json, repository, git_ref)
    }

    /// Build from a push event payload
    ///
    /// `repository` (usually `GITHUB_REPOSITORY`) wins over the payload's
    /// `repository.full_name`. A payload without `commits` gives an empty batch.
    pub fn from_event_json(
        json: &str,
        repository: Option<&str>,
        git_ref: Option<String>,
    ) -> Result<Self> {
        let event: PushEvent = serde_json::from_str(json)
            .map_err(|e| ReleaseError::trigger(format!("Invalid event payload: {}", e)))?;

        let full_name = repository
            .map(str::to_string)
            .filter(|r| !r.is_empty())
            .or_else(|| event.repository.and_then(|r| r.full_name))
            .ok_or_else(|| ReleaseError::trigger("Repository identity is unknown"))?;

        debug!(commits = event.commits.len(), repository = %full_name, "event payload loaded");

        Ok(TriggerContext {
            commits: event.commits,
            repository: RepositoryId::parse(&full_name)?,
            git_ref,
        })
    }

    /// Branch name when the ref is `refs/heads/<branch>`
    pub fn branch(&self) -> Option<&str> {
        self.git_ref
            .as_deref()
            .and_then(|r| r.strip_prefix("refs/heads/"))
    }
}
