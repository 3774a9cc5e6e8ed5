use crate::domain::{BumpCategory, CommitRecord};

/// Phrase placed in every release commit; seeing it again means the push was our own
pub const RELEASE_MARKER: &str = "version bump to";

/// Outcome of classifying a batch of commits
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Classification {
    /// The batch contains a release commit; nothing must change
    NoOp,
    Bump(BumpCategory),
}

/// Derive the bump category for a commit batch.
///
/// Checks are existence predicates over the whole batch, applied in
/// precedence order:
/// 1. any text contains [`RELEASE_MARKER`] (case-insensitive) -> `NoOp`
/// 2. any text contains `BREAKING CHANGE` (case-sensitive) or `major`
///    (case-insensitive) -> `Major`
/// 3. any text starts with `feat` or contains `minor` (case-insensitive) -> `Minor`
/// 4. otherwise, including an empty batch -> `Patch`
pub fn classify(commits: &[CommitRecord]) -> Classification {
    let texts: Vec<String> = commits.iter().map(CommitRecord::searchable_text).collect();

    if texts.iter().any(|text| is_release_commit(text)) {
        return Classification::NoOp;
    }

    let category = if texts.iter().any(|text| signals_major(text)) {
        BumpCategory::Major
    } else if texts.iter().any(|text| signals_minor(text)) {
        BumpCategory::Minor
    } else {
        BumpCategory::Patch
    };

    Classification::Bump(category)
}

/// Build the release commit message for a version; must keep matching [`is_release_commit`]
pub fn release_commit_message(version: &impl std::fmt::Display) -> String {
    format!("ci: {} {}", RELEASE_MARKER, version)
}

fn is_release_commit(text: &str) -> bool {
    text.to_lowercase().contains(RELEASE_MARKER)
}

fn signals_major(text: &str) -> bool {
    text.contains("BREAKING CHANGE") || text.to_lowercase().contains("major")
}

fn signals_minor(text: &str) -> bool {
    let lower = text.to_lowercase();
    lower.starts_with("feat") || lower.contains("minor")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn commits(messages: &[&str]) -> Vec<CommitRecord> {
        messages.iter().map(|m| CommitRecord::new(*m)).collect()
    }

    #[test]
    fn test_fix_is_patch() {
        assert_eq!(
            classify(&commits(&["fix: null check"])),
            Classification::Bump(BumpCategory::Patch)
        );
    }

    #[test]
    fn test_feat_is_minor() {
        assert_eq!(
            classify(&commits(&["feat: add widget"])),
            Classification::Bump(BumpCategory::Minor)
        );
        assert_eq!(
            classify(&commits(&["Feature: capitalised"])),
            Classification::Bump(BumpCategory::Minor)
        );
    }

    #[test]
    fn test_minor_keyword_anywhere() {
        assert_eq!(
            classify(&commits(&["chore: a MINOR tweak"])),
            Classification::Bump(BumpCategory::Minor)
        );
    }

    #[test]
    fn test_feat_must_lead_the_text() {
        assert_eq!(
            classify(&commits(&["fix: the feat flag"])),
            Classification::Bump(BumpCategory::Patch)
        );
    }

    #[test]
    fn test_breaking_change_in_later_commit_wins() {
        assert_eq!(
            classify(&commits(&["fix: x", "BREAKING CHANGE: remove API"])),
            Classification::Bump(BumpCategory::Major)
        );
    }

    #[test]
    fn test_breaking_change_is_case_sensitive() {
        assert_eq!(
            classify(&commits(&["fix: breaking change in docs"])),
            Classification::Bump(BumpCategory::Patch)
        );
    }

    #[test]
    fn test_major_keyword_is_case_insensitive() {
        assert_eq!(
            classify(&commits(&["feat: widget", "refactor: Major cleanup"])),
            Classification::Bump(BumpCategory::Major)
        );
    }

    #[test]
    fn test_breaking_change_in_body() {
        let batch = vec![CommitRecord::with_body(
            "feat: new parser",
            "BREAKING CHANGE: old parser removed",
        )];
        assert_eq!(classify(&batch), Classification::Bump(BumpCategory::Major));
    }

    #[test]
    fn test_empty_batch_is_patch() {
        assert_eq!(classify(&[]), Classification::Bump(BumpCategory::Patch));
    }

    #[test]
    fn test_release_marker_is_noop() {
        assert_eq!(
            classify(&commits(&["ci: version bump to 1.2.4"])),
            Classification::NoOp
        );
    }

    #[test]
    fn test_release_marker_overrides_everything() {
        assert_eq!(
            classify(&commits(&[
                "BREAKING CHANGE: gone",
                "feat: more",
                "CI: Version Bump To 3.0.0",
            ])),
            Classification::NoOp
        );
    }

    #[test]
    fn test_release_marker_in_body() {
        let batch = vec![CommitRecord::with_body("Merge branch", "ci: version bump to 0.2.0")];
        assert_eq!(classify(&batch), Classification::NoOp);
    }

    #[test]
    fn test_release_commit_message_is_detected() {
        let message = release_commit_message(&"1.2.4");
        assert_eq!(message, "ci: version bump to 1.2.4");
        assert_eq!(classify(&commits(&[&message])), Classification::NoOp);
    }
}
