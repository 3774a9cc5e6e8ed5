use serde::Deserialize;

/// A single commit delivered by the triggering push event
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct CommitRecord {
    pub message: String,
    #[serde(default)]
    pub body: String,
}

impl CommitRecord {
    /// Create a commit record from a subject/message only
    pub fn new(message: impl Into<String>) -> Self {
        CommitRecord {
            message: message.into(),
            body: String::new(),
        }
    }

    /// Create a commit record with an explicit body
    pub fn with_body(message: impl Into<String>, body: impl Into<String>) -> Self {
        CommitRecord {
            message: message.into(),
            body: body.into(),
        }
    }

    /// Subject and body joined into the one text the classifier searches
    pub fn searchable_text(&self) -> String {
        format!("{}\n{}", self.message, self.body)
    }
}
