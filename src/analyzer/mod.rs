//! Analysis engine for determining version bumps from commits

pub mod classifier;

pub use classifier::{classify, release_commit_message, Classification, RELEASE_MARKER};
