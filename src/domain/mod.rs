//! Domain logic - pure release rules independent of git and the package CLI

pub mod commit;
pub mod tag;
pub mod version;

pub use commit::CommitRecord;
pub use tag::TagName;
pub use version::{increment, BumpCategory, SemanticVersion};
