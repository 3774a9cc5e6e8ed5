pub mod analyzer;
pub mod config;
pub mod credentials;
pub mod domain;
pub mod error;
pub mod git;
pub mod manifest;
pub mod package;
pub mod process;
pub mod release;
pub mod trigger;
pub mod ui;

pub use error::{ReleaseError, Result};
