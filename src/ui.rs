//! Human-facing output: styled status lines and CI workflow annotations.

use std::env;

use console::style;

use crate::domain::{BumpCategory, SemanticVersion, TagName};

/// Whether output is consumed by GitHub Actions
pub fn in_github_actions() -> bool {
    env::var("GITHUB_ACTIONS").map(|v| v == "true").unwrap_or(false)
}

/// Escape a message for a `::level::` workflow command
pub fn format_annotation(level: &str, message: &str) -> String {
    let escaped = message
        .replace('%', "%25")
        .replace('\r', "%0D")
        .replace('\n', "%0A");
    format!("::{}::{}", level, escaped)
}

pub fn display_error(message: &str) {
    eprintln!("{} {}", style("ERROR:").red().bold(), message);
}

pub fn display_warning(message: &str) {
    eprintln!("{} {}", style("⚠").yellow(), message);
    if in_github_actions() {
        println!("{}", format_annotation("warning", message));
    }
}

pub fn display_success(message: &str) {
    println!("{} {}", style("✓").green(), message);
}

pub fn display_status(message: &str) {
    println!("{} {}", style("→").yellow(), message);
}

/// Report the run's failure; in CI this also marks the step as failed
pub fn annotate_failure(message: &str) {
    let message = format!("Action failed with error: {}", message);
    display_error(&message);
    if in_github_actions() {
        println!("{}", format_annotation("error", &message));
    }
}

/// Summarize the bump about to be written
pub fn display_release_plan(
    commit_count: usize,
    category: BumpCategory,
    current: &SemanticVersion,
    next: &SemanticVersion,
    tag: &TagName,
) {
    println!(
        "\n{} `{}` commit(s) for this version bump",
        style("Release plan:").bold(),
        commit_count
    );
    println!("  Bump: {} version bump!", style(category).cyan());
    println!("  From: {}", style(current).red());
    println!("  To:   {}", style(next).green());
    println!("  Tag:  {}\n", style(tag).green());
}
