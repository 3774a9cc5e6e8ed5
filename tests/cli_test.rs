// tests/cli_test.rs
use std::fs;
use std::path::{Path, PathBuf};
use std::process::{Command, Output};

use tempfile::TempDir;

const STALE_KEY: &str = ".ssh/id_deploy_key";

fn binary() -> Command {
    Command::new(env!("CARGO_BIN_EXE_dart-conventional-release"))
}

/// Workspace whose push only contains the previous release commit
fn noop_workspace() -> (TempDir, PathBuf) {
    let dir = TempDir::new().unwrap();
    fs::write(dir.path().join("pubspec.yaml"), "name: demo\nversion: 0.1.0\n").unwrap();
    let event = dir.path().join("event.json");
    fs::write(
        &event,
        r#"{"commits":[{"message":"ci: version bump to 0.1.0"}],"repository":{"full_name":"acme/demo"}}"#,
    )
    .unwrap();
    (dir, event)
}

/// The binary as the action runner starts it
fn action(workspace: &Path, event: &Path) -> Command {
    let mut cmd = binary();
    cmd.current_dir(workspace)
        .env("GITHUB_EVENT_PATH", event)
        .env("GITHUB_WORKSPACE", workspace)
        .env("GITHUB_TOKEN", "tok")
        .env_remove("GITHUB_REPOSITORY")
        .env_remove("GITHUB_ACTIONS");
    cmd
}

fn leave_stale_key(workspace: &Path) -> PathBuf {
    let key = workspace.join(STALE_KEY);
    fs::create_dir_all(key.parent().unwrap()).unwrap();
    fs::write(&key, "stale").unwrap();
    key
}

fn stderr(output: &Output) -> String {
    String::from_utf8_lossy(&output.stderr).into_owned()
}

#[test]
fn test_help_lists_options() {
    let output = binary().arg("--help").output().expect("Failed to execute command");

    assert!(output.status.success());
    let stdout = String::from_utf8(output.stdout).unwrap();
    assert!(stdout.contains("dart-conventional-release"));
    assert!(stdout.contains("--tag-prefix"));
    assert!(stdout.contains("--deploy-key"));
    assert!(stdout.contains("--on-verify-failure"));
}

#[test]
fn test_help_hides_secret_values() {
    let output = binary()
        .arg("--help")
        .env("GITHUB_TOKEN", "ghp_should_not_print")
        .output()
        .expect("Failed to execute command");

    let stdout = String::from_utf8(output.stdout).unwrap();
    assert!(!stdout.contains("ghp_should_not_print"));
}

#[test]
fn test_noop_push_exits_zero() {
    let (dir, event) = noop_workspace();

    let output = action(dir.path(), &event)
        .output()
        .expect("Failed to execute command");

    assert!(output.status.success(), "{}", stderr(&output));
    let stdout = String::from_utf8(output.stdout).unwrap();
    assert!(stdout.contains("No action necessary!"));
}

#[test]
fn test_unset_action_inputs_arrive_empty() {
    let (dir, event) = noop_workspace();

    let output = action(dir.path(), &event)
        .env("INPUT_USE-DART", "")
        .env("INPUT_SCRIPT-PRE-RUN", "")
        .env("INPUT_SKIP-PUBLISH", "")
        .env("INPUT_DEPLOY-KEY", "")
        .env("PACKAGEJSON_DIR", "")
        .env("INPUT_PACKAGEJSON_DIR", "")
        .env("GITHUB_USER", "")
        .env("GITHUB_EMAIL", "")
        .output()
        .expect("Failed to execute command");

    assert_eq!(output.status.code(), Some(0), "{}", stderr(&output));
}

#[test]
fn test_truthy_action_inputs_accepted() {
    for value in ["true", "yes", "1", "false", "0"] {
        let (dir, event) = noop_workspace();

        let output = action(dir.path(), &event)
            .env("INPUT_USE-DART", value)
            .env("INPUT_SKIP-PUBLISH", value)
            .output()
            .expect("Failed to execute command");

        assert_eq!(output.status.code(), Some(0), "{}: {}", value, stderr(&output));
    }
}

#[test]
fn test_missing_event_payload_fails_and_cleans_up() {
    let dir = TempDir::new().unwrap();
    let key = leave_stale_key(dir.path());

    let output = binary()
        .current_dir(dir.path())
        .env_remove("GITHUB_EVENT_PATH")
        .env("GITHUB_TOKEN", "tok")
        .env("GITHUB_WORKSPACE", dir.path())
        .output()
        .expect("Failed to execute command");

    assert_eq!(output.status.code(), Some(1));
    let stderr = stderr(&output);
    assert!(stderr.contains("Action failed with error"));
    assert!(stderr.contains("GITHUB_EVENT_PATH"));
    assert!(!key.exists());
}

#[test]
fn test_invalid_deploy_key_fails_and_cleans_up() {
    let (dir, event) = noop_workspace();
    let key = leave_stale_key(dir.path());

    let output = action(dir.path(), &event)
        .env("INPUT_DEPLOY-KEY", "!!!notb64")
        .output()
        .expect("Failed to execute command");

    assert_eq!(output.status.code(), Some(1));
    let stderr = stderr(&output);
    assert!(stderr.contains("Action failed with error"));
    assert!(stderr.contains("not valid base64"));
    assert!(!key.exists());
}

#[test]
fn test_unreadable_config_fails_and_cleans_up() {
    let (dir, event) = noop_workspace();
    let key = leave_stale_key(dir.path());

    let output = action(dir.path(), &event)
        .args(["--config", "missing-release.toml"])
        .output()
        .expect("Failed to execute command");

    assert_eq!(output.status.code(), Some(1));
    assert!(stderr(&output).contains("Action failed with error"));
    assert!(!key.exists());
}

#[test]
fn test_failure_annotation_in_github_actions() {
    let (dir, event) = noop_workspace();

    let output = action(dir.path(), &event)
        .env("GITHUB_ACTIONS", "true")
        .env("INPUT_DEPLOY-KEY", "!!!notb64")
        .output()
        .expect("Failed to execute command");

    assert_eq!(output.status.code(), Some(1));
    let stdout = String::from_utf8(output.stdout).unwrap();
    assert!(stdout.contains("::error::Action failed with error"));
}
