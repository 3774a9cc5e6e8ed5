use std::env;
use std::path::PathBuf;

use anyhow::Result;
use clap::builder::FalseyValueParser;
use clap::{ArgAction, Parser};
use tracing::info;
use tracing_subscriber::EnvFilter;

use dart_conventional_release::config::{self, ConfigOverrides, ReleaseConfig, VerifyFailurePolicy};
use dart_conventional_release::process::SystemRunner;
use dart_conventional_release::release::{ReleaseOrchestrator, ReleaseOutcome};
use dart_conventional_release::trigger::TriggerContext;
use dart_conventional_release::ui;

#[derive(clap::Parser)]
#[command(
    name = "dart-conventional-release",
    version,
    about = "Bump, tag and publish a Dart package from conventional commits"
)]
struct Args {
    #[arg(short, long, help = "Custom configuration file path")]
    config: Option<String>,

    #[arg(long, env = "GITHUB_WORKSPACE", help = "Repository checkout")]
    workspace: Option<String>,

    #[arg(
        long,
        env = "PACKAGEJSON_DIR",
        help = "Package directory relative to the workspace"
    )]
    package_dir: Option<String>,

    #[arg(long, env = "INPUT_TAG-PREFIX", help = "Prefix for release tags")]
    tag_prefix: Option<String>,

    #[arg(
        long,
        env = "INPUT_USE-DART",
        action = ArgAction::SetTrue,
        value_parser = FalseyValueParser::new(),
        help = "Use the dart tool instead of flutter"
    )]
    use_dart: bool,

    #[arg(long, env = "INPUT_SCRIPT-PRE-RUN", help = "Dart script to run before the release")]
    script_pre_run: Option<String>,

    #[arg(long, value_enum, help = "What to do with the manifest when verification fails")]
    on_verify_failure: Option<VerifyFailurePolicy>,

    #[arg(
        long,
        env = "INPUT_SKIP-PUBLISH",
        action = ArgAction::SetTrue,
        value_parser = FalseyValueParser::new(),
        help = "Push the tag without publishing to the registry"
    )]
    skip_publish: bool,

    #[arg(long, env = "GITHUB_USER", help = "Committer name")]
    git_user_name: Option<String>,

    #[arg(long, env = "GITHUB_EMAIL", help = "Committer email")]
    git_user_email: Option<String>,

    #[arg(
        long,
        env = "INPUT_DEPLOY-KEY",
        hide_env_values = true,
        help = "Base64-encoded SSH deploy key"
    )]
    deploy_key: Option<String>,

    #[arg(
        long,
        env = "GITHUB_TOKEN",
        hide_env_values = true,
        help = "Token used when no deploy key is given"
    )]
    token: Option<String>,
}

/// Action inputs arrive as empty strings when unset
fn non_empty_path(value: Option<String>) -> Option<PathBuf> {
    value.filter(|v| !v.trim().is_empty()).map(PathBuf::from)
}

impl Args {
    fn overrides(self) -> ConfigOverrides {
        let workspace =
            non_empty_path(self.workspace).or_else(|| env::current_dir().ok());
        let package_dir = non_empty_path(self.package_dir)
            .or_else(|| non_empty_path(env::var("INPUT_PACKAGEJSON_DIR").ok()));

        ConfigOverrides {
            workspace,
            package_dir,
            tag_prefix: self.tag_prefix,
            use_dart: self.use_dart,
            script_pre_run: non_empty_path(self.script_pre_run),
            on_verify_failure: self.on_verify_failure,
            skip_publish: self.skip_publish,
            git_user_name: self.git_user_name,
            git_user_email: self.git_user_email,
            deploy_key: self.deploy_key,
            token: self.token,
        }
    }
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    if let Err(e) = run(Args::parse()) {
        ui::annotate_failure(&format!("{:#}", e));
        std::process::exit(1);
    }
}

fn run(args: Args) -> Result<()> {
    let runner = SystemRunner::new();
    let config_path = args.config.clone();
    let overrides = args.overrides();

    let config = match config::load_config(config_path.as_deref()) {
        Ok(config) => config.apply(overrides),
        Err(e) => {
            let fallback = ReleaseConfig::default().apply(overrides);
            ReleaseOrchestrator::new(&fallback, &runner).discard_credentials();
            return Err(e.into());
        }
    };

    let report = ReleaseOrchestrator::new(&config, &runner).run_with(TriggerContext::from_env);
    match report.result? {
        ReleaseOutcome::NoOp => info!("nothing to release"),
        ReleaseOutcome::Released(attempt) => {
            info!(version = %attempt.new_version, tag = %attempt.tag_name, "release complete")
        }
    }
    Ok(())
}
