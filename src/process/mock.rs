use std::io;
use std::sync::Mutex;

use crate::process::{CommandOutput, CommandRunner, CommandSpec};

struct ScriptedFailure {
    program: String,
    args_prefix: Vec<String>,
    output: CommandOutput,
}

/// Mock runner for testing without spawning git or dart
///
/// Every invocation is recorded. Commands succeed unless a scripted failure
/// matches their program and leading arguments.
#[derive(Default)]
pub struct RecordingRunner {
    calls: Mutex<Vec<CommandSpec>>,
    failures: Vec<ScriptedFailure>,
}

impl RecordingRunner {
    /// Create a runner where every command succeeds
    pub fn new() -> Self {
        Self::default()
    }

    /// Fail commands starting with `program args_prefix..` with exit code 1
    pub fn with_failure(self, program: &str, args_prefix: &[&str], stderr: &str) -> Self {
        self.with_output(program, args_prefix, CommandOutput::failed(1, stderr))
    }

    /// Return `output` for commands starting with `program args_prefix..`
    pub fn with_output(mut self, program: &str, args_prefix: &[&str], output: CommandOutput) -> Self {
        self.failures.push(ScriptedFailure {
            program: program.to_string(),
            args_prefix: args_prefix.iter().map(|s| s.to_string()).collect(),
            output,
        });
        self
    }

    /// All recorded invocations in order
    pub fn calls(&self) -> Vec<CommandSpec> {
        self.calls.lock().map(|c| c.clone()).unwrap_or_default()
    }

    /// Recorded invocations as unmasked `program arg arg..` lines
    pub fn command_lines(&self) -> Vec<String> {
        self.calls()
            .iter()
            .map(|spec| {
                std::iter::once(spec.program.clone())
                    .chain(spec.args.iter().cloned())
                    .collect::<Vec<_>>()
                    .join(" ")
            })
            .collect()
    }

    /// Number of recorded invocations matching `program args_prefix..`
    pub fn count(&self, program: &str, args_prefix: &[&str]) -> usize {
        self.calls()
            .iter()
            .filter(|spec| spec.matches(program, args_prefix))
            .count()
    }

    /// Position of the first matching invocation
    pub fn position(&self, program: &str, args_prefix: &[&str]) -> Option<usize> {
        self.calls()
            .iter()
            .position(|spec| spec.matches(program, args_prefix))
    }
}

impl CommandRunner for RecordingRunner {
    fn run(&self, spec: &CommandSpec) -> io::Result<CommandOutput> {
        if let Ok(mut calls) = self.calls.lock() {
            calls.push(spec.clone());
        }

        let scripted = self.failures.iter().find(|f| {
            let args: Vec<&str> = f.args_prefix.iter().map(String::as_str).collect();
            spec.matches(&f.program, &args)
        });

        Ok(scripted
            .map(|f| f.output.clone())
            .unwrap_or_else(CommandOutput::ok))
    }
}
