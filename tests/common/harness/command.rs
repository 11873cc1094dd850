//! Fluent wrapper around assert_cmd::Command.

// Allow dead code since this is a test utility with methods for future tests
#![allow(dead_code)]

use assert_cmd::Command;
use serde::de::DeserializeOwned;
use std::path::{Path, PathBuf};

/// Fluent wrapper around `assert_cmd::Command` for the `scms` binary.
///
/// Provides a builder-style API for constructing and executing CLI commands.
pub struct ScmsCommand {
    args: Vec<String>,
    config_home: Option<PathBuf>,
}

impl ScmsCommand {
    /// Creates a new command for the `scms` binary.
    pub fn new() -> Self {
        Self {
            args: Vec::new(),
            config_home: None,
        }
    }

    /// Points the default config lookup at `dir` instead of the user's.
    pub fn config_home(mut self, dir: &Path) -> Self {
        self.config_home = Some(dir.to_path_buf());
        self
    }

    /// Adds arguments to the command.
    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.args
            .extend(args.into_iter().map(|s| s.as_ref().to_string()));
        self
    }

    fn path_arg(self, flag: &str, path: &Path) -> Self {
        let value = path.to_string_lossy().to_string();
        self.args([flag, value.as_str()])
    }

    /// Returns the current arguments (for testing).
    pub fn get_args(&self) -> &[String] {
        &self.args
    }

    /// Runs the command and returns an Assert for making assertions.
    #[allow(deprecated)]
    pub fn assert(self) -> assert_cmd::assert::Assert {
        let mut cmd = Command::cargo_bin("scms").expect("Failed to find scms binary");
        cmd.args(&self.args).env_remove("RUST_LOG");
        if let Some(dir) = &self.config_home {
            cmd.env("XDG_CONFIG_HOME", dir).env("HOME", dir);
        }
        cmd.assert()
    }

    /// Runs the command, expects success, and returns stdout as a string.
    pub fn output_success(self) -> String {
        let output = self.assert().success().get_output().stdout.clone();
        String::from_utf8(output).expect("Output was not valid UTF-8")
    }

    /// Runs the command, expects success, and parses stdout as JSON.
    pub fn output_json<T: DeserializeOwned>(self) -> T {
        let output = self.output_success();
        serde_json::from_str(&output).expect("Failed to parse output as JSON")
    }

    // ===========================================
    // Command Shortcuts
    // ===========================================

    /// Configures for the `build` command.
    pub fn build(self) -> Self {
        self.args(["build"])
    }

    /// Configures for the `check` command.
    pub fn check(self) -> Self {
        self.args(["check"])
    }

    /// Configures for the `completions` command.
    pub fn completions(self, shell: &str) -> Self {
        self.args(["completions", shell])
    }

    // ===========================================
    // Options
    // ===========================================

    /// Adds `--source-root <path>`.
    pub fn source(self, path: &Path) -> Self {
        self.path_arg("--source-root", path)
    }

    /// Adds `--target <path>`.
    pub fn target(self, path: &Path) -> Self {
        self.path_arg("--target", path)
    }

    /// Adds `--config <path>`.
    pub fn config(self, path: &Path) -> Self {
        self.path_arg("--config", path)
    }

    /// Adds `--format json` to the command.
    pub fn format_json(self) -> Self {
        self.args(["--format", "json"])
    }
}

impl Default for ScmsCommand {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    // ===========================================
    // ScmsCommand Basics
    // ===========================================

    #[test]
    fn test_command_runs_binary() {
        ScmsCommand::new().args(["--help"]).assert().success();
    }

    #[test]
    fn test_command_output_success() {
        let output = ScmsCommand::new().args(["--help"]).output_success();
        assert!(output.contains("build"));
        assert!(output.contains("check"));
    }

    #[test]
    fn test_command_shortcuts() {
        let temp = TempDir::new().unwrap();
        let cmd = ScmsCommand::new().build().source(temp.path()).format_json();
        let args = cmd.get_args();
        assert_eq!(args[0], "build");
        assert_eq!(args[1], "--source-root");
        assert_eq!(args[2], temp.path().to_string_lossy());
        assert!(args.contains(&"json".to_string()));
    }
}
