//! Helpers for running the `rznap` binary in integration tests

#![allow(dead_code)]

use anyhow::{Context, Result};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::process::Command;
use tempfile::TempDir;

/// CLI command builder
pub struct RznapCommand {
    args: Vec<String>,
    env: HashMap<String, String>,
}

impl RznapCommand {
    pub fn new() -> Self {
        let mut env = HashMap::new();
        env.insert("RUST_LOG".to_string(), "info".to_string());
        env.insert("NO_COLOR".to_string(), "1".to_string());
        Self {
            args: Vec::new(),
            env,
        }
    }

    /// Add command arguments
    pub fn args(&mut self, args: &[&str]) -> &mut Self {
        self.args.extend(args.iter().map(|s| s.to_string()));
        self
    }

    /// Use `path` as configuration file
    pub fn config(&mut self, path: &Path) -> &mut Self {
        self.args.push("--config".to_string());
        self.args.push(path.display().to_string());
        self
    }

    /// Set environment variable
    pub fn env(&mut self, key: &str, value: &str) -> &mut Self {
        self.env.insert(key.to_string(), value.to_string());
        self
    }

    pub fn execute(&self) -> Result<CommandResult> {
        let output = Command::new(env!("CARGO_BIN_EXE_rznap"))
            .args(&self.args)
            .env_remove("RZNAP_CONFIG")
            .envs(&self.env)
            .output()
            .context("Failed to execute rznap")?;

        Ok(CommandResult {
            stdout: String::from_utf8_lossy(&output.stdout).to_string(),
            stderr: String::from_utf8_lossy(&output.stderr).to_string(),
            exit_code: output.status.code().unwrap_or(-1),
        })
    }

    /// Execute and assert success
    pub fn assert_success(&self) -> Result<CommandResult> {
        let result = self.execute()?;

        if !result.success() {
            anyhow::bail!(
                "Command failed (exit code: {}):\nArgs: {:?}\nStdout: {}\nStderr: {}",
                result.exit_code,
                self.args,
                result.stdout,
                result.stderr
            );
        }

        Ok(result)
    }

    /// Execute and expect failure
    pub fn assert_failure(&self) -> Result<CommandResult> {
        let result = self.execute()?;

        if result.success() {
            anyhow::bail!(
                "Command should have failed but succeeded:\nArgs: {:?}\nStdout: {}",
                self.args,
                result.stdout
            );
        }

        Ok(result)
    }
}

/// Command execution result
#[derive(Debug, Clone)]
pub struct CommandResult {
    pub stdout: String,
    pub stderr: String,
    pub exit_code: i32,
}

impl CommandResult {
    pub fn success(&self) -> bool {
        self.exit_code == 0
    }

    /// stdout and stderr together
    pub fn output(&self) -> String {
        format!("{}{}", self.stdout, self.stderr)
    }
}

/// Scratch directory holding a configuration file
pub struct TestSetup {
    pub dir: TempDir,
}

impl TestSetup {
    pub fn new() -> Result<Self> {
        Ok(Self {
            dir: TempDir::new()?,
        })
    }

    pub fn lock_file(&self) -> PathBuf {
        self.dir.path().join("rznap.lock")
    }

    pub fn config_path(&self) -> PathBuf {
        self.dir.path().join("rznap.toml")
    }

    /// Write a configuration whose `[run]` section points the lock into
    /// the scratch directory, followed by `datasets`
    pub fn write_config(&self, datasets: &str) -> Result<PathBuf> {
        let path = self.config_path();
        let contents = format!(
            "[run]\nlock_file = \"{}\"\n\n{}",
            self.lock_file().display(),
            datasets
        );
        std::fs::write(&path, contents)?;
        Ok(path)
    }
}
