//! Configuration file handling
//!
//! The configuration is a TOML file with one `[[dataset]]` table per policy
//! entry and an optional `[run]` section.

use anyhow::{Context, Result};
use rznap_core::{Identity, RetentionPolicy};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::{Path, PathBuf};

/// Default location of the configuration file
pub const DEFAULT_CONFIG_PATH: &str = "/etc/rznap/rznap.toml";

/// Default location of the run lock
pub const DEFAULT_LOCK_FILE: &str = "/run/rznap.lock";

/// Whole configuration file
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    #[serde(default)]
    pub run: RunSettings,

    /// Policy entries, in file order
    #[serde(default, rename = "dataset")]
    pub datasets: Vec<RetentionPolicy>,
}

/// Settings for a snapshot pass
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RunSettings {
    /// Lock file preventing overlapping runs
    #[serde(default = "default_lock_file")]
    pub lock_file: PathBuf,

    /// Process entries concurrently
    #[serde(default)]
    pub parallel: bool,
}

impl Default for RunSettings {
    fn default() -> Self {
        Self {
            lock_file: default_lock_file(),
            parallel: false,
        }
    }
}

fn default_lock_file() -> PathBuf {
    PathBuf::from(DEFAULT_LOCK_FILE)
}

impl Config {
    /// Load and parse the configuration at `path`
    pub fn load(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;

        Self::from_toml(&contents)
            .with_context(|| format!("Failed to parse config file {}", path.display()))
    }

    pub fn from_toml(contents: &str) -> Result<Self> {
        Ok(toml::from_str(contents)?)
    }

    /// Problems an operator should fix.
    ///
    /// A snapshot pass runs regardless; each of these only affects its own
    /// entry at run time.
    pub fn validate(&self) -> Vec<String> {
        let mut problems = Vec::new();
        let mut seen = HashSet::new();

        for entry in &self.datasets {
            if !seen.insert(entry.name.as_str()) {
                problems.push(format!("{}: duplicate entry", entry.name));
            }

            match entry.name.parse::<Identity>() {
                Err(e) => problems.push(format!("{}: {}", entry.name, e)),
                Ok(identity) => {
                    if identity.endpoint().is_some() && entry.key.is_none() {
                        problems.push(format!("{}: remote dataset needs a 'key'", entry.name));
                    }
                    if identity.endpoint().is_none() && entry.key.is_some() {
                        problems.push(format!("{}: 'key' is only used for ssh datasets", entry.name));
                    }
                }
            }

            if entry.snap && entry.retained().next().is_none() {
                problems.push(format!("{}: snap is enabled but no bucket is retained", entry.name));
            }
        }

        problems
    }

    /// Entries with `snap` enabled
    pub fn enabled(&self) -> impl Iterator<Item = &RetentionPolicy> {
        self.datasets.iter().filter(|d| d.snap)
    }
}

/// Annotated example configuration
pub fn example_config() -> &'static str {
    r#"# rznap configuration

[run]
# Lock file preventing overlapping runs (e.g. from cron)
lock_file = "/run/rznap.lock"
# Process dataset entries concurrently
parallel = false

# One table per dataset. Snapshots are recursive: every descendant of
# `name` receives the same snapshots.
[[dataset]]
name = "tank/data"
snap = true
yearly = true
monthly = true
weekly = true
daily = true
hourly = true

# Descendant with its own policy. Datasets below it are left to its
# recursive snapshots.
[[dataset]]
name = "tank/data/vm"
snap = true
daily = true
hourly = true

# Remote dataset: ssh:<port>:<user>@<host>:<path>
[[dataset]]
name = "ssh:22:root@backup.example.org:pool/backup"
key = "/root/.ssh/id_ed25519"
snap = true
monthly = true
daily = true
"#
}
