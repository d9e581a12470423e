//! `zfs` command-line backend, local or over ssh

use crate::error::ZfsError;
use crate::remote::{shell_quote, Remote};
use crate::{Result, Zfs};
use chrono::{Local, NaiveDateTime, TimeZone};
use rznap_core::{Dataset, Endpoint, Snapshot};
use std::process::{Command, Stdio};
use tracing::debug;

/// Backend that shells out to `zfs`
#[derive(Debug, Clone, Default)]
pub struct ZfsCli {
    remote: Option<Remote>,
}

impl ZfsCli {
    /// Backend for the local host
    pub fn local() -> Self {
        Self { remote: None }
    }

    /// Backend running every command through `remote`
    pub fn remote(remote: Remote) -> Self {
        Self {
            remote: Some(remote),
        }
    }

    fn endpoint(&self) -> Option<&Endpoint> {
        self.remote.as_ref().map(Remote::endpoint)
    }

    /// Build the process for `zfs <args>`
    pub fn command(&self, args: &[&str]) -> Command {
        match &self.remote {
            None => {
                let mut cmd = Command::new("zfs");
                cmd.args(args);
                cmd
            }
            Some(remote) => {
                let remote_command = std::iter::once("zfs")
                    .chain(args.iter().copied())
                    .map(shell_quote)
                    .collect::<Vec<_>>()
                    .join(" ");
                remote.command(&remote_command)
            }
        }
    }

    /// Run `zfs <args>` and return its stdout
    fn run(&self, args: &[&str], dataset: &str) -> Result<String> {
        let command_line = format!("zfs {}", args.join(" "));
        debug!("Running {}", command_line);

        let output = self
            .command(args)
            .stdin(Stdio::null())
            .output()
            .map_err(|source| ZfsError::Spawn {
                command: command_line.clone(),
                source,
            })?;

        if !output.status.success() {
            return Err(ZfsError::from_stderr(
                &command_line,
                dataset,
                &String::from_utf8_lossy(&output.stderr),
            ));
        }

        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}

impl Zfs for ZfsCli {
    fn find(&self, path: &str) -> Result<Vec<Dataset>> {
        let stdout = self.run(
            &["list", "-H", "-p", "-o", "name", "-t", "filesystem,volume", "-r", path],
            path,
        )?;
        Ok(parse_dataset_list(&stdout, self.endpoint()))
    }

    fn snapshots(&self, dataset: &Dataset) -> Result<Vec<Snapshot>> {
        let stdout = self.run(
            &["list", "-H", "-p", "-o", "name,creation", "-t", "snapshot", "-d", "1", dataset.name.as_str()],
            &dataset.name,
        )?;
        parse_snapshot_list(&stdout)
    }

    fn snapshot(&self, dataset: &Dataset, name: &str, recursive: bool) -> Result<()> {
        let full_name = format!("{}@{}", dataset.name, name);
        let mut args = vec!["snapshot"];
        if recursive {
            args.push("-r");
        }
        args.push(full_name.as_str());

        self.run(&args, &dataset.name).map(|_| ())
    }
}

/// Parse `zfs list -H -o name` output; the first line is the root
pub fn parse_dataset_list(stdout: &str, endpoint: Option<&Endpoint>) -> Vec<Dataset> {
    stdout
        .lines()
        .map(str::trim_end)
        .filter(|line| !line.is_empty())
        .map(|name| Dataset {
            name: name.to_string(),
            remote: endpoint.cloned(),
        })
        .collect()
}

/// Parse `zfs list -H -p -o name,creation -t snapshot` output
pub fn parse_snapshot_list(stdout: &str) -> Result<Vec<Snapshot>> {
    let mut snapshots = Vec::new();

    for line in stdout.lines().filter(|l| !l.trim().is_empty()) {
        let parse_err = || ZfsError::Parse {
            line: line.to_string(),
        };

        let (full_name, creation) = line.split_once('\t').ok_or_else(parse_err)?;
        let (_, short_name) = full_name.split_once('@').ok_or_else(parse_err)?;
        let secs: i64 = creation.trim().parse().map_err(|_| parse_err())?;

        snapshots.push(Snapshot::new(short_name, local_time(secs).ok_or_else(parse_err)?));
    }

    Ok(snapshots)
}

/// Unix seconds to local wall-clock time
pub fn local_time(secs: i64) -> Option<NaiveDateTime> {
    Local
        .timestamp_opt(secs, 0)
        .earliest()
        .map(|dt| dt.naive_local())
}
