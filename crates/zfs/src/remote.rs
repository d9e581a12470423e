//! ssh transport to a remote ZFS host

use crate::error::RemoteError;
use rznap_core::Endpoint;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use tracing::error;

/// Seconds ssh waits for the TCP connection before giving up
const CONNECT_TIMEOUT_SECS: u32 = 10;

/// ssh connection parameters for one remote host
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Remote {
    endpoint: Endpoint,
    key: PathBuf,
}

impl Remote {
    /// Create a remote transport.
    ///
    /// Fails with `RemoteError::KeyMissing` if `key` does not exist.
    pub fn new(user: &str, host: &str, port: u16, key: &Path) -> Result<Self, RemoteError> {
        if !key.is_file() {
            return Err(RemoteError::KeyMissing(key.to_path_buf()));
        }

        Ok(Self {
            endpoint: Endpoint {
                user: user.to_string(),
                host: host.to_string(),
                port,
            },
            key: key.to_path_buf(),
        })
    }

    /// Convenience constructor from a parsed endpoint
    pub fn for_endpoint(endpoint: &Endpoint, key: &Path) -> Result<Self, RemoteError> {
        Self::new(&endpoint.user, &endpoint.host, endpoint.port, key)
    }

    pub fn endpoint(&self) -> &Endpoint {
        &self.endpoint
    }

    /// Arguments passed to `ssh` before the remote command
    pub fn ssh_args(&self) -> Vec<String> {
        vec![
            "-i".to_string(),
            self.key.display().to_string(),
            "-p".to_string(),
            self.endpoint.port.to_string(),
            "-o".to_string(),
            "BatchMode=yes".to_string(),
            "-o".to_string(),
            format!("ConnectTimeout={}", CONNECT_TIMEOUT_SECS),
            format!("{}@{}", self.endpoint.user, self.endpoint.host),
        ]
    }

    /// `ssh` command that runs `remote_command` on the host
    pub fn command(&self, remote_command: &str) -> Command {
        let mut cmd = Command::new("ssh");
        cmd.args(self.ssh_args()).arg(remote_command);
        cmd
    }

    /// Probe connectivity by running `true` on the host
    pub fn test(&self) -> bool {
        let output = self
            .command("true")
            .stdin(Stdio::null())
            .output();

        match output {
            Ok(out) if out.status.success() => true,
            Ok(out) => {
                error!(
                    "Connection to {}@{}:{} failed: {}",
                    self.endpoint.user,
                    self.endpoint.host,
                    self.endpoint.port,
                    String::from_utf8_lossy(&out.stderr).trim()
                );
                false
            }
            Err(e) => {
                error!("Could not run ssh: {}", e);
                false
            }
        }
    }
}

/// Quote `arg` for a POSIX shell if it contains anything beyond a safe set
pub(crate) fn shell_quote(arg: &str) -> String {
    let safe = !arg.is_empty()
        && arg
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || "-_./:@=,+%".contains(c));

    if safe {
        arg.to_string()
    } else {
        format!("'{}'", arg.replace('\'', r"'\''"))
    }
}
