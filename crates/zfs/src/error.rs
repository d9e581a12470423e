//! Backend and transport errors

use std::path::PathBuf;
use thiserror::Error;

/// Failure of a storage backend call
#[derive(Debug, Error)]
pub enum ZfsError {
    /// Dataset is busy or locked (e.g. a concurrent snapshot or send)
    #[error("dataset {dataset} is busy")]
    Busy { dataset: String },

    #[error("dataset {dataset} does not exist")]
    NotFound { dataset: String },

    /// Any other non-zero exit of the backend command
    #[error("'{command}' failed: {message}")]
    Backend { command: String, message: String },

    /// The backend command could not be started at all
    #[error("failed to run '{command}': {source}")]
    Spawn {
        command: String,
        #[source]
        source: std::io::Error,
    },

    #[error("unexpected output from zfs: '{line}'")]
    Parse { line: String },
}

/// Failure setting up the ssh transport
#[derive(Debug, Error)]
pub enum RemoteError {
    #[error("{} is not a valid ssh key file", .0.display())]
    KeyMissing(PathBuf),
}

impl ZfsError {
    /// Map a failed command's stderr onto the error taxonomy
    pub fn from_stderr(command: &str, dataset: &str, stderr: &str) -> Self {
        let message = stderr.trim();

        if message.contains("dataset is busy") || message.contains("pool or dataset is busy") {
            ZfsError::Busy {
                dataset: dataset.to_string(),
            }
        } else if message.contains("dataset does not exist") {
            ZfsError::NotFound {
                dataset: dataset.to_string(),
            }
        } else {
            ZfsError::Backend {
                command: command.to_string(),
                message: message.to_string(),
            }
        }
    }
}
