//! Resolving a configured identity to a storage backend

use rznap_core::Identity;
use rznap_zfs::{Remote, RemoteError, Zfs, ZfsCli};
use std::path::Path;
use thiserror::Error;

/// Why an entry's backend could not be set up
#[derive(Debug, Error)]
pub enum ConnectError {
    #[error("no ssh key configured for remote dataset {0}")]
    KeyRequired(String),

    #[error(transparent)]
    Remote(#[from] RemoteError),

    #[error("could not connect to {0}")]
    Unreachable(String),
}

/// Hands out a backend for one policy entry
pub trait Connector: Send + Sync {
    fn connect(&self, identity: &Identity, key: Option<&Path>) -> Result<Box<dyn Zfs>, ConnectError>;
}

/// Connector using the real `zfs` binary, locally or over ssh
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemConnector;

impl Connector for SystemConnector {
    fn connect(&self, identity: &Identity, key: Option<&Path>) -> Result<Box<dyn Zfs>, ConnectError> {
        let Some(endpoint) = identity.endpoint() else {
            return Ok(Box::new(ZfsCli::local()));
        };

        let key = key.ok_or_else(|| ConnectError::KeyRequired(identity.to_string()))?;
        let remote = Remote::for_endpoint(endpoint, key)?;

        if !remote.test() {
            return Err(ConnectError::Unreachable(format!(
                "{}@{}:{}",
                endpoint.user, endpoint.host, endpoint.port
            )));
        }

        Ok(Box::new(ZfsCli::remote(remote)))
    }
}
