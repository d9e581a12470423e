//! Canonical dataset identities
//!
//! A configuration `name` is either a local dataset path (`tank/data`) or a
//! remote one encoded as `ssh:<port>:<user>@<host>:<path>`.

use crate::dataset::Endpoint;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

const SSH_PREFIX: &str = "ssh:";

/// Parsed identity string
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Identity {
    Local { path: String },
    Ssh { endpoint: Endpoint, path: String },
}

/// Malformed identity string
#[derive(Debug, Error, PartialEq, Eq)]
pub enum IdentityError {
    #[error("empty dataset name")]
    Empty,
    #[error("'{0}' is not of the form ssh:<port>:<user>@<host>:<path>")]
    Malformed(String),
    #[error("invalid ssh port '{0}'")]
    InvalidPort(String),
}

impl Identity {
    /// Dataset path, without any remote prefix
    pub fn path(&self) -> &str {
        match self {
            Identity::Local { path } | Identity::Ssh { path, .. } => path,
        }
    }

    /// Remote endpoint, if any
    pub fn endpoint(&self) -> Option<&Endpoint> {
        match self {
            Identity::Local { .. } => None,
            Identity::Ssh { endpoint, .. } => Some(endpoint),
        }
    }

    /// Canonical identity of another dataset reachable through the same endpoint
    pub fn canonical(endpoint: Option<&Endpoint>, path: &str) -> String {
        match endpoint {
            None => path.to_string(),
            Some(ep) => format!("{}{}:{}@{}:{}", SSH_PREFIX, ep.port, ep.user, ep.host, path),
        }
    }
}

impl FromStr for Identity {
    type Err = IdentityError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.is_empty() {
            return Err(IdentityError::Empty);
        }

        let Some(rest) = s.strip_prefix(SSH_PREFIX) else {
            return Ok(Identity::Local { path: s.to_string() });
        };

        let malformed = || IdentityError::Malformed(s.to_string());

        let (port, rest) = rest.split_once(':').ok_or_else(malformed)?;
        let (login, path) = rest.split_once(':').ok_or_else(malformed)?;
        let (user, host) = login.split_once('@').ok_or_else(malformed)?;

        if user.is_empty() || host.is_empty() || path.is_empty() {
            return Err(malformed());
        }

        let port: u16 = port
            .parse()
            .map_err(|_| IdentityError::InvalidPort(port.to_string()))?;

        Ok(Identity::Ssh {
            endpoint: Endpoint {
                user: user.to_string(),
                host: host.to_string(),
                port,
            },
            path: path.to_string(),
        })
    }
}

impl fmt::Display for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&Identity::canonical(self.endpoint(), self.path()))
    }
}
