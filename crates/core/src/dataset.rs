//! Dataset and snapshot data model

use crate::identity::Identity;
use chrono::NaiveDateTime;
use std::fmt;

/// Separator between path components of a dataset name
pub const PATH_SEPARATOR: char = '/';

/// Remote ssh endpoint a dataset is reached through
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Endpoint {
    pub user: String,
    pub host: String,
    pub port: u16,
}

/// A ZFS filesystem or volume
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Dataset {
    /// Canonical dataset path (`tank/data/a`)
    pub name: String,
    /// Remote endpoint, `None` for local datasets
    pub remote: Option<Endpoint>,
}

/// A snapshot of one dataset
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Snapshot {
    /// Short name, the part after `@`
    pub name: String,
    /// Creation time (local wall clock)
    pub creation: NaiveDateTime,
}

impl Dataset {
    pub fn local(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            remote: None,
        }
    }

    pub fn remote(name: impl Into<String>, endpoint: Endpoint) -> Self {
        Self {
            name: name.into(),
            remote: Some(endpoint),
        }
    }

    /// True if `self` is a strict structural ancestor of `other`
    pub fn is_ancestor_of(&self, other: &Dataset) -> bool {
        other
            .name
            .strip_prefix(self.name.as_str())
            .is_some_and(|rest| rest.starts_with(PATH_SEPARATOR))
    }

    /// Identity string used to match configuration entries
    pub fn canonical_identity(&self) -> String {
        Identity::canonical(self.remote.as_ref(), &self.name)
    }
}

impl fmt::Display for Dataset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.remote {
            None => f.write_str(&self.name),
            Some(ep) => write!(f, "{}@{}:{}", ep.user, ep.host, self.name),
        }
    }
}

impl Snapshot {
    pub fn new(name: impl Into<String>, creation: NaiveDateTime) -> Self {
        Self {
            name: name.into(),
            creation,
        }
    }
}
