//! Retention policy entries

use crate::Bucket;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// One configured dataset and which buckets to keep for it
///
/// Deserialized straight from a `[[dataset]]` table; every flag defaults to
/// `false`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RetentionPolicy {
    /// Canonical identity string (local path or `ssh:<port>:<user>@<host>:<path>`)
    pub name: String,

    /// ssh private key, required for remote entries
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key: Option<PathBuf>,

    /// Take snapshots for this entry at all
    #[serde(default)]
    pub snap: bool,

    #[serde(default)]
    pub yearly: bool,
    #[serde(default)]
    pub monthly: bool,
    #[serde(default)]
    pub weekly: bool,
    #[serde(default)]
    pub daily: bool,
    #[serde(default)]
    pub hourly: bool,
}

impl RetentionPolicy {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// Whether `bucket` is retained
    pub fn retains(&self, bucket: Bucket) -> bool {
        match bucket {
            Bucket::Yearly => self.yearly,
            Bucket::Monthly => self.monthly,
            Bucket::Weekly => self.weekly,
            Bucket::Daily => self.daily,
            Bucket::Hourly => self.hourly,
        }
    }

    /// Builder-style setter, mostly for tests and examples
    pub fn with(mut self, bucket: Bucket, keep: bool) -> Self {
        match bucket {
            Bucket::Yearly => self.yearly = keep,
            Bucket::Monthly => self.monthly = keep,
            Bucket::Weekly => self.weekly = keep,
            Bucket::Daily => self.daily = keep,
            Bucket::Hourly => self.hourly = keep,
        }
        self
    }

    /// Retained buckets in priority order
    pub fn retained(&self) -> impl Iterator<Item = Bucket> + '_ {
        Bucket::ALL.into_iter().filter(|b| self.retains(*b))
    }
}
