//! ZFS storage backend for rznap
//!
//! This crate provides:
//! - The `Zfs` backend trait (inventory, snapshot listing, snapshot creation)
//! - `ZfsCli`, driving the `zfs` binary locally or over ssh
//! - `Remote`, the ssh transport and its connectivity probe
//! - `MemoryZfs`, an in-memory backend with failure injection

pub mod cli;
pub mod error;
pub mod memory;
pub mod remote;

// Re-exports
pub use cli::ZfsCli;
pub use error::{RemoteError, ZfsError};
pub use memory::{FailureKind, MemoryZfs, SnapshotCall};
pub use remote::Remote;

use rznap_core::{Dataset, Snapshot};
use std::sync::Arc;

/// Result type for backend operations
pub type Result<T> = std::result::Result<T, ZfsError>;

/// Narrow interface to the storage layer
///
/// Implementations are thin wrappers over the system interface so the
/// scheduling core can be exercised without real ZFS pools.
pub trait Zfs: Send + Sync {
    /// Filesystems and volumes at `path`: the dataset itself first, then all
    /// of its descendants in discovery order.
    fn find(&self, path: &str) -> Result<Vec<Dataset>>;

    /// Snapshots taken directly on `dataset` (not on its descendants)
    fn snapshots(&self, dataset: &Dataset) -> Result<Vec<Snapshot>>;

    /// Create `dataset@name`; with `recursive` every descendant receives a
    /// same-named snapshot atomically.
    fn snapshot(&self, dataset: &Dataset, name: &str, recursive: bool) -> Result<()>;
}

impl<T: Zfs + ?Sized> Zfs for Arc<T> {
    fn find(&self, path: &str) -> Result<Vec<Dataset>> {
        (**self).find(path)
    }

    fn snapshots(&self, dataset: &Dataset) -> Result<Vec<Snapshot>> {
        (**self).snapshots(dataset)
    }

    fn snapshot(&self, dataset: &Dataset, name: &str, recursive: bool) -> Result<()> {
        (**self).snapshot(dataset, name, recursive)
    }
}

impl<T: Zfs + ?Sized> Zfs for Box<T> {
    fn find(&self, path: &str) -> Result<Vec<Dataset>> {
        (**self).find(path)
    }

    fn snapshots(&self, dataset: &Dataset) -> Result<Vec<Snapshot>> {
        (**self).snapshots(dataset)
    }

    fn snapshot(&self, dataset: &Dataset, name: &str, recursive: bool) -> Result<()> {
        (**self).snapshot(dataset, name, recursive)
    }
}
