//! In-memory backend
//!
//! Models a single pool: an ordered list of datasets, their snapshots, and a
//! log of every snapshot creation request. Failures can be injected per
//! dataset listing or per snapshot-name suffix.

use crate::error::ZfsError;
use crate::{Result, Zfs};
use chrono::NaiveDateTime;
use parking_lot::Mutex;
use rznap_core::{Dataset, Endpoint, Snapshot};
use std::collections::HashMap;

/// Kind of failure to inject into snapshot creation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    Busy,
    NotFound,
    Backend,
}

/// A recorded `snapshot` call
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SnapshotCall {
    pub dataset: String,
    pub name: String,
    pub recursive: bool,
}

#[derive(Debug, Default)]
struct State {
    datasets: Vec<Dataset>,
    snapshots: HashMap<String, Vec<Snapshot>>,
    calls: Vec<SnapshotCall>,
    snapshot_failures: Vec<(String, FailureKind)>,
    listing_failures: Vec<String>,
    now: NaiveDateTime,
}

/// In-memory pool
#[derive(Debug)]
pub struct MemoryZfs {
    endpoint: Option<Endpoint>,
    state: Mutex<State>,
}

impl MemoryZfs {
    /// Empty local pool
    pub fn new() -> Self {
        Self {
            endpoint: None,
            state: Mutex::new(State::default()),
        }
    }

    /// Empty pool whose datasets are reported as living on `endpoint`
    pub fn on_endpoint(endpoint: Endpoint) -> Self {
        Self {
            endpoint: Some(endpoint),
            state: Mutex::new(State::default()),
        }
    }

    /// Add a dataset; discovery order is insertion order
    pub fn add_dataset(&self, name: &str) -> &Self {
        self.state.lock().datasets.push(Dataset {
            name: name.to_string(),
            remote: self.endpoint.clone(),
        });
        self
    }

    /// Add an existing snapshot to `dataset`
    pub fn add_snapshot(&self, dataset: &str, name: &str, creation: NaiveDateTime) -> &Self {
        self.state
            .lock()
            .snapshots
            .entry(dataset.to_string())
            .or_default()
            .push(Snapshot::new(name, creation));
        self
    }

    /// Creation time stamped on snapshots created from now on
    pub fn set_now(&self, now: NaiveDateTime) {
        self.state.lock().now = now;
    }

    /// Make every snapshot whose name ends with `_<suffix>` fail
    pub fn fail_snapshots(&self, suffix: &str, kind: FailureKind) {
        self.state
            .lock()
            .snapshot_failures
            .push((format!("_{}", suffix), kind));
    }

    /// Make listing snapshots of `dataset` fail
    pub fn fail_listing(&self, dataset: &str) {
        self.state.lock().listing_failures.push(dataset.to_string());
    }

    /// All snapshot creation requests, successful or not
    pub fn calls(&self) -> Vec<SnapshotCall> {
        self.state.lock().calls.clone()
    }

    /// Snapshot names currently present on `dataset`
    pub fn snapshot_names(&self, dataset: &str) -> Vec<String> {
        self.state
            .lock()
            .snapshots
            .get(dataset)
            .map(|snaps| snaps.iter().map(|s| s.name.clone()).collect())
            .unwrap_or_default()
    }
}

impl Default for MemoryZfs {
    fn default() -> Self {
        Self::new()
    }
}

impl Zfs for MemoryZfs {
    fn find(&self, path: &str) -> Result<Vec<Dataset>> {
        let state = self.state.lock();

        let root = state
            .datasets
            .iter()
            .find(|d| d.name == path)
            .ok_or_else(|| ZfsError::NotFound {
                dataset: path.to_string(),
            })?;

        let mut tree = vec![root.clone()];
        tree.extend(
            state
                .datasets
                .iter()
                .filter(|d| root.is_ancestor_of(d))
                .cloned(),
        );
        Ok(tree)
    }

    fn snapshots(&self, dataset: &Dataset) -> Result<Vec<Snapshot>> {
        let state = self.state.lock();

        if state.listing_failures.contains(&dataset.name) {
            return Err(ZfsError::Backend {
                command: format!("zfs list -t snapshot {}", dataset.name),
                message: "I/O error".to_string(),
            });
        }

        Ok(state.snapshots.get(&dataset.name).cloned().unwrap_or_default())
    }

    fn snapshot(&self, dataset: &Dataset, name: &str, recursive: bool) -> Result<()> {
        let mut state = self.state.lock();

        state.calls.push(SnapshotCall {
            dataset: dataset.name.clone(),
            name: name.to_string(),
            recursive,
        });

        let failure = state
            .snapshot_failures
            .iter()
            .find(|(suffix, _)| name.ends_with(suffix.as_str()))
            .map(|(_, kind)| *kind);

        if let Some(kind) = failure {
            return Err(match kind {
                FailureKind::Busy => ZfsError::Busy {
                    dataset: dataset.name.clone(),
                },
                FailureKind::NotFound => ZfsError::NotFound {
                    dataset: dataset.name.clone(),
                },
                FailureKind::Backend => ZfsError::Backend {
                    command: format!("zfs snapshot {}@{}", dataset.name, name),
                    message: "injected failure".to_string(),
                },
            });
        }

        let mut targets = vec![dataset.name.clone()];
        if recursive {
            targets.extend(
                state
                    .datasets
                    .iter()
                    .filter(|d| dataset.is_ancestor_of(d))
                    .map(|d| d.name.clone()),
            );
        }

        let creation = state.now;
        for target in targets {
            state
                .snapshots
                .entry(target)
                .or_default()
                .push(Snapshot::new(name, creation));
        }

        Ok(())
    }
}
