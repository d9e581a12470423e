//! Structured record of a scheduling pass

use rznap_core::Bucket;

/// Something notable that happened during a pass
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    /// Entry has `snap` unset
    EntrySkipped { entry: String },
    /// Entry could not be processed at all (identity, key, probe, discovery)
    EntryFailed { entry: String, reason: String },
    /// Snapshots of one dataset could not be listed
    DatasetFailed { dataset: String, reason: String },
    /// Descendant left to a configured ancestor's recursive run
    DescendantCovered { dataset: String },
    SnapshotCreated { dataset: String, name: String, bucket: Bucket },
    SnapshotPlanned { dataset: String, name: String, bucket: Bucket },
    SnapshotFailed { dataset: String, name: String, bucket: Bucket, reason: String },
}

impl Event {
    pub fn is_error(&self) -> bool {
        matches!(
            self,
            Event::EntryFailed { .. } | Event::DatasetFailed { .. } | Event::SnapshotFailed { .. }
        )
    }
}

/// All events of one pass, in the order they happened
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunReport {
    pub events: Vec<Event>,
}

impl RunReport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn extend(&mut self, events: impl IntoIterator<Item = Event>) {
        self.events.extend(events);
    }

    /// `dataset@name` of every snapshot created
    pub fn created(&self) -> Vec<String> {
        self.events
            .iter()
            .filter_map(|e| match e {
                Event::SnapshotCreated { dataset, name, .. } => Some(format!("{}@{}", dataset, name)),
                _ => None,
            })
            .collect()
    }

    /// `dataset@name` of every snapshot a dry run would create
    pub fn planned(&self) -> Vec<String> {
        self.events
            .iter()
            .filter_map(|e| match e {
                Event::SnapshotPlanned { dataset, name, .. } => Some(format!("{}@{}", dataset, name)),
                _ => None,
            })
            .collect()
    }

    pub fn failures(&self) -> impl Iterator<Item = &Event> {
        self.events.iter().filter(|e| e.is_error())
    }

    pub fn has_errors(&self) -> bool {
        self.failures().next().is_some()
    }
}
