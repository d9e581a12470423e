//! Snapshot execution
//!
//! Creates one recursive snapshot per due bucket, yearly first. A failure on
//! one bucket is reported and the remaining buckets are still attempted.

use chrono::NaiveDateTime;
use rznap_core::{naming, Bucket, Dataset};
use rznap_zfs::{Zfs, ZfsError};
use std::collections::BTreeSet;
use tracing::{error, info};

/// Result of handling one due bucket
#[derive(Debug)]
pub struct BucketOutcome {
    pub bucket: Bucket,
    /// Snapshot name (without the dataset part)
    pub name: String,
    pub outcome: Outcome,
}

#[derive(Debug)]
pub enum Outcome {
    Created,
    /// Dry run: the snapshot would have been created
    Planned,
    Failed(ZfsError),
}

impl BucketOutcome {
    pub fn is_failure(&self) -> bool {
        matches!(self.outcome, Outcome::Failed(_))
    }
}

/// Create a recursive snapshot on `dataset` for every bucket in `due`.
///
/// With `dry_run` nothing is sent to the backend.
pub fn apply(
    zfs: &dyn Zfs,
    dataset: &Dataset,
    due: &BTreeSet<Bucket>,
    now: NaiveDateTime,
    dry_run: bool,
) -> Vec<BucketOutcome> {
    // BTreeSet iterates in bucket priority order
    due.iter()
        .map(|&bucket| {
            let name = naming::generate(bucket, now);

            let outcome = if dry_run {
                info!("Would take snapshot {}@{}", dataset, name);
                Outcome::Planned
            } else {
                info!("Taking snapshot {}@{}...", dataset, name);
                match zfs.snapshot(dataset, &name, true) {
                    Ok(()) => Outcome::Created,
                    Err(e) => {
                        error!("Failed to take snapshot {}@{}: {}", dataset, name, e);
                        Outcome::Failed(e)
                    }
                }
            };

            BucketOutcome { bucket, name, outcome }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use rznap_zfs::{FailureKind, MemoryZfs};

    fn now() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 6, 1)
            .unwrap()
            .and_hms_opt(10, 0, 0)
            .unwrap()
    }

    fn pool() -> MemoryZfs {
        let zfs = MemoryZfs::new();
        zfs.add_dataset("tank").add_dataset("tank/data");
        zfs
    }

    #[test]
    fn test_priority_order_and_recursive() {
        let zfs = pool();
        let due: BTreeSet<_> = [Bucket::Hourly, Bucket::Yearly, Bucket::Daily].into_iter().collect();

        let outcomes = apply(&zfs, &Dataset::local("tank"), &due, now(), false);

        let buckets: Vec<_> = outcomes.iter().map(|o| o.bucket).collect();
        assert_eq!(buckets, vec![Bucket::Yearly, Bucket::Daily, Bucket::Hourly]);

        let calls = zfs.calls();
        assert_eq!(calls.len(), 3);
        assert_eq!(calls[0].name, "rznap_2024-06-01_10:00:00_yearly");
        assert_eq!(calls[2].name, "rznap_2024-06-01_10:00:00_hourly");
        assert!(calls.iter().all(|c| c.recursive && c.dataset == "tank"));
        assert!(outcomes.iter().all(|o| matches!(o.outcome, Outcome::Created)));
    }

    #[test]
    fn test_failure_isolated_per_bucket() {
        let zfs = pool();
        zfs.fail_snapshots("daily", FailureKind::Busy);
        let due: BTreeSet<_> = [Bucket::Daily, Bucket::Hourly].into_iter().collect();

        let outcomes = apply(&zfs, &Dataset::local("tank"), &due, now(), false);

        assert_eq!(outcomes.len(), 2);
        assert!(matches!(outcomes[0].outcome, Outcome::Failed(ZfsError::Busy { .. })));
        assert!(matches!(outcomes[1].outcome, Outcome::Created));
        assert_eq!(zfs.calls().len(), 2);
        assert_eq!(zfs.snapshot_names("tank/data"), vec!["rznap_2024-06-01_10:00:00_hourly"]);
    }

    #[test]
    fn test_backend_failure_does_not_stop_later_buckets() {
        let zfs = pool();
        zfs.fail_snapshots("yearly", FailureKind::Backend);
        zfs.fail_snapshots("monthly", FailureKind::NotFound);
        let due: BTreeSet<_> = Bucket::ALL.into_iter().collect();

        let outcomes = apply(&zfs, &Dataset::local("tank"), &due, now(), false);

        assert_eq!(outcomes.iter().filter(|o| o.is_failure()).count(), 2);
        assert_eq!(zfs.calls().len(), 5);
    }

    #[test]
    fn test_dry_run_touches_nothing() {
        let zfs = pool();
        let due: BTreeSet<_> = [Bucket::Weekly].into_iter().collect();

        let outcomes = apply(&zfs, &Dataset::local("tank"), &due, now(), true);

        assert!(matches!(outcomes[0].outcome, Outcome::Planned));
        assert_eq!(outcomes[0].name, "rznap_2024-06-01_10:00:00_weekly");
        assert!(zfs.calls().is_empty());
    }

    #[test]
    fn test_nothing_due() {
        let zfs = pool();
        let outcomes = apply(&zfs, &Dataset::local("tank"), &BTreeSet::new(), now(), false);
        assert!(outcomes.is_empty());
        assert!(zfs.calls().is_empty());
    }
}
