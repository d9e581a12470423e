//! One scheduling pass over the configured entries
//!
//! Per entry: parse the identity, connect, discover the dataset tree, take
//! recursive snapshots on the root, then on every descendant not covered by
//! a configured ancestor. Failures are contained to the entry, dataset or
//! bucket they happen in.

use crate::connect::Connector;
use crate::dedup;
use crate::executor::{self, Outcome};
use crate::report::{Event, RunReport};
use crate::retention;
use chrono::NaiveDateTime;
use rznap_core::{Clock, Dataset, Identity, RetentionPolicy, Snapshot};
use rznap_zfs::Zfs;
use tracing::{debug, error, info};

/// Runs scheduling passes
pub struct Driver<C, K> {
    connector: C,
    clock: K,
    dry_run: bool,
}

impl<C: Connector, K: Clock> Driver<C, K> {
    pub fn new(connector: C, clock: K) -> Self {
        Self {
            connector,
            clock,
            dry_run: false,
        }
    }

    /// Decide and report, but never create snapshots
    pub fn dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    /// Instant for a new pass
    pub fn now(&self) -> NaiveDateTime {
        self.clock.now()
    }

    /// Run one pass over `policies`, sequentially and in order
    pub fn run(&self, policies: &[RetentionPolicy]) -> RunReport {
        info!("Taking snapshots...");
        let now = self.now();

        let mut report = RunReport::new();
        for entry in policies {
            report.extend(self.run_entry(entry, policies, now));
        }
        report
    }

    /// Process a single entry; `policies` is the full configuration
    pub fn run_entry(
        &self,
        entry: &RetentionPolicy,
        policies: &[RetentionPolicy],
        now: NaiveDateTime,
    ) -> Vec<Event> {
        let mut events = Vec::new();

        if !entry.snap {
            debug!("Skipping {} (snap disabled)", entry.name);
            events.push(Event::EntrySkipped {
                entry: entry.name.clone(),
            });
            return events;
        }

        let identity: Identity = match entry.name.parse() {
            Ok(identity) => identity,
            Err(e) => {
                error!("Could not parse {}: {}...", entry.name, e);
                events.push(entry_failed(entry, e));
                return events;
            }
        };

        let zfs = match self.connector.connect(&identity, entry.key.as_deref()) {
            Ok(zfs) => zfs,
            Err(e) => {
                error!("{}", e);
                events.push(entry_failed(entry, e));
                return events;
            }
        };

        let tree = match zfs.find(identity.path()) {
            Ok(tree) => tree,
            Err(e) => {
                error!("{}", e);
                events.push(entry_failed(entry, e));
                return events;
            }
        };

        let Some((root, descendants)) = tree.split_first() else {
            error!("No datasets found for {}", entry.name);
            events.push(entry_failed(entry, "no datasets found"));
            return events;
        };

        // Recursive snapshots a dry run would have stamped on descendants
        let mut planned = Vec::new();

        // Root snapshot is recursive and covers the whole subtree
        self.take_snap(zfs.as_ref(), root, entry, now, &mut planned, &mut events);

        let targets = dedup::select_targets(descendants, policies);
        for dataset in descendants.iter().filter(|d| !targets.contains(d)) {
            debug!("Skipping {}: covered by a configured ancestor", dataset);
            events.push(Event::DescendantCovered {
                dataset: dataset.to_string(),
            });
        }

        for dataset in targets {
            self.take_snap(zfs.as_ref(), dataset, entry, now, &mut planned, &mut events);
        }

        events
    }

    fn take_snap(
        &self,
        zfs: &dyn Zfs,
        dataset: &Dataset,
        policy: &RetentionPolicy,
        now: NaiveDateTime,
        planned: &mut Vec<(Dataset, Snapshot)>,
        events: &mut Vec<Event>,
    ) {
        let mut snapshots = match zfs.snapshots(dataset) {
            Ok(snapshots) => snapshots,
            Err(e) => {
                error!("Could not list snapshots of {}: {}", dataset, e);
                events.push(Event::DatasetFailed {
                    dataset: dataset.to_string(),
                    reason: e.to_string(),
                });
                return;
            }
        };

        snapshots.extend(
            planned
                .iter()
                .filter(|(ancestor, _)| ancestor.is_ancestor_of(dataset))
                .map(|(_, snapshot)| snapshot.clone()),
        );

        let due = retention::decide(&snapshots, policy, now);
        if due.is_empty() {
            debug!("No snapshots due on {}", dataset);
        }

        for result in executor::apply(zfs, dataset, &due, now, self.dry_run) {
            let (name, bucket) = (result.name, result.bucket);

            events.push(match result.outcome {
                Outcome::Created => Event::SnapshotCreated {
                    dataset: dataset.to_string(),
                    name,
                    bucket,
                },
                Outcome::Planned => {
                    planned.push((dataset.clone(), Snapshot::new(name.as_str(), now)));
                    Event::SnapshotPlanned {
                        dataset: dataset.to_string(),
                        name,
                        bucket,
                    }
                }
                Outcome::Failed(e) => Event::SnapshotFailed {
                    dataset: dataset.to_string(),
                    name,
                    bucket,
                    reason: e.to_string(),
                },
            });
        }
    }
}

fn entry_failed(entry: &RetentionPolicy, reason: impl ToString) -> Event {
    Event::EntryFailed {
        entry: entry.name.clone(),
        reason: reason.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::connect::ConnectError;
    use chrono::NaiveDate;
    use rznap_core::{Bucket, FixedClock};
    use rznap_zfs::{FailureKind, MemoryZfs};
    use std::path::Path;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    /// Hands out the same in-memory pool for every identity
    struct PoolConnector {
        pool: Arc<MemoryZfs>,
        unreachable: Vec<String>,
    }

    impl Connector for PoolConnector {
        fn connect(&self, identity: &Identity, _key: Option<&Path>) -> Result<Box<dyn Zfs>, ConnectError> {
            if self.unreachable.contains(&identity.to_string()) {
                return Err(ConnectError::Unreachable(identity.to_string()));
            }
            Ok(Box::new(self.pool.clone()))
        }
    }

    /// Counts reads; always returns the same instant
    struct CountingClock {
        at: NaiveDateTime,
        reads: AtomicUsize,
    }

    impl Clock for CountingClock {
        fn now(&self) -> NaiveDateTime {
            self.reads.fetch_add(1, Ordering::SeqCst);
            self.at
        }
    }

    fn at(y: i32, m: u32, d: u32, h: u32, min: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, m, d)
            .unwrap()
            .and_hms_opt(h, min, 0)
            .unwrap()
    }

    fn setup(now: NaiveDateTime, datasets: &[&str]) -> (Arc<MemoryZfs>, Driver<PoolConnector, FixedClock>) {
        let pool = Arc::new(MemoryZfs::new());
        for name in datasets {
            pool.add_dataset(name);
        }
        pool.set_now(now);

        let connector = PoolConnector {
            pool: pool.clone(),
            unreachable: Vec::new(),
        };
        (pool, Driver::new(connector, FixedClock::new(now)))
    }

    fn entry(name: &str, buckets: &[Bucket]) -> RetentionPolicy {
        let mut policy = buckets
            .iter()
            .fold(RetentionPolicy::new(name), |p, b| p.with(*b, true));
        policy.snap = true;
        policy
    }

    #[test]
    fn test_yearly_only_single_call() {
        let (pool, driver) = setup(at(2024, 6, 1, 10, 0), &["tank/data"]);
        let policies = vec![entry("tank/data", &[Bucket::Yearly])];

        let report = driver.run(&policies);

        let calls = pool.calls();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].dataset, "tank/data");
        assert_eq!(calls[0].name, "rznap_2024-06-01_10:00:00_yearly");
        assert!(calls[0].recursive);
        assert_eq!(report.created(), vec!["tank/data@rznap_2024-06-01_10:00:00_yearly"]);
        assert!(!report.has_errors());
    }

    #[test]
    fn test_existing_yearly_same_year_no_call() {
        let (pool, driver) = setup(at(2024, 6, 1, 10, 0), &["tank/data"]);
        pool.add_snapshot("tank/data", "rznap_2024-01-01_00:00:00_yearly", at(2024, 1, 1, 0, 0));

        let report = driver.run(&[entry("tank/data", &[Bucket::Yearly])]);

        assert!(pool.calls().is_empty());
        assert!(report.events.is_empty());
    }

    #[test]
    fn test_busy_daily_still_attempts_hourly() {
        let (pool, driver) = setup(at(2024, 6, 1, 10, 0), &["tank"]);
        pool.fail_snapshots("daily", FailureKind::Busy);

        let report = driver.run(&[entry("tank", &[Bucket::Daily, Bucket::Hourly])]);

        assert_eq!(pool.calls().len(), 2);
        assert!(matches!(
            &report.events[0],
            Event::SnapshotFailed { bucket: Bucket::Daily, reason, .. } if reason.contains("busy")
        ));
        assert_eq!(report.created(), vec!["tank@rznap_2024-06-01_10:00:00_hourly"]);
    }

    #[test]
    fn test_hourly_idempotent_across_runs() {
        let (pool, driver) = setup(at(2024, 6, 1, 10, 5), &["tank"]);
        let policies = vec![entry("tank", &[Bucket::Hourly])];

        driver.run(&policies);
        assert_eq!(pool.calls().len(), 1);

        let later = Driver::new(
            PoolConnector {
                pool: pool.clone(),
                unreachable: Vec::new(),
            },
            FixedClock::new(at(2024, 6, 1, 10, 55)),
        );
        let report = later.run(&policies);

        assert_eq!(pool.calls().len(), 1);
        assert!(report.created().is_empty());
    }

    #[test]
    fn test_configured_ancestor_covers_descendant() {
        let now = at(2024, 6, 1, 10, 0);
        let (pool, driver) = setup(now, &["tank/data", "tank/data/a", "tank/data/a/b"]);
        // Root already has today's snapshot, the children do not
        pool.add_snapshot("tank/data", "rznap_2024-06-01_00:00:00_daily", at(2024, 6, 1, 0, 0));

        let mut child = entry("tank/data/a", &[Bucket::Daily]);
        child.snap = false;
        let policies = vec![entry("tank/data", &[Bucket::Daily]), child];

        let report = driver.run(&policies);

        assert!(report.events.contains(&Event::DescendantCovered {
            dataset: "tank/data/a/b".to_string()
        }));
        assert!(!report.events.contains(&Event::DescendantCovered {
            dataset: "tank/data/a".to_string()
        }));

        // Only tank/data/a is snapshotted; its recursive call covers b
        let calls = pool.calls();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].dataset, "tank/data/a");
        assert_eq!(
            pool.snapshot_names("tank/data/a/b"),
            vec!["rznap_2024-06-01_10:00:00_daily"]
        );
    }

    #[test]
    fn test_descendants_scheduled_after_root() {
        let (pool, driver) = setup(at(2024, 6, 1, 10, 0), &["tank", "tank/a", "tank/b"]);

        driver.run(&[entry("tank", &[Bucket::Daily])]);

        // Root's recursive snapshot already satisfies the children
        let calls = pool.calls();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].dataset, "tank");
        assert_eq!(pool.snapshot_names("tank/b"), vec!["rznap_2024-06-01_10:00:00_daily"]);
    }

    #[test]
    fn test_disabled_entry_skipped() {
        let (pool, driver) = setup(at(2024, 6, 1, 10, 0), &["tank"]);
        let mut off = entry("tank", &[Bucket::Daily]);
        off.snap = false;

        let report = driver.run(&[off]);

        assert!(pool.calls().is_empty());
        assert_eq!(
            report.events,
            vec![Event::EntrySkipped {
                entry: "tank".to_string()
            }]
        );
    }

    #[test]
    fn test_entry_failures_do_not_stop_batch() {
        let (pool, driver) = setup(at(2024, 6, 1, 10, 0), &["tank", "backup"]);
        let policies = vec![
            entry("ssh:notaport:root@nas:tank", &[Bucket::Daily]),
            entry("missing/dataset", &[Bucket::Daily]),
            entry("backup", &[Bucket::Daily]),
        ];

        let report = driver.run(&policies);

        let failed: Vec<_> = report.failures().collect();
        assert_eq!(failed.len(), 2);
        assert!(matches!(failed[0], Event::EntryFailed { reason, .. } if reason.contains("port")));
        assert!(matches!(failed[1], Event::EntryFailed { reason, .. } if reason.contains("does not exist")));
        assert_eq!(report.created(), vec!["backup@rznap_2024-06-01_10:00:00_daily"]);
        assert_eq!(pool.calls().len(), 1);
    }

    #[test]
    fn test_unreachable_remote_skips_entry() {
        let now = at(2024, 6, 1, 10, 0);
        let pool = Arc::new(MemoryZfs::new());
        pool.add_dataset("tank");
        pool.set_now(now);
        let connector = PoolConnector {
            pool: pool.clone(),
            unreachable: vec!["ssh:22:root@nas:tank".to_string()],
        };
        let driver = Driver::new(connector, FixedClock::new(now));

        let report = driver.run(&[
            entry("ssh:22:root@nas:tank", &[Bucket::Daily]),
            entry("tank", &[Bucket::Daily]),
        ]);

        assert!(matches!(&report.events[0], Event::EntryFailed { entry, .. } if entry == "ssh:22:root@nas:tank"));
        assert_eq!(pool.calls().len(), 1);
    }

    #[test]
    fn test_listing_failure_contained_to_dataset() {
        let (pool, driver) = setup(at(2024, 6, 1, 10, 0), &["tank", "tank/a", "tank/b"]);
        pool.fail_listing("tank/a");

        let report = driver.run(&[entry("tank", &[Bucket::Daily])]);

        assert!(report.events.iter().any(
            |e| matches!(e, Event::DatasetFailed { dataset, .. } if dataset == "tank/a")
        ));
        // Root and tank/b are still processed
        assert_eq!(report.created(), vec!["tank@rznap_2024-06-01_10:00:00_daily"]);
        assert_eq!(report.failures().count(), 1);
    }

    #[test]
    fn test_dry_run_plans_without_creating() {
        let (pool, driver) = setup(at(2024, 6, 1, 10, 0), &["tank"]);
        let driver = driver.dry_run(true);

        let report = driver.run(&[entry("tank", &[Bucket::Monthly, Bucket::Weekly])]);

        assert!(pool.calls().is_empty());
        assert_eq!(
            report.planned(),
            vec![
                "tank@rznap_2024-06-01_10:00:00_monthly",
                "tank@rznap_2024-06-01_10:00:00_weekly"
            ]
        );
    }

    #[test]
    fn test_dry_run_matches_real_run_on_tree() {
        let now = at(2024, 6, 1, 10, 0);
        let policies = vec![entry("tank", &[Bucket::Daily, Bucket::Hourly])];

        let (_, planner) = setup(now, &["tank", "tank/a", "tank/b"]);
        let plan = planner.dry_run(true).run(&policies);

        let (_, driver) = setup(now, &["tank", "tank/a", "tank/b"]);
        let real = driver.run(&policies);

        assert_eq!(
            plan.planned(),
            vec![
                "tank@rznap_2024-06-01_10:00:00_daily",
                "tank@rznap_2024-06-01_10:00:00_hourly"
            ]
        );
        assert_eq!(plan.planned(), real.created());
    }

    #[test]
    fn test_dry_run_still_plans_buckets_root_lacks() {
        let now = at(2024, 6, 1, 10, 0);
        let (pool, driver) = setup(now, &["tank", "tank/a"]);
        // Root is current, the child is not
        pool.add_snapshot("tank", "rznap_2024-06-01_00:00:00_daily", at(2024, 6, 1, 0, 0));

        let report = driver
            .dry_run(true)
            .run(&[entry("tank", &[Bucket::Daily])]);

        assert!(pool.calls().is_empty());
        assert_eq!(report.planned(), vec!["tank/a@rznap_2024-06-01_10:00:00_daily"]);
    }

    #[test]
    fn test_clock_read_once_per_pass() {
        let pool = Arc::new(MemoryZfs::new());
        pool.add_dataset("tank").add_dataset("tank/a").add_dataset("backup");
        pool.set_now(at(2024, 6, 1, 10, 0));
        let clock = CountingClock {
            at: at(2024, 6, 1, 10, 0),
            reads: AtomicUsize::new(0),
        };
        let driver = Driver::new(
            PoolConnector {
                pool: pool.clone(),
                unreachable: Vec::new(),
            },
            clock,
        );

        driver.run(&[
            entry("tank", Bucket::ALL.as_slice()),
            entry("backup", Bucket::ALL.as_slice()),
        ]);

        assert_eq!(driver.clock.reads.load(Ordering::SeqCst), 1);
        // Every generated name carries the same instant
        assert!(pool
            .calls()
            .iter()
            .all(|c| c.name.starts_with("rznap_2024-06-01_10:00:00_")));
    }
}
