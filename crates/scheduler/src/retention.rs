//! Retention decisions
//!
//! For one dataset and one policy, decide which buckets need a new snapshot
//! at `now`. Only managed snapshots count, and within a bucket only the
//! newest one matters.

use chrono::NaiveDateTime;
use rznap_core::naming;
use rznap_core::{Bucket, RetentionPolicy, Snapshot};
use std::collections::{BTreeMap, BTreeSet};

/// Newest managed snapshot per bucket
pub fn latest_per_bucket(snapshots: &[Snapshot]) -> BTreeMap<Bucket, &Snapshot> {
    let mut latest: BTreeMap<Bucket, &Snapshot> = BTreeMap::new();

    for snap in snapshots {
        let Some((_, bucket)) = naming::classify(&snap.name) else {
            continue;
        };

        latest
            .entry(bucket)
            .and_modify(|current| {
                if snap.creation > current.creation {
                    *current = snap;
                }
            })
            .or_insert(snap);
    }

    latest
}

/// Buckets due for a new snapshot
pub fn decide(
    snapshots: &[Snapshot],
    policy: &RetentionPolicy,
    now: NaiveDateTime,
) -> BTreeSet<Bucket> {
    let latest = latest_per_bucket(snapshots);

    policy
        .retained()
        .filter(|bucket| match latest.get(bucket) {
            None => true,
            Some(snap) => bucket.calendar_key(snap.creation) != bucket.calendar_key(now),
        })
        .collect()
}
