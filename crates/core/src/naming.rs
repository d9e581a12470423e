//! Snapshot naming scheme
//!
//! Wire format: `<tag>_<YYYY-MM-DD_HH:MM:SS>_<bucket>`, e.g.
//! `rznap_2024-06-01_10:00:00_yearly`.
//!
//! Names carrying a legacy tag (`pyznap`, `autosnap`) are treated exactly like
//! our own, so existing snapshot streams keep their retention history.

use crate::Bucket;
use chrono::NaiveDateTime;

/// Origin tag written into every snapshot this tool creates
pub const OWN_TAG: &str = "rznap";

/// Tags of compatible tools whose snapshots are adopted
pub const LEGACY_TAGS: [&str; 2] = ["pyznap", "autosnap"];

/// strftime format of the timestamp part
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d_%H:%M:%S";

/// A snapshot name that matches the managed format
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ManagedName {
    /// Recognized origin tag
    pub tag: &'static str,
    /// Timestamp encoded in the name, if it is in the wire format
    pub timestamp: Option<NaiveDateTime>,
    pub bucket: Bucket,
}

/// Generate the canonical name for a new snapshot in `bucket` taken at `now`
pub fn generate(bucket: Bucket, now: NaiveDateTime) -> String {
    format!("{}_{}_{}", OWN_TAG, now.format(TIMESTAMP_FORMAT), bucket)
}

/// Classify a snapshot name into (origin tag, bucket).
///
/// Returns `None` for unmanaged names: unknown tag or unknown bucket suffix.
/// Only the short name (after `@`) is expected here.
pub fn classify(name: &str) -> Option<(&'static str, Bucket)> {
    parse(name).map(|managed| (managed.tag, managed.bucket))
}

/// Parse a managed name back into its origin, timestamp and bucket
pub fn parse(name: &str) -> Option<ManagedName> {
    let (tag, rest) = recognized_tag(name)?;
    let (middle, suffix) = rest.rsplit_once('_')?;
    let bucket = Bucket::parse(suffix)?;
    let timestamp = NaiveDateTime::parse_from_str(middle, TIMESTAMP_FORMAT).ok();

    Some(ManagedName { tag, timestamp, bucket })
}

fn recognized_tag(name: &str) -> Option<(&'static str, &str)> {
    std::iter::once(OWN_TAG)
        .chain(LEGACY_TAGS)
        .find_map(|tag| {
            name.strip_prefix(tag)
                .and_then(|rest| rest.strip_prefix('_'))
                .map(|rest| (tag, rest))
        })
}
