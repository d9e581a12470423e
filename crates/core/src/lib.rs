//! Core types for rznap
//!
//! This crate provides:
//! - Retention buckets and their calendar keys
//! - Snapshot naming scheme (generate / classify / parse)
//! - Canonical dataset identities (local path or ssh triple)
//! - Dataset and snapshot data model
//! - Retention policy entries
//! - Injectable clock

pub mod bucket;
pub mod clock;
pub mod dataset;
pub mod identity;
pub mod naming;
pub mod policy;

// Re-exports
pub use bucket::{Bucket, CalendarKey};
pub use clock::{Clock, FixedClock, SystemClock};
pub use dataset::{Dataset, Endpoint, Snapshot};
pub use identity::{Identity, IdentityError};
pub use naming::ManagedName;
pub use policy::RetentionPolicy;
