//! Snapshot scheduling for rznap
//!
//! This crate provides:
//! - Retention decisions (which buckets are due)
//! - Snapshot execution with per-bucket failure isolation
//! - Ancestor deduplication over a dataset tree
//! - The driver running one pass over all configured entries
//! - Structured run reports

pub mod connect;
pub mod dedup;
pub mod driver;
pub mod executor;
pub mod report;
pub mod retention;

// Re-exports
pub use connect::{ConnectError, Connector, SystemConnector};
pub use driver::Driver;
pub use executor::{BucketOutcome, Outcome};
pub use report::{Event, RunReport};
