//! Library side of the `rznap` binary
//!
//! Exposed so integration tests can load configuration the same way the
//! binary does.

pub mod config;
pub mod locks;
pub mod logging;
