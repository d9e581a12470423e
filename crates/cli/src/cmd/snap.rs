//! Take all due snapshots

use anyhow::{Context, Result};
use rznap_cli::config::Config;
use rznap_cli::locks::RunLock;
use rznap_core::{RetentionPolicy, SystemClock};
use rznap_scheduler::{Driver, Event, RunReport, SystemConnector};
use std::path::Path;
use std::sync::Arc;
use tracing::{info, warn};

type SystemDriver = Driver<SystemConnector, SystemClock>;

pub async fn run(config_path: &Path, parallel: bool) -> Result<()> {
    // 1. Load configuration
    let config = Config::load(config_path)?;
    for problem in config.validate() {
        warn!("{}", problem);
    }

    // 2. Only one pass at a time
    let lock = RunLock::acquire(&config.run.lock_file)?;

    // 3. Run the pass
    let driver = Arc::new(Driver::new(SystemConnector, SystemClock));
    let policies = Arc::new(config.datasets);

    let report = if parallel || config.run.parallel {
        run_parallel(driver, policies).await?
    } else {
        tokio::task::spawn_blocking(move || driver.run(&policies))
            .await
            .context("Snapshot pass panicked")?
    };

    lock.release()?;

    // 4. Summarize; failures were already logged where they happened
    summarize(&report);

    Ok(())
}

/// One blocking task per entry, sharing a single `now`.
///
/// Events are merged back in configuration order.
async fn run_parallel(
    driver: Arc<SystemDriver>,
    policies: Arc<Vec<RetentionPolicy>>,
) -> Result<RunReport> {
    info!("Taking snapshots...");
    let now = driver.now();

    let handles: Vec<_> = (0..policies.len())
        .map(|i| {
            let driver = Arc::clone(&driver);
            let policies = Arc::clone(&policies);
            tokio::task::spawn_blocking(move || driver.run_entry(&policies[i], &policies, now))
        })
        .collect();

    let mut report = RunReport::new();
    for handle in handles {
        report.extend(handle.await.context("Snapshot task panicked")?);
    }
    Ok(report)
}

fn summarize(report: &RunReport) {
    let created = report.created().len();
    let failed = report
        .events
        .iter()
        .filter(|e| matches!(e, Event::SnapshotFailed { .. }))
        .count();
    let errors = report.failures().count();

    if errors == 0 {
        info!("Done: {} snapshot(s) taken", created);
    } else {
        warn!(
            "Done: {} snapshot(s) taken, {} snapshot(s) failed, {} error(s) in total",
            created, failed, errors
        );
    }
}
