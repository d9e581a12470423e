//! Show due snapshots without taking them

use anyhow::{Context, Result};
use owo_colors::OwoColorize;
use rznap_cli::config::Config;
use rznap_core::SystemClock;
use rznap_scheduler::{Driver, Event, SystemConnector};
use std::path::Path;

pub async fn run(config_path: &Path) -> Result<()> {
    let config = Config::load(config_path)?;

    let driver = Driver::new(SystemConnector, SystemClock).dry_run(true);
    let policies = config.datasets;
    let report = tokio::task::spawn_blocking(move || driver.run(&policies))
        .await
        .context("Planning pass panicked")?;

    println!("{}", "Snapshot Plan".bold());
    println!();

    let planned = report.planned();
    if planned.is_empty() {
        println!("{}", "Nothing due".dimmed());
    } else {
        for name in &planned {
            println!("  {} {}", "+".green(), name);
        }
    }

    let covered: Vec<_> = report
        .events
        .iter()
        .filter_map(|e| match e {
            Event::DescendantCovered { dataset } => Some(dataset),
            _ => None,
        })
        .collect();
    if !covered.is_empty() {
        println!();
        println!("{}", "Covered by a configured ancestor:".dimmed());
        for dataset in covered {
            println!("  {}", dataset.dimmed());
        }
    }

    let failures: Vec<_> = report.failures().collect();
    if !failures.is_empty() {
        println!();
        println!("{}", "Problems:".red().bold());
        for event in failures {
            match event {
                Event::EntryFailed { entry, reason } => println!("  {}: {}", entry.yellow(), reason),
                Event::DatasetFailed { dataset, reason } => {
                    println!("  {}: {}", dataset.yellow(), reason)
                }
                Event::SnapshotFailed { dataset, name, reason, .. } => {
                    println!("  {}@{}: {}", dataset.yellow(), name, reason)
                }
                _ => {}
            }
        }
    }

    Ok(())
}
