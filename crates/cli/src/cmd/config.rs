//! Configuration inspection commands

use anyhow::Result;
use owo_colors::OwoColorize;
use rznap_cli::config::{example_config, Config};
use std::path::Path;

/// Parse and validate the configuration file
pub async fn run_check(config_path: &Path) -> Result<()> {
    let config = Config::load(config_path)?;
    let problems = config.validate();

    if !problems.is_empty() {
        for problem in &problems {
            println!("  {} {}", "✗".red(), problem);
        }
        anyhow::bail!("{} problem(s) in {}", problems.len(), config_path.display());
    }

    println!(
        "{} {} ({} entries, {} enabled)",
        "✓".green(),
        config_path.display(),
        config.datasets.len(),
        config.enabled().count()
    );

    for entry in &config.datasets {
        let buckets: Vec<_> = entry.retained().map(|b| b.as_str()).collect();
        let state = if entry.snap {
            "snap".green().to_string()
        } else {
            "off".dimmed().to_string()
        };
        println!("  {} [{}] {}", entry.name.cyan(), state, buckets.join(" ").dimmed());
    }

    Ok(())
}

pub async fn run_example() -> Result<()> {
    print!("{}", example_config());
    Ok(())
}

pub async fn run_path(config_path: &Path) -> Result<()> {
    println!("{}", config_path.display());
    Ok(())
}
