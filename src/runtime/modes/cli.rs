//! Maintenance commands
//!
//! One-shot jobs that build the same service as the server, run one sweep
//! against the primary and exit.

use std::path::Path;

use anyhow::{Context, Result, bail};
use colored::Colorize;

use crate::config::{StaticConfig, get_config};
use crate::runtime::lifetime;

/// `reconcile`: assign keys to unkeyed records.
pub async fn run_reconcile(batch_size: u64) -> Result<usize> {
    let config = get_config();
    let context = lifetime::startup::build_service(&config).await?;

    let repaired = context
        .service
        .reconcile_orphans(batch_size)
        .await
        .context("Reconcile failed")?;

    println!(
        "{} Reconciled {} record(s)",
        "✓".bold().green(),
        repaired.to_string().cyan()
    );
    lifetime::shutdown::close_store(context.primary.get_db().clone()).await;
    Ok(repaired)
}

/// `rebuild-filter`: re-add every assigned key to the filter.
pub async fn run_rebuild_filter(batch_size: u64) -> Result<usize> {
    let config = get_config();
    if !config.filter.enabled {
        bail!("Membership filter is disabled (filter.enabled = false)");
    }

    let context = lifetime::startup::build_service(&config).await?;
    let added = context
        .service
        .rebuild_filter(batch_size)
        .await
        .context("Filter rebuild failed")?;

    println!(
        "{} Added {} key(s) to the membership filter",
        "✓".bold().green(),
        added.to_string().cyan()
    );
    lifetime::shutdown::close_store(context.primary.get_db().clone()).await;
    Ok(added)
}

/// `config generate [path]`: print a sample config or write it to `path`.
///
/// Runs before any config is loaded.
pub fn run_config_generate(path: Option<&str>, force: bool) -> Result<()> {
    let Some(path) = path else {
        print!("{}", StaticConfig::generate_sample_config());
        return Ok(());
    };

    if Path::new(path).exists() && !force {
        bail!("{} already exists; pass --force to overwrite", path);
    }

    StaticConfig::default()
        .save_to_file(path)
        .with_context(|| format!("Failed to write {}", path))?;
    println!("{} Sample config written to {}", "✓".bold().green(), path.cyan());
    Ok(())
}
