use anyhow::{Context, Result};
use clap::Parser;
use tracing::{error, info};

use shortener::cli::{Cli, Commands, ConfigAction};
use shortener::config::init_config;
use shortener::runtime::lifetime::startup::install_crypto_provider;
use shortener::runtime::modes;
use shortener::system::init_logging;

#[actix_web::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();
    let command = cli.command();

    // 生成配置不需要加载现有配置
    if let Commands::Config {
        action: ConfigAction::Generate { path, force },
    } = &command
    {
        return modes::run_config_generate(path.as_deref(), *force);
    }

    let config = init_config(&cli.config)
        .with_context(|| format!("Failed to load configuration from {}", cli.config))?;
    let _guard = init_logging(&config.logging).context("Failed to initialize logging")?;
    install_crypto_provider()?;

    info!(
        "shortener {} starting ({:?})",
        env!("CARGO_PKG_VERSION"),
        command
    );

    let result = match command {
        Commands::Serve => modes::run_server().await,
        Commands::Reconcile { batch_size } => modes::run_reconcile(batch_size).await.map(|_| ()),
        Commands::RebuildFilter { batch_size } => {
            modes::run_rebuild_filter(batch_size).await.map(|_| ())
        }
        Commands::Config { .. } => Ok(()),
    };

    if let Err(e) = &result {
        error!("{:#}", e);
    }
    result
}
