mod cli;
mod sources;

use std::process;
use std::time::Duration;

use anyhow::Context;
use clap::Parser;
use sluice_engine::{HarvestConfig, Supervisor};
use tracing::{Level, error, info};
use tracing_subscriber::{filter::EnvFilter, fmt, prelude::*};

use crate::cli::Args;

#[tokio::main]
async fn main() {
    let args = Args::parse();

    if let Err(e) = run(args).await {
        error!("Application error: {e}");
        eprintln!("Error: {e:#}");
    }

    // run() only returns after an interrupt or a startup failure; either
    // way the harvester did not finish on its own.
    process::exit(1);
}

async fn run(args: Args) -> anyhow::Result<()> {
    init_logging(args.verbose, args.quiet)?;

    let sources = if args.urls.is_empty() {
        sources::default_sources()
    } else {
        args.urls.clone()
    };

    let config = HarvestConfig {
        cache_capacity: args.cache_capacity,
        restart_cooldown: Duration::from_secs(args.cooldown),
        ..HarvestConfig::default()
    };

    let supervisor =
        Supervisor::new(sources, config).context("failed to start the harvest supervisor")?;
    let metrics = supervisor.metrics();

    info!("Harvesting until interrupted (ctrl-c to stop)");
    supervisor
        .run(async {
            tokio::signal::ctrl_c().await.ok();
        })
        .await;

    metrics.log_summary();
    Ok(())
}

fn init_logging(verbose: bool, quiet: bool) -> anyhow::Result<()> {
    let filter = if quiet {
        EnvFilter::new("error")
    } else if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::from_default_env().add_directive(Level::INFO.into())
    };

    let subscriber = tracing_subscriber::registry().with(filter);

    subscriber
        .with(fmt::layer().with_target(false).with_level(verbose))
        .init();
    Ok(())
}
