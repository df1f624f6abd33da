#![cfg_attr(not(test), deny(clippy::unwrap_used, clippy::expect_used))]
//! `sortline` binary: runs the scale node, the sort node, or a
//! single-process demo of both over a paired link.

mod cli;
mod run;

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use clap::Parser;
use eyre::{Result, WrapErr};
use tracing_subscriber::EnvFilter;

use crate::cli::{Cli, Commands};

fn init_tracing(level: &str, json: bool) -> Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(level))
        .wrap_err_with(|| format!("invalid log level {level:?}"))?;
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);
    if json {
        builder.json().init();
    } else {
        builder.init();
    }
    Ok(())
}

fn load_config(path: &std::path::Path) -> Result<sortline_config::Config> {
    let cfg = if path.exists() {
        let text = std::fs::read_to_string(path)
            .wrap_err_with(|| format!("read config {}", path.display()))?;
        sortline_config::load_toml(&text)
            .wrap_err_with(|| format!("parse config {}", path.display()))?
    } else {
        tracing::info!(path = %path.display(), "config file not found, using defaults");
        sortline_config::Config::default()
    };
    cfg.validate().wrap_err("invalid config")?;
    Ok(cfg)
}

fn main() -> Result<()> {
    color_eyre::install()?;
    let args = Cli::parse();
    init_tracing(&args.log_level, args.json)?;

    let cfg = load_config(&args.config)?;

    let shutdown = Arc::new(AtomicBool::new(false));
    {
        let shutdown = shutdown.clone();
        ctrlc::set_handler(move || {
            tracing::info!("shutdown requested");
            shutdown.store(true, Ordering::Relaxed);
        })
        .wrap_err("install Ctrl-C handler")?;
    }

    match args.cmd {
        Commands::Scale { ticks } => run::run_scale(&cfg, ticks, shutdown),
        Commands::Sort { ticks } => run::run_sort(&cfg, ticks, shutdown),
        Commands::Demo { mass_g, max_ticks } => run::run_demo(&cfg, mass_g, max_ticks),
    }
}
