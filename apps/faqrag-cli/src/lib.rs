//! Shared setup for the faqrag binaries.

use anyhow::{Context, Result};
use indicatif::{ProgressBar, ProgressStyle};
use std::time::Duration;
use tracing_subscriber::EnvFilter;

use faqrag_core::config::AppConfig;

/// `RUST_LOG`-driven logging to stderr, `info` when unset.
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).with_writer(std::io::stderr).init();
}

/// Load configuration and anchor relative storage paths at the working directory.
pub fn load_config() -> Result<AppConfig> {
    let cwd = std::env::current_dir().context("reading working directory")?;
    let config = AppConfig::load().context("loading configuration")?;
    Ok(config.resolve_paths(&cwd))
}

pub fn spinner(msg: &str) -> Result<ProgressBar> {
    let pb = ProgressBar::new_spinner();
    pb.set_style(ProgressStyle::default_spinner().template("{spinner:.green} [{elapsed_precise}] {msg}")?);
    pb.set_message(msg.to_string());
    pb.enable_steady_tick(Duration::from_millis(100));
    Ok(pb)
}
