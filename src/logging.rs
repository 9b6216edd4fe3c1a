//! Tracing setup.
//!
//! The TUI owns the terminal, so interactive runs only log when a file is given.

use anyhow::{Context, Result};
use std::path::Path;
use std::sync::Mutex;
use tracing_subscriber::fmt::format::FmtSpan;
use tracing_subscriber::EnvFilter;

pub enum LogTarget<'a> {
    Stderr,
    File(&'a Path),
    Off,
}

fn env_filter() -> Result<EnvFilter> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new("info"))?
        .add_directive("hyper_util=warn".parse()?)
        .add_directive("reqwest=warn".parse()?);
    Ok(filter)
}

pub fn init_logging(target: LogTarget<'_>) -> Result<()> {
    match target {
        LogTarget::Off => Ok(()),
        LogTarget::Stderr => {
            tracing_subscriber::fmt()
                .with_env_filter(env_filter()?)
                .with_span_events(FmtSpan::CLOSE)
                .with_writer(std::io::stderr)
                .try_init()
                .map_err(|e| anyhow::anyhow!("init logging: {e}"))
        }
        LogTarget::File(path) => {
            let file = std::fs::OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .with_context(|| format!("open log file {}", path.display()))?;
            tracing_subscriber::fmt()
                .with_env_filter(env_filter()?)
                .with_span_events(FmtSpan::CLOSE)
                .with_ansi(false)
                .with_writer(Mutex::new(file))
                .try_init()
                .map_err(|e| anyhow::anyhow!("init logging: {e}"))
        }
    }
}
