use std::{fs, sync::Mutex};

use anyhow::{Context, Result};
use clap::Parser;
use grazers_app::Args;
use tracing_subscriber::EnvFilter;

const TRACE_LOG: &str = "grazers.log";

fn main() -> Result<()> {
    let args = Args::parse();
    init_tracing(&args)?;
    grazers_app::run(&args)?;
    Ok(())
}

/// The terminal display owns stdout, so interactive runs trace into the log directory.
fn init_tracing(args: &Args) -> Result<()> {
    let builder = tracing_subscriber::fmt().with_env_filter(EnvFilter::from_default_env());
    if args.headless {
        let _ = builder.try_init();
        return Ok(());
    }
    fs::create_dir_all(&args.log_dir)
        .with_context(|| format!("failed to create {}", args.log_dir.display()))?;
    let path = args.log_dir.join(TRACE_LOG);
    let file = fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(&path)
        .with_context(|| format!("failed to open {}", path.display()))?;
    let _ = builder
        .with_ansi(false)
        .with_writer(Mutex::new(file))
        .try_init();
    Ok(())
}
