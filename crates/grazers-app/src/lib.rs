//! Front-end wiring for the grazers simulation.

pub mod cli;
pub mod config;
pub mod display;

use anyhow::{Context, Result};
use grazers_core::{DisplaySink, JournalSink, NullJournal, RunReport, WorldState};
use grazers_storage::JournalPipeline;
use tracing::info;

pub use cli::Args;
use display::{HeadlessDisplay, TerminalDisplay};

/// Build the world described by `args` and drive it until it stops.
pub fn run(args: &Args) -> Result<RunReport> {
    let mut config = config::load(args.config.as_deref())?;
    args.apply(&mut config);

    let journal: Box<dyn JournalSink> = if args.no_journal {
        Box::new(NullJournal)
    } else {
        let pipeline = JournalPipeline::open(&args.log_dir).with_context(|| {
            format!("failed to open journal in {}", args.log_dir.display())
        })?;
        Box::new(pipeline)
    };
    let display: Box<dyn DisplaySink> = if args.headless {
        Box::new(HeadlessDisplay::default())
    } else {
        Box::new(TerminalDisplay::new()?)
    };

    info!(
        width = config.grid_width,
        height = config.grid_height,
        population = config.initial_population,
        seed = ?config.rng_seed,
        headless = args.headless,
        "starting grazers"
    );
    let mut world =
        WorldState::with_sinks(config, display, journal).context("failed to build world")?;
    let report = grazers_core::run(&mut world, args.limits()).context("simulation failed")?;
    info!(
        steps = report.steps,
        epochs_rolled = report.epochs_rolled,
        reason = ?report.reason,
        epoch = world.epoch().0,
        "run finished"
    );
    Ok(report)
}
