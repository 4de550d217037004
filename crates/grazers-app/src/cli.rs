//! Command-line surface.

use std::path::PathBuf;

use clap::{Parser, ValueEnum};
use grazers_core::{GrazersConfig, RunLimits, SurvivorPolicy};

/// Steps a headless run takes when no limit is given.
pub const DEFAULT_HEADLESS_STEPS: u64 = 2_000;

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
pub enum PolicyArg {
    /// The most recent deaths breed the next generation.
    DeathOrder,
    /// The longest-lived dead organisms breed the next generation.
    Longevity,
}

impl From<PolicyArg> for SurvivorPolicy {
    fn from(value: PolicyArg) -> Self {
        match value {
            PolicyArg::DeathOrder => SurvivorPolicy::DeathOrder,
            PolicyArg::Longevity => SurvivorPolicy::Longevity,
        }
    }
}

#[derive(Parser, Debug)]
#[command(name = "grazers", version, about = "Herbivore grid evolution simulator")]
pub struct Args {
    /// JSON file with configuration overrides; missing keys keep their defaults.
    #[arg(long, env = "GRAZERS_CONFIG")]
    pub config: Option<PathBuf>,

    /// RNG seed for a reproducible run.
    #[arg(long, env = "GRAZERS_SEED")]
    pub seed: Option<u64>,

    #[arg(long)]
    pub grid_width: Option<usize>,

    #[arg(long)]
    pub grid_height: Option<usize>,

    /// Founders placed at genesis.
    #[arg(long)]
    pub population: Option<usize>,

    /// Organisms per reseeded cohort.
    #[arg(long)]
    pub cohort_size: Option<usize>,

    #[arg(long, value_enum)]
    pub survivor_policy: Option<PolicyArg>,

    /// Delay between ticks in slow mode, in milliseconds.
    #[arg(long)]
    pub slow_ms: Option<u64>,

    /// Run without the terminal display.
    #[arg(long, env = "GRAZERS_HEADLESS")]
    pub headless: bool,

    /// Stop after this many steps.
    #[arg(long)]
    pub steps: Option<u64>,

    /// Stop after this many epoch rollovers.
    #[arg(long)]
    pub epochs: Option<u64>,

    /// Directory for genome.log, info.log and the trace log.
    #[arg(long, env = "GRAZERS_LOG_DIR", default_value = "logs")]
    pub log_dir: PathBuf,

    /// Do not write genome.log and info.log.
    #[arg(long)]
    pub no_journal: bool,
}

impl Args {
    /// Apply command-line overrides on top of `config`.
    pub fn apply(&self, config: &mut GrazersConfig) {
        if let Some(seed) = self.seed {
            config.rng_seed = Some(seed);
        }
        if let Some(width) = self.grid_width {
            config.grid_width = width;
        }
        if let Some(height) = self.grid_height {
            config.grid_height = height;
        }
        if let Some(population) = self.population {
            config.initial_population = population;
        }
        if let Some(cohort_size) = self.cohort_size {
            config.cohort_size = cohort_size;
        }
        if let Some(policy) = self.survivor_policy {
            config.survivor_policy = policy.into();
        }
        if let Some(slow_ms) = self.slow_ms {
            config.slow_mode_delay_ms = slow_ms;
        }
    }

    /// Run bounds; headless runs without explicit bounds stop after [`DEFAULT_HEADLESS_STEPS`].
    #[must_use]
    pub fn limits(&self) -> RunLimits {
        let unbounded = self.steps.is_none() && self.epochs.is_none();
        RunLimits {
            max_steps: if self.headless && unbounded {
                Some(DEFAULT_HEADLESS_STEPS)
            } else {
                self.steps
            },
            max_epochs: self.epochs,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn overrides_replace_only_given_fields() {
        let args = Args::try_parse_from([
            "grazers",
            "--seed",
            "9",
            "--population",
            "12",
            "--survivor-policy",
            "longevity",
        ])
        .expect("args");
        let mut config = GrazersConfig::default();
        args.apply(&mut config);
        assert_eq!(config.rng_seed, Some(9));
        assert_eq!(config.initial_population, 12);
        assert_eq!(config.survivor_policy, SurvivorPolicy::Longevity);
        assert_eq!(config.grid_width, GrazersConfig::default().grid_width);
    }

    #[test]
    fn headless_runs_are_bounded_by_default() {
        let args = Args::try_parse_from(["grazers", "--headless"]).expect("args");
        assert_eq!(args.limits().max_steps, Some(DEFAULT_HEADLESS_STEPS));

        let args = Args::try_parse_from(["grazers", "--headless", "--epochs", "2"]).expect("args");
        assert_eq!(args.limits().max_steps, None);
        assert_eq!(args.limits().max_epochs, Some(2));

        let args = Args::try_parse_from(["grazers"]).expect("args");
        assert_eq!(args.limits(), RunLimits::default());
    }
}
