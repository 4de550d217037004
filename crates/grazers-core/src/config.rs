//! Static configuration for a grazers world.

use grazers_brain::MutationSettings;
use rand::{SeedableRng, rngs::SmallRng};
use serde::{Deserialize, Serialize};

use crate::WorldError;
use crate::cell::Cohort;

/// How the two breeding survivors are ranked inside the graveyard.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum SurvivorPolicy {
    /// The most recent deaths are treated as the best.
    #[default]
    DeathOrder,
    /// The longest-lived organisms are the best; death order breaks ties.
    Longevity,
}

/// Static configuration for a grazers world.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct GrazersConfig {
    /// Number of columns; the grid wraps horizontally.
    pub grid_width: usize,
    /// Number of rows, including the two wall rows.
    pub grid_height: usize,
    /// Edge length of one cell on the display, in pixels.
    pub cell_pixels: u32,
    /// Organisms placed at world genesis.
    pub initial_population: usize,
    /// Food cells placed at world genesis.
    pub initial_food: usize,
    /// Food cells placed on every reseed.
    pub reseed_food: usize,
    /// Organisms per cohort on every reseed.
    pub cohort_size: usize,
    /// Health of founders and reseeded organisms.
    pub initial_health: i32,
    /// Health paid every tick an organism acts.
    pub tick_cost: i32,
    /// Health gained from one successful bite.
    pub bite_heal: i32,
    /// Organisms need strictly more health than this to reproduce.
    pub reproduction_floor: i32,
    /// Mutation applied to the best and crossover genomes.
    pub mutation: MutationSettings,
    /// Optional override for the second survivor's mutation.
    pub second_mutation: Option<MutationSettings>,
    /// Ranking used when picking survivors.
    pub survivor_policy: SurvivorPolicy,
    /// Random sweeps before placement falls back to a deterministic scan.
    pub placement_max_sweeps: usize,
    /// Delay between ticks while slow mode is on.
    pub slow_mode_delay_ms: u64,
    /// Optional RNG seed for reproducible worlds.
    pub rng_seed: Option<u64>,
}

impl Default for GrazersConfig {
    fn default() -> Self {
        Self {
            grid_width: 128,
            grid_height: 70,
            cell_pixels: 10,
            initial_population: 48,
            initial_food: 150,
            reseed_food: 150,
            cohort_size: 8,
            initial_health: 50,
            tick_cost: 1,
            bite_heal: 20,
            reproduction_floor: 4,
            mutation: MutationSettings::default(),
            second_mutation: None,
            survivor_policy: SurvivorPolicy::DeathOrder,
            placement_max_sweeps: 64,
            slow_mode_delay_ms: 250,
            rng_seed: None,
        }
    }
}

impl GrazersConfig {
    /// Positions available to food and organisms (everything but the wall rows).
    #[must_use]
    pub fn interior_area(&self) -> usize {
        self.grid_width * self.grid_height.saturating_sub(2)
    }

    /// Organisms placed on every reseed.
    #[must_use]
    pub fn reseed_population(&self) -> usize {
        self.cohort_size * Cohort::RESEED.len()
    }

    /// Mutation settings used for the second survivor.
    #[must_use]
    pub fn second_mutation(&self) -> MutationSettings {
        self.second_mutation.unwrap_or(self.mutation)
    }

    /// Validates the configuration.
    pub fn validate(&self) -> Result<(), WorldError> {
        if self.grid_width == 0 || self.grid_height < 3 {
            return Err(WorldError::InvalidConfig(
                "grid needs a non-zero width and at least one row between the walls",
            ));
        }
        if self.cell_pixels == 0 {
            return Err(WorldError::InvalidConfig("cell_pixels must be non-zero"));
        }
        if self.cohort_size == 0 {
            return Err(WorldError::InvalidConfig("cohort_size must be non-zero"));
        }
        if self.initial_health <= 0 || self.tick_cost <= 0 {
            return Err(WorldError::InvalidConfig(
                "initial_health and tick_cost must be positive",
            ));
        }
        if self.bite_heal < 0 || self.reproduction_floor < 0 {
            return Err(WorldError::InvalidConfig(
                "bite_heal and reproduction_floor must be non-negative",
            ));
        }
        for settings in [Some(self.mutation), self.second_mutation]
            .into_iter()
            .flatten()
        {
            if !(0.0..=1.0).contains(&settings.probability)
                || !settings.step.is_finite()
                || settings.step < 0.0
            {
                return Err(WorldError::InvalidConfig(
                    "mutation probability must be in [0, 1] and step finite and non-negative",
                ));
            }
        }
        if self.placement_max_sweeps == 0 {
            return Err(WorldError::InvalidConfig(
                "placement_max_sweeps must be non-zero",
            ));
        }
        let interior = self.interior_area();
        if self.initial_food + self.initial_population > interior {
            return Err(WorldError::InvalidConfig(
                "initial food and population do not fit between the walls",
            ));
        }
        if self.reseed_food + self.reseed_population() > interior {
            return Err(WorldError::InvalidConfig(
                "reseed food and cohorts do not fit between the walls",
            ));
        }
        Ok(())
    }

    /// Returns the configured RNG seed, generating one from entropy if absent.
    pub(crate) fn seeded_rng(&self) -> SmallRng {
        match self.rng_seed {
            Some(seed) => SmallRng::seed_from_u64(seed),
            None => {
                let seed: u64 = rand::random();
                SmallRng::seed_from_u64(seed)
            }
        }
    }
}
