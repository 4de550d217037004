//! Traits and the baseline feed-forward genome for grazers organisms.

use rand::RngCore;
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub mod feedforward;

pub use feedforward::FeedForwardBrain;

/// Number of sensor inputs wired into each brain (eight neighbours plus own health).
pub const SENSOR_COUNT: usize = 9;
/// Width of the hidden layer.
pub const HIDDEN_SIZE: usize = 16;
/// Number of actions a brain can choose between.
pub const ACTION_COUNT: usize = 9;

/// Sensor vector handed to a brain each tick.
pub type Sensors = [f32; SENSOR_COUNT];

/// Per-call mutation parameters.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct MutationSettings {
    /// Chance that any single weight is perturbed.
    pub probability: f32,
    /// Magnitude of a perturbation; the sign is chosen uniformly.
    pub step: f32,
}

impl Default for MutationSettings {
    fn default() -> Self {
        Self {
            probability: 0.1,
            step: 0.15,
        }
    }
}

/// Errors raised when building genomes from raw weights.
#[derive(Debug, Error, PartialEq)]
pub enum GenomeError {
    #[error("expected {expected} weights, got {actual}")]
    ShapeMismatch { expected: usize, actual: usize },
    #[error("weight {index} is not finite")]
    NonFinite { index: usize },
}

/// Shared interface implemented by organism brains.
pub trait Brain: Clone {
    /// Pick an action index in `0..ACTION_COUNT` for the given sensors.
    fn decide(&self, sensors: &Sensors) -> usize;

    /// Perturb the brain in place.
    fn mutate(&mut self, rng: &mut dyn RngCore, settings: MutationSettings);

    /// Combine two parents into a child genome.
    fn crossover(&self, other: &Self) -> Self;

    /// Return a mutated copy, leaving `self` untouched.
    #[must_use]
    fn mutated(&self, rng: &mut dyn RngCore, settings: MutationSettings) -> Self {
        let mut child = self.clone();
        child.mutate(rng, settings);
        child
    }
}
