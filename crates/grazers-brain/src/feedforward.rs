//! Two-layer sigmoid network whose weights are the organism genome.

use std::cmp::Reverse;

use ordered_float::OrderedFloat;
use rand::{Rng, RngCore};
use serde::{Deserialize, Serialize};

use crate::{
    ACTION_COUNT, Brain, GenomeError, HIDDEN_SIZE, MutationSettings, SENSOR_COUNT,
    Sensors,
};

/// Weights feeding the hidden layer, indexed `[input][hidden]`.
pub type HiddenWeights = [[f32; HIDDEN_SIZE]; SENSOR_COUNT];
/// Weights feeding the output layer, indexed `[hidden][action]`.
pub type OutputWeights = [[f32; ACTION_COUNT]; HIDDEN_SIZE];

/// Total number of scalar weights in a genome.
pub const PARAMETER_COUNT: usize = SENSOR_COUNT * HIDDEN_SIZE + HIDDEN_SIZE * ACTION_COUNT;

/// Feed-forward brain: the genome is the pair of weight matrices.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeedForwardBrain {
    hidden: HiddenWeights,
    output: OutputWeights,
}

impl FeedForwardBrain {
    /// Construct a brain from explicit weight matrices.
    #[must_use]
    pub const fn from_weights(hidden: HiddenWeights, output: OutputWeights) -> Self {
        Self { hidden, output }
    }

    /// Construct a brain with weights drawn uniformly from `[-1, 1)`.
    #[must_use]
    pub fn random(rng: &mut dyn RngCore) -> Self {
        let mut brain = Self::from_weights(
            [[0.0; HIDDEN_SIZE]; SENSOR_COUNT],
            [[0.0; ACTION_COUNT]; HIDDEN_SIZE],
        );
        for weight in brain.weights_mut() {
            *weight = rng.random_range(-1.0..1.0);
        }
        brain
    }

    /// Rebuild a brain from the flattened traversal produced by [`Self::weights`].
    pub fn from_flat(weights: &[f32]) -> Result<Self, GenomeError> {
        if weights.len() != PARAMETER_COUNT {
            return Err(GenomeError::ShapeMismatch {
                expected: PARAMETER_COUNT,
                actual: weights.len(),
            });
        }
        if let Some(index) = weights.iter().position(|w| !w.is_finite()) {
            return Err(GenomeError::NonFinite { index });
        }
        let mut brain = Self::from_weights(
            [[0.0; HIDDEN_SIZE]; SENSOR_COUNT],
            [[0.0; ACTION_COUNT]; HIDDEN_SIZE],
        );
        for (slot, value) in brain.weights_mut().zip(weights) {
            *slot = *value;
        }
        Ok(brain)
    }

    /// Iterate every weight: hidden matrix row-major, then output matrix row-major.
    pub fn weights(&self) -> impl Iterator<Item = f32> + '_ {
        self.hidden
            .iter()
            .flatten()
            .chain(self.output.iter().flatten())
            .copied()
    }

    fn weights_mut(&mut self) -> impl Iterator<Item = &mut f32> + '_ {
        self.hidden
            .iter_mut()
            .flatten()
            .chain(self.output.iter_mut().flatten())
    }

    /// Deep copy of the genome; changes to the copy never reach `self`.
    #[must_use]
    pub fn save_genome(&self) -> Self {
        self.clone()
    }

    /// Raw output activations for the given sensors.
    #[must_use]
    pub fn activations(&self, sensors: &Sensors) -> [f32; ACTION_COUNT] {
        let mut hidden = [0.0_f32; HIDDEN_SIZE];
        for (h, slot) in hidden.iter_mut().enumerate() {
            let acc: f32 = sensors
                .iter()
                .zip(&self.hidden)
                .map(|(input, row)| input * row[h])
                .sum();
            *slot = sigmoid(acc);
        }

        let mut output = [0.0_f32; ACTION_COUNT];
        for (a, slot) in output.iter_mut().enumerate() {
            let acc: f32 = hidden
                .iter()
                .zip(&self.output)
                .map(|(value, row)| value * row[a])
                .sum();
            *slot = sigmoid(acc);
        }
        output
    }
}

/// Logistic activation `1 / (1 + e^-x)`.
#[must_use]
pub fn sigmoid(value: f32) -> f32 {
    1.0 / (1.0 + (-value).exp())
}

/// Index of the largest value; ties go to the lowest index.
#[must_use]
pub fn argmax(values: &[f32]) -> usize {
    values
        .iter()
        .enumerate()
        .max_by_key(|(idx, value)| (OrderedFloat(**value), Reverse(*idx)))
        .map_or(0, |(idx, _)| idx)
}

impl Brain for FeedForwardBrain {
    fn decide(&self, sensors: &Sensors) -> usize {
        argmax(&self.activations(sensors))
    }

    fn mutate(&mut self, rng: &mut dyn RngCore, settings: MutationSettings) {
        for weight in self.weights_mut() {
            if rng.random::<f32>() < settings.probability {
                let sign = if rng.random_bool(0.5) { 1.0 } else { -1.0 };
                *weight += sign * settings.step;
            }
        }
    }

    fn crossover(&self, other: &Self) -> Self {
        let mut child = self.clone();
        // 1-indexed positions: odd come from `self`, even from `other`.
        for (idx, (slot, theirs)) in child.weights_mut().zip(other.weights()).enumerate() {
            if (idx + 1) % 2 == 0 {
                *slot = theirs;
            }
        }
        child
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::SmallRng;

    fn constant(value: f32) -> FeedForwardBrain {
        FeedForwardBrain::from_weights(
            [[value; HIDDEN_SIZE]; SENSOR_COUNT],
            [[value; ACTION_COUNT]; HIDDEN_SIZE],
        )
    }

    #[test]
    fn sigmoid_is_centered() {
        assert!((sigmoid(0.0) - 0.5).abs() < f32::EPSILON);
        assert!(sigmoid(10.0) > 0.99);
        assert!(sigmoid(-10.0) < 0.01);
    }

    #[test]
    fn argmax_prefers_lowest_index_on_ties() {
        assert_eq!(argmax(&[0.2, 0.9, 0.9, 0.1]), 1);
        assert_eq!(argmax(&[0.5; ACTION_COUNT]), 0);
        assert_eq!(argmax(&[0.1, 0.2, 0.3]), 2);
    }

    #[test]
    fn uniform_weights_pick_first_action() {
        let brain = constant(0.3);
        assert_eq!(brain.decide(&[0.5; SENSOR_COUNT]), 0);
    }

    #[test]
    fn decide_follows_the_strongest_output_column() {
        let mut output = [[0.0; ACTION_COUNT]; HIDDEN_SIZE];
        for row in &mut output {
            row[6] = 2.0;
        }
        let brain = FeedForwardBrain::from_weights([[0.1; HIDDEN_SIZE]; SENSOR_COUNT], output);
        assert_eq!(brain.decide(&[1.0; SENSOR_COUNT]), 6);
    }

    #[test]
    fn random_brain_outputs_are_finite_and_in_range() {
        let mut rng = SmallRng::seed_from_u64(0xDEADBEEF);
        let brain = FeedForwardBrain::random(&mut rng);
        let activations = brain.activations(&[-1.0, 0.0, 0.5, -1.0, 0.0, 0.5, 0.0, 0.0, 0.5]);
        assert!(activations.iter().all(|v| v.is_finite() && (0.0..=1.0).contains(v)));
        assert!(brain.weights().all(|w| (-1.0..1.0).contains(&w)));
        assert!(brain.decide(&[0.0; SENSOR_COUNT]) < ACTION_COUNT);
    }

    #[test]
    fn saved_genome_is_independent() {
        let mut rng = SmallRng::seed_from_u64(7);
        let brain = FeedForwardBrain::random(&mut rng);
        let mut copy = brain.save_genome();
        copy.mutate(
            &mut rng,
            MutationSettings {
                probability: 1.0,
                step: 0.15,
            },
        );
        assert_ne!(copy, brain);
        assert_eq!(brain, brain.save_genome());
    }

    #[test]
    fn crossover_alternates_parents_across_both_matrices() {
        let a = constant(1.0);
        let b = constant(-1.0);
        let child = a.crossover(&b);
        for (idx, weight) in child.weights().enumerate() {
            let position = idx + 1;
            let expected = if position % 2 == 1 { 1.0 } else { -1.0 };
            assert_eq!(weight, expected, "position {position}");
        }
        assert_eq!(child.weights().count(), PARAMETER_COUNT);
    }

    #[test]
    fn crossover_is_deterministic() {
        let mut rng = SmallRng::seed_from_u64(99);
        let a = FeedForwardBrain::random(&mut rng);
        let b = FeedForwardBrain::random(&mut rng);
        assert_eq!(a.crossover(&b), a.crossover(&b));
    }

    #[test]
    fn mutation_moves_weights_by_exactly_one_step() {
        let mut rng = SmallRng::seed_from_u64(2024);
        let settings = MutationSettings::default();
        let mut perturbed = 0usize;
        let mut total = 0usize;
        for _ in 0..200 {
            let original = FeedForwardBrain::random(&mut rng);
            let mutated = original.mutated(&mut rng, settings);
            for (before, after) in original.weights().zip(mutated.weights()) {
                let delta = (after - before).abs();
                total += 1;
                if delta > 1e-6 {
                    perturbed += 1;
                    assert!((delta - settings.step).abs() < 1e-5, "delta {delta}");
                }
            }
        }
        let rate = perturbed as f64 / total as f64;
        assert!((rate - 0.1).abs() < 0.01, "observed rate {rate}");
    }

    #[test]
    fn from_flat_roundtrips_and_validates() {
        let mut rng = SmallRng::seed_from_u64(5);
        let brain = FeedForwardBrain::random(&mut rng);
        let flat: Vec<f32> = brain.weights().collect();
        assert_eq!(FeedForwardBrain::from_flat(&flat), Ok(brain));

        assert_eq!(
            FeedForwardBrain::from_flat(&flat[..10]),
            Err(GenomeError::ShapeMismatch {
                expected: PARAMETER_COUNT,
                actual: 10
            })
        );

        let mut broken = flat;
        broken[3] = f32::NAN;
        assert_eq!(
            FeedForwardBrain::from_flat(&broken),
            Err(GenomeError::NonFinite { index: 3 })
        );
    }
}
