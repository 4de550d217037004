//! Survivor selection and breeding of the next generation.

use grazers_brain::{Brain, FeedForwardBrain, MutationSettings};
use rand::RngCore;
use thiserror::Error;

use crate::cell::{ClanId, ClanIds, Cohort, Organism};
use crate::config::SurvivorPolicy;
use crate::lifecycle::Graveyard;
use crate::sink::SurvivorRecord;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SelectionError {
    #[error("graveyard is empty")]
    EmptyGraveyard,
    #[error("all {candidates} dead organisms belong to clan {clan:?}")]
    SingleClan { clan: ClanId, candidates: usize },
}

/// The two genetically distinct organisms a new generation is bred from.
#[derive(Debug, Clone)]
pub struct Survivors {
    pub best: Organism,
    pub second: Organism,
}

impl Survivors {
    #[must_use]
    pub fn records(&self) -> [SurvivorRecord; 2] {
        [
            SurvivorRecord::from_organism(&self.best),
            SurvivorRecord::from_organism(&self.second),
        ]
    }
}

/// Pop the best organism and the next one of a different clan.
///
/// Entries of the best organism's clan popped while searching are discarded.
/// On error the graveyard is left untouched.
pub fn pick_survivors(
    graveyard: &mut Graveyard,
    policy: SurvivorPolicy,
) -> Result<Survivors, SelectionError> {
    let candidates = graveyard.len();
    if policy == SurvivorPolicy::Longevity {
        graveyard.sort_by_longevity();
    }
    let best_clan = graveyard
        .iter()
        .last()
        .map(Organism::clan)
        .ok_or(SelectionError::EmptyGraveyard)?;
    if graveyard.iter().all(|organism| organism.clan() == best_clan) {
        return Err(SelectionError::SingleClan {
            clan: best_clan,
            candidates,
        });
    }
    let best = graveyard.pop().ok_or(SelectionError::EmptyGraveyard)?;
    while let Some(candidate) = graveyard.pop() {
        if candidate.clan() != best.clan() {
            return Ok(Survivors {
                best,
                second: candidate,
            });
        }
    }
    Err(SelectionError::SingleClan {
        clan: best.clan(),
        candidates,
    })
}

/// Genome and lineage of one reseeded cohort.
#[derive(Debug, Clone)]
pub struct CohortSeed {
    pub cohort: Cohort,
    pub clan: ClanId,
    pub brain: FeedForwardBrain,
}

/// Six cohorts to place on the next reseed, in placement order.
#[derive(Debug, Clone)]
pub struct BreedingPlan {
    pub seeds: Vec<CohortSeed>,
}

impl BreedingPlan {
    /// Cross the survivors and mutate best, second and child.
    ///
    /// Best and second keep their clans; every other cohort gets a fresh one.
    pub fn breed(
        survivors: &Survivors,
        rng: &mut dyn RngCore,
        clans: &mut ClanIds,
        mutation: MutationSettings,
        second_mutation: MutationSettings,
    ) -> Self {
        let best = survivors.best.save_genome();
        let second = survivors.second.save_genome();
        let child = best.crossover(&second);
        let mutated_best = best.mutated(rng, mutation);
        let mutated_second = second.mutated(rng, second_mutation);
        let mutated_child = child.mutated(rng, mutation);

        let seeds = vec![
            CohortSeed {
                cohort: Cohort::Best,
                clan: survivors.best.clan(),
                brain: best,
            },
            CohortSeed {
                cohort: Cohort::Second,
                clan: survivors.second.clan(),
                brain: second,
            },
            CohortSeed {
                cohort: Cohort::Child,
                clan: clans.fresh(),
                brain: child,
            },
            CohortSeed {
                cohort: Cohort::MutatedBest,
                clan: clans.fresh(),
                brain: mutated_best,
            },
            CohortSeed {
                cohort: Cohort::MutatedSecond,
                clan: clans.fresh(),
                brain: mutated_second,
            },
            CohortSeed {
                cohort: Cohort::MutatedChild,
                clan: clans.fresh(),
                brain: mutated_child,
            },
        ];
        Self { seeds }
    }
}
