//! Birth and death bookkeeping.
//!
//! Observers are registered with a world's [`Lifecycle`] when the world is
//! built, so two worlds never share a population counter or a graveyard.

use crate::cell::Organism;

/// Receives birth and death notifications from the resolution pipeline.
pub trait LifecycleObserver: Send {
    fn on_birth(&mut self, _organism: &Organism) {}
    fn on_death(&mut self, _organism: &Organism) {}
}

/// Tally of live organisms.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Population {
    live: usize,
}

impl Population {
    #[must_use]
    pub const fn new(live: usize) -> Self {
        Self { live }
    }

    #[must_use]
    pub const fn live(&self) -> usize {
        self.live
    }

    #[must_use]
    pub const fn is_extinct(&self) -> bool {
        self.live == 0
    }

    /// Replace the tally, e.g. after a reseed.
    pub fn reset(&mut self, live: usize) {
        self.live = live;
    }
}

impl LifecycleObserver for Population {
    fn on_birth(&mut self, _organism: &Organism) {
        self.live += 1;
    }

    fn on_death(&mut self, _organism: &Organism) {
        self.live = self.live.saturating_sub(1);
    }
}

/// Organisms that died during the current epoch, oldest death first.
#[derive(Debug, Clone, Default)]
pub struct Graveyard {
    dead: Vec<Organism>,
}

impl Graveyard {
    #[must_use]
    pub fn len(&self) -> usize {
        self.dead.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.dead.is_empty()
    }

    /// Most recent death.
    pub fn pop(&mut self) -> Option<Organism> {
        self.dead.pop()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Organism> {
        self.dead.iter()
    }

    /// Reorder by age so the longest-lived end up last; death order breaks ties.
    pub fn sort_by_longevity(&mut self) {
        self.dead.sort_by_key(Organism::age);
    }

    pub fn clear(&mut self) {
        self.dead.clear();
    }
}

impl LifecycleObserver for Graveyard {
    fn on_death(&mut self, organism: &Organism) {
        self.dead.push(organism.clone());
    }
}

/// Fan-out of lifecycle events to the world's observers.
#[derive(Default)]
pub struct Lifecycle {
    population: Population,
    graveyard: Graveyard,
    observers: Vec<Box<dyn LifecycleObserver>>,
    births: usize,
    deaths: usize,
}

impl std::fmt::Debug for Lifecycle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Lifecycle")
            .field("population", &self.population)
            .field("graveyard", &self.graveyard.len())
            .field("observers", &self.observers.len())
            .finish()
    }
}

impl Lifecycle {
    #[must_use]
    pub fn new(live: usize) -> Self {
        Self {
            population: Population::new(live),
            ..Self::default()
        }
    }

    /// Register an additional observer.
    pub fn subscribe(&mut self, observer: Box<dyn LifecycleObserver>) {
        self.observers.push(observer);
    }

    pub fn birth(&mut self, organism: &Organism) {
        self.births += 1;
        self.population.on_birth(organism);
        for observer in &mut self.observers {
            observer.on_birth(organism);
        }
    }

    pub fn death(&mut self, organism: &Organism) {
        self.deaths += 1;
        self.population.on_death(organism);
        self.graveyard.on_death(organism);
        for observer in &mut self.observers {
            observer.on_death(organism);
        }
    }

    #[must_use]
    pub const fn population(&self) -> Population {
        self.population
    }

    pub fn population_mut(&mut self) -> &mut Population {
        &mut self.population
    }

    #[must_use]
    pub const fn graveyard(&self) -> &Graveyard {
        &self.graveyard
    }

    pub fn graveyard_mut(&mut self) -> &mut Graveyard {
        &mut self.graveyard
    }

    /// Births and deaths since the last call, resetting both.
    pub fn take_counts(&mut self) -> (usize, usize) {
        let counts = (self.births, self.deaths);
        self.births = 0;
        self.deaths = 0;
        counts
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cell::{ClanId, Cohort};
    use grazers_brain::FeedForwardBrain;
    use rand::SeedableRng;
    use rand::rngs::SmallRng;
    use std::sync::{Arc, Mutex};

    fn organism(clan: u64, age_ticks: u32) -> Organism {
        let mut rng = SmallRng::seed_from_u64(clan);
        let mut organism = Organism::new(
            FeedForwardBrain::random(&mut rng),
            50,
            ClanId(clan),
            Cohort::Founder,
        );
        for _ in 0..age_ticks {
            organism.make_move(&[0.0; grazers_brain::SENSOR_COUNT], 1);
        }
        organism
    }

    #[derive(Clone, Default)]
    struct Probe(Arc<Mutex<Vec<&'static str>>>);

    impl LifecycleObserver for Probe {
        fn on_birth(&mut self, _organism: &Organism) {
            self.0.lock().unwrap().push("birth");
        }

        fn on_death(&mut self, _organism: &Organism) {
            self.0.lock().unwrap().push("death");
        }
    }

    #[test]
    fn events_reach_counter_graveyard_and_subscribers() {
        let probe = Probe::default();
        let mut lifecycle = Lifecycle::new(2);
        lifecycle.subscribe(Box::new(probe.clone()));

        lifecycle.birth(&organism(1, 0));
        lifecycle.death(&organism(2, 0));
        lifecycle.death(&organism(3, 0));

        assert_eq!(lifecycle.population().live(), 1);
        assert_eq!(lifecycle.graveyard().len(), 2);
        assert_eq!(lifecycle.take_counts(), (1, 2));
        assert_eq!(lifecycle.take_counts(), (0, 0));
        assert_eq!(*probe.0.lock().unwrap(), vec!["birth", "death", "death"]);
    }

    #[test]
    fn population_never_underflows() {
        let mut population = Population::new(0);
        population.on_death(&organism(1, 0));
        assert!(population.is_extinct());
    }

    #[test]
    fn longevity_sort_is_stable() {
        let mut graveyard = Graveyard::default();
        graveyard.on_death(&organism(1, 5));
        graveyard.on_death(&organism(2, 9));
        graveyard.on_death(&organism(3, 5));
        graveyard.sort_by_longevity();
        let clans: Vec<_> = graveyard.iter().map(|o| o.clan().0).collect();
        assert_eq!(clans, vec![1, 3, 2]);
        assert_eq!(graveyard.pop().map(|o| o.clan()), Some(ClanId(2)));
    }
}
