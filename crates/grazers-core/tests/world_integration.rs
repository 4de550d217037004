use std::collections::HashSet;

use grazers_core::{
    CellTag, Epoch, GrazersConfig, Organism, Position, SelectionError, SurvivorPolicy, WorldError,
    WorldState,
};
use proptest::prelude::*;

fn small_world(seed: u64) -> GrazersConfig {
    GrazersConfig {
        grid_width: 24,
        grid_height: 14,
        initial_population: 16,
        initial_food: 30,
        reseed_food: 30,
        cohort_size: 3,
        rng_seed: Some(seed),
        ..GrazersConfig::default()
    }
}

/// Observable state of every position: tag, slot and organism health.
fn snapshot(world: &WorldState) -> Vec<(CellTag, u64, Option<i32>)> {
    world
        .grid()
        .cells()
        .iter()
        .map(|cell| {
            (
                cell.tag(),
                cell.slot().0,
                cell.as_organism().map(Organism::health),
            )
        })
        .collect()
}

#[test]
fn same_seed_replays_identically() {
    let mut a = WorldState::new(small_world(42)).expect("world");
    let mut b = WorldState::new(small_world(42)).expect("world");
    for _ in 0..200 {
        let left = a.step();
        let right = b.step();
        match (left, right) {
            (Ok(left), Ok(right)) => assert_eq!(left, right),
            (Err(_), Err(_)) => break,
            _ => panic!("worlds diverged"),
        }
        assert_eq!(snapshot(&a), snapshot(&b));
    }
}

#[test]
fn slots_stay_bound_to_positions() {
    let mut world = WorldState::new(small_world(3)).expect("world");
    let before: Vec<_> = world.grid().cells().iter().map(|c| c.slot()).collect();
    for _ in 0..50 {
        if world.step().is_err() {
            break;
        }
    }
    let after: Vec<_> = world.grid().cells().iter().map(|c| c.slot()).collect();
    assert_eq!(before, after);
}

#[test]
fn population_counter_matches_grid_every_tick() {
    let mut world = WorldState::new(small_world(11)).expect("world");
    for _ in 0..300 {
        match world.step() {
            Ok(events) => {
                assert_eq!(events.population, world.grid().count_organisms());
                assert_eq!(world.population(), world.grid().count_organisms());
            }
            Err(WorldError::Selection { .. }) => break,
            Err(other) => panic!("unexpected error: {other}"),
        }
    }
}

#[test]
fn walls_survive_ticks_and_rollovers() {
    let config = small_world(9);
    let walls = config.grid_width * 2;
    let mut world = WorldState::new(config).expect("world");
    for _ in 0..400 {
        if world.step().is_err() {
            break;
        }
        assert_eq!(world.grid().count_tag(CellTag::Wall), walls);
    }
}

#[test]
fn epoch_end_reseeds_six_cohorts() {
    // Without food or bite healing every founder starves after exactly three ticks.
    let config = GrazersConfig {
        initial_health: 3,
        initial_food: 0,
        bite_heal: 0,
        survivor_policy: SurvivorPolicy::Longevity,
        ..small_world(21)
    };
    let cohort_total = config.reseed_population();
    let mut world = WorldState::new(config).expect("world");

    for _ in 0..3 {
        let events = world.step().expect("step");
        assert!(!events.epoch_rolled);
    }
    assert_eq!(world.population(), 0);
    assert_eq!(world.graveyard().len(), 16);

    let events = world.step().expect("rollover");
    assert!(events.epoch_rolled);
    assert_eq!(events.epoch, Epoch(2));
    assert_eq!(events.population, cohort_total);
    assert_eq!(world.grid().count_organisms(), cohort_total);
    assert!(world.graveyard().is_empty());
    assert_eq!(world.past_steps(), 3);

    let clans: HashSet<_> = world
        .grid()
        .cells()
        .iter()
        .filter_map(|cell| cell.as_organism())
        .map(|organism| (organism.cohort(), organism.clan()))
        .collect();
    assert_eq!(clans.len(), 6, "one clan per cohort");
}

#[test]
fn lone_clan_cannot_be_bred() {
    let config = GrazersConfig {
        initial_population: 1,
        initial_health: 1,
        ..small_world(4)
    };
    let mut world = WorldState::new(config).expect("world");
    world.step().expect("founder starves");
    assert_eq!(world.population(), 0);
    let err = world.step().unwrap_err();
    assert!(matches!(
        err,
        WorldError::Selection {
            source: SelectionError::SingleClan { candidates: 1, .. },
            ..
        }
    ));
}

#[test]
fn insert_rejects_occupied_positions() {
    let mut world = WorldState::new(GrazersConfig {
        initial_population: 0,
        initial_food: 0,
        ..small_world(1)
    })
    .expect("world");
    world.insert_food(Position::new(3, 3)).expect("food");
    assert!(matches!(
        world.insert_food(Position::new(3, 3)),
        Err(WorldError::Occupied(_))
    ));
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(24))]

    #[test]
    fn no_position_ever_holds_two_occupants(seed in any::<u64>(), ticks in 1usize..60) {
        let mut world = WorldState::new(small_world(seed)).expect("world");
        let area = world.grid().area();
        for _ in 0..ticks {
            if world.step().is_err() {
                break;
            }
            let slots: HashSet<_> = world.grid().cells().iter().map(|c| c.slot()).collect();
            prop_assert_eq!(slots.len(), area);
            prop_assert_eq!(world.grid().cells().len(), area);
            let population = world.population();
            prop_assert_eq!(population, world.grid().count_organisms());
        }
    }
}
