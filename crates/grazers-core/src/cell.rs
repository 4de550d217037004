//! Grid occupants and the organism model.

use grazers_brain::{Brain, FeedForwardBrain, Sensors};
use serde::{Deserialize, Serialize};

use crate::SlotId;

/// Sensor reading of anything that blocks movement.
pub const SOLID_COST: f32 = -1.0;
/// Sensor reading of an open position.
pub const EMPTY_COST: f32 = 0.0;
/// Sensor reading of food that can still be eaten.
pub const FOOD_COST: f32 = 0.5;

/// RGB color sent to the display.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Color {
    #[must_use]
    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    pub const EMPTY: Self = Self::rgb(245, 245, 235);
    pub const WALL: Self = Self::rgb(60, 60, 60);
    pub const PLANT_FOOD: Self = Self::rgb(60, 170, 70);
}

impl std::fmt::Display for Color {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }
}

/// Lineage marker shared by an organism and its unmutated descendants.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ClanId(pub u64);

/// Hands out fresh clan ids for one world.
#[derive(Debug, Clone, Default)]
pub struct ClanIds {
    next: u64,
}

impl ClanIds {
    pub fn fresh(&mut self) -> ClanId {
        let id = ClanId(self.next);
        self.next += 1;
        id
    }
}

/// Group an organism's lineage was seeded into; drives its color.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum Cohort {
    Founder,
    Best,
    Second,
    Child,
    MutatedBest,
    MutatedSecond,
    MutatedChild,
}

impl Cohort {
    /// Cohorts placed on every reseed, in placement order.
    pub const RESEED: [Cohort; 6] = [
        Cohort::Best,
        Cohort::Second,
        Cohort::Child,
        Cohort::MutatedBest,
        Cohort::MutatedSecond,
        Cohort::MutatedChild,
    ];

    #[must_use]
    pub const fn color(self) -> Color {
        match self {
            Self::Founder => Color::rgb(40, 90, 200),
            Self::Best => Color::rgb(200, 40, 40),
            Self::Second => Color::rgb(230, 140, 30),
            Self::Child => Color::rgb(130, 60, 180),
            Self::MutatedBest => Color::rgb(235, 110, 160),
            Self::MutatedSecond => Color::rgb(210, 190, 40),
            Self::MutatedChild => Color::rgb(40, 180, 190),
        }
    }

    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Founder => "founder",
            Self::Best => "best",
            Self::Second => "second",
            Self::Child => "child",
            Self::MutatedBest => "mutated_best",
            Self::MutatedSecond => "mutated_second",
            Self::MutatedChild => "mutated_child",
        }
    }
}

/// Cardinal direction on the grid; `Up` decreases the row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    Up,
    Right,
    Down,
    Left,
}

impl Direction {
    #[must_use]
    pub const fn delta(self) -> (isize, isize) {
        match self {
            Self::Up => (0, -1),
            Self::Right => (1, 0),
            Self::Down => (0, 1),
            Self::Left => (-1, 0),
        }
    }
}

/// One of the nine decisions a brain can make.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Action {
    Move(Direction),
    Bite(Direction),
    Reproduce,
}

impl Action {
    const DIRECTIONS: [Direction; 4] = [
        Direction::Up,
        Direction::Right,
        Direction::Down,
        Direction::Left,
    ];

    /// Decode a controller output index: moves `0..4`, bites `4..8`, reproduce `8`.
    #[must_use]
    pub fn from_index(index: usize) -> Option<Self> {
        match index {
            0..4 => Some(Self::Move(Self::DIRECTIONS[index])),
            4..8 => Some(Self::Bite(Self::DIRECTIONS[index - 4])),
            8 => Some(Self::Reproduce),
            _ => None,
        }
    }

    #[must_use]
    pub const fn intent(self) -> MoveIntent {
        match self {
            Self::Move(direction) => {
                let (dx, dy) = direction.delta();
                MoveIntent {
                    dx,
                    dy,
                    bite: false,
                    reproduce: false,
                }
            }
            Self::Bite(direction) => {
                let (dx, dy) = direction.delta();
                MoveIntent {
                    dx,
                    dy,
                    bite: true,
                    reproduce: false,
                }
            }
            Self::Reproduce => MoveIntent {
                dx: 0,
                dy: 0,
                bite: false,
                reproduce: true,
            },
        }
    }
}

/// Decision of the current tick; never survives past resolution.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MoveIntent {
    pub dx: isize,
    pub dy: isize,
    pub bite: bool,
    pub reproduce: bool,
}

impl MoveIntent {
    /// Displacement of a plain move.
    #[must_use]
    pub const fn displacement(&self) -> Option<(isize, isize)> {
        if self.bite || self.reproduce || (self.dx == 0 && self.dy == 0) {
            None
        } else {
            Some((self.dx, self.dy))
        }
    }

    /// Offset of the bitten position.
    #[must_use]
    pub const fn bite_offset(&self) -> Option<(isize, isize)> {
        if self.bite && !self.reproduce {
            Some((self.dx, self.dy))
        } else {
            None
        }
    }

    #[must_use]
    pub const fn is_idle(&self) -> bool {
        self.displacement().is_none() && self.bite_offset().is_none() && !self.reproduce
    }
}

/// A herbivore: the only mobile occupant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Organism {
    health: i32,
    brain: FeedForwardBrain,
    clan: ClanId,
    cohort: Cohort,
    age: u32,
    #[serde(skip)]
    intent: MoveIntent,
}

impl Organism {
    #[must_use]
    pub fn new(brain: FeedForwardBrain, health: i32, clan: ClanId, cohort: Cohort) -> Self {
        Self {
            health,
            brain,
            clan,
            cohort,
            age: 0,
            intent: MoveIntent::default(),
        }
    }

    #[must_use]
    pub const fn health(&self) -> i32 {
        self.health
    }

    #[must_use]
    pub const fn brain(&self) -> &FeedForwardBrain {
        &self.brain
    }

    #[must_use]
    pub const fn clan(&self) -> ClanId {
        self.clan
    }

    #[must_use]
    pub const fn cohort(&self) -> Cohort {
        self.cohort
    }

    /// Ticks this organism has acted.
    #[must_use]
    pub const fn age(&self) -> u32 {
        self.age
    }

    #[must_use]
    pub const fn intent(&self) -> MoveIntent {
        self.intent
    }

    #[must_use]
    pub const fn color(&self) -> Color {
        self.cohort.color()
    }

    #[must_use]
    pub const fn is_dead(&self) -> bool {
        self.health <= 0
    }

    #[must_use]
    pub const fn can_reproduce(&self, floor: i32) -> bool {
        self.health > floor
    }

    /// Deep copy of the genome.
    #[must_use]
    pub fn save_genome(&self) -> FeedForwardBrain {
        self.brain.save_genome()
    }

    /// Run the brain, store the resulting intent and pay the cost of acting.
    pub fn make_move(&mut self, sensors: &Sensors, tick_cost: i32) -> Action {
        let action = Action::from_index(self.brain.decide(sensors)).unwrap_or(Action::Reproduce);
        self.plan(action);
        self.health -= tick_cost;
        self.age = self.age.saturating_add(1);
        action
    }

    /// Store `action` as the pending intent without consulting the brain.
    pub fn plan(&mut self, action: Action) {
        self.intent = action.intent();
    }

    /// Take the pending intent, leaving none behind.
    pub fn take_intent(&mut self) -> MoveIntent {
        std::mem::take(&mut self.intent)
    }

    pub fn got_food(&mut self, amount: i32) {
        self.health += amount;
    }

    /// Split off a clone carrying half the health; both keep the remainder.
    #[must_use]
    pub fn reproduce(&mut self) -> Organism {
        let half = (f64::from(self.health) / 2.0).round_ties_even() as i32;
        self.health -= half;
        Organism::new(self.save_genome(), self.health, self.clan, self.cohort)
    }
}

/// Plant food; solid until eaten.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlantFood {
    edible: bool,
}

impl PlantFood {
    #[must_use]
    pub const fn fresh() -> Self {
        Self { edible: true }
    }

    #[must_use]
    pub const fn is_edible(&self) -> bool {
        self.edible
    }
}

/// What sits on a grid position.
#[derive(Debug, Clone, PartialEq)]
pub enum Occupant {
    Empty,
    Wall,
    Food(PlantFood),
    Organism(Box<Organism>),
}

/// Variant discriminant used when diffing buffers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CellTag {
    Empty,
    Wall,
    Food,
    Organism,
}

/// Everything the display can observe about a position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CellSignature {
    pub tag: CellTag,
    pub slot: SlotId,
    pub color: Color,
}

/// One grid position: its visual slot, solidity and occupant.
#[derive(Debug, Clone, PartialEq)]
pub struct Cell {
    slot: SlotId,
    solid: bool,
    occupant: Occupant,
}

impl Cell {
    #[must_use]
    pub const fn empty(slot: SlotId) -> Self {
        Self {
            slot,
            solid: false,
            occupant: Occupant::Empty,
        }
    }

    #[must_use]
    pub const fn wall(slot: SlotId) -> Self {
        Self {
            slot,
            solid: true,
            occupant: Occupant::Wall,
        }
    }

    #[must_use]
    pub const fn food(slot: SlotId) -> Self {
        Self {
            slot,
            solid: true,
            occupant: Occupant::Food(PlantFood::fresh()),
        }
    }

    #[must_use]
    pub fn organism(slot: SlotId, organism: impl Into<Box<Organism>>) -> Self {
        Self {
            slot,
            solid: true,
            occupant: Occupant::Organism(organism.into()),
        }
    }

    #[must_use]
    pub const fn slot(&self) -> SlotId {
        self.slot
    }

    pub fn set_slot(&mut self, slot: SlotId) {
        self.slot = slot;
    }

    #[must_use]
    pub const fn occupant(&self) -> &Occupant {
        &self.occupant
    }

    #[must_use]
    pub const fn is_solid(&self) -> bool {
        self.solid
    }

    /// Lock this position for the rest of the tick.
    pub fn reserve(&mut self) {
        self.solid = true;
    }

    /// Whether the occupant never initiates an action.
    #[must_use]
    pub const fn is_fixed(&self) -> bool {
        !matches!(self.occupant, Occupant::Organism(_))
    }

    #[must_use]
    pub fn can_move(&self) -> bool {
        match &self.occupant {
            Occupant::Organism(organism) => !organism.is_dead(),
            _ => false,
        }
    }

    /// Sensor value neighbouring organisms read for this position.
    #[must_use]
    pub fn cost(&self) -> f32 {
        match &self.occupant {
            Occupant::Food(food) if food.is_edible() => FOOD_COST,
            _ if self.solid => SOLID_COST,
            _ => EMPTY_COST,
        }
    }

    #[must_use]
    pub fn color(&self) -> Color {
        match &self.occupant {
            Occupant::Empty => Color::EMPTY,
            Occupant::Wall => Color::WALL,
            Occupant::Food(_) => Color::PLANT_FOOD,
            Occupant::Organism(organism) => organism.color(),
        }
    }

    #[must_use]
    pub const fn tag(&self) -> CellTag {
        match self.occupant {
            Occupant::Empty => CellTag::Empty,
            Occupant::Wall => CellTag::Wall,
            Occupant::Food(_) => CellTag::Food,
            Occupant::Organism(_) => CellTag::Organism,
        }
    }

    #[must_use]
    pub fn signature(&self) -> CellSignature {
        CellSignature {
            tag: self.tag(),
            slot: self.slot,
            color: self.color(),
        }
    }

    #[must_use]
    pub fn as_organism(&self) -> Option<&Organism> {
        match &self.occupant {
            Occupant::Organism(organism) => Some(organism),
            _ => None,
        }
    }

    /// Eat the food here; returns `false` if there was nothing edible.
    pub fn eat(&mut self) -> bool {
        match &mut self.occupant {
            Occupant::Food(food) if food.edible => {
                food.edible = false;
                self.solid = false;
                true
            }
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::SmallRng;

    fn sample_organism(health: i32) -> Organism {
        let mut rng = SmallRng::seed_from_u64(17);
        Organism::new(
            FeedForwardBrain::random(&mut rng),
            health,
            ClanId(3),
            Cohort::Founder,
        )
    }

    #[test]
    fn action_decoding_covers_nine_outputs() {
        assert_eq!(Action::from_index(0), Some(Action::Move(Direction::Up)));
        assert_eq!(Action::from_index(3), Some(Action::Move(Direction::Left)));
        assert_eq!(Action::from_index(5), Some(Action::Bite(Direction::Right)));
        assert_eq!(Action::from_index(8), Some(Action::Reproduce));
        assert_eq!(Action::from_index(9), None);

        let bite = Action::Bite(Direction::Down).intent();
        assert_eq!(bite.displacement(), None);
        assert_eq!(bite.bite_offset(), Some((0, 1)));

        let step = Action::Move(Direction::Left).intent();
        assert_eq!(step.displacement(), Some((-1, 0)));
        assert!(MoveIntent::default().is_idle());
        assert!(!Action::Reproduce.intent().is_idle());
    }

    #[test]
    fn costs_follow_solidity_and_food() {
        let slot = SlotId(1);
        assert_eq!(Cell::empty(slot).cost(), EMPTY_COST);
        assert_eq!(Cell::wall(slot).cost(), SOLID_COST);
        assert_eq!(Cell::food(slot).cost(), FOOD_COST);
        assert_eq!(Cell::organism(slot, sample_organism(5)).cost(), SOLID_COST);

        let mut reserved = Cell::empty(slot);
        reserved.reserve();
        assert_eq!(reserved.cost(), SOLID_COST);

        let mut food = Cell::food(slot);
        assert!(food.eat());
        assert!(!food.is_solid());
        assert_eq!(food.cost(), EMPTY_COST);
        assert!(!food.eat(), "eaten food stays eaten");
    }

    #[test]
    fn only_live_organisms_move() {
        let slot = SlotId(0);
        assert!(Cell::wall(slot).is_fixed());
        assert!(!Cell::empty(slot).can_move());
        assert!(Cell::organism(slot, sample_organism(1)).can_move());
        assert!(!Cell::organism(slot, sample_organism(0)).can_move());
    }

    #[test]
    fn make_move_costs_one_health_and_sets_intent() {
        let mut organism = sample_organism(10);
        let action = organism.make_move(&[0.0; grazers_brain::SENSOR_COUNT], 1);
        assert_eq!(organism.health(), 9);
        assert_eq!(organism.age(), 1);
        assert_eq!(organism.intent(), action.intent());
        assert_eq!(organism.take_intent(), action.intent());
        assert!(organism.intent().is_idle());
    }

    #[test]
    fn reproduce_halves_health_with_banker_rounding() {
        let mut parent = sample_organism(10);
        let child = parent.reproduce();
        assert_eq!(parent.health(), 5);
        assert_eq!(child.health(), 5);
        assert_eq!(child.clan(), parent.clan());
        assert_eq!(child.brain(), parent.brain());
        assert_eq!(child.age(), 0);

        // 5 / 2 = 2.5 rounds to 2, 7 / 2 = 3.5 rounds to 4.
        let mut odd = sample_organism(5);
        let _ = odd.reproduce();
        assert_eq!(odd.health(), 3);
        let mut odd = sample_organism(7);
        let _ = odd.reproduce();
        assert_eq!(odd.health(), 3);
    }

    #[test]
    fn eligibility_needs_health_above_floor() {
        assert!(!sample_organism(4).can_reproduce(4));
        assert!(sample_organism(5).can_reproduce(4));
    }
}
