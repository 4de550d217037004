//! Core types shared across the grazers workspace.
//!
//! The world is a grid that wraps horizontally and is walled on its first and
//! last rows. Herbivores sense their eight neighbours, pick one of nine actions
//! with a small feed-forward brain, and are resolved one by one against a read
//! buffer while results accumulate in a write buffer. When the last organism
//! dies the epoch ends and the next generation is bred from the graveyard.

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub mod cell;
pub mod config;
pub mod driver;
pub mod grid;
pub mod lifecycle;
pub mod placement;
pub mod resolve;
pub mod selection;
pub mod sink;
pub mod world;

pub use cell::{
    Action, Cell, CellSignature, CellTag, ClanId, Cohort, Color, Direction, MoveIntent, Occupant,
    Organism, PlantFood,
};
pub use config::{GrazersConfig, SurvivorPolicy};
pub use driver::{ControlState, RunLimits, RunReport, StopReason, run};
pub use grid::{Grid, NEIGHBOR_OFFSETS};
pub use lifecycle::{Graveyard, Lifecycle, LifecycleObserver, Population};
pub use selection::{BreedingPlan, SelectionError, Survivors};
pub use sink::{
    ControlSignal, Counter, DisplaySink, JournalSink, NullDisplay, NullJournal, Rect, SinkError,
    SurvivorRecord,
};
pub use world::{TickEvents, WorldState};

pub use grazers_brain::feedforward::PARAMETER_COUNT;
pub use grazers_brain::{
    ACTION_COUNT, Brain, FeedForwardBrain, HIDDEN_SIZE, MutationSettings, SENSOR_COUNT, Sensors,
};

/// Ticks processed since the current epoch began.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord)]
pub struct Tick(pub u64);

impl Tick {
    /// Returns the next sequential tick.
    #[must_use]
    pub const fn next(self) -> Self {
        Self(self.0 + 1)
    }

    /// Resets the tick counter back to zero.
    #[must_use]
    pub const fn zero() -> Self {
        Self(0)
    }
}

/// Generation counter; the first epoch is `Epoch(1)`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Epoch(pub u64);

impl Epoch {
    #[must_use]
    pub const fn first() -> Self {
        Self(1)
    }

    #[must_use]
    pub const fn next(self) -> Self {
        Self(self.0 + 1)
    }
}

impl Default for Epoch {
    fn default() -> Self {
        Self::first()
    }
}

impl std::fmt::Display for Epoch {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Opaque handle of the display element bound to a grid position.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct SlotId(pub u64);

/// Grid coordinate: `x` is the column, `y` the row.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct Position {
    pub x: usize,
    pub y: usize,
}

impl Position {
    #[must_use]
    pub const fn new(x: usize, y: usize) -> Self {
        Self { x, y }
    }
}

/// Errors surfaced by the world engine.
#[derive(Debug, Error)]
pub enum WorldError {
    /// Indicates an invalid configuration value.
    #[error("invalid configuration: {0}")]
    InvalidConfig(&'static str),
    /// Breeding could not find two distinct survivors; the epoch cannot restart.
    #[error("epoch {epoch} cannot be reseeded: {source}")]
    Selection {
        epoch: Epoch,
        #[source]
        source: SelectionError,
    },
    /// The display refused to create the slots the grid is drawn on.
    #[error("display failed during world genesis: {0}")]
    Genesis(#[source] SinkError),
    /// A manual placement targeted a position that is already occupied.
    #[error("position ({x}, {y}) is occupied", x = .0.x, y = .0.y)]
    Occupied(Position),
    /// A manual placement targeted a position outside the grid.
    #[error("position ({x}, {y}) is outside the grid", x = .0.x, y = .0.y)]
    OutOfBounds(Position),
    /// A manual placement offered an organism with no health left.
    #[error("organism for ({x}, {y}) has no health", x = .0.x, y = .0.y)]
    Lifeless(Position),
}
