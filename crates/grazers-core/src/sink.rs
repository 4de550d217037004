//! Outbound seams: the display the grid is drawn on and the journal survivors are logged to.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::cell::{ClanId, Cohort, Color, Organism};
use crate::{Epoch, SlotId};

/// Pixel rectangle of one cell, corners inclusive-exclusive.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct Rect {
    pub x1: u32,
    pub y1: u32,
    pub x2: u32,
    pub y2: u32,
}

impl Rect {
    /// Rectangle covering grid column `x`, row `y` at `cell_px` pixels per cell.
    #[must_use]
    pub const fn for_cell(x: u32, y: u32, cell_px: u32) -> Self {
        Self {
            x1: x * cell_px,
            y1: y * cell_px,
            x2: (x + 1) * cell_px,
            y2: (y + 1) * cell_px,
        }
    }
}

/// Named counters shown next to the grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Counter {
    Population,
    Epoch,
    Steps,
    PastSteps,
}

impl Counter {
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Population => "Live cells",
            Self::Epoch => "Epoch",
            Self::Steps => "Steps",
            Self::PastSteps => "Past steps",
        }
    }
}

/// Operator requests polled between ticks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControlSignal {
    Pause,
    Resume,
    ToggleSlowMode,
    Stop,
}

#[derive(Debug, Error)]
pub enum SinkError {
    #[error("display error: {0}")]
    Display(String),
    #[error("journal error: {0}")]
    Journal(String),
}

/// Rendering surface the world pushes cell colors and counters to.
pub trait DisplaySink {
    /// Bind a new display element to a cell rectangle.
    fn create_slot(&mut self, rect: Rect, color: Color) -> Result<SlotId, SinkError>;

    fn recolor(&mut self, slot: SlotId, color: Color) -> Result<(), SinkError>;

    fn set_counter(&mut self, counter: Counter, value: u64);

    /// Next pending operator request, if any.
    fn poll_control(&mut self) -> Option<ControlSignal> {
        None
    }

    /// Flush everything recolored since the last call.
    fn present(&mut self) -> Result<(), SinkError> {
        Ok(())
    }
}

/// Genome and lineage facts of one breeding survivor.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SurvivorRecord {
    pub clan: ClanId,
    pub cohort: Cohort,
    pub age: u32,
    pub health: i32,
    /// Hidden weights followed by output weights, row-major.
    pub weights: Vec<f32>,
}

impl SurvivorRecord {
    #[must_use]
    pub fn from_organism(organism: &Organism) -> Self {
        Self {
            clan: organism.clan(),
            cohort: organism.cohort(),
            age: organism.age(),
            health: organism.health(),
            weights: organism.brain().weights().collect(),
        }
    }
}

/// Append-only record of each epoch's survivors and length.
pub trait JournalSink: Send {
    fn log_genomes(&mut self, epoch: Epoch, survivors: &[SurvivorRecord]) -> Result<(), SinkError>;

    /// Record how many steps `epoch` lasted.
    fn log_epoch(&mut self, epoch: Epoch, steps: u64) -> Result<(), SinkError>;
}

/// Display that draws nothing; slots are numbered in creation order.
#[derive(Debug, Default)]
pub struct NullDisplay {
    next_slot: u64,
}

impl DisplaySink for NullDisplay {
    fn create_slot(&mut self, _rect: Rect, _color: Color) -> Result<SlotId, SinkError> {
        let slot = SlotId(self.next_slot);
        self.next_slot += 1;
        Ok(slot)
    }

    fn recolor(&mut self, _slot: SlotId, _color: Color) -> Result<(), SinkError> {
        Ok(())
    }

    fn set_counter(&mut self, _counter: Counter, _value: u64) {}
}

/// Journal that discards everything.
#[derive(Debug, Default)]
pub struct NullJournal;

impl JournalSink for NullJournal {
    fn log_genomes(&mut self, _epoch: Epoch, _survivors: &[SurvivorRecord]) -> Result<(), SinkError> {
        Ok(())
    }

    fn log_epoch(&mut self, _epoch: Epoch, _steps: u64) -> Result<(), SinkError> {
        Ok(())
    }
}
