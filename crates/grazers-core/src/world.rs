//! World state, the tick loop and epoch rollover.

use std::fmt;

use grazers_brain::{FeedForwardBrain, SENSOR_COUNT, Sensors};
use rand::rngs::SmallRng;
use tracing::{debug, info, warn};

use crate::cell::{Cell, CellTag, ClanIds, Cohort, Color, Organism};
use crate::config::GrazersConfig;
use crate::grid::Grid;
use crate::lifecycle::{Graveyard, Lifecycle, LifecycleObserver};
use crate::placement::scatter;
use crate::resolve::{Pipeline, ResolveContext, Rules};
use crate::selection::{BreedingPlan, pick_survivors};
use crate::sink::{
    ControlSignal, Counter, DisplaySink, JournalSink, NullDisplay, NullJournal, Rect,
};
use crate::{Epoch, Position, SlotId, Tick, WorldError};

/// Health is scaled by this before it reaches the brain.
const HEALTH_SENSOR_SCALE: f32 = 100.0;

/// Summary of one call to [`WorldState::step`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TickEvents {
    /// Tick counter after the step; zero right after a rollover.
    pub tick: Tick,
    pub epoch: Epoch,
    pub population: usize,
    /// Display slots recolored while committing.
    pub recolored: usize,
    pub births: usize,
    pub deaths: usize,
    /// The step bred and reseeded a new generation instead of ticking.
    pub epoch_rolled: bool,
}

/// Grid world with double-buffered ticks.
pub struct WorldState {
    config: GrazersConfig,
    rules: Rules,
    pipeline: Pipeline,
    read: Grid,
    write: Grid,
    lifecycle: Lifecycle,
    clans: ClanIds,
    rng: SmallRng,
    tick: Tick,
    total_ticks: u64,
    epoch: Epoch,
    past_steps: u64,
    display: Box<dyn DisplaySink>,
    journal: Box<dyn JournalSink>,
}

impl fmt::Debug for WorldState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WorldState")
            .field("config", &self.config)
            .field("tick", &self.tick)
            .field("epoch", &self.epoch)
            .field("population", &self.lifecycle.population().live())
            .field("pipeline", &self.pipeline)
            .finish()
    }
}

impl WorldState {
    /// Build a world that draws and journals nothing.
    pub fn new(config: GrazersConfig) -> Result<Self, WorldError> {
        Self::with_sinks(
            config,
            Box::new(NullDisplay::default()),
            Box::new(NullJournal),
        )
    }

    /// Build a world, create one display slot per position and seed the founders.
    pub fn with_sinks(
        config: GrazersConfig,
        mut display: Box<dyn DisplaySink>,
        journal: Box<dyn JournalSink>,
    ) -> Result<Self, WorldError> {
        config.validate()?;
        let blank = blank_grid(&config, display.as_mut())?;
        let rules = Rules {
            bite_heal: config.bite_heal,
            reproduction_floor: config.reproduction_floor,
        };
        let rng = config.seeded_rng();
        let mut world = Self {
            rules,
            pipeline: Pipeline::standard(),
            read: blank.clone(),
            write: blank,
            lifecycle: Lifecycle::default(),
            clans: ClanIds::default(),
            rng,
            tick: Tick::zero(),
            total_ticks: 0,
            epoch: Epoch::first(),
            past_steps: 0,
            display,
            journal,
            config,
        };
        world.genesis();
        Ok(world)
    }

    fn genesis(&mut self) {
        let height = self.write.height();
        for x in 0..self.write.width() {
            for y in [0, height - 1] {
                let cell = self.write.cell_mut(Position::new(x, y));
                *cell = Cell::wall(cell.slot());
            }
        }

        let sweeps = self.config.placement_max_sweeps;
        let food = scatter(
            &mut self.write,
            &mut self.rng,
            self.config.initial_food,
            sweeps,
            Cell::food,
        );

        let health = self.config.initial_health;
        let mut founders: Vec<Organism> = (0..self.config.initial_population)
            .map(|_| {
                Organism::new(
                    FeedForwardBrain::random(&mut self.rng),
                    health,
                    self.clans.fresh(),
                    Cohort::Founder,
                )
            })
            .collect();
        founders.reverse();
        scatter(
            &mut self.write,
            &mut self.rng,
            self.config.initial_population,
            sweeps,
            |slot| match founders.pop() {
                Some(organism) => Cell::organism(slot, organism),
                None => Cell::empty(slot),
            },
        );

        self.lifecycle
            .population_mut()
            .reset(self.write.count_organisms());
        self.commit();
        info!(
            width = self.read.width(),
            height = self.read.height(),
            food,
            population = self.population(),
            "world genesis complete"
        );
        self.publish_counters();
    }

    /// Advance the world by one step.
    ///
    /// A step that begins with no live organisms breeds and reseeds the next
    /// generation instead of ticking.
    pub fn step(&mut self) -> Result<TickEvents, WorldError> {
        if self.lifecycle.population().is_extinct() {
            return self.roll_epoch();
        }

        self.write.clone_from(&self.read);
        let tick_cost = self.config.tick_cost;
        let mut ctx = ResolveContext {
            read: &mut self.read,
            write: &mut self.write,
            lifecycle: &mut self.lifecycle,
            rules: self.rules,
        };
        for index in 0..ctx.read.area() {
            let at = ctx.read.position_of(index);
            let cell = ctx.read.cell(at);
            if !cell.can_move() {
                continue;
            }
            let Some(organism) = cell.as_organism() else {
                continue;
            };
            let mut actor = Box::new(organism.clone());
            let sensors = sense(ctx.read, at, &actor);
            actor.make_move(&sensors, tick_cost);
            self.pipeline.run(&mut ctx, at, actor);
        }

        let recolored = self.commit();
        self.tick = self.tick.next();
        self.total_ticks += 1;
        let (births, deaths) = self.lifecycle.take_counts();
        let population = self.population();
        debug!(
            tick = self.tick.0,
            epoch = self.epoch.0,
            population,
            births,
            deaths,
            recolored,
            "tick committed"
        );
        self.publish_counters();
        Ok(TickEvents {
            tick: self.tick,
            epoch: self.epoch,
            population,
            recolored,
            births,
            deaths,
            epoch_rolled: false,
        })
    }

    fn roll_epoch(&mut self) -> Result<TickEvents, WorldError> {
        let finished = self.epoch;
        let steps = self.tick.0;
        let survivors = pick_survivors(
            self.lifecycle.graveyard_mut(),
            self.config.survivor_policy,
        )
        .map_err(|source| WorldError::Selection {
            epoch: finished,
            source,
        })?;

        if let Err(err) = self.journal.log_genomes(finished, &survivors.records()) {
            warn!(epoch = finished.0, error = %err, "failed to journal survivor genomes");
        }
        if let Err(err) = self.journal.log_epoch(finished, steps) {
            warn!(epoch = finished.0, error = %err, "failed to journal epoch length");
        }

        let plan = BreedingPlan::breed(
            &survivors,
            &mut self.rng,
            &mut self.clans,
            self.config.mutation,
            self.config.second_mutation(),
        );
        self.reseed(&plan);
        self.lifecycle.graveyard_mut().clear();
        self.lifecycle
            .population_mut()
            .reset(self.write.count_organisms());
        let _ = self.lifecycle.take_counts();
        let recolored = self.commit();

        self.epoch = self.epoch.next();
        self.past_steps = steps;
        self.tick = Tick::zero();
        let population = self.population();
        info!(
            finished = finished.0,
            steps,
            best_clan = survivors.best.clan().0,
            second_clan = survivors.second.clan().0,
            population,
            "epoch rolled over"
        );
        self.publish_counters();
        Ok(TickEvents {
            tick: self.tick,
            epoch: self.epoch,
            population,
            recolored,
            births: 0,
            deaths: 0,
            epoch_rolled: true,
        })
    }

    /// Rebuild the write buffer: walls only, fresh food, then the six cohorts.
    fn reseed(&mut self, plan: &BreedingPlan) {
        self.write.clone_from(&self.read);
        self.write.clear_to_walls();
        let sweeps = self.config.placement_max_sweeps;
        scatter(
            &mut self.write,
            &mut self.rng,
            self.config.reseed_food,
            sweeps,
            Cell::food,
        );
        let health = self.config.initial_health;
        for seed in &plan.seeds {
            let placed = scatter(
                &mut self.write,
                &mut self.rng,
                self.config.cohort_size,
                sweeps,
                |slot| {
                    Cell::organism(
                        slot,
                        Organism::new(seed.brain.clone(), health, seed.clan, seed.cohort),
                    )
                },
            );
            debug!(cohort = seed.cohort.label(), clan = seed.clan.0, placed, "cohort placed");
        }
    }

    /// Recolor every slot that differs between the buffers, then swap them.
    fn commit(&mut self) -> usize {
        let mut recolored = 0;
        for cell in self.read.changed(&self.write) {
            if let Err(err) = self.display.recolor(cell.slot(), cell.color()) {
                warn!(slot = cell.slot().0, error = %err, "failed to recolor slot");
            }
            recolored += 1;
        }
        std::mem::swap(&mut self.read, &mut self.write);
        if let Err(err) = self.display.present() {
            warn!(error = %err, "failed to present frame");
        }
        recolored
    }

    /// Epoch goes last so a display reacting to it sees the other counters current.
    fn publish_counters(&mut self) {
        let population = self.population() as u64;
        self.display.set_counter(Counter::Population, population);
        self.display.set_counter(Counter::PastSteps, self.past_steps);
        self.display.set_counter(Counter::Steps, self.tick.0);
        self.display.set_counter(Counter::Epoch, self.epoch.0);
    }

    /// Put `organism` on an empty position between ticks.
    pub fn insert_organism(&mut self, pos: Position, organism: Organism) -> Result<(), WorldError> {
        let slot = self.vacant_slot(pos)?;
        if organism.is_dead() {
            return Err(WorldError::Lifeless(pos));
        }
        self.place(pos, Cell::organism(slot, organism));
        self.lifecycle
            .population_mut()
            .reset(self.read.count_organisms());
        Ok(())
    }

    /// Put fresh food on an empty position between ticks.
    pub fn insert_food(&mut self, pos: Position) -> Result<(), WorldError> {
        let slot = self.vacant_slot(pos)?;
        self.place(pos, Cell::food(slot));
        Ok(())
    }

    fn vacant_slot(&self, pos: Position) -> Result<SlotId, WorldError> {
        let cell = self.read.get(pos).ok_or(WorldError::OutOfBounds(pos))?;
        if cell.tag() != CellTag::Empty || cell.is_solid() {
            return Err(WorldError::Occupied(pos));
        }
        Ok(cell.slot())
    }

    fn place(&mut self, pos: Position, cell: Cell) {
        if let Err(err) = self.display.recolor(cell.slot(), cell.color()) {
            warn!(slot = cell.slot().0, error = %err, "failed to recolor slot");
        }
        self.read.set(pos, cell);
    }

    /// Register an extra observer for births and deaths.
    pub fn subscribe(&mut self, observer: Box<dyn LifecycleObserver>) {
        self.lifecycle.subscribe(observer);
    }

    /// Next pending operator request from the display.
    pub fn poll_control(&mut self) -> Option<ControlSignal> {
        self.display.poll_control()
    }

    /// Sensor vector the organism at `pos` would see right now.
    #[must_use]
    pub fn sensors_at(&self, pos: Position) -> Option<Sensors> {
        let organism = self.read.get(pos)?.as_organism()?;
        Some(sense(&self.read, pos, organism))
    }

    #[must_use]
    pub const fn config(&self) -> &GrazersConfig {
        &self.config
    }

    /// Steps taken in the current epoch.
    #[must_use]
    pub const fn tick(&self) -> Tick {
        self.tick
    }

    /// Ticks taken since genesis, across epochs.
    #[must_use]
    pub const fn total_ticks(&self) -> u64 {
        self.total_ticks
    }

    #[must_use]
    pub const fn epoch(&self) -> Epoch {
        self.epoch
    }

    /// Length of the previous epoch in steps.
    #[must_use]
    pub const fn past_steps(&self) -> u64 {
        self.past_steps
    }

    #[must_use]
    pub const fn population(&self) -> usize {
        self.lifecycle.population().live()
    }

    /// Committed grid.
    #[must_use]
    pub const fn grid(&self) -> &Grid {
        &self.read
    }

    #[must_use]
    pub const fn graveyard(&self) -> &Graveyard {
        self.lifecycle.graveyard()
    }
}

/// One slot per position, created row-major in the empty color.
fn blank_grid(config: &GrazersConfig, display: &mut dyn DisplaySink) -> Result<Grid, WorldError> {
    let (width, height) = (config.grid_width, config.grid_height);
    let mut cells = Vec::with_capacity(width * height);
    for y in 0..height {
        for x in 0..width {
            let rect = Rect::for_cell(x as u32, y as u32, config.cell_pixels);
            let slot = display
                .create_slot(rect, Color::EMPTY)
                .map_err(WorldError::Genesis)?;
            cells.push(Cell::empty(slot));
        }
    }
    Grid::from_cells(width, height, cells)
        .ok_or(WorldError::InvalidConfig("grid dimensions do not match cell count"))
}

/// Neighbour costs clockwise from the top-left, then scaled health.
fn sense(grid: &Grid, at: Position, organism: &Organism) -> Sensors {
    let mut sensors = [0.0; SENSOR_COUNT];
    sensors[..8].copy_from_slice(&grid.neighbor_costs(at));
    sensors[8] = organism.health() as f32 / HEALTH_SENSOR_SCALE;
    sensors
}
