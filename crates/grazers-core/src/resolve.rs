//! Per-organism action resolution.
//!
//! Every live organism is run through an ordered chain of resolvers once per
//! tick. Resolvers read solidity from the read buffer, reserve what they claim
//! there, and write results into the write buffer. The first resolver that
//! fires ends the chain for that organism.

use crate::Position;
use crate::cell::{Cell, MoveIntent, Organism};
use crate::grid::{Grid, NEIGHBOR_OFFSETS};
use crate::lifecycle::Lifecycle;

/// Tunables consulted while resolving actions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rules {
    /// Health gained from one successful bite.
    pub bite_heal: i32,
    /// Organisms need strictly more health than this to reproduce.
    pub reproduction_floor: i32,
}

impl Default for Rules {
    fn default() -> Self {
        Self {
            bite_heal: 20,
            reproduction_floor: 4,
        }
    }
}

/// Buffers and observers a resolver operates on.
pub struct ResolveContext<'a> {
    pub read: &'a mut Grid,
    pub write: &'a mut Grid,
    pub lifecycle: &'a mut Lifecycle,
    pub rules: Rules,
}

impl ResolveContext<'_> {
    /// Write `organism` back at `at` in the write buffer, keeping the position's slot.
    pub fn keep(&mut self, at: Position, organism: Box<Organism>) {
        let slot = self.read.cell(at).slot();
        self.write.set(at, Cell::organism(slot, organism));
    }
}

/// Result of offering an organism to one resolver.
#[derive(Debug)]
pub enum Outcome {
    /// The resolver fired and wrote the organism's final state.
    Resolved,
    /// The resolver did not apply; the organism moves on to the next stage.
    Pass(Box<Organism>),
}

/// One stage of the resolution chain.
pub trait Resolver: Send + Sync {
    fn name(&self) -> &'static str;

    fn resolve(
        &self,
        ctx: &mut ResolveContext<'_>,
        at: Position,
        intent: MoveIntent,
        actor: Box<Organism>,
    ) -> Outcome;
}

/// Converts dead organisms into food on their own position.
#[derive(Debug, Default, Clone, Copy)]
pub struct DeathResolver;

impl Resolver for DeathResolver {
    fn name(&self) -> &'static str {
        "death"
    }

    fn resolve(
        &self,
        ctx: &mut ResolveContext<'_>,
        at: Position,
        _intent: MoveIntent,
        actor: Box<Organism>,
    ) -> Outcome {
        if !actor.is_dead() {
            return Outcome::Pass(actor);
        }
        ctx.lifecycle.death(&actor);
        let slot = ctx.read.cell(at).slot();
        ctx.write.set(at, Cell::food(slot));
        Outcome::Resolved
    }
}

/// Moves an organism one step when the destination is free.
#[derive(Debug, Default, Clone, Copy)]
pub struct MoveResolver;

impl Resolver for MoveResolver {
    fn name(&self) -> &'static str {
        "move"
    }

    fn resolve(
        &self,
        ctx: &mut ResolveContext<'_>,
        at: Position,
        intent: MoveIntent,
        actor: Box<Organism>,
    ) -> Outcome {
        let Some((dx, dy)) = intent.displacement() else {
            return Outcome::Pass(actor);
        };
        let dest = ctx.read.wrap(at, dx, dy);
        let dest_cell = ctx.read.cell_mut(dest);
        if dest_cell.is_solid() {
            ctx.keep(at, actor);
            return Outcome::Resolved;
        }
        dest_cell.reserve();
        let dest_slot = dest_cell.slot();
        let source_slot = ctx.read.cell(at).slot();
        ctx.write.set(at, Cell::empty(source_slot));
        ctx.write.set(dest, Cell::organism(dest_slot, actor));
        Outcome::Resolved
    }
}

/// Eats edible food on the bitten position.
#[derive(Debug, Default, Clone, Copy)]
pub struct BiteResolver;

impl Resolver for BiteResolver {
    fn name(&self) -> &'static str {
        "bite"
    }

    fn resolve(
        &self,
        ctx: &mut ResolveContext<'_>,
        at: Position,
        intent: MoveIntent,
        mut actor: Box<Organism>,
    ) -> Outcome {
        let Some((dx, dy)) = intent.bite_offset() else {
            return Outcome::Pass(actor);
        };
        let target = ctx.read.wrap(at, dx, dy);
        let target_cell = ctx.read.cell_mut(target);
        if target_cell.eat() {
            let slot = target_cell.slot();
            actor.got_food(ctx.rules.bite_heal);
            ctx.write.set(target, Cell::empty(slot));
        }
        ctx.keep(at, actor);
        Outcome::Resolved
    }
}

/// Splits a healthy organism into the first free neighbouring position.
#[derive(Debug, Default, Clone, Copy)]
pub struct ReproduceResolver;

impl Resolver for ReproduceResolver {
    fn name(&self) -> &'static str {
        "reproduce"
    }

    fn resolve(
        &self,
        ctx: &mut ResolveContext<'_>,
        at: Position,
        intent: MoveIntent,
        mut actor: Box<Organism>,
    ) -> Outcome {
        if !intent.reproduce || !actor.can_reproduce(ctx.rules.reproduction_floor) {
            return Outcome::Pass(actor);
        }
        let free = NEIGHBOR_OFFSETS
            .iter()
            .map(|&(dx, dy)| ctx.read.wrap(at, dx, dy))
            .find(|&pos| !ctx.read.cell(pos).is_solid());
        let Some(free) = free else {
            ctx.keep(at, actor);
            return Outcome::Resolved;
        };

        let free_cell = ctx.read.cell_mut(free);
        free_cell.reserve();
        let free_slot = free_cell.slot();
        let child = actor.reproduce();
        ctx.lifecycle.birth(&child);
        ctx.keep(at, actor);
        ctx.write.set(free, Cell::organism(free_slot, child));
        Outcome::Resolved
    }
}

/// Ordered resolver chain.
pub struct Pipeline {
    stages: Vec<Box<dyn Resolver>>,
}

impl std::fmt::Debug for Pipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list()
            .entries(self.stages.iter().map(|stage| stage.name()))
            .finish()
    }
}

impl Default for Pipeline {
    fn default() -> Self {
        Self::standard()
    }
}

impl Pipeline {
    /// Death, move, bite, reproduce.
    #[must_use]
    pub fn standard() -> Self {
        Self {
            stages: vec![
                Box::new(DeathResolver),
                Box::new(MoveResolver),
                Box::new(BiteResolver),
                Box::new(ReproduceResolver),
            ],
        }
    }

    pub fn stage_names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.stages.iter().map(|stage| stage.name())
    }

    /// Resolve the organism that stood at `at`, consuming its pending intent.
    ///
    /// An organism no stage claims is written back where it stood.
    pub fn run(&self, ctx: &mut ResolveContext<'_>, at: Position, mut actor: Box<Organism>) {
        let intent = actor.take_intent();
        for stage in &self.stages {
            match stage.resolve(ctx, at, intent, actor) {
                Outcome::Resolved => return,
                Outcome::Pass(next) => actor = next,
            }
        }
        ctx.keep(at, actor);
    }
}
