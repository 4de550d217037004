use grazers_core::{Color, Counter, DisplaySink, Rect, SinkError, SlotId};
use tracing::info;

/// Counters as last published by the world.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CounterValues {
    pub population: u64,
    pub epoch: u64,
    pub steps: u64,
    pub past_steps: u64,
}

impl CounterValues {
    fn set(&mut self, counter: Counter, value: u64) {
        match counter {
            Counter::Population => self.population = value,
            Counter::Epoch => self.epoch = value,
            Counter::Steps => self.steps = value,
            Counter::PastSteps => self.past_steps = value,
        }
    }
}

/// What the headless display reported when an epoch began.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EpochReport {
    pub epoch: u64,
    pub past_steps: u64,
    pub population: u64,
}

/// Display without a screen: counts what it is asked to draw and reports epochs through tracing.
#[derive(Debug, Default)]
pub struct HeadlessDisplay {
    slots: u64,
    recolors: u64,
    frames: u64,
    counters: CounterValues,
    reported_epoch: u64,
    reports: Vec<EpochReport>,
}

impl HeadlessDisplay {
    #[must_use]
    pub const fn slots(&self) -> u64 {
        self.slots
    }

    #[must_use]
    pub const fn recolors(&self) -> u64 {
        self.recolors
    }

    #[must_use]
    pub const fn frames(&self) -> u64 {
        self.frames
    }

    #[must_use]
    pub const fn counters(&self) -> CounterValues {
        self.counters
    }

    #[must_use]
    pub fn reports(&self) -> &[EpochReport] {
        &self.reports
    }
}

impl DisplaySink for HeadlessDisplay {
    fn create_slot(&mut self, _rect: Rect, _color: Color) -> Result<SlotId, SinkError> {
        let slot = SlotId(self.slots);
        self.slots += 1;
        Ok(slot)
    }

    fn recolor(&mut self, slot: SlotId, _color: Color) -> Result<(), SinkError> {
        if slot.0 >= self.slots {
            return Err(SinkError::Display(format!("unknown slot {}", slot.0)));
        }
        self.recolors += 1;
        Ok(())
    }

    fn set_counter(&mut self, counter: Counter, value: u64) {
        self.counters.set(counter, value);
        if counter == Counter::Epoch && value != self.reported_epoch {
            self.reported_epoch = value;
            let report = EpochReport {
                epoch: value,
                past_steps: self.counters.past_steps,
                population: self.counters.population,
            };
            info!(
                epoch = report.epoch,
                past_steps = report.past_steps,
                population = report.population,
                "epoch started"
            );
            self.reports.push(report);
        }
    }

    fn present(&mut self) -> Result<(), SinkError> {
        self.frames += 1;
        Ok(())
    }
}
