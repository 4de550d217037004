//! Display front-ends the world can draw on.

pub mod headless;
pub mod terminal;

pub use headless::{CounterValues, EpochReport, HeadlessDisplay};
pub use terminal::TerminalDisplay;
