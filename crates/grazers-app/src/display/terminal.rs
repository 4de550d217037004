//! Full-screen terminal display built on ratatui.

use std::{
    io::{self, Stdout},
    time::{Duration, Instant},
};

use anyhow::{Context, Result};
use crossterm::{
    event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers},
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use grazers_core::{Color, ControlSignal, Counter, DisplaySink, Rect, SinkError, SlotId};
use ratatui::{
    Frame, Terminal,
    backend::CrosstermBackend,
    layout::{Constraint, Direction, Layout},
    style::{Color as TermColor, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
};

use super::headless::CounterValues;

const DRAW_INTERVAL: Duration = Duration::from_millis(33);
const SIDEBAR_WIDTH: u16 = 26;
const CELL_GLYPH: &str = "█";

#[derive(Debug, Clone, Copy)]
struct SlotCell {
    col: u16,
    row: u16,
    color: Color,
}

/// Renders the grid one character per cell, clipped to the terminal.
pub struct TerminalDisplay {
    terminal: Terminal<CrosstermBackend<Stdout>>,
    slots: Vec<SlotCell>,
    columns: u16,
    rows: u16,
    counters: CounterValues,
    paused: bool,
    slow_mode: bool,
    last_draw: Option<Instant>,
}

impl TerminalDisplay {
    /// Switch the terminal to raw mode on the alternate screen.
    pub fn new() -> Result<Self> {
        enable_raw_mode().context("failed to enable raw mode")?;
        let mut terminal = open_or_restore(Self::open_screen, restore_screen)?;
        terminal.hide_cursor().ok();
        Ok(Self {
            terminal,
            slots: Vec::new(),
            columns: 0,
            rows: 0,
            counters: CounterValues::default(),
            paused: false,
            slow_mode: false,
            last_draw: None,
        })
    }

    fn open_screen() -> Result<Terminal<CrosstermBackend<Stdout>>> {
        let mut stdout = io::stdout();
        execute!(stdout, EnterAlternateScreen).context("failed to enter alternate screen")?;
        Terminal::new(CrosstermBackend::new(stdout)).context("failed to build terminal backend")
    }

    fn redraw(&mut self) -> Result<(), SinkError> {
        let view = View {
            slots: &self.slots,
            columns: self.columns,
            rows: self.rows,
            counters: self.counters,
            paused: self.paused,
            slow_mode: self.slow_mode,
        };
        self.terminal
            .draw(|frame| view.draw(frame))
            .map_err(|err| SinkError::Display(err.to_string()))?;
        self.last_draw = Some(Instant::now());
        Ok(())
    }

    fn signal_for(&mut self, key: KeyEvent) -> Option<ControlSignal> {
        let signal = signal_of(key)?;
        match signal {
            ControlSignal::Pause => self.paused = true,
            ControlSignal::Resume => self.paused = false,
            ControlSignal::ToggleSlowMode => self.slow_mode = !self.slow_mode,
            ControlSignal::Stop => {}
        }
        Some(signal)
    }
}

impl DisplaySink for TerminalDisplay {
    fn create_slot(&mut self, rect: Rect, color: Color) -> Result<SlotId, SinkError> {
        let cell_px = rect.x2.saturating_sub(rect.x1).max(1);
        let col = u16::try_from(rect.x1 / cell_px)
            .map_err(|_| SinkError::Display("grid too wide for the terminal".into()))?;
        let row = u16::try_from(rect.y1 / cell_px)
            .map_err(|_| SinkError::Display("grid too tall for the terminal".into()))?;
        self.columns = self.columns.max(col + 1);
        self.rows = self.rows.max(row + 1);
        self.slots.push(SlotCell { col, row, color });
        Ok(SlotId(self.slots.len() as u64 - 1))
    }

    fn recolor(&mut self, slot: SlotId, color: Color) -> Result<(), SinkError> {
        let cell = usize::try_from(slot.0)
            .ok()
            .and_then(|idx| self.slots.get_mut(idx))
            .ok_or_else(|| SinkError::Display(format!("unknown slot {}", slot.0)))?;
        cell.color = color;
        Ok(())
    }

    fn set_counter(&mut self, counter: Counter, value: u64) {
        match counter {
            Counter::Population => self.counters.population = value,
            Counter::Epoch => self.counters.epoch = value,
            Counter::Steps => self.counters.steps = value,
            Counter::PastSteps => self.counters.past_steps = value,
        }
    }

    fn poll_control(&mut self) -> Option<ControlSignal> {
        while event::poll(Duration::ZERO).unwrap_or(false) {
            let Ok(Event::Key(key)) = event::read() else {
                continue;
            };
            if let Some(signal) = self.signal_for(key) {
                if let Err(err) = self.redraw() {
                    tracing::warn!(error = %err, "failed to redraw after control key");
                }
                return Some(signal);
            }
        }
        None
    }

    fn present(&mut self) -> Result<(), SinkError> {
        if self
            .last_draw
            .is_some_and(|last| last.elapsed() < DRAW_INTERVAL)
        {
            return Ok(());
        }
        self.redraw()
    }
}

impl Drop for TerminalDisplay {
    fn drop(&mut self) {
        self.terminal.show_cursor().ok();
        restore_screen();
    }
}

fn signal_of(key: KeyEvent) -> Option<ControlSignal> {
    if key.kind != KeyEventKind::Press {
        return None;
    }
    let signal = match (key.code, key.modifiers) {
        (KeyCode::Esc | KeyCode::Char('q' | 'Q'), _)
        | (KeyCode::Char('c'), KeyModifiers::CONTROL) => ControlSignal::Stop,
        (KeyCode::Char('p' | 'P' | ' '), _) => ControlSignal::Pause,
        (KeyCode::Char('r' | 'R'), _) => ControlSignal::Resume,
        (KeyCode::Char('s' | 'S'), _) => ControlSignal::ToggleSlowMode,
        _ => return None,
    };
    Some(signal)
}

/// Run `open`; if it fails, undo whatever was set up before it.
fn open_or_restore<T>(open: impl FnOnce() -> Result<T>, restore: impl FnOnce()) -> Result<T> {
    open().inspect_err(|_| restore())
}

/// Leave raw mode and the alternate screen; safe to call when only raw mode was entered.
fn restore_screen() {
    if let Err(err) = disable_raw_mode() {
        tracing::error!(?err, "failed to disable raw mode");
    }
    if let Err(err) = execute!(io::stdout(), LeaveAlternateScreen) {
        tracing::error!(?err, "failed to leave alternate screen");
    }
}

struct View<'a> {
    slots: &'a [SlotCell],
    columns: u16,
    rows: u16,
    counters: CounterValues,
    paused: bool,
    slow_mode: bool,
}

impl View<'_> {
    fn draw(&self, frame: &mut Frame<'_>) {
        let body = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Min(0), Constraint::Length(SIDEBAR_WIDTH)])
            .split(frame.area());
        self.draw_grid(frame, body[0]);
        self.draw_sidebar(frame, body[1]);
    }

    fn draw_grid(&self, frame: &mut Frame<'_>, area: ratatui::layout::Rect) {
        let block = Block::default()
            .title(format!(" Grazers {}×{} ", self.columns, self.rows))
            .borders(Borders::ALL);
        let inner = block.inner(area);
        frame.render_widget(block, area);

        let width = inner.width.min(self.columns) as usize;
        let height = inner.height.min(self.rows) as usize;
        if width == 0 || height == 0 {
            return;
        }
        let mut colors = vec![Color::EMPTY; width * height];
        for slot in self.slots {
            let (col, row) = (slot.col as usize, slot.row as usize);
            if col < width && row < height {
                colors[row * width + col] = slot.color;
            }
        }
        let lines: Vec<Line<'_>> = colors
            .chunks(width)
            .map(|row| {
                Line::from(
                    row.iter()
                        .map(|c| Span::styled(CELL_GLYPH, Style::default().fg(term_color(*c))))
                        .collect::<Vec<_>>(),
                )
            })
            .collect();
        frame.render_widget(Paragraph::new(lines), inner);
    }

    fn draw_sidebar(&self, frame: &mut Frame<'_>, area: ratatui::layout::Rect) {
        let label = Style::default().add_modifier(Modifier::BOLD);
        let status = if self.paused {
            Span::styled(" PAUSED ", Style::default().fg(TermColor::Black).bg(TermColor::Yellow))
        } else {
            Span::styled(" RUNNING ", Style::default().fg(TermColor::Black).bg(TermColor::Green))
        };
        let mut lines = vec![
            Line::from(vec![status]),
            Line::from(if self.slow_mode { "slow mode" } else { "" }),
            Line::default(),
        ];
        for (counter, value) in [
            (Counter::Population, self.counters.population),
            (Counter::Epoch, self.counters.epoch),
            (Counter::Steps, self.counters.steps),
            (Counter::PastSteps, self.counters.past_steps),
        ] {
            lines.push(Line::from(vec![
                Span::styled(format!("{:<11}", counter.label()), label),
                Span::raw(value.to_string()),
            ]));
        }
        lines.push(Line::default());
        lines.push(Line::from("p pause   r resume"));
        lines.push(Line::from("s slow    q quit"));
        let paragraph =
            Paragraph::new(lines).block(Block::default().title(" Stats ").borders(Borders::ALL));
        frame.render_widget(paragraph, area);
    }
}

fn term_color(color: Color) -> TermColor {
    TermColor::Rgb(color.r, color.g, color.b)
}
