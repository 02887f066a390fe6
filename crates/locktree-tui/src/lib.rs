mod keymap;
mod theme;
mod tree_flow;
mod ui;

use std::io::{Stdout, stdout};
use std::time::Duration;

use anyhow::{Context, Result, anyhow};
use crossterm::cursor::{Hide, Show};
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use crossterm::execute;
use crossterm::terminal::{
    EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode,
};
use locktree_app::{App, LockController};
use ratatui::Terminal;
use ratatui::backend::CrosstermBackend;
use ratatui::layout::{Constraint, Direction, Layout, Rect};

use crate::tree_flow::{FlowSignal, TreeScreen};
use crate::ui::loading::SystemLockWorker;

/// Lock changes made during one interactive session.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TreeSummary {
    pub applied: usize,
    pub failed: usize,
}

const TICK_RATE: Duration = Duration::from_millis(120);

pub(crate) struct TerminalSession {
    terminal: Terminal<CrosstermBackend<Stdout>>,
}

/// Terminal state changed on entry, in the order it is applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Stage {
    RawMode,
    AltScreen,
}

impl TerminalSession {
    pub(crate) fn enter() -> Result<Self> {
        let mut completed = Vec::with_capacity(2);
        match Self::setup(&mut completed) {
            Ok(terminal) => Ok(Self { terminal }),
            Err(error) => Err(unwind(error, &completed, undo_stage)),
        }
    }

    fn setup(completed: &mut Vec<Stage>) -> Result<Terminal<CrosstermBackend<Stdout>>> {
        enable_raw_mode().context("failed to enable raw mode")?;
        completed.push(Stage::RawMode);

        let mut out = stdout();
        execute!(out, EnterAlternateScreen, Hide).context("failed to enter alternate screen")?;
        completed.push(Stage::AltScreen);

        Terminal::new(CrosstermBackend::new(stdout())).context("failed to create terminal backend")
    }

    pub(crate) fn draw<F>(&mut self, draw_fn: F) -> Result<()>
    where
        F: FnOnce(&mut ratatui::Frame<'_>),
    {
        self.terminal
            .draw(draw_fn)
            .context("failed to render terminal")?;
        Ok(())
    }

    pub(crate) fn autoresize(&mut self) -> Result<()> {
        self.terminal
            .autoresize()
            .context("failed to autoresize terminal")
    }
}

impl Drop for TerminalSession {
    fn drop(&mut self) {
        let _ = undo_stage(Stage::AltScreen);
        let _ = undo_stage(Stage::RawMode);
    }
}

fn undo_stage(stage: Stage) -> Result<()> {
    match stage {
        Stage::RawMode => disable_raw_mode().context("failed to disable raw mode"),
        Stage::AltScreen => {
            let mut out = stdout();
            execute!(out, Show, LeaveAlternateScreen).context("failed to leave alternate screen")
        }
    }
}

/// Undoes `completed` newest first. Cleanup failures are appended to the
/// setup error rather than replacing it.
fn unwind<Undo>(setup_error: anyhow::Error, completed: &[Stage], mut undo: Undo) -> anyhow::Error
where
    Undo: FnMut(Stage) -> Result<()>,
{
    let failures: Vec<String> = completed
        .iter()
        .rev()
        .filter_map(|stage| undo(*stage).err())
        .map(|error| format!("{error:#}"))
        .collect();

    if failures.is_empty() {
        setup_error
    } else {
        anyhow!(
            "{setup_error:#}\nterminal cleanup failed: {}",
            failures.join("; ")
        )
    }
}

pub(crate) fn is_ctrl_c(key: KeyEvent) -> bool {
    key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c')
}

/// Opens the lock tree for `controller` and blocks until the user quits.
pub fn run_root(app: &App<'_>, controller: LockController) -> Result<TreeSummary> {
    let mut session = TerminalSession::enter()?;
    let mut screen = TreeScreen::new(controller, Box::new(SystemLockWorker));

    loop {
        session.draw(|frame| screen.render(frame))?;

        let has_event = event::poll(TICK_RATE).context("failed to poll terminal event")?;
        if !has_event {
            screen.on_tick();
            continue;
        }

        let event = event::read().context("failed to read terminal event")?;
        let key = match event {
            Event::Resize(_, _) => {
                session.autoresize()?;
                continue;
            }
            Event::Key(key) if matches!(key.kind, KeyEventKind::Press) => key,
            _ => continue,
        };

        if is_ctrl_c(key) {
            return Ok(screen.summary());
        }

        if screen.on_key(key, app.runner) == FlowSignal::Exit {
            return Ok(screen.summary());
        }

        if screen.is_busy() {
            screen.on_tick();
        }
    }
}

pub(crate) fn centered_rect(percent_x: u16, percent_y: u16, area: Rect) -> Rect {
    let pct_x = percent_x.min(100);
    let pct_y = percent_y.min(100);

    let [_, vertical, _] = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - pct_y) / 2),
            Constraint::Percentage(pct_y),
            Constraint::Percentage((100 - pct_y) / 2),
        ])
        .areas(area);
    let [_, horizontal, _] = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - pct_x) / 2),
            Constraint::Percentage(pct_x),
            Constraint::Percentage((100 - pct_x) / 2),
        ])
        .areas(vertical);
    horizontal
}
