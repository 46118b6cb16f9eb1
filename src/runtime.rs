//! Event pump for the profile screen.
//!
//! Terminal input is read on its own thread and queued; the draw loop pulls
//! one event per step and only repaints when the screen would look different.

use std::sync::mpsc::{self, Receiver, Sender};
use std::time::Duration;

use crossterm::event::{self, Event as CtEvent, KeyEvent, KeyEventKind};

use crate::profile::{ClearAction, ProfileOutcome};
use crate::App;

#[derive(Clone, Debug)]
pub enum AppEvent {
    Key(KeyEvent),
    Resize,
    /// No input arrived within the tick interval
    Tick,
}

/// Queue of pending terminal events
pub struct EventQueue {
    rx: Receiver<AppEvent>,
}

impl EventQueue {
    /// Spawn a reader thread feeding crossterm key presses and resizes
    pub fn terminal() -> Self {
        let (tx, rx) = mpsc::channel();
        std::thread::spawn(move || read_terminal(&tx));
        Self { rx }
    }

    /// Events pushed by hand, for headless driving
    pub fn from_channel(rx: Receiver<AppEvent>) -> Self {
        Self { rx }
    }

    fn next(&self, timeout: Duration) -> AppEvent {
        // A closed queue behaves like an idle one
        self.rx.recv_timeout(timeout).unwrap_or(AppEvent::Tick)
    }
}

fn read_terminal(tx: &Sender<AppEvent>) {
    loop {
        let event = match event::read() {
            // Windows reports releases too
            Ok(CtEvent::Key(key)) if key.kind == KeyEventKind::Press => AppEvent::Key(key),
            Ok(CtEvent::Resize(_, _)) => AppEvent::Resize,
            Ok(_) => continue,
            Err(e) => {
                tracing::warn!(error = %e, "terminal event reader stopped");
                return;
            }
        };
        if tx.send(event).is_err() {
            return;
        }
    }
}

/// Everything on the profile screen that a key press can change
#[derive(Debug, Clone, PartialEq, Eq)]
struct ScreenState {
    visible: usize,
    total_games: usize,
    high_score: i64,
    pending: Option<ClearAction>,
    scroll_offset: usize,
}

impl ScreenState {
    fn of(app: &App) -> Self {
        let stats = app.stats();
        Self {
            visible: app.scores.visible().len(),
            total_games: stats.total_games,
            high_score: stats.high_score,
            pending: app.profile.pending,
            scroll_offset: app.profile.scroll_offset,
        }
    }
}

/// Result of feeding one event to the app
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Step {
    pub outcome: ProfileOutcome,
    pub redraw: bool,
}

pub struct Runner {
    events: EventQueue,
    tick: Duration,
}

impl Runner {
    pub fn new(events: EventQueue, tick: Duration) -> Self {
        Self { events, tick }
    }

    /// Wait up to one tick for input and apply it to `app`
    pub fn step(&self, app: &mut App) -> Step {
        let event = self.events.next(self.tick);
        let before = ScreenState::of(app);
        let resized = matches!(event, AppEvent::Resize);

        let outcome = app.on_event(event);
        Step {
            outcome,
            redraw: resized || ScreenState::of(app) != before,
        }
    }
}
