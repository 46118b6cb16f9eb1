//! Profile screen behaviour: score cards, statistics and confirm-gated clears.
//!
//! Rendering lives in `ui`; this module has no terminal I/O so it can be
//! driven headlessly.

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

use crate::persist::PendingWrite;
use crate::score::{ScoreEntry, ScoreStore};
use crate::session::SessionStore;

pub const DEFAULT_OPERATION_LABEL: &str = "+ | - | * | ÷";
pub const EMPTY_SCORES_MESSAGE: &str = "No scores recorded.";
pub const THANK_YOU_MESSAGE: &str = "Thanks for playing MathOff! Keep practicing and having fun!";

/// The two destructive actions offered by the profile screen
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum_macros::Display)]
pub enum ClearAction {
    #[strum(serialize = "clear-recent")]
    Recent,
    #[strum(serialize = "clear-all")]
    All,
}

impl ClearAction {
    pub fn title(self) -> &'static str {
        match self {
            ClearAction::Recent => "Clear score list?",
            ClearAction::All => "Delete everything?",
        }
    }

    pub fn message(self) -> &'static str {
        match self {
            ClearAction::Recent => {
                "This removes only the visible cards. Your statistics stay saved."
            }
            ClearAction::All => "This deletes all data, including statistics and history.",
        }
    }

    pub fn confirm_label(self) -> &'static str {
        match self {
            ClearAction::Recent => "Clear",
            ClearAction::All => "Delete all",
        }
    }

    pub fn is_destructive(self) -> bool {
        matches!(self, ClearAction::All)
    }

    /// Run the action against the store
    pub fn apply(self, scores: &mut ScoreStore) -> PendingWrite {
        match self {
            ClearAction::Recent => scores.clear_recent_scores(),
            ClearAction::All => scores.clear_scores(),
        }
    }
}

/// What the caller should do after a key was handled
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProfileOutcome {
    Continue,
    /// Session token was cleared; hand off to the login flow
    Logout,
    Quit,
}

/// Text lines of one score card
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScoreCard {
    pub title: String,
    pub detail: String,
    pub operation: String,
    pub score: String,
}

/// Pure presenter for a single visible score, `index` is zero-based
pub fn present_card(index: usize, entry: &ScoreEntry) -> ScoreCard {
    let detail = match (&entry.mode, entry.level) {
        (Some(mode), _) if !mode.is_empty() => format!("Mode: {mode}"),
        (_, Some(level)) => format!("Level: {level}"),
        (_, None) => "Level: -".to_string(),
    };

    let operation = match entry.operation.as_deref() {
        Some(op) if !op.is_empty() => op,
        _ => DEFAULT_OPERATION_LABEL,
    };

    let plural = if entry.points != 1 { "s" } else { "" };

    ScoreCard {
        title: format!("Game {}", index + 1),
        detail,
        operation: format!("Operation: {operation}"),
        score: format!("Score: {} point{plural}", entry.points),
    }
}

#[derive(Debug, Default)]
pub struct ProfileScreen {
    pub pending: Option<ClearAction>,
    pub scroll_offset: usize,
}

impl ProfileScreen {
    pub fn new() -> Self {
        Self::default()
    }

    /// Clear buttons are only offered while there are visible cards
    pub fn clear_available(scores: &ScoreStore) -> bool {
        !scores.visible().is_empty()
    }

    /// Open the confirmation dialog. Returns false if the action isn't offered.
    pub fn request_clear(&mut self, action: ClearAction, scores: &ScoreStore) -> bool {
        if !Self::clear_available(scores) {
            return false;
        }
        self.pending = Some(action);
        true
    }

    pub fn cancel(&mut self) {
        self.pending = None;
    }

    /// Apply the pending action, if any
    pub fn confirm(&mut self, scores: &mut ScoreStore) -> Option<PendingWrite> {
        let action = self.pending.take()?;
        tracing::info!(%action, "clear confirmed");
        self.scroll_offset = 0;
        Some(action.apply(scores))
    }

    /// End the session. Storage failures are logged; the caller navigates away regardless.
    pub fn logout(&mut self, session: &SessionStore) -> ProfileOutcome {
        if let Err(e) = session.clear_token() {
            tracing::error!(error = %e, "failed to clear session token");
        }
        self.pending = None;
        ProfileOutcome::Logout
    }

    fn max_scroll(scores: &ScoreStore) -> usize {
        scores.visible().len().saturating_sub(1)
    }

    pub fn on_key(
        &mut self,
        key: KeyEvent,
        scores: &mut ScoreStore,
        session: &SessionStore,
    ) -> ProfileOutcome {
        if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
            return ProfileOutcome::Quit;
        }

        // Confirmation dialog is modal
        if self.pending.is_some() {
            match key.code {
                KeyCode::Char('y') | KeyCode::Enter => {
                    // fire-and-forget; failures are logged by the persister
                    let _ = self.confirm(scores);
                }
                KeyCode::Char('n') | KeyCode::Esc => self.cancel(),
                _ => {}
            }
            return ProfileOutcome::Continue;
        }

        match key.code {
            KeyCode::Char('q') | KeyCode::Esc => return ProfileOutcome::Quit,
            KeyCode::Char('l') => return self.logout(session),
            KeyCode::Char('r') => {
                self.request_clear(ClearAction::Recent, scores);
            }
            KeyCode::Char('x') => {
                self.request_clear(ClearAction::All, scores);
            }
            KeyCode::Up => {
                self.scroll_offset = self.scroll_offset.saturating_sub(1);
            }
            KeyCode::Down => {
                self.scroll_offset = (self.scroll_offset + 1).min(Self::max_scroll(scores));
            }
            KeyCode::PageUp => {
                self.scroll_offset = self.scroll_offset.saturating_sub(10);
            }
            KeyCode::PageDown => {
                self.scroll_offset = (self.scroll_offset + 10).min(Self::max_scroll(scores));
            }
            KeyCode::Home => {
                self.scroll_offset = 0;
            }
            _ => {}
        }
        ProfileOutcome::Continue
    }
}
