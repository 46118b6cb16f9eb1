use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::persist::{PendingWrite, ScorePersister};
use crate::stats::ProfileStats;
use crate::storage::KeyValueStore;

pub const VISIBLE_SCORES_KEY: &str = "userScores";
pub const HISTORY_KEY: &str = "userHistorico";

/// One completed game round. Immutable once recorded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScoreEntry {
    pub points: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub level: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub operation: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mode: Option<String>,
}

impl ScoreEntry {
    pub fn new(
        points: i64,
        level: Option<i64>,
        operation: Option<String>,
        mode: Option<String>,
    ) -> Self {
        Self {
            points,
            level,
            operation,
            mode,
        }
    }
}

/// Visible cards and the full history, both in chronological order
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScoreState {
    pub visible: Vec<ScoreEntry>,
    pub history: Vec<ScoreEntry>,
}

/// Process-wide score state, mirrored to storage on every mutation.
///
/// The in-memory state is authoritative while the store is alive; storage is
/// only read by [`ScoreStore::initialize`].
pub struct ScoreStore {
    state: ScoreState,
    just_cleared: bool,
    storage: Arc<dyn KeyValueStore>,
    persister: ScorePersister,
}

impl ScoreStore {
    /// Build the store and load it from storage
    pub fn open(storage: Arc<dyn KeyValueStore>) -> Self {
        let persister = ScorePersister::spawn(storage.clone());
        let mut store = Self {
            state: ScoreState::default(),
            just_cleared: false,
            storage,
            persister,
        };
        store.initialize();
        store
    }

    /// Reload from storage.
    ///
    /// History is always reloaded. Visible scores are reloaded only if no
    /// clear happened since the last added score; otherwise they start empty
    /// even if storage still holds an older list.
    pub fn initialize(&mut self) {
        self.persister.flush();

        self.state.history = self.load_list(HISTORY_KEY);
        self.state.visible = if self.just_cleared {
            Vec::new()
        } else {
            self.load_list(VISIBLE_SCORES_KEY)
        };

        tracing::debug!(
            visible = self.state.visible.len(),
            history = self.state.history.len(),
            just_cleared = self.just_cleared,
            "score store loaded"
        );
    }

    fn load_list(&self, key: &str) -> Vec<ScoreEntry> {
        let raw = match self.storage.get_item(key) {
            Ok(Some(raw)) => raw,
            Ok(None) => return Vec::new(),
            Err(e) => {
                tracing::warn!(key, error = %e, "failed to read scores; starting empty");
                return Vec::new();
            }
        };

        serde_json::from_str(&raw).unwrap_or_else(|e| {
            tracing::warn!(key, error = %e, "stored scores are corrupt; starting empty");
            Vec::new()
        })
    }

    /// Append a score to both lists and re-arm reloading of visible scores
    pub fn add_score(
        &mut self,
        points: i64,
        level: Option<i64>,
        operation: Option<String>,
        mode: Option<String>,
    ) -> PendingWrite {
        let entry = ScoreEntry::new(points, level, operation, mode);
        tracing::info!(points, ?level, "score added");

        self.state.visible.push(entry.clone());
        self.state.history.push(entry);
        self.just_cleared = false;
        self.persist()
    }

    /// Empty both lists. Irreversible.
    pub fn clear_scores(&mut self) -> PendingWrite {
        tracing::info!(history = self.state.history.len(), "clearing all scores");
        self.state.visible.clear();
        self.state.history.clear();
        self.just_cleared = true;
        self.persist()
    }

    /// Empty the visible cards only; history is re-persisted unchanged
    pub fn clear_recent_scores(&mut self) -> PendingWrite {
        tracing::info!(visible = self.state.visible.len(), "clearing recent scores");
        self.state.visible.clear();
        self.just_cleared = true;
        self.persist()
    }

    fn persist(&mut self) -> PendingWrite {
        self.persister.submit(&self.state.visible, &self.state.history)
    }

    /// Block until all writes issued so far have settled
    pub fn flush(&self) {
        self.persister.flush();
    }

    pub fn visible(&self) -> &[ScoreEntry] {
        &self.state.visible
    }

    pub fn history(&self) -> &[ScoreEntry] {
        &self.state.history
    }

    pub fn state(&self) -> &ScoreState {
        &self.state
    }

    pub fn just_cleared(&self) -> bool {
        self.just_cleared
    }

    pub fn stats(&self) -> ProfileStats {
        ProfileStats::from_history(&self.state.history)
    }
}

impl std::fmt::Debug for ScoreStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ScoreStore")
            .field("state", &self.state)
            .field("just_cleared", &self.just_cleared)
            .field("persister", &self.persister)
            .finish_non_exhaustive()
    }
}
