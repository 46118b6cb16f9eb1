use std::sync::Arc;

use crate::profile::{ProfileOutcome, ProfileScreen};
use crate::runtime::AppEvent;
use crate::score::ScoreStore;
use crate::session::SessionStore;
use crate::stats::ProfileStats;
use crate::storage::KeyValueStore;

/// Application state, built once at startup and handed to every consumer
#[derive(Debug)]
pub struct App {
    pub scores: ScoreStore,
    pub session: SessionStore,
    pub profile: ProfileScreen,
}

impl App {
    pub fn new(storage: Arc<dyn KeyValueStore>) -> Self {
        Self {
            session: SessionStore::new(storage.clone()),
            scores: ScoreStore::open(storage),
            profile: ProfileScreen::new(),
        }
    }

    pub fn stats(&self) -> ProfileStats {
        self.scores.stats()
    }

    pub fn on_event(&mut self, event: AppEvent) -> ProfileOutcome {
        match event {
            AppEvent::Key(key) => self.profile.on_key(key, &mut self.scores, &self.session),
            AppEvent::Resize | AppEvent::Tick => ProfileOutcome::Continue,
        }
    }
}
