use crate::score::ScoreEntry;

/// Aggregate statistics shown on the profile screen, derived from history
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ProfileStats {
    pub total_games: usize,
    pub high_score: i64,
}

impl ProfileStats {
    pub fn from_history(history: &[ScoreEntry]) -> Self {
        Self {
            total_games: total_games(history),
            high_score: high_score(history),
        }
    }
}

pub fn total_games(history: &[ScoreEntry]) -> usize {
    history.len()
}

/// Highest points in history, or 0 when there is none
pub fn high_score(history: &[ScoreEntry]) -> i64 {
    history.iter().map(|e| e.points).max().unwrap_or(0)
}
