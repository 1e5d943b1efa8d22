//! Persisted player records and preferences.

use crate::core::constants::*;
use crate::leaderboard::LeaderboardEntry;
use crate::utils::persistence::Store;
use serde::{Deserialize, Serialize};

/// Play-field palette.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    #[default]
    Dark,
    Light,
}

impl Theme {
    pub fn toggled(self) -> Self {
        match self {
            Theme::Dark => Theme::Light,
            Theme::Light => Theme::Dark,
        }
    }
}

/// Everything the game remembers between runs.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Profile {
    pub high_score: u32,
    pub high_level: u32,
    pub player_name: String,
    pub theme: Theme,
}

impl Profile {
    /// Read each key independently; bad values fall back to defaults.
    pub fn load(store: &Store) -> Self {
        Self {
            high_score: store.load_or_default(HIGH_SCORE_KEY),
            high_level: store.load_or_default::<u32>(HIGH_LEVEL_KEY).max(1),
            player_name: store.load_or_default(PLAYER_NAME_KEY),
            theme: store.load_or_default(THEME_KEY),
        }
    }

    /// Persist the high score only if it beats the stored one.
    pub fn record_score(&mut self, store: Option<&Store>, score: u32) -> bool {
        if score <= self.high_score {
            return false;
        }
        self.high_score = score;
        if let Some(store) = store {
            store.save_quiet(HIGH_SCORE_KEY, &score);
        }
        true
    }

    /// Persist the high level only if it beats the stored one.
    pub fn record_level(&mut self, store: Option<&Store>, level: u32) -> bool {
        if level <= self.high_level {
            return false;
        }
        self.high_level = level;
        if let Some(store) = store {
            store.save_quiet(HIGH_LEVEL_KEY, &level);
        }
        true
    }

    pub fn set_player_name(&mut self, store: Option<&Store>, name: &str) {
        self.player_name = name.to_string();
        if let Some(store) = store {
            store.save_quiet(PLAYER_NAME_KEY, &self.player_name);
        }
    }

    pub fn set_theme(&mut self, store: Option<&Store>, theme: Theme) {
        self.theme = theme;
        if let Some(store) = store {
            store.save_quiet(THEME_KEY, &theme);
        }
    }
}

/// Cached leaderboard snapshot; malformed caches load as empty.
pub fn load_leaderboard_cache(store: &Store) -> Vec<LeaderboardEntry> {
    store.load_or_default(LEADERBOARD_CACHE_KEY)
}

pub fn save_leaderboard_cache(store: &Store, entries: &[LeaderboardEntry]) {
    store.save_quiet(LEADERBOARD_CACHE_KEY, &entries);
}

/// Forget records, name and cache (`gridsnake reset`). Theme and config stay.
pub fn reset(store: &Store) {
    for key in [
        HIGH_SCORE_KEY,
        HIGH_LEVEL_KEY,
        PLAYER_NAME_KEY,
        LEADERBOARD_CACHE_KEY,
    ] {
        store.remove_quiet(key);
    }
}
