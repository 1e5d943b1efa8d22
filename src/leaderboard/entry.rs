//! Leaderboard entries: name rules, ordering, merging and qualification.

use crate::core::constants::{LEADERBOARD_CAPACITY, MAX_NAME_LEN};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

/// Accented capitals accepted in names, besides ASCII letters and digits.
pub const ALLOWED_ACCENTS: &str = "ÀÁÂÄÃÅÇÈÉÊËÌÍÎÏÑÒÓÔÖÕÙÚÛÜÝ";

/// One immutable leaderboard row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LeaderboardEntry {
    /// Store-assigned id, or `local-<uuid>` for entries that never reached
    /// the remote table.
    #[serde(default)]
    pub id: Option<String>,
    pub name: String,
    pub score: u32,
    pub level: u32,
    pub created_at: DateTime<Utc>,
}

impl LeaderboardEntry {
    /// Build a fresh entry from a validated name.
    pub fn new(name: String, score: u32, level: u32, created_at: DateTime<Utc>) -> Self {
        Self {
            id: None,
            name,
            score,
            level: level.max(1),
            created_at,
        }
    }

    /// Same entry tagged with a local-only id.
    pub fn into_local(mut self) -> Self {
        if self.id.is_none() {
            self.id = Some(format!("local-{}", uuid::Uuid::new_v4()));
        }
        self
    }

    pub fn is_local_only(&self) -> bool {
        self.id.as_deref().map_or(true, |id| id.starts_with("local-"))
    }

    fn same_as(&self, other: &LeaderboardEntry) -> bool {
        match (&self.id, &other.id) {
            (Some(a), Some(b)) => a == b,
            _ => {
                self.name == other.name
                    && self.score == other.score
                    && self.level == other.level
                    && self.created_at == other.created_at
            }
        }
    }
}

/// Why a name was refused.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NameError {
    Empty,
    TooLong,
}

impl std::fmt::Display for NameError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            NameError::Empty => write!(f, "Enter a name"),
            NameError::TooLong => write!(f, "Name must be {} characters or fewer", MAX_NAME_LEN),
        }
    }
}

impl std::error::Error for NameError {}

/// Uppercase a single typed character, returning it only if it is allowed.
pub fn normalize_char(c: char) -> Option<char> {
    let mut upper = c.to_uppercase();
    let u = upper.next()?;
    if upper.next().is_some() {
        return None;
    }
    if u.is_ascii_alphanumeric() || ALLOWED_ACCENTS.contains(u) {
        Some(u)
    } else {
        None
    }
}

/// Uppercase, drop disallowed characters, cap at `MAX_NAME_LEN`.
pub fn normalize_name(raw: &str) -> String {
    raw.trim()
        .chars()
        .filter_map(normalize_char)
        .take(MAX_NAME_LEN)
        .collect()
}

/// Validate a submitted name and return its stored form.
pub fn validate_name(raw: &str) -> Result<String, NameError> {
    let trimmed = raw.trim();
    if trimmed.chars().count() > MAX_NAME_LEN {
        return Err(NameError::TooLong);
    }
    let name = normalize_name(trimmed);
    if name.is_empty() {
        return Err(NameError::Empty);
    }
    Ok(name)
}

/// Score descending, then most recent first.
pub fn compare_entries(a: &LeaderboardEntry, b: &LeaderboardEntry) -> Ordering {
    b.score
        .cmp(&a.score)
        .then_with(|| b.created_at.cmp(&a.created_at))
}

/// Sort and cap a list in place.
pub fn normalize_board(entries: &mut Vec<LeaderboardEntry>) {
    entries.sort_by(compare_entries);
    entries.truncate(LEADERBOARD_CAPACITY);
}

/// Merge `incoming` into `current`, dropping duplicates, sorted and capped.
pub fn merge_entries(
    current: &[LeaderboardEntry],
    incoming: &[LeaderboardEntry],
) -> Vec<LeaderboardEntry> {
    let mut merged: Vec<LeaderboardEntry> = Vec::with_capacity(current.len() + incoming.len());
    for entry in incoming.iter().chain(current.iter()) {
        if !merged.iter().any(|e| e.same_as(entry)) {
            merged.push(entry.clone());
        }
    }
    normalize_board(&mut merged);
    merged
}

/// A score earns a leaderboard slot if it is positive and the board has
/// room or the score beats the current lowest entry.
pub fn qualifies(entries: &[LeaderboardEntry], score: u32) -> bool {
    if score == 0 {
        return false;
    }
    if entries.len() < LEADERBOARD_CAPACITY {
        return true;
    }
    entries
        .iter()
        .map(|e| e.score)
        .min()
        .map_or(true, |lowest| score > lowest)
}
