//! Best-effort mirror between the local leaderboard cache and the remote table.
//!
//! Remote calls run on worker threads and report back over a channel that the
//! frame loop drains with [`LeaderboardSync::poll`]. Every fetch carries a
//! generation number; only the newest generation may replace visible state.
//! After [`LeaderboardSync::teardown`] no worker result is applied.

use super::entry::{merge_entries, qualifies, LeaderboardEntry};
use super::remote::{RemoteError, RemoteLeaderboard};
use crate::core::constants::LEADERBOARD_CAPACITY;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Messages sent from workers (and the change feed) to the frame loop.
#[derive(Debug)]
enum SyncMessage {
    Fetched {
        generation: u64,
        result: Result<Vec<LeaderboardEntry>, RemoteError>,
    },
    Inserted {
        /// Game the submission belongs to.
        game: u64,
        submitted: LeaderboardEntry,
        result: Result<LeaderboardEntry, RemoteError>,
    },
    Changed,
}

/// Progress of the current game's score submission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SaveState {
    Idle,
    Saving,
    /// Recorded. `remote` is false when only the local cache holds it.
    Saved { remote: bool },
    /// Remote insert failed; the entry was kept locally.
    Failed(String),
}

impl SaveState {
    pub fn is_done(&self) -> bool {
        matches!(self, SaveState::Saved { .. } | SaveState::Failed(_))
    }
}

/// Notable changes reported by [`LeaderboardSync::poll`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncEvent {
    /// Visible entries changed.
    Updated,
    /// The mount fetch is taking too long and the cache is empty.
    Slow,
    /// A submission finished (remotely or locally).
    Saved { remote: bool },
    /// A submission could not reach the remote table.
    SaveFailed(String),
}

/// Cloneable sender that asks the sync engine for a silent refetch.
///
/// Notifications after teardown are dropped.
#[derive(Clone)]
pub struct ChangeNotifier {
    tx: Sender<SyncMessage>,
    alive: Arc<AtomicBool>,
}

impl ChangeNotifier {
    pub fn notify(&self) {
        if self.alive.load(Ordering::SeqCst) {
            let _ = self.tx.send(SyncMessage::Changed);
        }
    }
}

pub struct LeaderboardSync {
    remote: Option<Arc<dyn RemoteLeaderboard>>,
    entries: Vec<LeaderboardEntry>,

    generation: u64,
    loading: bool,
    fetch_started: Option<Instant>,
    slow: bool,
    error: Option<String>,
    stale_discarded: u64,

    /// Bumped by `begin_game`; insert results from earlier games only merge.
    game: u64,
    save_state: SaveState,
    /// Entries changed since the cache was last persisted.
    dirty: bool,

    timeout: Duration,
    tx: Sender<SyncMessage>,
    rx: Receiver<SyncMessage>,
    alive: Arc<AtomicBool>,

    #[cfg(feature = "realtime")]
    feed: Option<super::realtime::ChangeFeed>,
}

impl std::fmt::Debug for LeaderboardSync {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LeaderboardSync")
            .field("remote", &self.remote.is_some())
            .field("entries", &self.entries.len())
            .field("generation", &self.generation)
            .field("loading", &self.loading)
            .field("slow", &self.slow)
            .field("save_state", &self.save_state)
            .finish()
    }
}

impl LeaderboardSync {
    /// Create a sync engine seeded with the cached snapshot.
    /// `remote = None` runs local-only with no errors.
    pub fn new(
        remote: Option<Arc<dyn RemoteLeaderboard>>,
        cached: Vec<LeaderboardEntry>,
        timeout: Duration,
    ) -> Self {
        let entries = merge_entries(&[], &cached);
        let (tx, rx) = mpsc::channel();
        Self {
            remote,
            entries,
            generation: 0,
            loading: false,
            fetch_started: None,
            slow: false,
            error: None,
            stale_discarded: 0,
            game: 0,
            save_state: SaveState::Idle,
            dirty: false,
            timeout,
            tx,
            rx,
            alive: Arc::new(AtomicBool::new(true)),
            #[cfg(feature = "realtime")]
            feed: None,
        }
    }

    /// Initial load: fetch the top entries and subscribe to changes.
    pub fn mount(&mut self) {
        if self.remote.is_none() || !self.is_alive() {
            return;
        }
        self.refresh(true);
        self.subscribe();
    }

    #[cfg(feature = "realtime")]
    fn subscribe(&mut self) {
        let Some(target) = self.remote.as_ref().and_then(|r| r.change_feed()) else {
            return;
        };
        let notifier = self.change_notifier();
        match super::realtime::ChangeFeed::start(target, move || notifier.notify()) {
            Ok(feed) => self.feed = Some(feed),
            Err(e) => tracing::warn!(error = %e, "could not start leaderboard change feed"),
        }
    }

    #[cfg(not(feature = "realtime"))]
    fn subscribe(&mut self) {
        tracing::debug!("built without realtime support; leaderboard is fetched on mount only");
    }

    /// Fetch the top entries. A loading fetch drives the slow notice;
    /// a non-loading one (change notifications) refreshes silently.
    pub fn refresh(&mut self, loading: bool) {
        let Some(remote) = self.remote.clone() else {
            return;
        };
        if !self.is_alive() {
            return;
        }
        self.generation += 1;
        let generation = self.generation;
        if loading {
            self.loading = true;
            self.fetch_started = Some(Instant::now());
        }
        tracing::debug!(generation, loading, "fetching leaderboard");
        self.spawn(move || SyncMessage::Fetched {
            generation,
            result: remote.fetch_top(LEADERBOARD_CAPACITY),
        });
    }

    /// Record a finished game's score. Returns false if this game already
    /// submitted or the score doesn't qualify.
    pub fn submit(&mut self, entry: LeaderboardEntry) -> bool {
        if self.save_state != SaveState::Idle || !self.is_alive() {
            return false;
        }
        if !qualifies(&self.entries, entry.score) {
            return false;
        }

        match self.remote.clone() {
            None => {
                self.merge(&[entry.into_local()]);
                self.save_state = SaveState::Saved { remote: false };
            }
            Some(remote) => {
                self.save_state = SaveState::Saving;
                tracing::info!(name = %entry.name, score = entry.score, "submitting score");
                let game = self.game;
                self.spawn(move || {
                    let result = remote.insert(&entry);
                    SyncMessage::Inserted {
                        game,
                        submitted: entry,
                        result,
                    }
                });
            }
        }
        true
    }

    /// Allow the next game to submit. An insert still in flight for the
    /// previous game merges its row when it lands but no longer drives
    /// the save state.
    pub fn begin_game(&mut self) {
        self.game += 1;
        self.save_state = SaveState::Idle;
    }

    /// Handle for reporting remote table changes from another thread.
    pub fn change_notifier(&self) -> ChangeNotifier {
        ChangeNotifier {
            tx: self.tx.clone(),
            alive: Arc::clone(&self.alive),
        }
    }

    /// Apply finished work and check the slow-load timeout.
    pub fn poll(&mut self) -> Vec<SyncEvent> {
        self.poll_at(Instant::now())
    }

    /// [`poll`](Self::poll) with an explicit clock, for timeout checks.
    pub fn poll_at(&mut self, now: Instant) -> Vec<SyncEvent> {
        let mut events = Vec::new();
        if !self.is_alive() {
            return events;
        }

        while let Ok(msg) = self.rx.try_recv() {
            match msg {
                SyncMessage::Fetched { generation, result } => {
                    self.apply_fetch(generation, result, &mut events);
                }
                SyncMessage::Inserted {
                    game,
                    submitted,
                    result,
                } => {
                    self.apply_insert(game, submitted, result, &mut events);
                }
                SyncMessage::Changed => self.refresh(false),
            }
        }

        if self.loading && !self.slow && self.entries.is_empty() {
            if let Some(started) = self.fetch_started {
                if now.saturating_duration_since(started) >= self.timeout {
                    tracing::warn!("leaderboard fetch is slow; showing local data");
                    self.slow = true;
                    self.loading = false;
                    events.push(SyncEvent::Slow);
                }
            }
        }

        events
    }

    fn apply_fetch(
        &mut self,
        generation: u64,
        result: Result<Vec<LeaderboardEntry>, RemoteError>,
        events: &mut Vec<SyncEvent>,
    ) {
        if generation != self.generation {
            self.stale_discarded += 1;
            tracing::debug!(generation, current = self.generation, "discarding stale fetch");
            return;
        }
        self.loading = false;
        self.fetch_started = None;
        match result {
            Ok(remote_rows) => {
                // Local-only rows survive a refresh if they still rank.
                let local: Vec<LeaderboardEntry> = self
                    .entries
                    .iter()
                    .filter(|e| e.is_local_only())
                    .cloned()
                    .collect();
                let merged = merge_entries(&local, &remote_rows);
                self.slow = false;
                self.error = None;
                if merged != self.entries {
                    self.entries = merged;
                    self.dirty = true;
                    events.push(SyncEvent::Updated);
                }
            }
            Err(e) => {
                tracing::warn!(error = %e, "leaderboard fetch failed");
                self.error = Some(e.to_string());
            }
        }
    }

    fn apply_insert(
        &mut self,
        game: u64,
        submitted: LeaderboardEntry,
        result: Result<LeaderboardEntry, RemoteError>,
        events: &mut Vec<SyncEvent>,
    ) {
        let current = game == self.game;
        let outcome = match result {
            Ok(stored) => {
                tracing::info!(id = ?stored.id, "score saved");
                self.merge(&[stored]);
                (SaveState::Saved { remote: true }, SyncEvent::Saved { remote: true })
            }
            Err(e) => {
                tracing::warn!(error = %e, "score insert failed; keeping it locally");
                self.merge(&[submitted.into_local()]);
                let reason = e.to_string();
                (SaveState::Failed(reason.clone()), SyncEvent::SaveFailed(reason))
            }
        };
        if current {
            self.save_state = outcome.0;
            events.push(outcome.1);
        } else {
            tracing::debug!(game, current = self.game, "insert from an earlier game landed");
        }
        events.push(SyncEvent::Updated);
    }

    fn merge(&mut self, incoming: &[LeaderboardEntry]) {
        self.entries = merge_entries(&self.entries, incoming);
        self.dirty = true;
    }

    /// Run `job` off the frame loop; its result is dropped after teardown.
    fn spawn<F>(&self, job: F)
    where
        F: FnOnce() -> SyncMessage + Send + 'static,
    {
        let tx = self.tx.clone();
        let alive = Arc::clone(&self.alive);
        let spawned = std::thread::Builder::new()
            .name("leaderboard-sync".to_string())
            .spawn(move || {
                let msg = job();
                if alive.load(Ordering::SeqCst) {
                    let _ = tx.send(msg);
                }
            });
        if let Err(e) = spawned {
            tracing::warn!(error = %e, "could not spawn leaderboard worker");
        }
    }

    /// Cancel everything. Later worker results and notifications are ignored.
    pub fn teardown(&mut self) {
        self.alive.store(false, Ordering::SeqCst);
        self.loading = false;
        #[cfg(feature = "realtime")]
        {
            if let Some(mut feed) = self.feed.take() {
                feed.stop();
            }
        }
        while self.rx.try_recv().is_ok() {}
    }

    pub fn is_alive(&self) -> bool {
        self.alive.load(Ordering::SeqCst)
    }

    pub fn entries(&self) -> &[LeaderboardEntry] {
        &self.entries
    }

    pub fn qualifies(&self, score: u32) -> bool {
        qualifies(&self.entries, score)
    }

    pub fn is_remote(&self) -> bool {
        self.remote.is_some()
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    pub fn is_slow(&self) -> bool {
        self.slow
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn save_state(&self) -> &SaveState {
        &self.save_state
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Count of fetch responses dropped for being superseded.
    pub fn stale_discarded(&self) -> u64 {
        self.stale_discarded
    }

    /// Returns true once per batch of changes that should be persisted.
    pub fn take_dirty(&mut self) -> bool {
        std::mem::take(&mut self.dirty)
    }
}

impl Drop for LeaderboardSync {
    fn drop(&mut self) {
        self.alive.store(false, Ordering::SeqCst);
    }
}
