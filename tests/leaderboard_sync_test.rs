//! Integration test: leaderboard sync against a scripted remote table
//!
//! The mock remote answers on the sync engine's worker threads. A gate lets a
//! test hold the first fetch open to exercise timeouts, superseded fetches
//! and teardown.

use chrono::{Duration as ChronoDuration, TimeZone, Utc};
use gridsnake::leaderboard::{
    LeaderboardEntry, LeaderboardSync, RemoteError, RemoteLeaderboard, SaveState, SyncEvent,
};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

// =============================================================================
// Mock remote
// =============================================================================

#[derive(Default)]
struct MockRemote {
    rows: Mutex<Vec<LeaderboardEntry>>,
    /// Taken by the first fetch, which then blocks until rows are sent.
    gate: Mutex<Option<Receiver<Vec<LeaderboardEntry>>>>,
    /// Signalled when the gated fetch has started.
    entered: Mutex<Option<Sender<()>>>,
    fail_fetch: bool,
    fail_insert: bool,
    /// How long each insert takes to answer.
    insert_delay: Duration,
    inserts: AtomicUsize,
}

impl MockRemote {
    fn with_rows(rows: Vec<LeaderboardEntry>) -> Self {
        Self {
            rows: Mutex::new(rows),
            ..Default::default()
        }
    }

    /// Hold the first fetch until the returned sender delivers its rows.
    /// The receiver fires once that fetch is in flight.
    fn gated(mut self) -> (Self, Sender<Vec<LeaderboardEntry>>, Receiver<()>) {
        let (release_tx, release_rx) = mpsc::channel();
        let (entered_tx, entered_rx) = mpsc::channel();
        self.gate = Mutex::new(Some(release_rx));
        self.entered = Mutex::new(Some(entered_tx));
        (self, release_tx, entered_rx)
    }
}

impl RemoteLeaderboard for MockRemote {
    fn fetch_top(&self, limit: usize) -> Result<Vec<LeaderboardEntry>, RemoteError> {
        let gate = self.gate.lock().unwrap().take();
        if let Some(release) = gate {
            if let Some(entered) = self.entered.lock().unwrap().take() {
                let _ = entered.send(());
            }
            return Ok(release.recv().unwrap_or_default());
        }
        if self.fail_fetch {
            return Err(RemoteError::Transport("connection refused".into()));
        }
        Ok(self.rows.lock().unwrap().iter().take(limit).cloned().collect())
    }

    fn insert(&self, entry: &LeaderboardEntry) -> Result<LeaderboardEntry, RemoteError> {
        std::thread::sleep(self.insert_delay);
        let n = self.inserts.fetch_add(1, Ordering::SeqCst) + 1;
        if self.fail_insert {
            return Err(RemoteError::Http(503, String::new()));
        }
        let mut stored = entry.clone();
        stored.id = Some(format!("row-{}", n));
        Ok(stored)
    }
}

// =============================================================================
// Helpers
// =============================================================================

fn row(id: &str, name: &str, score: u32, minutes_ago: i64) -> LeaderboardEntry {
    let base = Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap();
    let mut entry = LeaderboardEntry::new(
        name.to_string(),
        score,
        1,
        base - ChronoDuration::minutes(minutes_ago),
    );
    entry.id = Some(id.to_string());
    entry
}

fn sync_with(remote: &Arc<MockRemote>, cached: Vec<LeaderboardEntry>) -> LeaderboardSync {
    sync_with_timeout(remote, cached, Duration::from_secs(60))
}

fn sync_with_timeout(
    remote: &Arc<MockRemote>,
    cached: Vec<LeaderboardEntry>,
    timeout: Duration,
) -> LeaderboardSync {
    let remote: Arc<dyn RemoteLeaderboard> = remote.clone();
    LeaderboardSync::new(Some(remote), cached, timeout)
}

/// Poll until `done` holds, collecting every event seen on the way.
fn poll_until<F>(sync: &mut LeaderboardSync, mut done: F) -> Vec<SyncEvent>
where
    F: FnMut(&LeaderboardSync, &[SyncEvent]) -> bool,
{
    let deadline = Instant::now() + Duration::from_secs(5);
    let mut seen = Vec::new();
    loop {
        seen.extend(sync.poll());
        if done(sync, &seen) {
            return seen;
        }
        assert!(Instant::now() < deadline, "timed out; events so far: {:?}", seen);
        std::thread::sleep(Duration::from_millis(5));
    }
}

fn names(sync: &LeaderboardSync) -> Vec<String> {
    sync.entries().iter().map(|e| e.name.clone()).collect()
}

// =============================================================================
// Loading
// =============================================================================

#[test]
fn test_mount_loads_remote_rows() {
    let remote = Arc::new(MockRemote::with_rows(vec![
        row("r1", "ANA", 120, 1),
        row("r2", "BO", 80, 2),
    ]));
    let mut sync = sync_with(&remote, Vec::new());
    sync.mount();
    assert!(sync.is_loading());

    let events = poll_until(&mut sync, |s, _| !s.is_loading());
    assert!(events.contains(&SyncEvent::Updated));
    assert_eq!(names(&sync), vec!["ANA", "BO"]);
    assert!(sync.error().is_none());
    assert!(sync.take_dirty());
}

#[test]
fn test_fetch_keeps_local_only_rows() {
    let local = LeaderboardEntry::new("ME".into(), 100, 2, Utc::now()).into_local();
    let remote = Arc::new(MockRemote::with_rows(vec![
        row("r1", "ANA", 120, 1),
        row("r2", "BO", 80, 2),
    ]));
    let mut sync = sync_with(&remote, vec![local.clone()]);
    sync.mount();

    poll_until(&mut sync, |s, _| s.entries().len() == 3);
    assert_eq!(names(&sync), vec!["ANA", "ME", "BO"]);
    assert!(sync.entries()[1].is_local_only());
    assert_eq!(sync.entries()[1].id, local.id);
}

#[test]
fn test_fetch_failure_keeps_cache_and_reports() {
    let cached = vec![row("r9", "OLD", 60, 5)];
    let remote = Arc::new(MockRemote {
        fail_fetch: true,
        ..Default::default()
    });
    let mut sync = sync_with(&remote, cached);
    sync.mount();

    poll_until(&mut sync, |s, _| s.error().is_some());
    assert!(!sync.is_loading());
    assert_eq!(names(&sync), vec!["OLD"]);
    assert!(sync.error().unwrap_or_default().contains("connection refused"));
}

#[test]
fn test_change_notification_refetches_silently() {
    let remote = Arc::new(MockRemote::with_rows(vec![row("r1", "ANA", 120, 1)]));
    let mut sync = sync_with(&remote, Vec::new());
    sync.mount();
    poll_until(&mut sync, |s, _| !s.entries().is_empty());
    let loaded = sync.generation();

    *remote.rows.lock().unwrap() = vec![row("r2", "NEW", 300, 0), row("r1", "ANA", 120, 1)];
    let notifier = sync.change_notifier();
    notifier.notify();

    let events = poll_until(&mut sync, |s, _| {
        assert!(!s.is_loading(), "change refetch must not show loading");
        s.entries().len() == 2
    });
    assert!(events.contains(&SyncEvent::Updated));
    assert_eq!(sync.generation(), loaded + 1);
    assert_eq!(names(&sync), vec!["NEW", "ANA"]);

    // Dropped once torn down
    sync.teardown();
    notifier.notify();
    assert!(sync.poll().is_empty());
    assert_eq!(sync.generation(), loaded + 1);
}

#[test]
fn test_slow_fetch_shows_notice_then_applies_late_result() {
    let (mock, release, entered) = MockRemote::default().gated();
    let remote = Arc::new(mock);
    let mut sync = sync_with_timeout(&remote, Vec::new(), Duration::from_millis(20));
    sync.mount();
    entered.recv_timeout(Duration::from_secs(5)).unwrap();

    let events = sync.poll_at(Instant::now() + Duration::from_millis(100));
    assert_eq!(events, vec![SyncEvent::Slow]);
    assert!(sync.is_slow());
    assert!(!sync.is_loading());
    assert!(sync.entries().is_empty());

    // Reported once
    assert!(sync
        .poll_at(Instant::now() + Duration::from_millis(200))
        .is_empty());

    release.send(vec![row("r1", "LATE", 50, 0)]).unwrap();
    poll_until(&mut sync, |s, _| !s.entries().is_empty());
    assert_eq!(names(&sync), vec!["LATE"]);
    assert!(!sync.is_slow());
}

#[test]
fn test_no_slow_notice_when_cache_has_rows() {
    let (mock, _release, entered) = MockRemote::default().gated();
    let remote = Arc::new(mock);
    let cached = vec![row("r1", "ANA", 40, 1)];
    let mut sync = sync_with_timeout(&remote, cached, Duration::from_millis(20));
    sync.mount();
    entered.recv_timeout(Duration::from_secs(5)).unwrap();

    assert!(sync
        .poll_at(Instant::now() + Duration::from_millis(100))
        .is_empty());
    assert!(!sync.is_slow());
}

#[test]
fn test_superseded_fetch_is_discarded() {
    let fresh = vec![row("b1", "NEW", 200, 0), row("b2", "NEWER", 150, 0)];
    let (mock, release, entered) = MockRemote::with_rows(fresh).gated();
    let remote = Arc::new(mock);
    let mut sync = sync_with(&remote, Vec::new());

    sync.mount();
    entered.recv_timeout(Duration::from_secs(5)).unwrap();
    assert_eq!(sync.generation(), 1);

    sync.refresh(false);
    assert_eq!(sync.generation(), 2);
    poll_until(&mut sync, |s, _| s.entries().len() == 2);
    assert_eq!(names(&sync), vec!["NEW", "NEWER"]);

    // The first fetch now answers with older data
    release.send(vec![row("a1", "STALE", 999, 10)]).unwrap();
    poll_until(&mut sync, |s, _| s.stale_discarded() == 1);
    assert_eq!(names(&sync), vec!["NEW", "NEWER"]);
}

// =============================================================================
// Submission
// =============================================================================

#[test]
fn test_insert_success_uses_remote_id() {
    let remote = Arc::new(MockRemote::default());
    let mut sync = sync_with(&remote, Vec::new());

    let entry = LeaderboardEntry::new("ANA".into(), 70, 2, Utc::now());
    assert!(sync.submit(entry.clone()));
    assert_eq!(sync.save_state(), &SaveState::Saving);
    // Second submit for the same game is refused while saving
    assert!(!sync.submit(entry));

    let events = poll_until(&mut sync, |s, _| s.save_state().is_done());
    assert!(events.contains(&SyncEvent::Saved { remote: true }));
    assert_eq!(sync.save_state(), &SaveState::Saved { remote: true });
    assert_eq!(sync.entries().len(), 1);
    assert_eq!(sync.entries()[0].id.as_deref(), Some("row-1"));
    assert!(!sync.entries()[0].is_local_only());
    assert_eq!(remote.inserts.load(Ordering::SeqCst), 1);
}

#[test]
fn test_next_game_can_submit_while_previous_insert_in_flight() {
    let remote = Arc::new(MockRemote {
        insert_delay: Duration::from_millis(100),
        ..Default::default()
    });
    let mut sync = sync_with(&remote, Vec::new());

    assert!(sync.submit(LeaderboardEntry::new("ANA".into(), 40, 1, Utc::now())));
    sync.begin_game();
    assert_eq!(sync.save_state(), &SaveState::Idle);
    assert!(sync.submit(LeaderboardEntry::new("ANA".into(), 60, 2, Utc::now())));

    let events = poll_until(&mut sync, |s, _| {
        s.save_state().is_done() && s.entries().len() == 2
    });
    let saved = events
        .iter()
        .filter(|e| matches!(e, SyncEvent::Saved { .. }))
        .count();
    assert_eq!(saved, 1);
    assert_eq!(sync.save_state(), &SaveState::Saved { remote: true });
    assert!(sync.entries().iter().all(|e| !e.is_local_only()));
    assert_eq!(remote.inserts.load(Ordering::SeqCst), 2);
}

#[test]
fn test_earlier_game_insert_leaves_new_game_idle() {
    let remote = Arc::new(MockRemote {
        insert_delay: Duration::from_millis(50),
        ..Default::default()
    });
    let mut sync = sync_with(&remote, Vec::new());

    assert!(sync.submit(LeaderboardEntry::new("BO".into(), 30, 1, Utc::now())));
    sync.begin_game();

    let events = poll_until(&mut sync, |s, _| !s.entries().is_empty());
    assert!(!events.iter().any(|e| matches!(e, SyncEvent::Saved { .. })));
    assert_eq!(sync.save_state(), &SaveState::Idle);
    assert_eq!(sync.entries()[0].id.as_deref(), Some("row-1"));
}

#[test]
fn test_insert_failure_keeps_entry_locally() {
    let remote = Arc::new(MockRemote {
        fail_insert: true,
        ..Default::default()
    });
    let mut sync = sync_with(&remote, Vec::new());

    assert!(sync.submit(LeaderboardEntry::new("BO".into(), 40, 1, Utc::now())));
    let events = poll_until(&mut sync, |s, _| s.save_state().is_done());

    assert!(events.contains(&SyncEvent::SaveFailed("HTTP 503".into())));
    assert_eq!(sync.save_state(), &SaveState::Failed("HTTP 503".into()));
    assert_eq!(names(&sync), vec!["BO"]);
    assert!(sync.entries()[0].is_local_only());
    assert!(sync.take_dirty());
}

#[test]
fn test_zero_score_never_inserted() {
    let remote = Arc::new(MockRemote::default());
    let mut sync = sync_with(&remote, Vec::new());

    assert!(!sync.submit(LeaderboardEntry::new("ZED".into(), 0, 1, Utc::now())));
    std::thread::sleep(Duration::from_millis(20));
    assert!(sync.poll().is_empty());
    assert_eq!(sync.save_state(), &SaveState::Idle);
    assert_eq!(remote.inserts.load(Ordering::SeqCst), 0);
}

#[test]
fn test_non_qualifying_score_on_full_board() {
    let full: Vec<_> = (0..10)
        .map(|i| row(&format!("r{}", i), "X", 100 + i * 10, i as i64))
        .collect();
    let remote = Arc::new(MockRemote::default());
    let mut sync = sync_with(&remote, full);

    assert!(!sync.qualifies(100));
    assert!(!sync.submit(LeaderboardEntry::new("LOW".into(), 100, 1, Utc::now())));
    assert!(sync.qualifies(101));
    assert_eq!(remote.inserts.load(Ordering::SeqCst), 0);
}

// =============================================================================
// Teardown
// =============================================================================

#[test]
fn test_teardown_ignores_late_results() {
    let (mock, release, entered) = MockRemote::default().gated();
    let remote = Arc::new(mock);
    let mut sync = sync_with(&remote, Vec::new());
    sync.mount();
    entered.recv_timeout(Duration::from_secs(5)).unwrap();

    sync.teardown();
    assert!(!sync.is_loading());

    release.send(vec![row("r1", "GHOST", 500, 0)]).unwrap();
    std::thread::sleep(Duration::from_millis(30));
    assert!(sync.poll().is_empty());
    assert!(sync.entries().is_empty());

    sync.refresh(true);
    assert_eq!(sync.generation(), 1);
}
