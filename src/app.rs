//! Top-level game state driven by the frame loop in `main`.
//!
//! The simulation produces [`GameEvent`]s; this module turns them into
//! particles, sounds, persisted records and leaderboard prompts.

use crate::audio::{Audio, Cue};
use crate::core::constants::*;
use crate::input::AppAction;
use crate::leaderboard::{normalize_char, normalize_name, validate_name, LeaderboardEntry};
use crate::leaderboard::{LeaderboardSync, SyncEvent};
use crate::profile::{save_leaderboard_cache, Profile};
use crate::snake::{
    process_input, set_visible, tick_snake, GameEvent, GamePhase, ParticleSystem, Position,
    SnakeGame, SnakeInput,
};
use crate::ui;
use crate::utils::persistence::Store;
use chrono::Utc;
use rand::rngs::StdRng;
use ratatui::Frame;

const NO_LONGER_QUALIFIES: &str = "Score no longer qualifies";
const NOT_SAVED: &str = "Score could not be saved";

/// Name typed on the game-over screen.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct NameEntry {
    pub buffer: String,
    pub error: Option<String>,
}

impl NameEntry {
    pub fn new(prefill: &str) -> Self {
        Self {
            buffer: normalize_name(prefill),
            error: None,
        }
    }

    /// Append a typed character if it is allowed and there is room.
    pub fn push(&mut self, c: char) -> bool {
        if self.buffer.chars().count() >= MAX_NAME_LEN {
            return false;
        }
        match normalize_char(c) {
            Some(u) => {
                self.buffer.push(u);
                self.error = None;
                true
            }
            None => false,
        }
    }

    pub fn backspace(&mut self) {
        self.buffer.pop();
        self.error = None;
    }
}

pub struct App {
    game: SnakeGame,
    particles: ParticleSystem,
    sync: LeaderboardSync,
    store: Option<Store>,
    profile: Profile,
    audio: Audio,
    name_entry: Option<NameEntry>,
    rng: StdRng,
    elapsed_secs: f32,
    quit: bool,
}

impl App {
    pub fn new(
        store: Option<Store>,
        profile: Profile,
        sync: LeaderboardSync,
        audio: Audio,
        mut rng: StdRng,
    ) -> Self {
        let game = SnakeGame::new(&mut rng, profile.high_score, profile.high_level);
        Self {
            game,
            particles: ParticleSystem::new(),
            sync,
            store,
            profile,
            audio,
            name_entry: None,
            rng,
            elapsed_secs: 0.0,
            quit: false,
        }
    }

    /// Start leaderboard loading.
    pub fn mount(&mut self) {
        self.sync.mount();
    }

    pub fn game(&self) -> &SnakeGame {
        &self.game
    }

    pub fn particles(&self) -> &ParticleSystem {
        &self.particles
    }

    pub fn sync(&self) -> &LeaderboardSync {
        &self.sync
    }

    pub fn profile(&self) -> &Profile {
        &self.profile
    }

    pub fn name_entry(&self) -> Option<&NameEntry> {
        self.name_entry.as_ref()
    }

    pub fn is_naming(&self) -> bool {
        self.name_entry.is_some()
    }

    pub fn elapsed_secs(&self) -> f32 {
        self.elapsed_secs
    }

    pub fn should_quit(&self) -> bool {
        self.quit
    }

    pub fn handle_action(&mut self, action: AppAction) {
        if action == AppAction::None {
            return;
        }
        self.audio.unlock();

        match action {
            AppAction::Quit => self.quit = true,
            AppAction::ToggleTheme => {
                if self.game.phase != GamePhase::Playing {
                    let theme = self.profile.theme.toggled();
                    self.profile.set_theme(self.store.as_ref(), theme);
                }
            }
            AppAction::Game(input) => self.handle_game_input(input),
            AppAction::NameChar(c) => {
                if let Some(entry) = self.name_entry.as_mut() {
                    entry.push(c);
                }
            }
            AppAction::NameBackspace => {
                if let Some(entry) = self.name_entry.as_mut() {
                    entry.backspace();
                }
            }
            AppAction::NameSubmit => self.submit_name(),
            AppAction::NameCancel => self.name_entry = None,
            AppAction::None => {}
        }
    }

    fn handle_game_input(&mut self, input: SnakeInput) {
        let before = self.game.phase;
        if !process_input(&mut self.game, input, &mut self.rng) {
            return;
        }
        if matches!(before, GamePhase::Menu | GamePhase::GameOver)
            && self.game.phase == GamePhase::Playing
        {
            self.particles.clear();
            self.name_entry = None;
            self.sync.begin_game();
        }
    }

    fn submit_name(&mut self) {
        let Some(entry) = self.name_entry.as_mut() else {
            return;
        };
        let name = match validate_name(&entry.buffer) {
            Ok(name) => name,
            Err(e) => {
                entry.error = Some(e.to_string());
                return;
            }
        };
        // The board may have moved on while the prompt was open
        if !self.sync.qualifies(self.game.score) {
            entry.error = Some(NO_LONGER_QUALIFIES.to_string());
            return;
        }

        let record = LeaderboardEntry::new(name.clone(), self.game.score, self.game.level, Utc::now());
        if !self.sync.submit(record) {
            tracing::debug!(score = self.game.score, "score not submitted");
            entry.error = Some(NOT_SAVED.to_string());
            return;
        }
        self.name_entry = None;
        self.profile.set_player_name(self.store.as_ref(), &name);
    }

    /// Visibility signal from the terminal (focus lost/gained).
    pub fn set_visible(&mut self, visible: bool) {
        set_visible(&mut self.game, visible);
    }

    /// Per-frame logic: maybe one simulation step, then leaderboard work.
    pub fn update(&mut self, dt_ms: f64) {
        let dt = if dt_ms.is_finite() {
            dt_ms.clamp(0.0, MAX_FRAME_DT_MS)
        } else {
            0.0
        };

        for event in tick_snake(&mut self.game, dt, &mut self.rng) {
            self.apply_event(event);
        }

        for event in self.sync.poll() {
            match event {
                SyncEvent::Saved { .. } => self.audio.play(Cue::Saved),
                SyncEvent::SaveFailed(_) | SyncEvent::Updated | SyncEvent::Slow => {}
            }
        }

        if self.sync.take_dirty() {
            if let Some(store) = self.store.as_ref() {
                save_leaderboard_cache(store, self.sync.entries());
            }
        }
    }

    fn apply_event(&mut self, event: GameEvent) {
        let palette = ui::theme::palette(self.profile.theme);
        match event {
            GameEvent::FoodEaten { position, .. } => {
                self.burst(position, FOOD_BURST_PARTICLES, palette.food);
                self.audio.play(Cue::Food);
            }
            GameEvent::LevelCleared { level, bonus } => {
                tracing::debug!(level, bonus, "level bonus awarded");
                let head = self.game.head();
                self.burst(head, LEVEL_BURST_PARTICLES, palette.head);
                self.audio.play(Cue::Victory);
            }
            GameEvent::Collision { at, .. } => {
                self.burst(at, CRASH_BURST_PARTICLES, palette.ant);
                self.audio.play(Cue::GameOver);
                if self.sync.qualifies(self.game.score) {
                    self.name_entry = Some(NameEntry::new(&self.profile.player_name));
                }
            }
            GameEvent::NewHighScore(score) => {
                self.profile.record_score(self.store.as_ref(), score);
            }
            GameEvent::NewHighLevel(level) => {
                self.profile.record_level(self.store.as_ref(), level);
            }
        }
    }

    fn burst(&mut self, at: Position, count: usize, color: (u8, u8, u8)) {
        self.particles.burst(
            at.x as f32 + 0.5,
            at.y as f32 + 0.5,
            count,
            color,
            &mut self.rng,
        );
    }

    /// Draw one frame. Advances cosmetic particles only.
    pub fn render(&mut self, frame: &mut Frame, dt_secs: f32) {
        let dt = if dt_secs.is_finite() { dt_secs.max(0.0) } else { 0.0 };
        self.elapsed_secs += dt;
        self.particles.update(dt);
        ui::draw(frame, self);
    }

    /// Cancel background work and persist the cache.
    pub fn shutdown(&mut self) {
        self.sync.teardown();
        if let Some(store) = self.store.as_ref() {
            save_leaderboard_cache(store, self.sync.entries());
        }
    }
}
