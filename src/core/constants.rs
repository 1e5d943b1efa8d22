// Grid
pub const GRID_SIZE: i16 = 15;
pub const INITIAL_SNAKE_LEN: usize = 3;

// Scoring and levels
pub const FOOD_SCORE: u32 = 10;
pub const LEVEL_CLEAR_SCORE: u32 = 50;
pub const FOOD_PER_LEVEL: u32 = 8;

// Tick speed (milliseconds between simulation steps, lower = faster).
// The per-food and per-level steps are tuned independently.
pub const INITIAL_TICK_MS: f64 = 150.0;
pub const FOOD_SPEED_STEP_MS: f64 = 5.0;
pub const LEVEL_SPEED_STEP_MS: f64 = 10.0;
pub const MIN_TICK_MS: f64 = 60.0;

// Placement budgets
pub const FOOD_SPAWN_ATTEMPTS: u32 = 100;
pub const OBSTACLE_ATTEMPTS_PER_ENEMY: u32 = 50;

// Frame loop
pub const FRAME_MS: u64 = 16;
pub const MAX_FRAME_DT_MS: f64 = 500.0;

// Particles
pub const MAX_PARTICLES: usize = 200;
pub const PARTICLE_GRAVITY: f32 = 18.0;
pub const PARTICLE_DECAY_PER_SEC: f32 = 1.6;
pub const FOOD_BURST_PARTICLES: usize = 14;
pub const LEVEL_BURST_PARTICLES: usize = 40;
pub const CRASH_BURST_PARTICLES: usize = 24;

// Leaderboard
pub const LEADERBOARD_CAPACITY: usize = 10;
pub const MAX_NAME_LEN: usize = 8;
pub const LEADERBOARD_TIMEOUT_MS: u64 = 5_000;
pub const REMOTE_REQUEST_TIMEOUT_MS: u64 = 10_000;
pub const DEFAULT_REMOTE_TABLE: &str = "leaderboard";

// Persisted keys
pub const HIGH_SCORE_KEY: &str = "high_score";
pub const HIGH_LEVEL_KEY: &str = "high_level";
pub const PLAYER_NAME_KEY: &str = "player_name";
pub const LEADERBOARD_CACHE_KEY: &str = "leaderboard_cache";
pub const THEME_KEY: &str = "theme";
pub const CONFIG_KEY: &str = "config";
pub const LOG_FILE_NAME: &str = "gridsnake.log";
