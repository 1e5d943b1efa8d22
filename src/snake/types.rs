//! Snake game data structures.
//!
//! The grid model is owned by [`SnakeGame`] and mutated only by the
//! simulation step in `logic.rs`. The renderer reads it.

use crate::core::constants::*;
use rand::Rng;
use std::collections::VecDeque;

/// Capacity of the buffered direction queue.
pub const DIRECTION_QUEUE_CAPACITY: usize = 2;

/// Cardinal direction for snake movement.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Up,
    Down,
    Left,
    Right,
}

impl Direction {
    /// Returns the opposite direction.
    pub fn opposite(&self) -> Self {
        match self {
            Self::Up => Self::Down,
            Self::Down => Self::Up,
            Self::Left => Self::Right,
            Self::Right => Self::Left,
        }
    }

    /// Returns the (dx, dy) delta for this direction.
    pub fn delta(&self) -> (i16, i16) {
        match self {
            Self::Up => (0, -1),
            Self::Down => (0, 1),
            Self::Left => (-1, 0),
            Self::Right => (1, 0),
        }
    }
}

/// A position on the grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Position {
    pub x: i16,
    pub y: i16,
}

impl Position {
    pub const fn new(x: i16, y: i16) -> Self {
        Self { x, y }
    }

    /// The neighbouring cell one step in `direction`. May be off-grid.
    pub fn step(self, direction: Direction) -> Self {
        let (dx, dy) = direction.delta();
        Self {
            x: self.x + dx,
            y: self.y + dy,
        }
    }

    pub fn in_bounds(self, grid_size: i16) -> bool {
        self.x >= 0 && self.x < grid_size && self.y >= 0 && self.y < grid_size
    }

    /// True if `other` shares an edge with this cell.
    pub fn is_adjacent(self, other: Position) -> bool {
        (self.x - other.x).abs() + (self.y - other.y).abs() == 1
    }

    /// True if `other` lies in the 3x3 block centred on this cell.
    pub fn is_near(self, other: Position) -> bool {
        (self.x - other.x).abs() <= 1 && (self.y - other.y).abs() <= 1
    }
}

/// Visual flavour of an obstacle. Cosmetic only.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ObstacleKind {
    Ant,
    Crab,
    Void,
}

impl ObstacleKind {
    pub const ALL: [ObstacleKind; 3] = [ObstacleKind::Ant, ObstacleKind::Crab, ObstacleKind::Void];

    pub fn name(&self) -> &'static str {
        match self {
            Self::Ant => "Ant",
            Self::Crab => "Crab",
            Self::Void => "Void",
        }
    }
}

/// A blocking cell ("enemy").
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Obstacle {
    pub position: Position,
    pub kind: ObstacleKind,
    /// Animation phase offset in radians.
    pub phase: f32,
}

/// Top-level game phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GamePhase {
    Menu,
    Playing,
    Paused,
    GameOver,
    LevelClear,
}

/// What ended the run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CollisionKind {
    Wall,
    SelfBite,
    Obstacle,
}

impl CollisionKind {
    pub fn describe(&self) -> &'static str {
        match self {
            Self::Wall => "Hit the wall",
            Self::SelfBite => "Bit its own tail",
            Self::Obstacle => "Ran into an enemy",
        }
    }
}

/// Side effects produced by a simulation step, consumed by the driver.
#[derive(Debug, Clone, PartialEq)]
pub enum GameEvent {
    FoodEaten { position: Position, score: u32 },
    LevelCleared { level: u32, bonus: u32 },
    Collision { kind: CollisionKind, at: Position },
    NewHighScore(u32),
    NewHighLevel(u32),
}

/// Main game state.
#[derive(Debug, Clone)]
pub struct SnakeGame {
    pub grid_size: i16,
    pub phase: GamePhase,
    /// Set when the current pause came from visibility loss.
    pub auto_paused: bool,

    /// Snake body segments. Head is at the front (index 0).
    pub snake: VecDeque<Position>,
    /// Current heading.
    pub direction: Direction,
    /// Buffered player input, applied one per tick.
    pub pending: VecDeque<Direction>,

    /// `None` only when no free cell was left.
    pub food: Option<Position>,
    pub obstacles: Vec<Obstacle>,

    // Scoring
    pub score: u32,
    pub level: u32,
    pub eaten_this_level: u32,
    pub high_score: u32,
    pub high_level: u32,

    // Timing
    /// Current tick interval in milliseconds.
    pub tick_interval_ms: f64,
    /// Time accumulated toward the next tick.
    pub accumulated_ms: f64,
    /// Total movement steps elapsed.
    pub tick_count: u64,

    // Terminal outcome
    pub collision: Option<CollisionKind>,
    /// Head cell that caused the collision, kept for the crash flash.
    pub fatal_head: Option<Position>,
}

impl SnakeGame {
    /// Create a game sitting at the menu, seeded with persisted records.
    pub fn new<R: Rng>(rng: &mut R, high_score: u32, high_level: u32) -> Self {
        let mut game = Self {
            grid_size: GRID_SIZE,
            phase: GamePhase::Menu,
            auto_paused: false,

            snake: starting_snake(GRID_SIZE),
            direction: Direction::Right,
            pending: VecDeque::with_capacity(DIRECTION_QUEUE_CAPACITY),

            food: None,
            obstacles: Vec::new(),

            score: 0,
            level: 1,
            eaten_this_level: 0,
            high_score,
            high_level: high_level.max(1),

            tick_interval_ms: INITIAL_TICK_MS,
            accumulated_ms: 0.0,
            tick_count: 0,

            collision: None,
            fatal_head: None,
        };
        game.food = spawn_food(&game, rng);
        game
    }

    pub fn head(&self) -> Position {
        self.snake[0]
    }

    pub fn is_obstacle(&self, pos: Position) -> bool {
        self.obstacles.iter().any(|o| o.position == pos)
    }

    /// True if the cell holds the snake or an obstacle.
    pub fn is_occupied(&self, pos: Position) -> bool {
        self.snake.contains(&pos) || self.is_obstacle(pos)
    }

    /// Target obstacle count for the current level.
    pub fn obstacle_target(&self) -> usize {
        self.level.saturating_sub(1) as usize
    }
}

/// Fixed centred 3-cell start, heading right.
pub fn starting_snake(grid_size: i16) -> VecDeque<Position> {
    let center = grid_size / 2;
    (0..INITIAL_SNAKE_LEN as i16)
        .map(|i| Position::new(center - i, center))
        .collect()
}

/// Tick interval at the start of `level`, before any per-food speed-up.
pub fn level_start_interval(level: u32) -> f64 {
    let interval = INITIAL_TICK_MS - LEVEL_SPEED_STEP_MS * level.saturating_sub(1) as f64;
    if interval.is_finite() {
        interval.max(MIN_TICK_MS)
    } else {
        INITIAL_TICK_MS
    }
}

/// Pick a free cell for food (snake and obstacles excluded).
///
/// Random sampling first; a bounded miss count degrades to a row-major
/// scan for the first free cell. `None` means the grid is full.
pub fn spawn_food<R: Rng>(game: &SnakeGame, rng: &mut R) -> Option<Position> {
    for _ in 0..FOOD_SPAWN_ATTEMPTS {
        let pos = Position::new(
            rng.gen_range(0..game.grid_size),
            rng.gen_range(0..game.grid_size),
        );
        if !game.is_occupied(pos) {
            return Some(pos);
        }
    }

    (0..game.grid_size)
        .flat_map(|y| (0..game.grid_size).map(move |x| Position::new(x, y)))
        .find(|&pos| !game.is_occupied(pos))
}

/// Regenerate obstacles for the current level.
///
/// Cells in the head's 3x3 neighbourhood, on the snake, on the food or on
/// another obstacle are rejected. Placement gives up after a bounded number
/// of attempts, leaving the level short of enemies rather than hanging.
pub fn place_obstacles<R: Rng>(game: &mut SnakeGame, rng: &mut R) {
    game.obstacles.clear();
    let target = game.obstacle_target();
    if target == 0 {
        return;
    }

    let head = game.head();
    let mut attempts = target as u32 * OBSTACLE_ATTEMPTS_PER_ENEMY;
    while game.obstacles.len() < target && attempts > 0 {
        attempts -= 1;
        let pos = Position::new(
            rng.gen_range(0..game.grid_size),
            rng.gen_range(0..game.grid_size),
        );
        if head.is_near(pos)
            || game.snake.contains(&pos)
            || game.food == Some(pos)
            || game.is_obstacle(pos)
        {
            continue;
        }
        let kind = ObstacleKind::ALL[rng.gen_range(0..ObstacleKind::ALL.len())];
        game.obstacles.push(Obstacle {
            position: pos,
            kind,
            phase: rng.gen_range(0.0..std::f32::consts::TAU),
        });
    }

    if game.obstacles.len() < target {
        tracing::debug!(
            placed = game.obstacles.len(),
            target,
            "obstacle placement ran out of attempts"
        );
    }
}
