//! Snake game logic: input, phase transitions, movement, collision detection.

use super::types::*;
use crate::core::constants::*;
use rand::Rng;

/// UI-agnostic input actions for Snake.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SnakeInput {
    Up,
    Down,
    Left,
    Right,
    /// Space/Enter: start, restart, resume or continue to the next level.
    Select,
    /// Reserved pause/escape action.
    Pause,
    Other,
}

impl SnakeInput {
    fn direction(self) -> Option<Direction> {
        match self {
            Self::Up => Some(Direction::Up),
            Self::Down => Some(Direction::Down),
            Self::Left => Some(Direction::Left),
            Self::Right => Some(Direction::Right),
            _ => None,
        }
    }
}

/// Process player input. Returns true if the game state changed.
pub fn process_input<R: Rng>(game: &mut SnakeGame, input: SnakeInput, rng: &mut R) -> bool {
    match game.phase {
        GamePhase::Menu | GamePhase::GameOver => {
            if input == SnakeInput::Select {
                start_game(game, rng);
                return true;
            }
            false
        }
        GamePhase::Playing => {
            if input == SnakeInput::Pause {
                game.phase = GamePhase::Paused;
                game.auto_paused = false;
                tracing::debug!("paused");
                return true;
            }
            match input.direction() {
                Some(direction) => queue_direction(game, direction),
                None => false,
            }
        }
        GamePhase::Paused => {
            if matches!(input, SnakeInput::Pause | SnakeInput::Select) {
                resume(game);
                return true;
            }
            false
        }
        GamePhase::LevelClear => {
            if input == SnakeInput::Select {
                game.phase = GamePhase::Playing;
                game.accumulated_ms = 0.0;
                tracing::info!(level = game.level, "next level");
                return true;
            }
            false
        }
    }
}

/// Buffer a heading change for a later tick.
///
/// Reversals are not rejected here: they are dropped when dequeued against
/// the heading that is current at that tick.
pub fn queue_direction(game: &mut SnakeGame, direction: Direction) -> bool {
    if game.pending.len() >= DIRECTION_QUEUE_CAPACITY {
        return false;
    }
    let last = game.pending.back().copied().unwrap_or(game.direction);
    if last == direction {
        return false;
    }
    game.pending.push_back(direction);
    true
}

/// Reset to the initial grid and enter `Playing` (new game or restart).
pub fn start_game<R: Rng>(game: &mut SnakeGame, rng: &mut R) {
    game.score = 0;
    game.level = 1;
    game.eaten_this_level = 0;
    game.tick_interval_ms = INITIAL_TICK_MS;
    game.accumulated_ms = 0.0;
    game.tick_count = 0;
    game.collision = None;
    game.fatal_head = None;
    game.auto_paused = false;
    reset_board(game, rng);
    game.phase = GamePhase::Playing;
    tracing::info!("game started");
}

/// Surface visibility changed. Only automatic pauses are lifted automatically.
pub fn set_visible(game: &mut SnakeGame, visible: bool) -> bool {
    if !visible && game.phase == GamePhase::Playing {
        game.phase = GamePhase::Paused;
        game.auto_paused = true;
        tracing::debug!("auto-paused on visibility loss");
        return true;
    }
    if visible && game.phase == GamePhase::Paused && game.auto_paused {
        resume(game);
        return true;
    }
    false
}

fn resume(game: &mut SnakeGame) {
    game.phase = GamePhase::Playing;
    game.auto_paused = false;
    game.accumulated_ms = 0.0;
}

/// Advance the game by `dt_ms` of wall-clock time. Called once per frame.
///
/// At most one step runs per call, and only once the current tick interval
/// has accumulated. Nothing happens outside `Playing`.
pub fn tick_snake<R: Rng>(game: &mut SnakeGame, dt_ms: f64, rng: &mut R) -> Vec<GameEvent> {
    if game.phase != GamePhase::Playing {
        return Vec::new();
    }

    let dt_ms = if dt_ms.is_finite() {
        dt_ms.clamp(0.0, MAX_FRAME_DT_MS)
    } else {
        0.0
    };
    game.accumulated_ms += dt_ms;

    if !game.tick_interval_ms.is_finite() || game.tick_interval_ms <= 0.0 {
        game.tick_interval_ms = INITIAL_TICK_MS;
    }
    if game.accumulated_ms < game.tick_interval_ms {
        return Vec::new();
    }
    game.accumulated_ms =
        (game.accumulated_ms - game.tick_interval_ms).clamp(0.0, game.tick_interval_ms);

    step_snake(game, rng)
}

/// Single movement step.
pub fn step_snake<R: Rng>(game: &mut SnakeGame, rng: &mut R) -> Vec<GameEvent> {
    let mut events = Vec::new();
    game.tick_count += 1;

    if let Some(next) = game.pending.pop_front() {
        if next != game.direction.opposite() {
            game.direction = next;
        }
    }

    let new_head = game.head().step(game.direction);

    // The tail moves out of the way this tick unless we're eating.
    let eating = game.food == Some(new_head);
    let body_len = if eating {
        game.snake.len()
    } else {
        game.snake.len() - 1
    };

    let collision = if !new_head.in_bounds(game.grid_size) {
        Some(CollisionKind::Wall)
    } else if game.snake.iter().take(body_len).any(|&seg| seg == new_head) {
        Some(CollisionKind::SelfBite)
    } else if game.is_obstacle(new_head) {
        Some(CollisionKind::Obstacle)
    } else {
        None
    };

    if let Some(kind) = collision {
        game.collision = Some(kind);
        game.fatal_head = Some(new_head);
        game.phase = GamePhase::GameOver;
        game.pending.clear();
        tracing::info!(
            score = game.score,
            level = game.level,
            cause = ?kind,
            "game over"
        );
        events.push(GameEvent::Collision { kind, at: new_head });
        return events;
    }

    game.snake.push_front(new_head);

    if !eating {
        game.snake.pop_back();
        return events;
    }

    game.eaten_this_level += 1;
    add_score(game, FOOD_SCORE, &mut events);
    game.tick_interval_ms = next_interval(game.tick_interval_ms);
    events.insert(
        0,
        GameEvent::FoodEaten {
            position: new_head,
            score: game.score,
        },
    );

    if game.eaten_this_level >= FOOD_PER_LEVEL {
        clear_level(game, rng, &mut events);
    } else {
        game.food = spawn_food(game, rng);
    }

    events
}

/// Per-food speed-up, floored and guarded against non-finite values.
fn next_interval(current: f64) -> f64 {
    if !current.is_finite() {
        return INITIAL_TICK_MS;
    }
    let next = (current - FOOD_SPEED_STEP_MS).max(MIN_TICK_MS);
    if next.is_finite() {
        next
    } else {
        INITIAL_TICK_MS
    }
}

fn add_score(game: &mut SnakeGame, points: u32, events: &mut Vec<GameEvent>) {
    game.score = game.score.saturating_add(points);
    if game.score > game.high_score {
        game.high_score = game.score;
        events.push(GameEvent::NewHighScore(game.score));
    }
}

/// Award the bonus and set up the next level. Score carries over.
fn clear_level<R: Rng>(game: &mut SnakeGame, rng: &mut R, events: &mut Vec<GameEvent>) {
    let cleared = game.level;
    add_score(game, LEVEL_CLEAR_SCORE, events);
    game.level += 1;
    game.eaten_this_level = 0;
    game.tick_interval_ms = level_start_interval(game.level);
    game.accumulated_ms = 0.0;
    reset_board(game, rng);
    game.phase = GamePhase::LevelClear;

    events.push(GameEvent::LevelCleared {
        level: cleared,
        bonus: LEVEL_CLEAR_SCORE,
    });
    if game.level > game.high_level {
        game.high_level = game.level;
        events.push(GameEvent::NewHighLevel(game.level));
    }
    tracing::info!(level = game.level, score = game.score, "level cleared");
}

/// Centre the snake, then place obstacles and food for the current level.
fn reset_board<R: Rng>(game: &mut SnakeGame, rng: &mut R) {
    game.snake = starting_snake(game.grid_size);
    game.direction = Direction::Right;
    game.pending.clear();
    game.food = None;
    place_obstacles(game, rng);
    game.food = spawn_food(game, rng);
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    fn rng() -> ChaCha8Rng {
        ChaCha8Rng::seed_from_u64(42)
    }

    /// Create a game that has already been started.
    fn started_game(r: &mut ChaCha8Rng) -> SnakeGame {
        let mut game = SnakeGame::new(r, 0, 0);
        start_game(&mut game, r);
        // Park the food out of the way of straight-line movement
        game.food = Some(Position::new(0, 0));
        game
    }

    #[test]
    fn test_menu_blocks_movement_and_physics() {
        let mut r = rng();
        let mut game = SnakeGame::new(&mut r, 0, 0);
        assert!(!process_input(&mut game, SnakeInput::Up, &mut r));
        assert!(game.pending.is_empty());

        let head = game.head();
        let events = tick_snake(&mut game, 1000.0, &mut r);
        assert!(events.is_empty());
        assert_eq!(game.head(), head);

        assert!(process_input(&mut game, SnakeInput::Select, &mut r));
        assert_eq!(game.phase, GamePhase::Playing);
    }

    #[test]
    fn test_tick_waits_for_interval() {
        let mut r = rng();
        let mut game = started_game(&mut r);
        let head = game.head();

        tick_snake(&mut game, INITIAL_TICK_MS - 1.0, &mut r);
        assert_eq!(game.head(), head);

        tick_snake(&mut game, 1.0, &mut r);
        assert_eq!(game.head(), Position::new(head.x + 1, head.y));
    }

    #[test]
    fn test_one_step_per_frame() {
        let mut r = rng();
        let mut game = started_game(&mut r);
        tick_snake(&mut game, 10_000.0, &mut r);
        assert_eq!(game.tick_count, 1);
        assert!(game.accumulated_ms <= game.tick_interval_ms);
    }

    #[test]
    fn test_direction_queue_capacity() {
        let mut r = rng();
        let mut game = started_game(&mut r);
        assert!(process_input(&mut game, SnakeInput::Up, &mut r));
        assert!(process_input(&mut game, SnakeInput::Left, &mut r));
        assert!(!process_input(&mut game, SnakeInput::Down, &mut r));
        assert_eq!(game.pending.len(), 2);
    }

    #[test]
    fn test_duplicate_direction_not_queued() {
        let mut r = rng();
        let mut game = started_game(&mut r);
        assert!(!process_input(&mut game, SnakeInput::Right, &mut r));
        assert!(game.pending.is_empty());
    }

    #[test]
    fn test_reversal_discarded_on_dequeue() {
        let mut r = rng();
        let mut game = started_game(&mut r);
        process_input(&mut game, SnakeInput::Left, &mut r);
        let head = game.head();

        step_snake(&mut game, &mut r);

        assert_eq!(game.direction, Direction::Right);
        assert_eq!(game.head(), Position::new(head.x + 1, head.y));
        assert!(game.collision.is_none());
    }

    #[test]
    fn test_queued_turns_apply_one_per_tick() {
        let mut r = rng();
        let mut game = started_game(&mut r);
        process_input(&mut game, SnakeInput::Up, &mut r);
        process_input(&mut game, SnakeInput::Left, &mut r);
        let head = game.head();

        step_snake(&mut game, &mut r);
        assert_eq!(game.direction, Direction::Up);
        step_snake(&mut game, &mut r);
        assert_eq!(game.direction, Direction::Left);
        assert_eq!(game.head(), Position::new(head.x - 1, head.y - 1));
    }

    #[test]
    fn test_wall_collision_from_center() {
        let mut r = rng();
        let mut game = started_game(&mut r);
        let mut outcome = None;
        for _ in 0..20 {
            let events = step_snake(&mut game, &mut r);
            if let Some(GameEvent::Collision { kind, at }) = events.last() {
                outcome = Some((*kind, *at));
                break;
            }
        }
        assert_eq!(
            outcome,
            Some((CollisionKind::Wall, Position::new(GRID_SIZE, 7)))
        );
        assert_eq!(game.phase, GamePhase::GameOver);
        // Fatal move is not applied to the body
        assert_eq!(game.head(), Position::new(GRID_SIZE - 1, 7));
        assert_eq!(game.fatal_head, Some(Position::new(GRID_SIZE, 7)));
    }

    #[test]
    fn test_self_collision() {
        let mut r = rng();
        let mut game = started_game(&mut r);
        game.snake.clear();
        game.snake.push_back(Position::new(5, 5)); // head
        game.snake.push_back(Position::new(5, 4));
        game.snake.push_back(Position::new(6, 4));
        game.snake.push_back(Position::new(6, 5));
        game.snake.push_back(Position::new(6, 6));

        step_snake(&mut game, &mut r);

        assert_eq!(game.collision, Some(CollisionKind::SelfBite));
        assert_eq!(game.phase, GamePhase::GameOver);
    }

    #[test]
    fn test_tail_chasing_allowed() {
        let mut r = rng();
        let mut game = started_game(&mut r);
        game.snake.clear();
        game.snake.push_back(Position::new(5, 5)); // head
        game.snake.push_back(Position::new(6, 5));
        game.snake.push_back(Position::new(6, 6));
        game.snake.push_back(Position::new(5, 6)); // tail
        game.direction = Direction::Down;

        step_snake(&mut game, &mut r);

        assert!(game.collision.is_none());
        assert_eq!(game.head(), Position::new(5, 6));
        assert_eq!(game.snake.len(), 4);
    }

    #[test]
    fn test_obstacle_collision() {
        let mut r = rng();
        let mut game = started_game(&mut r);
        let ahead = game.head().step(Direction::Right);
        game.obstacles.push(Obstacle {
            position: ahead,
            kind: ObstacleKind::Crab,
            phase: 0.0,
        });

        let events = step_snake(&mut game, &mut r);

        assert_eq!(game.collision, Some(CollisionKind::Obstacle));
        assert_eq!(
            events,
            vec![GameEvent::Collision {
                kind: CollisionKind::Obstacle,
                at: ahead
            }]
        );
    }

    #[test]
    fn test_eating_food_grows_and_speeds_up() {
        let mut r = rng();
        let mut game = started_game(&mut r);
        let ahead = game.head().step(Direction::Right);
        game.food = Some(ahead);

        let events = step_snake(&mut game, &mut r);

        assert_eq!(game.snake.len(), 4);
        assert_eq!(game.score, FOOD_SCORE);
        assert_eq!(game.eaten_this_level, 1);
        assert_eq!(game.tick_interval_ms, INITIAL_TICK_MS - FOOD_SPEED_STEP_MS);
        assert!(matches!(events[0], GameEvent::FoodEaten { .. }));
        assert!(events.contains(&GameEvent::NewHighScore(FOOD_SCORE)));

        let food = game.food.unwrap();
        assert!(!game.snake.contains(&food));
    }

    #[test]
    fn test_speed_never_passes_floor() {
        assert_eq!(next_interval(MIN_TICK_MS), MIN_TICK_MS);
        assert_eq!(next_interval(MIN_TICK_MS + 1.0), MIN_TICK_MS);
        assert_eq!(next_interval(f64::NAN), INITIAL_TICK_MS);
    }

    #[test]
    fn test_non_finite_interval_reset_in_tick() {
        let mut r = rng();
        let mut game = started_game(&mut r);
        game.tick_interval_ms = f64::INFINITY;
        tick_snake(&mut game, 1.0, &mut r);
        assert_eq!(game.tick_interval_ms, INITIAL_TICK_MS);
    }

    #[test]
    fn test_high_score_only_when_exceeded() {
        let mut r = rng();
        let mut game = SnakeGame::new(&mut r, 100, 1);
        start_game(&mut game, &mut r);
        game.food = Some(game.head().step(Direction::Right));

        let events = step_snake(&mut game, &mut r);

        assert_eq!(game.high_score, 100);
        assert!(!events
            .iter()
            .any(|e| matches!(e, GameEvent::NewHighScore(_))));
    }

    #[test]
    fn test_pause_and_resume() {
        let mut r = rng();
        let mut game = started_game(&mut r);
        assert!(process_input(&mut game, SnakeInput::Pause, &mut r));
        assert_eq!(game.phase, GamePhase::Paused);
        assert!(!game.auto_paused);

        // Movement ignored while paused
        assert!(!process_input(&mut game, SnakeInput::Up, &mut r));
        assert!(tick_snake(&mut game, 1000.0, &mut r).is_empty());

        assert!(process_input(&mut game, SnakeInput::Pause, &mut r));
        assert_eq!(game.phase, GamePhase::Playing);
    }

    #[test]
    fn test_visibility_auto_pause_resumes() {
        let mut r = rng();
        let mut game = started_game(&mut r);
        assert!(set_visible(&mut game, false));
        assert_eq!(game.phase, GamePhase::Paused);
        assert!(game.auto_paused);

        assert!(set_visible(&mut game, true));
        assert_eq!(game.phase, GamePhase::Playing);
        assert!(!game.auto_paused);
    }

    #[test]
    fn test_visibility_never_resumes_manual_pause() {
        let mut r = rng();
        let mut game = started_game(&mut r);
        process_input(&mut game, SnakeInput::Pause, &mut r);

        assert!(!set_visible(&mut game, false));
        assert!(!set_visible(&mut game, true));
        assert_eq!(game.phase, GamePhase::Paused);
    }

    #[test]
    fn test_visibility_ignored_outside_playing() {
        let mut r = rng();
        let mut game = SnakeGame::new(&mut r, 0, 0);
        assert!(!set_visible(&mut game, false));
        assert_eq!(game.phase, GamePhase::Menu);
    }

    #[test]
    fn test_restart_after_game_over_resets_session() {
        let mut r = rng();
        let mut game = started_game(&mut r);
        game.score = 70;
        game.level = 3;
        game.phase = GamePhase::GameOver;
        game.collision = Some(CollisionKind::Wall);

        // Pause is reserved but does nothing after game over
        assert!(!process_input(&mut game, SnakeInput::Pause, &mut r));
        assert!(process_input(&mut game, SnakeInput::Select, &mut r));

        assert_eq!(game.phase, GamePhase::Playing);
        assert_eq!(game.score, 0);
        assert_eq!(game.level, 1);
        assert!(game.obstacles.is_empty());
        assert!(game.collision.is_none());
        assert!(game.fatal_head.is_none());
        assert_eq!(game.snake, starting_snake(GRID_SIZE));
    }

    #[test]
    fn test_level_clear_waits_for_select() {
        let mut r = rng();
        let mut game = started_game(&mut r);
        game.eaten_this_level = FOOD_PER_LEVEL - 1;
        game.food = Some(game.head().step(Direction::Right));

        step_snake(&mut game, &mut r);
        assert_eq!(game.phase, GamePhase::LevelClear);
        assert!(tick_snake(&mut game, 1000.0, &mut r).is_empty());
        assert!(!process_input(&mut game, SnakeInput::Up, &mut r));

        assert!(process_input(&mut game, SnakeInput::Select, &mut r));
        assert_eq!(game.phase, GamePhase::Playing);
        assert_eq!(game.level, 2);
    }

    #[test]
    fn test_level_clear_resets_speed_for_next_level() {
        let mut r = rng();
        let mut game = started_game(&mut r);
        game.eaten_this_level = FOOD_PER_LEVEL - 1;
        game.tick_interval_ms = MIN_TICK_MS;
        game.food = Some(game.head().step(Direction::Right));

        let events = step_snake(&mut game, &mut r);

        assert_eq!(game.tick_interval_ms, level_start_interval(2));
        assert!(events.contains(&GameEvent::LevelCleared {
            level: 1,
            bonus: LEVEL_CLEAR_SCORE
        }));
        assert!(events.contains(&GameEvent::NewHighLevel(2)));
        assert_eq!(game.snake, starting_snake(GRID_SIZE));
        assert_eq!(game.obstacles.len(), 1);
    }
}
