pub mod game_common;
pub mod leaderboard_panel;
pub mod snake_scene;
pub mod theme;
mod throbber;

use crate::app::App;
use crate::core::constants::{FOOD_PER_LEVEL, GRID_SIZE};
use crate::snake::{GamePhase, SnakeGame};
use game_common::{render_banner, render_centered_prompt, render_game_frame, render_status_bar};
use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::Paragraph,
    Frame,
};
use theme::Palette;

const INFO_PANEL_WIDTH: u16 = 30;
const MIN_WIDTH: u16 = INFO_PANEL_WIDTH + 22;
const STATS_HEIGHT: u16 = 8;

/// Draw the whole screen from app state.
pub fn draw(frame: &mut Frame, app: &App) {
    let size = frame.size();
    let palette = theme::palette(app.profile().theme);
    let field_h = snake_scene::field_height(GRID_SIZE);

    if size.width < MIN_WIDTH || size.height < field_h + 4 {
        let msg = Paragraph::new(format!(
            "Terminal too small ({}x{}), need {}x{}",
            size.width,
            size.height,
            MIN_WIDTH,
            field_h + 4
        ))
        .alignment(Alignment::Center);
        frame.render_widget(msg, size);
        return;
    }

    let game = app.game();
    let elapsed = app.elapsed_secs();
    let layout = render_game_frame(
        frame,
        size,
        " Gridsnake ",
        palette,
        field_h,
        INFO_PANEL_WIDTH,
    );

    snake_scene::render_play_field(frame, layout.field, game, app.particles(), palette, elapsed);
    draw_phase_prompt(frame, layout.field, game, palette);

    if game.phase == GamePhase::GameOver {
        draw_game_over(frame, layout.field, app);
    }

    draw_status_bar(frame, layout.status_bar, app);

    let columns = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(STATS_HEIGHT), Constraint::Min(0)])
        .split(layout.info_panel);
    draw_stats(frame, columns[0], game, palette);
    leaderboard_panel::render_leaderboard(frame, columns[1], app.sync(), palette, elapsed);
}

fn draw_phase_prompt(frame: &mut Frame, field: Rect, game: &SnakeGame, palette: &Palette) {
    let bold = Style::default().fg(palette.text).add_modifier(Modifier::BOLD);
    let muted = Style::default().fg(palette.muted);
    let lines = match game.phase {
        GamePhase::Menu => vec![
            Line::from(Span::styled("GRIDSNAKE", bold)),
            Line::from(Span::styled("Space to start", muted)),
        ],
        GamePhase::Paused => vec![Line::from(Span::styled("PAUSED", bold))],
        GamePhase::LevelClear => vec![
            Line::from(Span::styled(format!("LEVEL {}", game.level), bold)),
            Line::from(Span::styled("Space to go", muted)),
        ],
        GamePhase::Playing | GamePhase::GameOver => return,
    };
    render_centered_prompt(frame, field, lines);
}

fn draw_game_over(frame: &mut Frame, area: Rect, app: &App) {
    let game = app.game();
    let palette = theme::palette(app.profile().theme);
    let cause = game.collision.as_ref().map(|c| c.describe()).unwrap_or("Game over");

    let mut body = vec![
        Line::from(Span::styled(cause, Style::default().fg(palette.text))),
        Line::from(Span::styled(
            format!("Score {}  Level {}", game.score, game.level),
            Style::default().fg(Color::Cyan),
        )),
    ];

    if let Some(entry) = app.name_entry() {
        let cursor = if (app.elapsed_secs() * 2.0) as u64 % 2 == 0 { "_" } else { " " };
        body.push(Line::from(vec![
            Span::styled("Name: ", Style::default().fg(palette.muted)),
            Span::styled(
                format!("{}{}", entry.buffer, cursor),
                Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD),
            ),
        ]));
        if let Some(err) = &entry.error {
            body.push(Line::from(Span::styled(err.clone(), Style::default().fg(Color::Red))));
        }
    } else if let Some((text, color)) =
        leaderboard_panel::save_status(app.sync().save_state(), app.elapsed_secs())
    {
        body.push(Line::from(Span::styled(text, Style::default().fg(color))));
    }

    let title = if app.is_naming() { "NEW HIGH SCORE" } else { "GAME OVER" };
    let color = if app.is_naming() { Color::Yellow } else { Color::Red };
    render_banner(frame, area, color, title, body);
}

type KeyHints = &'static [(&'static str, &'static str)];

const NAMING_KEYS: KeyHints = &[("[Enter]", "Save"), ("[Esc]", "Skip")];
const MENU_KEYS: KeyHints = &[("[Space]", "Start"), ("[T]", "Theme"), ("[Q]", "Quit")];
const PLAYING_KEYS: KeyHints = &[("[Arrows]", "Move"), ("[P]", "Pause"), ("[Q]", "Quit")];
const PAUSED_KEYS: KeyHints = &[("[Space]", "Resume"), ("[T]", "Theme"), ("[Q]", "Quit")];
const LEVEL_CLEAR_KEYS: KeyHints = &[("[Space]", "Next level"), ("[Q]", "Quit")];
const GAME_OVER_KEYS: KeyHints = &[("[Space]", "Play again"), ("[T]", "Theme"), ("[Q]", "Quit")];

fn draw_status_bar(frame: &mut Frame, area: Rect, app: &App) {
    let game = app.game();
    let palette = theme::palette(app.profile().theme);

    let (text, color, keys): (String, Color, KeyHints) = if app.is_naming() {
        ("Enter your name".into(), Color::Yellow, NAMING_KEYS)
    } else {
        match game.phase {
            GamePhase::Menu => ("Ready".into(), palette.accent, MENU_KEYS),
            GamePhase::Playing => (format!("Level {}", game.level), Color::Green, PLAYING_KEYS),
            GamePhase::Paused if game.auto_paused => {
                ("Paused (focus lost)".into(), Color::Yellow, PAUSED_KEYS)
            }
            GamePhase::Paused => ("Paused".into(), Color::Yellow, PAUSED_KEYS),
            GamePhase::LevelClear => (
                format!("Level {} cleared!", game.level.saturating_sub(1)),
                Color::Cyan,
                LEVEL_CLEAR_KEYS,
            ),
            GamePhase::GameOver => ("Game over".into(), Color::Red, GAME_OVER_KEYS),
        }
    };
    render_status_bar(frame, area, palette, (text.as_str(), color), keys);
}

fn draw_stats(frame: &mut Frame, area: Rect, game: &SnakeGame, palette: &Palette) {
    let inner = game_common::render_panel_frame(frame, area, " Info ", Color::DarkGray);
    let label = Style::default().fg(palette.muted);
    let value = Style::default().fg(palette.text);

    let row = |name: &'static str, text: String, style: Style| {
        Line::from(vec![Span::styled(name, label), Span::styled(text, style)])
    };
    let lines = vec![
        row(
            "Score: ",
            game.score.to_string(),
            value.add_modifier(Modifier::BOLD),
        ),
        row("Level: ", game.level.to_string(), value),
        row(
            "Food:  ",
            format!("{}/{}", game.eaten_this_level, FOOD_PER_LEVEL),
            value,
        ),
        row("Speed: ", format!("{:.0}ms", game.tick_interval_ms), value),
        row(
            "Best:  ",
            format!("{} (L{})", game.high_score, game.high_level),
            Style::default().fg(Color::Yellow),
        ),
        row(
            "Foes:  ",
            game.obstacles.len().to_string(),
            Style::default().fg(palette.muted),
        ),
    ];
    frame.render_widget(Paragraph::new(lines), inner);
}
