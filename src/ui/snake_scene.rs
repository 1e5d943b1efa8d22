//! Play field rendering.
//!
//! Uses half-block pixel rendering. Each game cell maps to a colored pixel;
//! pairs of vertical pixels are packed into one terminal row using the `▀`
//! (upper half block) character with fg=top, bg=bottom colors.

use super::theme::{mix, rgb, Palette, Rgb};
use crate::snake::{GamePhase, ParticleSystem, SnakeGame};
use ratatui::{
    layout::Rect,
    style::{Color, Style},
    text::{Line, Span},
    widgets::Paragraph,
    Frame,
};

const BORDER_H: char = '\u{2500}'; // ─
const BORDER_V: char = '\u{2502}'; // │
const BORDER_TL: char = '\u{250C}'; // ┌
const BORDER_TR: char = '\u{2510}'; // ┐
const BORDER_BL: char = '\u{2514}'; // └
const BORDER_BR: char = '\u{2518}'; // ┘
const HALF_TOP: char = '\u{2580}'; // ▀

/// Food pulse period.
const FOOD_PULSE_SECS: f32 = 0.8;
/// Fatal head blink period.
const FLASH_SECS: f32 = 0.25;

pub type PixelGrid = Vec<Vec<Option<Rgb>>>;

/// Terminal rows the field occupies, borders included.
pub fn field_height(grid_size: i16) -> u16 {
    (grid_size.max(0) as u16).div_ceil(2) + 2
}

fn body_color(palette: &Palette, index: usize, snake_len: usize) -> Rgb {
    let t = index as f32 / (snake_len.saturating_sub(1)).max(1) as f32;
    mix(palette.body_bright, palette.body_dim, t)
}

fn put(pixels: &mut PixelGrid, x: i64, y: i64, color: Rgb) {
    if x < 0 || y < 0 {
        return;
    }
    if let Some(cell) = pixels
        .get_mut(y as usize)
        .and_then(|row| row.get_mut(x as usize))
    {
        *cell = Some(color);
    }
}

/// Compose the field into one color per cell. Reads game state only.
pub fn build_pixels(
    game: &SnakeGame,
    particles: &ParticleSystem,
    palette: &Palette,
    elapsed_secs: f32,
) -> PixelGrid {
    let size = game.grid_size.max(0) as usize;
    let mut pixels: PixelGrid = vec![vec![None; size]; size];
    let elapsed = if elapsed_secs.is_finite() { elapsed_secs } else { 0.0 };

    if game.phase == GamePhase::Menu {
        return pixels;
    }

    if let Some(food) = game.food {
        let pulse = (elapsed / FOOD_PULSE_SECS * std::f32::consts::TAU).sin() * 0.5 + 0.5;
        let color = mix(palette.food, palette.flash, pulse * 0.25);
        put(&mut pixels, food.x as i64, food.y as i64, color);
    }

    for obstacle in &game.obstacles {
        let wobble = (elapsed * 3.0 + obstacle.phase).sin() * 0.5 + 0.5;
        let color = mix(palette.obstacle(obstacle.kind), palette.empty, wobble * 0.35);
        put(&mut pixels, obstacle.position.x as i64, obstacle.position.y as i64, color);
    }

    let snake_len = game.snake.len();
    for (i, seg) in game.snake.iter().enumerate().rev() {
        let color = if i == 0 {
            palette.head
        } else {
            body_color(palette, i, snake_len)
        };
        put(&mut pixels, seg.x as i64, seg.y as i64, color);
    }

    // Particles sit under the snake's cells but over empty ground.
    for p in particles.iter() {
        let (cx, cy) = (p.x.floor() as i64, p.y.floor() as i64);
        let color = mix(palette.empty, p.color, p.alpha());
        let mut plot = |x: i64, y: i64| {
            if x >= 0 && y >= 0 {
                if let Some(cell) = pixels
                    .get_mut(y as usize)
                    .and_then(|row| row.get_mut(x as usize))
                {
                    if cell.is_none() {
                        *cell = Some(color);
                    }
                }
            }
        };
        plot(cx, cy);
        if p.draw_radius() > 0.5 {
            plot(cx + 1, cy);
            plot(cx - 1, cy);
            plot(cx, cy + 1);
            plot(cx, cy - 1);
        }
    }

    if game.phase == GamePhase::GameOver {
        let on = (elapsed / FLASH_SECS) as u64 % 2 == 0;
        let color = if on { palette.flash } else { palette.food };
        // Walls put the fatal head off the grid, so flash the last head instead.
        let target = game
            .fatal_head
            .filter(|p| p.in_bounds(game.grid_size))
            .unwrap_or_else(|| game.head());
        put(&mut pixels, target.x as i64, target.y as i64, color);
    }

    pixels
}

/// Draw the bordered field at the top of `area`, centered horizontally.
pub fn render_play_field(
    frame: &mut Frame,
    area: Rect,
    game: &SnakeGame,
    particles: &ParticleSystem,
    palette: &Palette,
    elapsed_secs: f32,
) {
    if area.height < 3 || area.width < 5 {
        return;
    }

    let pixels = build_pixels(game, particles, palette, elapsed_secs);
    let grid = pixels.len();
    let border = Style::default().fg(rgb(palette.border));
    let empty = rgb(palette.empty);

    let content_rows = grid.div_ceil(2);
    let render_w = ((grid + 2) as u16).min(area.width);
    let inner_w = render_w.saturating_sub(2) as usize;
    let x_off = area.x + (area.width.saturating_sub(render_w)) / 2;
    let y_off = area.y;
    let bottom = area.y + area.height;

    let top: String = std::iter::once(BORDER_TL)
        .chain(std::iter::repeat(BORDER_H).take(inner_w))
        .chain(std::iter::once(BORDER_TR))
        .collect();
    frame.render_widget(
        Paragraph::new(Line::from(Span::styled(top, border))),
        Rect::new(x_off, y_off, render_w, 1),
    );

    let blank: Vec<Option<Rgb>> = vec![None; grid];
    for term_row in 0..content_rows {
        let top_row = pixels.get(term_row * 2).unwrap_or(&blank);
        let bot_row = pixels.get(term_row * 2 + 1).unwrap_or(&blank);

        let mut spans: Vec<Span> = vec![Span::styled(BORDER_V.to_string(), border)];

        // Batch consecutive cells with the same style
        let mut cur_fg = Color::Reset;
        let mut cur_bg = Color::Reset;
        let mut cur_text = String::new();

        for (&top_c, &bot_c) in top_row.iter().zip(bot_row.iter()).take(inner_w) {
            let fg = top_c.map(rgb).unwrap_or(empty);
            // Odd grids leave the last half-row outside the field
            let bg = if term_row * 2 + 1 < grid {
                bot_c.map(rgb).unwrap_or(empty)
            } else {
                Color::Reset
            };

            if fg != cur_fg || bg != cur_bg {
                if !cur_text.is_empty() {
                    spans.push(Span::styled(
                        std::mem::take(&mut cur_text),
                        Style::default().fg(cur_fg).bg(cur_bg),
                    ));
                }
                cur_fg = fg;
                cur_bg = bg;
            }
            cur_text.push(HALF_TOP);
        }
        if !cur_text.is_empty() {
            spans.push(Span::styled(cur_text, Style::default().fg(cur_fg).bg(cur_bg)));
        }
        spans.push(Span::styled(BORDER_V.to_string(), border));

        let row_y = y_off + 1 + term_row as u16;
        if row_y < bottom {
            frame.render_widget(
                Paragraph::new(Line::from(spans)),
                Rect::new(x_off, row_y, render_w, 1),
            );
        }
    }

    let bot_y = y_off + 1 + content_rows as u16;
    if bot_y < bottom {
        let s: String = std::iter::once(BORDER_BL)
            .chain(std::iter::repeat(BORDER_H).take(inner_w))
            .chain(std::iter::once(BORDER_BR))
            .collect();
        frame.render_widget(
            Paragraph::new(Line::from(Span::styled(s, border))),
            Rect::new(x_off, bot_y, render_w, 1),
        );
    }
}
