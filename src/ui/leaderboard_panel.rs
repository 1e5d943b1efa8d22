//! Leaderboard column: status line and the top ten.

use super::game_common::render_panel_frame;
use super::theme::Palette;
use super::throbber::spinner_char;
use crate::leaderboard::{LeaderboardSync, SaveState};
use ratatui::{
    layout::Rect,
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::Paragraph,
    Frame,
};

/// One-line sync status shown above the rows.
pub fn status_line(sync: &LeaderboardSync, elapsed_secs: f32) -> (String, Color) {
    if !sync.is_remote() {
        return ("Local scores".to_string(), Color::DarkGray);
    }
    if sync.is_loading() {
        return (format!("{} Loading...", spinner_char(elapsed_secs)), Color::Yellow);
    }
    if sync.is_slow() {
        return ("Slow connection, showing local".to_string(), Color::Yellow);
    }
    if sync.error().is_some() {
        return ("Offline, showing cached".to_string(), Color::Red);
    }
    ("Online".to_string(), Color::Green)
}

/// Save progress text for the game-over banner, if any.
pub fn save_status(state: &SaveState, elapsed_secs: f32) -> Option<(String, Color)> {
    match state {
        SaveState::Idle => None,
        SaveState::Saving => Some((format!("{} Saving score...", spinner_char(elapsed_secs)), Color::Yellow)),
        SaveState::Saved { remote: true } => Some(("Score saved!".to_string(), Color::Green)),
        SaveState::Saved { remote: false } => Some(("Score saved locally".to_string(), Color::Green)),
        SaveState::Failed(reason) => Some((format!("Saved locally ({})", reason), Color::Red)),
    }
}

pub fn render_leaderboard(
    frame: &mut Frame,
    area: Rect,
    sync: &LeaderboardSync,
    palette: &Palette,
    elapsed_secs: f32,
) {
    let inner = render_panel_frame(frame, area, " Leaderboard ", Color::DarkGray);
    if inner.height == 0 {
        return;
    }

    let (status, status_color) = status_line(sync, elapsed_secs);
    let mut lines = vec![Line::from(Span::styled(status, Style::default().fg(status_color)))];

    if sync.entries().is_empty() {
        lines.push(Line::from(""));
        lines.push(Line::from(Span::styled(
            "No scores yet",
            Style::default().fg(palette.muted),
        )));
    }

    for (rank, entry) in sync.entries().iter().enumerate() {
        let rank_style = if rank == 0 {
            Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD)
        } else {
            Style::default().fg(palette.muted)
        };
        let marker = if entry.is_local_only() { "*" } else { " " };
        lines.push(Line::from(vec![
            Span::styled(format!("{:>2}.", rank + 1), rank_style),
            Span::styled(format!(" {:<8}", entry.name), Style::default().fg(palette.text)),
            Span::styled(
                format!("{:>6}", entry.score),
                Style::default().fg(palette.text).add_modifier(Modifier::BOLD),
            ),
            Span::styled(format!(" L{:<2}", entry.level), Style::default().fg(palette.muted)),
            Span::styled(marker, Style::default().fg(palette.muted)),
        ]));
    }

    frame.render_widget(Paragraph::new(lines), inner);
}
