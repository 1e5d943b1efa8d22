//! Shared layout pieces: framed game area, status bar, info panel, banners.

use super::theme::Palette;
use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph},
    Frame,
};

/// Screen regions inside the outer frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GameLayout {
    /// Play field, sized to the board when there is room
    pub field: Rect,
    /// Two rows under the field: status text, then key hints
    pub status_bar: Rect,
    /// Right-hand column for stats and the leaderboard
    pub info_panel: Rect,
}

impl GameLayout {
    /// Split the inside of the outer frame.
    ///
    /// ```text
    /// ┌─ Title ─────────────────────────┬─────────────┐
    /// │   [field]                       │  [info]     │
    /// │ [status]                        │             │
    /// │ [keys]                          │             │
    /// └─────────────────────────────────┴─────────────┘
    /// ```
    ///
    /// Spare rows go below the status bar so it stays next to the board.
    pub fn split(inner: Rect, field_height: u16, info_width: u16) -> Self {
        let columns = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Min(20), Constraint::Length(info_width)])
            .split(inner);
        let rows = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(field_height),
                Constraint::Length(2),
                Constraint::Min(0),
            ])
            .split(columns[0]);

        Self {
            field: rows[0],
            status_bar: rows[1],
            info_panel: columns[1],
        }
    }
}

/// Clear the screen, draw the titled outer frame and return the layout.
pub fn render_game_frame(
    frame: &mut Frame,
    area: Rect,
    title: &str,
    palette: &Palette,
    field_height: u16,
    info_width: u16,
) -> GameLayout {
    frame.render_widget(Clear, area);
    let inner = render_panel_frame(frame, area, title, palette.accent);
    GameLayout::split(inner, field_height, info_width)
}

/// Status message over a row of `[key] action` hints.
pub fn render_status_bar(
    frame: &mut Frame,
    area: Rect,
    palette: &Palette,
    status: (&str, Color),
    controls: &[(&str, &str)],
) {
    let (text, color) = status;
    let mut lines = vec![Line::from(Span::styled(text.to_string(), Style::default().fg(color)))];

    let hints: Vec<Span> = controls
        .iter()
        .enumerate()
        .flat_map(|(i, (key, action))| {
            let gap = if i == 0 { "" } else { "  " };
            [
                Span::raw(gap),
                Span::styled(*key, Style::default().fg(palette.text)),
                Span::styled(format!(" {}", action), Style::default().fg(palette.muted)),
            ]
        })
        .collect();
    if !hints.is_empty() {
        lines.push(Line::from(hints));
    }

    frame.render_widget(Paragraph::new(lines).alignment(Alignment::Center), area);
}

/// Draw a titled side-panel frame and return its inner area.
pub fn render_panel_frame(frame: &mut Frame, area: Rect, title: &str, border: Color) -> Rect {
    let block = Block::default()
        .title(title)
        .borders(Borders::ALL)
        .border_style(Style::default().fg(border));
    let inner = block.inner(area);
    frame.render_widget(block, area);
    inner
}

/// Draw centered lines over the middle of `area` without clearing it.
pub fn render_centered_prompt(frame: &mut Frame, area: Rect, lines: Vec<Line<'_>>) {
    let height = lines.len() as u16;
    if area.height < height || area.width < 4 {
        return;
    }
    let y = area.y + (area.height - height) / 2;
    let text = Paragraph::new(lines).alignment(Alignment::Center);
    frame.render_widget(text, Rect::new(area.x, y, area.width, height));
}

/// Bordered banner at the bottom of `area`; the board stays visible above it.
pub fn render_banner(frame: &mut Frame, area: Rect, color: Color, title: &str, body: Vec<Line<'_>>) {
    let banner_height = (body.len() as u16 + 3).min(area.height);
    if banner_height < 3 {
        return;
    }
    let banner_area = Rect {
        x: area.x,
        y: area.y + area.height - banner_height,
        width: area.width,
        height: banner_height,
    };

    frame.render_widget(Clear, banner_area);

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(color));
    let inner = block.inner(banner_area);
    frame.render_widget(block, banner_area);

    let mut lines = vec![Line::from(Span::styled(
        title.to_string(),
        Style::default().fg(color).add_modifier(Modifier::BOLD),
    ))];
    lines.extend(body);

    let text = Paragraph::new(lines).alignment(Alignment::Center);
    frame.render_widget(text, inner);
}
