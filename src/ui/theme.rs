//! Play-field palettes.

use crate::profile::Theme;
use crate::snake::ObstacleKind;
use ratatui::style::Color;

pub type Rgb = (u8, u8, u8);

#[derive(Debug, Clone, Copy)]
pub struct Palette {
    pub empty: Rgb,
    pub border: Rgb,
    pub head: Rgb,
    pub body_bright: Rgb,
    pub body_dim: Rgb,
    pub food: Rgb,
    pub ant: Rgb,
    pub crab: Rgb,
    pub void: Rgb,
    pub flash: Rgb,
    pub text: Color,
    pub muted: Color,
    pub accent: Color,
}

const DARK: Palette = Palette {
    empty: (12, 12, 18),
    border: (80, 80, 80),
    head: (100, 255, 100),
    body_bright: (50, 220, 50),
    body_dim: (20, 80, 20),
    food: (255, 80, 40),
    ant: (200, 40, 40),
    crab: (240, 140, 30),
    void: (150, 60, 220),
    flash: (255, 255, 255),
    text: Color::White,
    muted: Color::DarkGray,
    accent: Color::LightGreen,
};

const LIGHT: Palette = Palette {
    empty: (236, 234, 222),
    border: (150, 150, 150),
    head: (10, 120, 10),
    body_bright: (40, 160, 40),
    body_dim: (150, 205, 150),
    food: (220, 60, 30),
    ant: (160, 20, 20),
    crab: (210, 110, 0),
    void: (110, 40, 180),
    flash: (20, 20, 20),
    text: Color::Black,
    muted: Color::Gray,
    accent: Color::Green,
};

pub fn palette(theme: Theme) -> &'static Palette {
    match theme {
        Theme::Dark => &DARK,
        Theme::Light => &LIGHT,
    }
}

impl Palette {
    pub fn obstacle(&self, kind: ObstacleKind) -> Rgb {
        match kind {
            ObstacleKind::Ant => self.ant,
            ObstacleKind::Crab => self.crab,
            ObstacleKind::Void => self.void,
        }
    }
}

pub fn rgb((r, g, b): Rgb) -> Color {
    Color::Rgb(r, g, b)
}

/// Linear blend from `a` (t = 0) to `b` (t = 1).
pub fn mix(a: Rgb, b: Rgb, t: f32) -> Rgb {
    let t = if t.is_finite() { t.clamp(0.0, 1.0) } else { 0.0 };
    let lerp = |x: u8, y: u8| (x as f32 + (y as f32 - x as f32) * t).round() as u8;
    (lerp(a.0, b.0), lerp(a.1, b.1), lerp(a.2, b.2))
}
