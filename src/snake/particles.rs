//! Cosmetic particle bursts drawn over the play field.
//!
//! Positions are in grid-cell units. Particles never touch game state.

use crate::core::constants::{MAX_PARTICLES, PARTICLE_DECAY_PER_SEC, PARTICLE_GRAVITY};
use rand::Rng;

/// Smallest alpha/radius handed to the renderer.
pub const MIN_ALPHA: f32 = 0.0;
pub const MIN_RADIUS: f32 = 0.05;

#[derive(Debug, Clone, PartialEq)]
pub struct Particle {
    pub x: f32,
    pub y: f32,
    pub vx: f32,
    pub vy: f32,
    /// Remaining life in [0, 1]. Culled at or below zero.
    pub life: f32,
    pub radius: f32,
    pub color: (u8, u8, u8),
}

impl Particle {
    /// Opacity clamped to a drawable range.
    pub fn alpha(&self) -> f32 {
        if self.life.is_finite() {
            self.life.clamp(MIN_ALPHA, 1.0)
        } else {
            MIN_ALPHA
        }
    }

    /// Radius scaled by life, never below `MIN_RADIUS`.
    pub fn draw_radius(&self) -> f32 {
        let r = self.radius * self.alpha();
        if r.is_finite() {
            r.max(MIN_RADIUS)
        } else {
            MIN_RADIUS
        }
    }

    /// Color faded toward black by alpha.
    pub fn faded_color(&self) -> (u8, u8, u8) {
        let a = self.alpha();
        let scale = |c: u8| (c as f32 * a).round().clamp(0.0, 255.0) as u8;
        (scale(self.color.0), scale(self.color.1), scale(self.color.2))
    }
}

#[derive(Debug, Clone, Default)]
pub struct ParticleSystem {
    particles: Vec<Particle>,
}

impl ParticleSystem {
    pub fn new() -> Self {
        Self::default()
    }

    /// Spawn up to `count` particles radiating from a cell centre.
    /// Extra particles beyond `MAX_PARTICLES` are dropped.
    pub fn burst<R: Rng>(&mut self, x: f32, y: f32, count: usize, color: (u8, u8, u8), rng: &mut R) {
        let room = MAX_PARTICLES.saturating_sub(self.particles.len());
        for _ in 0..count.min(room) {
            let angle = rng.gen_range(0.0..std::f32::consts::TAU);
            let speed = rng.gen_range(2.0..7.0);
            self.particles.push(Particle {
                x,
                y,
                vx: angle.cos() * speed,
                vy: angle.sin() * speed - 4.0,
                life: 1.0,
                radius: rng.gen_range(0.3..0.7),
                color,
            });
        }
    }

    /// Integrate one frame: gravity, motion, decay, cull.
    pub fn update(&mut self, dt_secs: f32) {
        let dt = if dt_secs.is_finite() {
            dt_secs.clamp(0.0, 0.5)
        } else {
            0.0
        };
        for p in &mut self.particles {
            p.vy += PARTICLE_GRAVITY * dt;
            p.x += p.vx * dt;
            p.y += p.vy * dt;
            p.life -= PARTICLE_DECAY_PER_SEC * dt;
        }
        self.particles
            .retain(|p| p.life > 0.0 && p.x.is_finite() && p.y.is_finite());
    }

    pub fn iter(&self) -> impl Iterator<Item = &Particle> {
        self.particles.iter()
    }

    pub fn len(&self) -> usize {
        self.particles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.particles.is_empty()
    }

    pub fn clear(&mut self) {
        self.particles.clear();
    }
}
