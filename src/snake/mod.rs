//! Grid snake minigame.
//!
//! A real-time arcade game on a fixed 15x15 grid. The player eats food to
//! grow and score, clears a level every few meals, and dodges obstacles that
//! multiply with each level. Simulation is tick-throttled; rendering and
//! particles run every frame.

pub mod logic;
pub mod particles;
pub mod types;

pub use logic::*;
pub use particles::*;
pub use types::*;
