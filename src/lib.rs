//! Gridsnake - terminal snake with an online/offline leaderboard.
//!
//! The library holds the simulation, leaderboard sync and app state so they
//! can be tested without a terminal; `main.rs` only drives the frame loop.

pub mod app;
pub mod audio;
pub mod config;
pub mod core;
pub mod input;
pub mod leaderboard;
pub mod logging;
pub mod profile;
pub mod snake;
pub mod utils;

// Rendering is reached through `App::render`
mod ui;
