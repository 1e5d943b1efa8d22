//! Core constants shared by the simulation, sync engine and renderer.

pub mod constants;

pub use constants::*;
