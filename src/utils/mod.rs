//! Utility modules: build info and persistence.

pub mod build_info;
pub mod persistence;
