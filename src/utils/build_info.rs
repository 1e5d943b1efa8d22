//! Build metadata written by `build.rs`.

include!(concat!(env!("OUT_DIR"), "/build_info.rs"));

/// `gridsnake <version> (<date>, <commit>)`
pub fn version_line() -> String {
    format!(
        "gridsnake {} ({}, {})",
        env!("CARGO_PKG_VERSION"),
        BUILD_DATE,
        BUILD_COMMIT
    )
}
