//! Hushloop - long-form ambient video assembly pipeline
//!
//! This crate contains all pipeline logic with no UI dependencies.
//! It composes short source clips into multi-hour white noise videos
//! and uploads them, driven by a single-worker job queue.

pub mod assets;
pub mod compose;
pub mod compress;
pub mod config;
pub mod encoder;
pub mod expand;
pub mod jobs;
pub mod logging;
pub mod media;
pub mod models;
pub mod mux;
pub mod noise;
pub mod orchestrator;
pub mod text;
pub mod upload;

/// Returns the crate version.
pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn version_returns_value() {
        assert!(!version().is_empty());
    }
}
