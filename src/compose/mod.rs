//! Layered video composition via chroma-key overlays.

mod engine;
mod filter;

pub use engine::{ComposeError, ComposeResult, CompositionEngine};
pub use filter::{build_overlay_graph, ChromaKey};
