//! Colored noise synthesis and mixing.

mod mix;
mod synth;

pub use mix::NoiseMixer;
pub use synth::{NoiseError, NoiseResult, NoiseSynthesizer};
