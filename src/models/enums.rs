//! Core enums used throughout the pipeline.

use std::ops::RangeInclusive;

use serde::{Deserialize, Serialize};

/// Category of a source asset clip.
///
/// Each category maps to a subdirectory of the asset root and a fixed
/// index range of numbered clips. The composition layers are listed in
/// front-to-back overlay order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AssetCategory {
    Background,
    Effect,
    Soundbar,
    SubjectOverlay,
    AmbientLayer,
    Intro,
}

impl AssetCategory {
    /// Subdirectory under the asset root holding this category's clips.
    pub fn dir_name(&self) -> &'static str {
        match self {
            AssetCategory::Background => "backgrounds",
            AssetCategory::Effect => "effects",
            AssetCategory::Soundbar => "soundbars",
            AssetCategory::SubjectOverlay => "baby_greenscreen",
            AssetCategory::AmbientLayer => "sleep_effects",
            AssetCategory::Intro => "intros",
        }
    }

    /// Range of clip indices available for this category.
    pub fn index_range(&self) -> RangeInclusive<u32> {
        match self {
            AssetCategory::Background => 1..=11,
            AssetCategory::Effect => 1..=8,
            AssetCategory::Soundbar => 1..=8,
            AssetCategory::SubjectOverlay => 1..=6,
            AssetCategory::AmbientLayer => 1..=1,
            AssetCategory::Intro => 1..=1,
        }
    }

    /// The five categories composited into the base clip, in overlay order.
    pub fn composition_layers() -> &'static [AssetCategory] {
        &[
            AssetCategory::Background,
            AssetCategory::Effect,
            AssetCategory::Soundbar,
            AssetCategory::SubjectOverlay,
            AssetCategory::AmbientLayer,
        ]
    }
}

impl std::fmt::Display for AssetCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.dir_name())
    }
}

/// Duration variant of an asset clip.
///
/// Full-length clips are named `<n>.mp4`; one-minute preview cuts of the
/// same material are named `<n>_1min.mp4`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AssetVariant {
    /// Full-length clip (30s to 5min of material).
    #[default]
    Full,
    /// One-minute preview cut.
    Preview,
}

impl AssetVariant {
    /// Filename for a clip index in this variant.
    pub fn file_name(&self, index: u32) -> String {
        match self {
            AssetVariant::Full => format!("{}.mp4", index),
            AssetVariant::Preview => format!("{}_1min.mp4", index),
        }
    }
}

/// Spectral color of a generated noise track.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NoiseColor {
    /// Flat spectrum.
    White,
    /// -3 dB per octave.
    Pink,
    /// -6 dB per octave.
    Brown,
}

impl NoiseColor {
    /// Name understood by the generator's noise source filter.
    pub fn filter_name(&self) -> &'static str {
        match self {
            NoiseColor::White => "white",
            NoiseColor::Pink => "pink",
            NoiseColor::Brown => "brown",
        }
    }

    /// All supported colors.
    pub fn all() -> &'static [NoiseColor] {
        &[NoiseColor::White, NoiseColor::Pink, NoiseColor::Brown]
    }
}

impl std::fmt::Display for NoiseColor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.filter_name())
    }
}

/// Privacy status applied to an uploaded video.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PrivacyStatus {
    #[default]
    Public,
    Unlisted,
    Private,
}

impl PrivacyStatus {
    /// Wire value for the upload platform.
    pub fn as_str(&self) -> &'static str {
        match self {
            PrivacyStatus::Public => "public",
            PrivacyStatus::Unlisted => "unlisted",
            PrivacyStatus::Private => "private",
        }
    }
}

impl std::fmt::Display for PrivacyStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn category_serializes_snake_case() {
        let json = serde_json::to_string(&AssetCategory::SubjectOverlay).unwrap();
        assert_eq!(json, "\"subject_overlay\"");
    }

    #[test]
    fn composition_layers_start_with_background() {
        let layers = AssetCategory::composition_layers();
        assert_eq!(layers.len(), 5);
        assert_eq!(layers[0], AssetCategory::Background);
        assert!(!layers.contains(&AssetCategory::Intro));
    }

    #[test]
    fn variant_file_names() {
        assert_eq!(AssetVariant::Full.file_name(7), "7.mp4");
        assert_eq!(AssetVariant::Preview.file_name(7), "7_1min.mp4");
    }

    #[test]
    fn noise_color_round_trips() {
        let color: NoiseColor = serde_json::from_str("\"brown\"").unwrap();
        assert_eq!(color, NoiseColor::Brown);
        assert_eq!(color.filter_name(), "brown");
    }
}
