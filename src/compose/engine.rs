//! Composition engine: one encoder pass over the layered filter graph.

use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::config::EncoderSettings;
use crate::encoder::Invocation;
use crate::models::CompositionPlan;

use super::filter::{build_overlay_graph, ChromaKey};

/// Errors from the composition stage.
#[derive(Error, Debug)]
pub enum ComposeError {
    /// A plan was built with fewer than two layers.
    #[error("Composition plan needs at least two layers, got {0}")]
    TooFewLayers(usize),

    /// The encoder could not be launched.
    #[error("Failed to launch encoder: {0}")]
    LaunchFailed(String),

    /// The encoder exited nonzero. Fatal; no degraded composition is
    /// attempted.
    #[error("Composition encode failed with exit code {exit_code}: {stderr}")]
    EncoderFailed { exit_code: i32, stderr: String },

    /// The encoder reported success but the output file is absent.
    #[error("Composition output missing: {0}")]
    OutputMissing(PathBuf),
}

/// Result type for composition operations.
pub type ComposeResult<T> = Result<T, ComposeError>;

/// Builds and runs the layered composition encode.
pub struct CompositionEngine<'a> {
    settings: &'a EncoderSettings,
}

impl<'a> CompositionEngine<'a> {
    pub fn new(settings: &'a EncoderSettings) -> Self {
        Self { settings }
    }

    /// Build the encoder argument vector for a plan.
    ///
    /// Separated from execution so the command can be inspected and
    /// logged without running anything.
    pub fn build_args(&self, plan: &CompositionPlan, output: &Path) -> ComposeResult<Invocation> {
        if plan.layers.len() < 2 {
            return Err(ComposeError::TooFewLayers(plan.layers.len()));
        }

        let key = ChromaKey::from_settings(self.settings);
        let graph = build_overlay_graph(plan.layers.len(), &key);

        let mut inv = Invocation::new(&self.settings.ffmpeg_path).arg("-y");
        for layer in &plan.layers {
            inv = inv.arg("-i").path_arg(&layer.path);
        }

        Ok(inv
            .args(["-filter_complex", &graph])
            .args(["-map", "[out]"])
            .args(["-c:v", "libx264"])
            .args(["-crf", &self.settings.compose_crf.to_string()])
            .args(["-preset", &self.settings.preset])
            .args(["-profile:v", "high"])
            .args(["-level", "4.1"])
            .args(["-pix_fmt", "yuv420p"])
            .args(["-movflags", "+faststart"])
            .path_arg(output))
    }

    /// Run the composition, producing exactly one output file.
    ///
    /// Inputs are shared static assets and are never deleted here.
    pub fn compose(&self, plan: &CompositionPlan, output: &Path) -> ComposeResult<PathBuf> {
        let inv = self.build_args(plan, output)?;

        tracing::info!(
            layers = plan.layers.len(),
            output = %output.display(),
            "compositing base clip"
        );

        let result = inv
            .run()
            .map_err(|e| ComposeError::LaunchFailed(e.to_string()))?;

        if !result.success {
            return Err(ComposeError::EncoderFailed {
                exit_code: result.exit_code,
                stderr: result.stderr_tail(20),
            });
        }

        if !output.exists() {
            return Err(ComposeError::OutputMissing(output.to_path_buf()));
        }

        Ok(output.to_path_buf())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{AssetCategory, CompositionLayer};

    fn plan() -> CompositionPlan {
        let layers = AssetCategory::composition_layers()
            .iter()
            .enumerate()
            .map(|(i, &category)| CompositionLayer {
                category,
                path: PathBuf::from(format!("/assets/{}/{}.mp4", category.dir_name(), i + 1)),
            })
            .collect();
        CompositionPlan::new(layers)
    }

    #[test]
    fn args_list_every_input_in_order() {
        let settings = EncoderSettings::default();
        let engine = CompositionEngine::new(&settings);
        let inv = engine
            .build_args(&plan(), Path::new("/work/base.mp4"))
            .unwrap();

        let args = inv.arg_slice();
        let inputs: Vec<&String> = args
            .iter()
            .zip(args.iter().skip(1))
            .filter(|(flag, _)| flag.as_str() == "-i")
            .map(|(_, value)| value)
            .collect();

        assert_eq!(inputs.len(), 5);
        assert!(inputs[0].contains("backgrounds"));
        assert!(inputs[4].contains("sleep_effects"));
    }

    #[test]
    fn args_map_final_overlay_output() {
        let settings = EncoderSettings::default();
        let engine = CompositionEngine::new(&settings);
        let inv = engine
            .build_args(&plan(), Path::new("/work/base.mp4"))
            .unwrap();

        let args: Vec<&str> = inv.arg_slice().iter().map(String::as_str).collect();
        let map_pos = args.iter().position(|a| *a == "-map").unwrap();
        assert_eq!(args[map_pos + 1], "[out]");
        assert_eq!(*args.last().unwrap(), "/work/base.mp4");
    }

    #[test]
    fn single_layer_plan_is_rejected() {
        let settings = EncoderSettings::default();
        let engine = CompositionEngine::new(&settings);
        let single = CompositionPlan::new(vec![CompositionLayer {
            category: AssetCategory::Background,
            path: PathBuf::from("/assets/backgrounds/1.mp4"),
        }]);

        assert!(matches!(
            engine.build_args(&single, Path::new("/work/base.mp4")),
            Err(ComposeError::TooFewLayers(1))
        ));
    }

    #[test]
    fn encode_quality_settings_applied() {
        let settings = EncoderSettings {
            compose_crf: 18,
            preset: "slow".to_string(),
            ..EncoderSettings::default()
        };
        let engine = CompositionEngine::new(&settings);
        let inv = engine
            .build_args(&plan(), Path::new("/work/base.mp4"))
            .unwrap();

        let args: Vec<&str> = inv.arg_slice().iter().map(String::as_str).collect();
        let crf_pos = args.iter().position(|a| *a == "-crf").unwrap();
        assert_eq!(args[crf_pos + 1], "18");
        let preset_pos = args.iter().position(|a| *a == "-preset").unwrap();
        assert_eq!(args[preset_pos + 1], "slow");
    }
}
